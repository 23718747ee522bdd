use core::fmt::Debug;
#[cfg(any(feature = "foldhash", feature = "std"))]
use core::hash::Hash;

use crate::error::Error;
use crate::hash_table::HashTable;
use crate::hash_table::INITIAL_CAPACITY;
use crate::hash_table::Iter;
#[cfg(any(feature = "foldhash", feature = "std"))]
use crate::identity;

/// A set of borrowed items identified by a caller-supplied hash function.
///
/// `HashSet<'a, T, H, E>` stores `&'a T` references in a [`HashTable`],
/// keyed by `hash(item)`. The set never copies, drops, or frees an item; the
/// caller keeps every item alive for `'a`, which the borrow checker enforces.
///
/// # Identity
///
/// Two items are the same member exactly when `hash` returns the same value
/// for both. The `equals` predicate is kept as part of the set's
/// configuration but is never called by [`add`], [`get`], [`contains`], or
/// [`remove`]. Callers must ensure that items `equals` considers equal have
/// equal hashes; [`check_contract`] audits a pair. Items with equal hashes
/// that `equals` would tell apart still replace one another, and a lookup may
/// return the other one. This is never memory-unsafe.
///
/// [`add`]: HashSet::add
/// [`get`]: HashSet::get
/// [`contains`]: HashSet::contains
/// [`remove`]: HashSet::remove
/// [`check_contract`]: HashSet::check_contract
///
/// # Examples
///
/// ```rust
/// use linprobe::HashSet;
///
/// struct Account {
///     id: u64,
///     owner: &'static str,
/// }
///
/// let alice = Account { id: 1, owner: "alice" };
/// let bob = Account { id: 2, owner: "bob" };
///
/// let mut accounts = HashSet::new(
///     |a: &Account| a.id,
///     |a: &Account, b: &Account| a.id == b.id,
/// )?;
/// accounts.add(&alice)?;
/// accounts.add(&bob)?;
///
/// let probe = Account { id: 2, owner: "" };
/// assert_eq!(accounts.get(&probe).map(|a| a.owner), Some("bob"));
/// assert_eq!(accounts.count(), 2);
/// # Ok::<(), linprobe::Error>(())
/// ```
pub struct HashSet<'a, T: ?Sized, H, E> {
    table: HashTable<'a, T>,
    hash: H,
    equals: E,
}

/// A [`HashSet`] using the functions from [`identity`](crate::identity).
#[cfg(any(feature = "foldhash", feature = "std"))]
pub type DefaultHashSet<'a, T> = HashSet<'a, T, fn(&T) -> u64, fn(&T, &T) -> bool>;

impl<T, H, E> Clone for HashSet<'_, T, H, E>
where
    T: ?Sized,
    H: Clone,
    E: Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            hash: self.hash.clone(),
            equals: self.equals.clone(),
        }
    }
}

impl<T, H, E> Debug for HashSet<'_, T, H, E>
where
    T: Debug + ?Sized,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.table.iter()).finish()
    }
}

impl<'a, T, H, E> HashSet<'a, T, H, E>
where
    T: ?Sized,
    H: Fn(&T) -> u64,
    E: Fn(&T, &T) -> bool,
{
    /// Creates an empty set with the default table size of
    /// [`INITIAL_CAPACITY`] slots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the slot array cannot be allocated.
    pub fn new(hash: H, equals: E) -> Result<Self, Error> {
        Self::with_capacity(hash, equals, INITIAL_CAPACITY)
    }

    /// Creates an empty set whose table starts with at least `capacity` slots
    /// and never fewer than [`INITIAL_CAPACITY`].
    ///
    /// The table grows once half of its slots are in use, so a set expected to
    /// hold `n` items without growing needs a `capacity` of `2 * n`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashSet;
    ///
    /// let set = HashSet::with_capacity(|n: &u32| *n as u64, |a: &u32, b: &u32| a == b, 1000)?;
    /// assert_eq!(set.capacity(), 1024);
    ///
    /// let set = HashSet::with_capacity(|n: &u32| *n as u64, |a: &u32, b: &u32| a == b, 10)?;
    /// assert_eq!(set.capacity(), 256);
    /// # Ok::<(), linprobe::Error>(())
    /// ```
    pub fn with_capacity(hash: H, equals: E, capacity: usize) -> Result<Self, Error> {
        Ok(Self {
            table: HashTable::with_capacity(capacity.max(INITIAL_CAPACITY))?,
            hash,
            equals,
        })
    }

    /// Adds `item`, replacing any member with the same hash, and returns the
    /// member it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] or [`Error::CapacityOverflow`] if the
    /// table had to grow and could not, and [`Error::WindowSaturated`] if too
    /// many members already collide with `item`. The set is left unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashSet;
    ///
    /// let first = String::from("first");
    /// let second = String::from("second");
    ///
    /// // Every string has the same identity here.
    /// let mut set = HashSet::new(|_: &String| 0u64, |a: &String, b: &String| a == b)?;
    /// assert_eq!(set.add(&first)?, None);
    /// assert_eq!(set.add(&second)?, Some(&first));
    /// assert_eq!(set.count(), 1);
    /// # Ok::<(), linprobe::Error>(())
    /// ```
    pub fn add(&mut self, item: &'a T) -> Result<Option<&'a T>, Error> {
        let key = (self.hash)(item);
        self.table.put(key, item)
    }

    /// Removes the member with the same hash as `item` and returns it.
    pub fn remove(&mut self, item: &T) -> Option<&'a T> {
        self.table.remove((self.hash)(item))
    }

    /// Returns the member with the same hash as `item`.
    pub fn get(&self, item: &T) -> Option<&'a T> {
        self.table.get((self.hash)(item))
    }

    /// Returns `true` if a member has the same hash as `item`.
    pub fn contains(&self, item: &T) -> bool {
        self.get(item).is_some()
    }

    /// Returns the number of members.
    pub fn count(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of slots in the underlying table.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Calls `visitor` once for every member.
    ///
    /// Members are visited in the table's physical slot order, which is
    /// unspecified and changes when the set grows.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashSet;
    ///
    /// let numbers = [3u64, 5, 8];
    /// let mut set = HashSet::new(|n: &u64| *n, |a: &u64, b: &u64| a == b)?;
    /// for n in &numbers {
    ///     set.add(n)?;
    /// }
    ///
    /// let mut total = 0u64;
    /// set.apply(|n| total += *n);
    /// assert_eq!(total, 16);
    /// # Ok::<(), linprobe::Error>(())
    /// ```
    pub fn apply(&self, mut visitor: impl FnMut(&'a T)) {
        for item in self.table.iter() {
            visitor(item);
        }
    }

    /// Returns an iterator over the members, in the same order as
    /// [`apply`](Self::apply).
    pub fn iter(&self) -> Iter<'_, 'a, T> {
        self.table.iter()
    }

    /// Removes every member. The table keeps its capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Applies the set's equality predicate to two items.
    ///
    /// Membership never depends on this predicate; it is exposed so callers
    /// can compare a retrieved member against the item they looked up.
    pub fn equivalent(&self, left: &T, right: &T) -> bool {
        (self.equals)(left, right)
    }

    /// Checks that two items do not break the set's identity contract.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContractViolation`] if `equals(left, right)` holds
    /// but the two items hash differently.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::Error;
    /// use linprobe::HashSet;
    ///
    /// // Hashes the exact text but compares case-insensitively.
    /// let set = HashSet::new(
    ///     |s: &str| s.len() as u64 + s.bytes().map(u64::from).sum::<u64>(),
    ///     |a: &str, b: &str| a.eq_ignore_ascii_case(b),
    /// )?;
    ///
    /// assert!(set.check_contract("abc", "abc").is_ok());
    /// assert!(set.check_contract("abc", "xyz").is_ok());
    /// assert!(matches!(
    ///     set.check_contract("abc", "ABC"),
    ///     Err(Error::ContractViolation { .. })
    /// ));
    /// # Ok::<(), linprobe::Error>(())
    /// ```
    pub fn check_contract(&self, left: &T, right: &T) -> Result<(), Error> {
        let (left_hash, right_hash) = ((self.hash)(left), (self.hash)(right));
        if left_hash != right_hash && (self.equals)(left, right) {
            return Err(Error::ContractViolation {
                left: left_hash,
                right: right_hash,
            });
        }
        Ok(())
    }

    /// Returns the probe-length histogram of the underlying table.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> crate::hash_table::ProbeHistogram {
        self.table.probe_histogram()
    }

    /// Returns occupancy statistics of the underlying table.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl<T> DefaultHashSet<'_, T>
where
    T: Hash + Eq + ?Sized,
{
    /// Creates an empty set that hashes members with
    /// [`identity::hash_one`] and compares them with `==`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::DefaultHashSet;
    ///
    /// let word = String::from("apple");
    /// let mut set: DefaultHashSet<'_, str> = DefaultHashSet::with_default_identity()?;
    /// set.add(&word)?;
    ///
    /// assert!(set.contains("apple"));
    /// assert!(!set.contains("pear"));
    /// # Ok::<(), linprobe::Error>(())
    /// ```
    pub fn with_default_identity() -> Result<Self, Error> {
        Self::new(identity::hash_one::<T>, identity::equals::<T>)
    }
}

impl<'t, 'a, T, H, E> IntoIterator for &'t HashSet<'a, T, H, E>
where
    T: ?Sized,
    H: Fn(&T) -> u64,
    E: Fn(&T, &T) -> bool,
{
    type IntoIter = Iter<'t, 'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::hash::Hasher;

    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct Tx {
        id: u64,
        memo: &'static str,
    }

    impl Tx {
        fn new(id: u64) -> Self {
            Self { id, memo: "" }
        }
    }

    fn hash_tx(tx: &Tx) -> u64 {
        tx.id
    }

    fn eq_tx(left: &Tx, right: &Tx) -> bool {
        left.id == right.id
    }

    #[test]
    fn test_new_and_with_capacity() {
        let set = HashSet::new(hash_tx, eq_tx).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.count(), 0);
        assert_eq!(set.capacity(), 256);

        let set = HashSet::with_capacity(hash_tx, eq_tx, 3000).unwrap();
        assert_eq!(set.capacity(), 4096);
    }

    #[test]
    fn test_add_and_contains() {
        let txs: Vec<Tx> = (0..10).map(Tx::new).collect();
        let mut set = HashSet::new(hash_tx, eq_tx).unwrap();

        for (added, tx) in txs.iter().enumerate() {
            assert!(!set.contains(tx));
            assert_eq!(set.add(tx).unwrap(), None);
            assert!(set.contains(tx));
            assert_eq!(set.count(), added + 1);
        }

        assert!(!set.contains(&Tx::new(10)));
        assert!(set.contains(&Tx::new(4)));
    }

    #[test]
    fn test_same_hash_replaces() {
        let a = Tx { id: 9, memo: "a" };
        let b = Tx { id: 9, memo: "b" };
        let mut set = HashSet::new(hash_tx, eq_tx).unwrap();

        set.add(&a).unwrap();
        let replaced = set.add(&b).unwrap().unwrap();
        assert!(core::ptr::eq(replaced, &a));

        assert_eq!(set.count(), 1);
        assert!(core::ptr::eq(set.get(&a).unwrap(), &b));
    }

    #[test]
    fn test_remove() {
        let txs: Vec<Tx> = (0..3).map(Tx::new).collect();
        let mut set = HashSet::new(hash_tx, eq_tx).unwrap();
        for tx in &txs {
            set.add(tx).unwrap();
        }

        let removed = set.remove(&Tx::new(1)).unwrap();
        assert!(core::ptr::eq(removed, &txs[1]));
        assert_eq!(set.count(), 2);
        assert!(!set.contains(&txs[1]));
        assert!(set.contains(&txs[0]));
        assert!(set.contains(&txs[2]));

        assert_eq!(set.remove(&txs[1]), None);
        assert_eq!(set.remove(&Tx::new(77)), None);
        assert_eq!(set.count(), 2);
    }

    #[test]
    fn test_apply_visits_each_member_once() {
        let txs: Vec<Tx> = (0..500).map(|id| Tx::new(id * 7)).collect();
        let mut set = HashSet::new(hash_tx, eq_tx).unwrap();
        for tx in &txs {
            set.add(tx).unwrap();
        }
        for tx in txs.iter().take(100) {
            set.remove(tx);
        }

        let mut visited = Vec::new();
        set.apply(|tx| visited.push(tx.id));
        assert_eq!(visited.len(), set.count());

        visited.sort_unstable();
        let expected: Vec<u64> = txs.iter().skip(100).map(|tx| tx.id).collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_growth_keeps_members() {
        let txs: Vec<Tx> = (1..=200).map(Tx::new).collect();
        let mut set = HashSet::with_capacity(hash_tx, eq_tx, 256).unwrap();
        assert_eq!(set.capacity(), 256);

        for tx in &txs {
            set.add(tx).unwrap();
        }

        assert_eq!(set.count(), 200);
        assert!(set.capacity() >= 512);
        for tx in &txs {
            assert!(core::ptr::eq(set.get(&Tx::new(tx.id)).unwrap(), tx));
        }
        assert!(!set.contains(&Tx::new(201)));
    }

    #[test]
    fn test_clear() {
        let txs: Vec<Tx> = (0..300).map(Tx::new).collect();
        let mut set = HashSet::new(hash_tx, eq_tx).unwrap();
        for tx in &txs {
            set.add(tx).unwrap();
        }

        set.clear();
        assert_eq!(set.count(), 0);
        assert!(set.is_empty());
        assert!(txs.iter().all(|tx| !set.contains(tx)));

        let mut visited = 0;
        set.apply(|_| visited += 1);
        assert_eq!(visited, 0);
    }

    #[test]
    fn test_equals_is_never_consulted() {
        let txs: Vec<Tx> = (0..50).map(Tx::new).collect();
        let mut set = HashSet::new(hash_tx, |_: &Tx, _: &Tx| -> bool {
            panic!("membership must not depend on equals")
        })
        .unwrap();

        for tx in &txs {
            set.add(tx).unwrap();
        }
        set.add(&txs[3]).unwrap();
        assert!(set.contains(&Tx::new(3)));
        assert!(set.get(&Tx::new(4)).is_some());
        assert!(set.remove(&Tx::new(5)).is_some());
        assert_eq!(set.count(), 49);
    }

    #[test]
    fn test_check_contract() {
        let set = HashSet::new(hash_tx, |a: &Tx, b: &Tx| a.memo == b.memo).unwrap();

        let paid = Tx { id: 1, memo: "rent" };
        let same = Tx { id: 1, memo: "rent" };
        let twin = Tx { id: 2, memo: "rent" };
        let other = Tx { id: 3, memo: "food" };

        assert_eq!(set.check_contract(&paid, &same), Ok(()));
        assert_eq!(set.check_contract(&paid, &other), Ok(()));
        assert_eq!(
            set.check_contract(&paid, &twin),
            Err(Error::ContractViolation { left: 1, right: 2 })
        );
        assert!(set.equivalent(&paid, &twin));
        assert!(!set.equivalent(&paid, &other));
    }

    #[test]
    fn test_unsized_members_with_siphash() {
        let (k0, k1) = (0x0706_0504_0302_0100, 0x0f0e_0d0c_0b0a_0908);
        let hash = move |s: &str| {
            let mut hasher = SipHasher::new_with_keys(k0, k1);
            hasher.write(s.as_bytes());
            hasher.finish()
        };

        let words: Vec<String> = ["north", "south", "east", "west"]
            .iter()
            .map(|w| String::from(*w))
            .collect();
        let mut set = HashSet::new(hash, |a: &str, b: &str| a == b).unwrap();
        for word in &words {
            set.add(word.as_str()).unwrap();
        }

        assert_eq!(set.count(), 4);
        assert_eq!(set.get("east"), Some("east"));
        assert!(!set.contains("up"));
        assert_eq!(set.remove("north"), Some("north"));
        assert_eq!((&set).into_iter().count(), 3);
    }

    #[test]
    fn test_debug_lists_members() {
        let seven = 7u64;
        let mut set = HashSet::new(|n: &u64| *n, |a: &u64, b: &u64| a == b).unwrap();
        assert_eq!(format!("{:?}", set), "{}");

        set.add(&seven).unwrap();
        assert_eq!(format!("{:?}", set), "{7}");
    }

    #[cfg(any(feature = "foldhash", feature = "std"))]
    #[test]
    fn test_default_identity() {
        let words = [String::from("apple"), String::from("pear")];
        let mut set: DefaultHashSet<'_, String> = DefaultHashSet::with_default_identity().unwrap();
        for word in &words {
            set.add(word).unwrap();
        }

        assert!(set.contains(&String::from("apple")));
        assert!(!set.contains(&String::from("plum")));
        assert!(set.equivalent(&words[0], &String::from("apple")));
        assert_eq!(set.count(), 2);
    }

    #[test]
    fn test_clone_is_independent() {
        let txs: Vec<Tx> = (0..4).map(Tx::new).collect();
        let mut set = HashSet::new(hash_tx, eq_tx).unwrap();
        for tx in &txs {
            set.add(tx).unwrap();
        }

        let mut copy = set.clone();
        copy.remove(&txs[0]);

        assert_eq!(set.count(), 4);
        assert_eq!(copy.count(), 3);
        assert!(set.contains(&txs[0]));
    }
}
