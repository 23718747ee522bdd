//! A linear-probing hash table from `u64` identities to borrowed values.
//!
//! The table owns its slot array but never the values stored in it: each
//! occupied slot holds a `&'a T`, so the items must outlive the table.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;

use log::debug;
use log::trace;

use crate::error::Error;

/// Number of slots allocated by [`HashTable::new`].
pub const INITIAL_CAPACITY: usize = 256;

/// Maximum number of consecutive slots examined for any key, starting at its
/// home slot.
pub const MAX_PROBE: usize = 8;

/// Knuth's multiplicative constant, `floor(2^32 / phi)`.
const KNUTH: u32 = 2_654_435_761;

/// Robert Jenkins' 32-bit integer mix followed by Knuth's multiplicative
/// step. The upper half of the key is folded into the lower half first so
/// that keys differing only in their high bits still spread.
#[inline(always)]
fn mix(key: u64) -> u32 {
    let mut k = (key ^ (key >> 32)) as u32;
    k = k.wrapping_add(k << 12);
    k ^= k >> 22;
    k = k.wrapping_add(k << 4);
    k ^= k >> 9;
    k = k.wrapping_add(k << 10);
    k ^= k >> 2;
    k = k.wrapping_add(k << 7);
    k ^= k >> 12;
    k.wrapping_mul(KNUTH)
}

/// Home slot of `key` in a table of `capacity` slots. `capacity` is a power
/// of two, so masking is the modulo.
#[inline(always)]
fn home_index(key: u64, capacity: usize) -> usize {
    mix(key) as usize & (capacity - 1)
}

enum Slot<'a, T: ?Sized> {
    Empty,
    /// A removed entry. Probes walk past it; inserts may reuse it.
    Deleted,
    Occupied {
        key: u64,
        value: &'a T,
    },
}

impl<T: ?Sized> Clone for Slot<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Slot<'_, T> {}

impl<'a, T: ?Sized> Slot<'a, T> {
    #[inline(always)]
    fn value(&self) -> Option<&'a T> {
        match *self {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    fn marker(&self) -> char {
        match self {
            Slot::Empty => '.',
            Slot::Deleted => 'x',
            Slot::Occupied { .. } => '#',
        }
    }
}

enum Probe {
    /// The key is stored at this index.
    Found(usize),
    /// The key is absent and may be written at this index.
    Vacant(usize),
    /// Every slot in the probe window holds some other key.
    Exhausted,
}

/// Walks the probe window of `key` looking for either the key itself or a
/// place to put it. The first tombstone seen is preferred over a later empty
/// slot, but only once the whole window has been ruled out for the key.
fn probe_for_insert<T: ?Sized>(slots: &[Slot<'_, T>], key: u64) -> Probe {
    let mask = slots.len() - 1;
    let mut index = home_index(key, slots.len());
    let mut reusable = None;

    for _ in 0..MAX_PROBE {
        match slots[index] {
            Slot::Empty => return Probe::Vacant(reusable.unwrap_or(index)),
            Slot::Deleted if reusable.is_none() => reusable = Some(index),
            Slot::Deleted => {}
            Slot::Occupied { key: stored, .. } if stored == key => return Probe::Found(index),
            Slot::Occupied { .. } => {}
        }
        index = (index + 1) & mask;
    }

    reusable.map_or(Probe::Exhausted, Probe::Vacant)
}

fn probe_for_lookup<T: ?Sized>(slots: &[Slot<'_, T>], key: u64) -> Option<usize> {
    let mask = slots.len() - 1;
    let mut index = home_index(key, slots.len());

    for _ in 0..MAX_PROBE {
        match slots[index] {
            Slot::Empty => return None,
            Slot::Occupied { key: stored, .. } if stored == key => return Some(index),
            _ => {}
        }
        index = (index + 1) & mask;
    }

    None
}

fn allocate_slots<'a, T: ?Sized>(capacity: usize) -> Result<Vec<Slot<'a, T>>, Error> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| Error::OutOfMemory { slots: capacity })?;
    slots.resize(capacity, Slot::Empty);
    Ok(slots)
}

/// A slot array set aside by a rehash, kept so a failed insert can put it
/// back.
struct Layout<'a, T: ?Sized> {
    slots: Vec<Slot<'a, T>>,
    tombstones: usize,
}

/// Probe-length statistics, available with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live entries
    pub populated: usize,
    /// Number of slots allocated
    pub capacity: usize,
    /// Number of slots holding a removal marker
    pub tombstones: usize,
    /// Live entries over capacity
    pub load_factor: f64,
    /// Longest distance of any entry from its home slot
    pub longest_probe: usize,
    /// Mean distance of entries from their home slot
    pub mean_probe: f64,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!("Tombstones: {}", self.tombstones);
        println!(
            "Probe length: {:.2} mean, {} longest",
            self.mean_probe, self.longest_probe
        );
    }
}

/// Number of live entries found at each distance from their home slot.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    /// `counts[d]` is the number of entries stored `d` slots past home.
    pub counts: [usize; MAX_PROBE],
}

#[cfg(any(test, feature = "stats"))]
impl ProbeHistogram {
    /// Prints the histogram as a horizontal bar chart.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        for (distance, &count) in self.counts.iter().enumerate() {
            let width = (count * max_bar).div_ceil(max);
            println!("{:>2} | {} ({})", distance, "█".repeat(width), count);
        }
    }
}

/// An open-addressing hash table with linear probing.
///
/// Keys are raw `u64` identities compared with `==`; values are borrowed
/// `&'a T` references that the table never copies, drops, or frees. The slot
/// count is a power of two and doubles whenever an insertion would push the
/// number of live entries past half the capacity, or when the key's
/// [`MAX_PROBE`]-slot window has no room left. It never shrinks.
///
/// Removal leaves a tombstone so that entries displaced past the removed one
/// stay reachable. Tombstones are reused by later inserts and discarded on
/// rehash.
///
/// ## Example
///
/// ```rust
/// use linprobe::HashTable;
///
/// let alice = String::from("alice");
/// let bob = String::from("bob");
///
/// let mut table: HashTable<'_, String> = HashTable::new()?;
/// assert_eq!(table.put(7, &alice)?, None);
/// assert_eq!(table.put(7, &bob)?, Some(&alice));
///
/// assert_eq!(table.get(7), Some(&bob));
/// assert_eq!(table.len(), 1);
/// # Ok::<(), linprobe::Error>(())
/// ```
pub struct HashTable<'a, T: ?Sized> {
    slots: Vec<Slot<'a, T>>,
    populated: usize,
    tombstones: usize,
}

impl<T: ?Sized> Clone for HashTable<'_, T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            populated: self.populated,
            tombstones: self.tombstones,
        }
    }
}

impl<T: ?Sized> Debug for HashTable<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("capacity", &self.capacity())
            .field("populated", &self.populated)
            .field("tombstones", &self.tombstones)
            .field(
                "occupancy",
                &self
                    .slots
                    .chunks(64)
                    .map(|chunk| chunk.iter().map(Slot::marker).collect::<String>())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<'a, T: ?Sized> HashTable<'a, T> {
    /// Creates an empty table with [`INITIAL_CAPACITY`] slots.
    pub fn new() -> Result<Self, Error> {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Creates an empty table with at least `capacity` slots.
    ///
    /// The slot count is rounded up to a power of two and is never zero.
    /// Note that only half of the slots can be filled before the table grows.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let table: HashTable<'_, u32> = HashTable::with_capacity(100)?;
    /// assert_eq!(table.capacity(), 128);
    ///
    /// let table: HashTable<'_, u32> = HashTable::with_capacity(0)?;
    /// assert_eq!(table.capacity(), 1);
    /// # Ok::<(), linprobe::Error>(())
    /// ```
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        let slots = capacity
            .max(1)
            .checked_next_power_of_two()
            .ok_or(Error::CapacityOverflow { capacity })?;

        Ok(Self {
            slots: allocate_slots(slots)?,
            populated: 0,
            tombstones: 0,
        })
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Stores `value` under `key`, returning the value it replaced.
    ///
    /// Overwriting an existing key does not change [`len`](Self::len). A new
    /// key may first grow the table, which rehashes every entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] or [`Error::CapacityOverflow`] if the
    /// table needed to grow and could not, and [`Error::WindowSaturated`] if
    /// [`MAX_PROBE`] stored keys already share the new key's mix. The table
    /// is left unchanged.
    pub fn put(&mut self, key: u64, value: &'a T) -> Result<Option<&'a T>, Error> {
        let mut original = None;

        loop {
            let rebuilt = match probe_for_insert(&self.slots, key) {
                Probe::Found(index) => {
                    let previous = core::mem::replace(
                        &mut self.slots[index],
                        Slot::Occupied { key, value },
                    );
                    return Ok(previous.value());
                }
                Probe::Vacant(index) if self.populated < self.capacity() / 2 => {
                    if let Slot::Deleted = self.slots[index] {
                        self.tombstones -= 1;
                    }
                    self.slots[index] = Slot::Occupied { key, value };
                    self.populated += 1;
                    return Ok(None);
                }
                Probe::Vacant(_) => self.grow(),
                Probe::Exhausted => {
                    trace!(
                        "probe window for key {key:#018x} exhausted at capacity {}",
                        self.capacity()
                    );
                    self.make_room(key)
                }
            };

            match rebuilt {
                Ok(replaced) => {
                    if original.is_none() {
                        original = Some(replaced);
                    }
                }
                Err(error) => {
                    if let Some(Layout { slots, tombstones }) = original {
                        debug!(
                            "restoring {} slots after failed insert: {error}",
                            slots.len()
                        );
                        self.slots = slots;
                        self.tombstones = tombstones;
                    }
                    return Err(error);
                }
            }
        }
    }

    /// Returns the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let answer = 42u32;
    /// let mut table = HashTable::new()?;
    /// table.put(1, &answer)?;
    ///
    /// assert_eq!(table.get(1), Some(&42));
    /// assert_eq!(table.get(2), None);
    /// # Ok::<(), linprobe::Error>(())
    /// ```
    pub fn get(&self, key: u64) -> Option<&'a T> {
        let index = probe_for_lookup(&self.slots, key)?;
        self.slots[index].value()
    }

    /// Returns `true` if an entry is stored under `key`.
    pub fn contains_key(&self, key: u64) -> bool {
        probe_for_lookup(&self.slots, key).is_some()
    }

    /// Removes the entry stored under `key` and returns its value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let answer = 42u32;
    /// let mut table = HashTable::new()?;
    /// table.put(1, &answer)?;
    ///
    /// assert_eq!(table.remove(1), Some(&42));
    /// assert_eq!(table.remove(1), None);
    /// assert!(table.is_empty());
    /// # Ok::<(), linprobe::Error>(())
    /// ```
    pub fn remove(&mut self, key: u64) -> Option<&'a T> {
        let index = probe_for_lookup(&self.slots, key)?;

        // No probe sequence continues past a slot followed by an empty one, so
        // such a slot can go straight back to empty.
        let next = (index + 1) & (self.capacity() - 1);
        let marker = if let Slot::Empty = self.slots[next] {
            Slot::Empty
        } else {
            self.tombstones += 1;
            Slot::Deleted
        };

        let removed = core::mem::replace(&mut self.slots[index], marker);
        self.populated -= 1;
        removed.value()
    }

    /// Removes every entry. The capacity is kept.
    pub fn clear(&mut self) {
        self.slots.fill(Slot::Empty);
        self.populated = 0;
        self.tombstones = 0;
    }

    /// Returns the value in raw slot `index`, or `None` if that slot is free.
    ///
    /// This exposes the physical layout; slot positions change whenever the
    /// table grows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index >= capacity()`.
    pub fn get_by_index(&self, index: usize) -> Result<Option<&'a T>, Error> {
        self.slots
            .get(index)
            .map(Slot::value)
            .ok_or(Error::IndexOutOfRange {
                index,
                capacity: self.capacity(),
            })
    }

    /// Returns an iterator over all values in physical slot order.
    ///
    /// The order is unspecified and changes when the table grows.
    pub fn iter(&self) -> Iter<'_, 'a, T> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.populated,
        }
    }

    fn grow(&mut self) -> Result<Layout<'a, T>, Error> {
        let capacity = self.doubled(self.capacity())?;
        self.rehash(capacity)
    }

    /// Called when `key`'s probe window is full of live entries. Rebuilding
    /// at the same size is enough when most dead slots are tombstones.
    fn make_room(&mut self, key: u64) -> Result<Layout<'a, T>, Error> {
        // Keys with the same mix share a home slot at every capacity.
        let mask = self.capacity() - 1;
        let home = home_index(key, self.capacity());
        let sharing = (0..MAX_PROBE.min(self.capacity()))
            .filter(|distance| {
                matches!(
                    self.slots[(home + distance) & mask],
                    Slot::Occupied { key: stored, .. } if mix(stored) == mix(key)
                )
            })
            .count();
        if sharing == MAX_PROBE {
            return Err(Error::WindowSaturated { key });
        }

        if self.tombstones > self.populated {
            self.rehash(self.capacity())
        } else {
            self.grow()
        }
    }

    fn doubled(&self, capacity: usize) -> Result<usize, Error> {
        capacity
            .checked_mul(2)
            .ok_or(Error::CapacityOverflow { capacity })
    }

    /// Moves every live entry into a fresh slot array of `capacity` slots,
    /// doubling further if some entry finds no room within its window.
    /// Returns the layout it replaced.
    fn rehash(&mut self, mut capacity: usize) -> Result<Layout<'a, T>, Error> {
        loop {
            let mut slots = allocate_slots(capacity)?;

            let placed = self.slots.iter().all(|slot| match *slot {
                Slot::Occupied { key, value } => match probe_for_insert(&slots, key) {
                    Probe::Found(index) | Probe::Vacant(index) => {
                        slots[index] = Slot::Occupied { key, value };
                        true
                    }
                    Probe::Exhausted => false,
                },
                _ => true,
            });

            if placed {
                debug!(
                    "rehashed {} entries from {} to {} slots, dropped {} tombstones",
                    self.populated,
                    self.capacity(),
                    capacity,
                    self.tombstones
                );
                return Ok(Layout {
                    slots: core::mem::replace(&mut self.slots, slots),
                    tombstones: core::mem::take(&mut self.tombstones),
                });
            }

            capacity = self.doubled(capacity)?;
        }
    }

    /// Returns the number of live entries at each distance from their home
    /// slot.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let mask = self.capacity() - 1;
        let mut counts = [0usize; MAX_PROBE];

        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied { key, .. } = *slot {
                let distance = index.wrapping_sub(home_index(key, self.capacity())) & mask;
                counts[distance] += 1;
            }
        }

        ProbeHistogram { counts }
    }

    /// Returns occupancy and probe-length statistics.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let histogram = self.probe_histogram();
        let total_distance: usize = histogram
            .counts
            .iter()
            .enumerate()
            .map(|(distance, count)| distance * count)
            .sum();

        DebugStats {
            populated: self.populated,
            capacity: self.capacity(),
            tombstones: self.tombstones,
            load_factor: self.populated as f64 / self.capacity() as f64,
            longest_probe: histogram
                .counts
                .iter()
                .rposition(|&count| count > 0)
                .unwrap_or(0),
            mean_probe: if self.populated == 0 {
                0.0
            } else {
                total_distance as f64 / self.populated as f64
            },
        }
    }
}

impl<'t, 'a, T: ?Sized> IntoIterator for &'t HashTable<'a, T> {
    type IntoIter = Iter<'t, 'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the values of a [`HashTable`], in slot order.
///
/// This struct is created by [`HashTable::iter`].
pub struct Iter<'t, 'a, T: ?Sized> {
    slots: core::slice::Iter<'t, Slot<'a, T>>,
    remaining: usize,
}

impl<'a, T: ?Sized> Iterator for Iter<'_, 'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.slots.find_map(Slot::value)?;
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: ?Sized> ExactSizeIterator for Iter<'_, '_, T> {}

impl<T: ?Sized> FusedIterator for Iter<'_, '_, T> {}
