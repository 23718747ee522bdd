//! Ready-made identity functions for items that implement [`Hash`] and [`Eq`].
//!
//! A [`HashSet`](crate::HashSet) takes its hash and equality functions from
//! the caller. For types that already implement `Hash + Eq` these helpers
//! give a deterministic pair: hashing uses a fixed seed, so an item hashes to
//! the same identity for the lifetime of the process.

use core::hash::Hash;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        use core::hash::BuildHasher;

        /// Seed for the fixed-state hasher. Any constant works; it only has
        /// to be the same for every call.
        const SEED: u64 = 0x243f_6a88_85a3_08d3;

        /// Hashes `item` with `foldhash`'s fixed-seed hasher.
        ///
        /// # Examples
        ///
        /// ```rust
        /// use linprobe::identity::hash_one;
        ///
        /// assert_eq!(hash_one("apple"), hash_one("apple"));
        /// assert_ne!(hash_one("apple"), hash_one("pear"));
        /// ```
        pub fn hash_one<T: Hash + ?Sized>(item: &T) -> u64 {
            foldhash::fast::FixedState::with_seed(SEED).hash_one(item)
        }
    } else if #[cfg(feature = "std")] {
        use core::hash::Hasher;

        /// Hashes `item` with the standard library's `DefaultHasher`, which
        /// uses fixed keys.
        pub fn hash_one<T: Hash + ?Sized>(item: &T) -> u64 {
            let mut hasher = std::hash::DefaultHasher::new();
            item.hash(&mut hasher);
            hasher.finish()
        }
    }
}

/// Compares two items with their [`PartialEq`] implementation.
#[cfg(any(feature = "foldhash", feature = "std"))]
pub fn equals<T: Eq + ?Sized>(left: &T, right: &T) -> bool {
    left == right
}
