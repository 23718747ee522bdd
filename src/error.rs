use thiserror::Error;

/// Errors returned by [`HashTable`](crate::HashTable) and
/// [`HashSet`](crate::HashSet) operations.
///
/// A missing key is not an error: lookups and removals report it as `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The slot array could not be allocated, either at construction or while
    /// growing.
    #[error("failed to allocate a table of {slots} slots")]
    OutOfMemory {
        /// Number of slots that were requested.
        slots: usize,
    },

    /// The next power-of-two capacity is not representable.
    #[error("table capacity overflowed growing past {capacity} slots")]
    CapacityOverflow {
        /// Capacity at the time growth was attempted.
        capacity: usize,
    },

    /// Every slot in the key's probe window already holds an entry whose
    /// key mixes to the same value, so no capacity can make room for it.
    #[error("probe window of key {key:#018x} is full of keys with the same mix")]
    WindowSaturated {
        /// The key that could not be placed.
        key: u64,
    },

    /// A raw slot index was outside the table.
    #[error("slot index {index} is out of range for a table of {capacity} slots")]
    IndexOutOfRange {
        /// The requested slot index.
        index: usize,
        /// The table capacity at the time of the request.
        capacity: usize,
    },

    /// Two items the set's equality predicate considers equal produced
    /// different hashes.
    #[error("equivalent items hash to different identities ({left:#018x} != {right:#018x})")]
    ContractViolation {
        /// Hash of the first item.
        left: u64,
        /// Hash of the second item.
        right: u64,
    },
}
