#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Crate error type.
pub mod error;

pub mod hash_table;

/// A set of borrowed items keyed by a caller-supplied hash.
///
/// This module provides a `HashSet` that wraps the `HashTable`, using the
/// caller's hash function to derive each item's table key.
pub mod hash_set;

pub mod identity;

pub use error::Error;
#[cfg(any(feature = "foldhash", feature = "std"))]
pub use hash_set::DefaultHashSet;
pub use hash_set::HashSet;
pub use hash_table::HashTable;
