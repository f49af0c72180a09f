//! Fixed-capacity chained hash table for pimsim banks.
//!
//! Join-style queries probe a hash table kept in the BLIMP scratch region of
//! a bank. [`ChainedHashTable`] models that table: a power-of-two number of
//! home buckets, each holding a fixed number of key/value slots, with full
//! buckets chained to overflow buckets by index. Buckets pack into
//! fixed-width values ([`BucketFormat`]), so a table can be written into
//! a [`pimsim_core::memory::Bank`] region like any other data.
//!
//! [`ChainedHashTable::traced_fetch`] reports which buckets a lookup visited
//! and how many slots it scanned in each, for cost accounting by callers.

#![warn(missing_docs)]

mod bucket;
mod persist;
mod table;

pub use bucket::{Bucket, BucketFormat, Slot};
pub use table::{ChainedHashTable, Trace};

use pimsim_core::{CapacityError, ConfigError, RangeError};
use thiserror::Error;

/// Errors returned by the hash table.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    Core(#[from] pimsim_core::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    #[error("corrupt hash table file: {0}")]
    Corrupt(String),
}

/// Result type of the hash table.
pub type Result<T> = std::result::Result<T, Error>;
