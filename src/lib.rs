//! # pimsim
//!
//! Umbrella crate for the processing-in-memory bank simulator. It re-exports
//! [`pimsim_core`] (profiles, bank substrate, layout planner, placement engine,
//! record sources) and, with the `hashmap` feature, the chained hash table from
//! `pimsim-hashmap`.

pub use pimsim_core::*;

#[cfg(feature = "hashmap")]
pub use pimsim_hashmap as hashmap;
