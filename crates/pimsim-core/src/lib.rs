//! # pimsim Core
//!
//! `pimsim-core` models one DRAM bank of a processing-in-memory system and
//! decides how a database is laid out in it.
//!
//! ## Architecture Overview
//!
//! - [`config`] - [`config::HardwareProfile`] (bank geometry, DRAM timings,
//!   optional BLIMP and AMBIT capabilities) and [`config::DatabaseProfile`]
//!   (record and index widths, hitmaps, reserved regions), loaded from JSON.
//!
//! - [`memory`] - [`memory::Bank`], a row-addressable byte store with
//!   bulk-bitwise primitives (row copy, inversion, triple-row activation),
//!   and the [`memory::Word`] value type.
//!
//! - [`layout`] - [`layout::LayoutPlanner`] partitions a bank into named row
//!   regions for a [`layout::LayoutKind`] and reports capacity in
//!   [`layout::LayoutMetadata`]. A planned [`layout::Layout`] can fill a bank
//!   with [`layout::Layout::perform`].
//!
//! - [`placement`] - Writes items into a row region in packed, row-aligned or
//!   bit-plane (bit-weaved) encoding, and initializes hitmaps and AMBIT control rows.
//!
//! - [`records`] - The [`records::RecordSource`] trait and a deterministic
//!   [`records::RecordGenerator`].
//!
//! ## Errors
//!
//! Every fallible operation returns [`Result`]. Failures are classified as
//! [`ConfigError`], [`RangeError`], [`CapacityError`] or [`InvariantViolation`].

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod layout;
pub mod memory;
pub mod placement;
pub mod records;
pub mod util;

pub use crate::error::{CapacityError, ConfigError, Error, InvariantViolation, RangeError, Result};
