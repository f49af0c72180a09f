//! Utility functions and types used throughout pimsim.
//!
//! This module provides:
//! - [`Size`] - Byte size representation for banks and regions
//! - [`Rng`] - Seedable random number generation for record generators
//! - Row arithmetic helpers shared by the planner and the hash table

mod rng;
mod size;

pub use self::rng::Rng;
pub use self::size::Size;

/// Rounds `value` up to the next multiple of `base`.
///
/// A `base` of zero leaves `value` unchanged.
///
/// # Examples
///
/// ```
/// use pimsim_core::util::ceil_to_multiple;
///
/// assert_eq!(ceil_to_multiple(17, 8), 24);
/// assert_eq!(ceil_to_multiple(16, 8), 16);
/// assert_eq!(ceil_to_multiple(0, 8), 0);
/// ```
pub const fn ceil_to_multiple(value: usize, base: usize) -> usize {
    if base == 0 {
        return value;
    }
    value.div_ceil(base) * base
}

/// Number of rows needed to hold `bytes` bytes with rows of `row_buffer_bytes`.
///
/// # Examples
///
/// ```
/// use pimsim_core::util::rows_for_bytes;
///
/// assert_eq!(rows_for_bytes(0, 1024), 0);
/// assert_eq!(rows_for_bytes(1, 1024), 1);
/// assert_eq!(rows_for_bytes(2049, 1024), 3);
/// ```
pub const fn rows_for_bytes(bytes: usize, row_buffer_bytes: usize) -> usize {
    bytes.div_ceil(row_buffer_bytes)
}

/// Returns `true` if one of the two sizes divides the other.
///
/// This is the alignment rule for horizontally placed items: an item either
/// fits a whole number of times into a row buffer, or spans a whole number of rows.
pub const fn row_buffer_aligned(item_bytes: usize, row_buffer_bytes: usize) -> bool {
    if item_bytes == 0 || row_buffer_bytes == 0 {
        return false;
    }
    if item_bytes > row_buffer_bytes {
        item_bytes % row_buffer_bytes == 0
    } else {
        row_buffer_bytes % item_bytes == 0
    }
}
