//! Writes fixed-width items into bank regions.
//!
//! Three encodings are supported:
//!
//! - **packed horizontal**: items are concatenated into a byte stream that is cut
//!   into rows, so items may straddle a row boundary.
//! - **aligned horizontal**: whole items per row with the tail padded, or, for
//!   items wider than a row, each item padded to a whole number of rows.
//! - **bit-plane vertical** ("bitweave"): a page of `row_buffer_bits` items is
//!   transposed so that row `b` of the page holds bit `b` of every item.
//!
//! Besides the item encoders this module provides hitmap initialization and the
//! AMBIT control row reset used by the layouts.

mod ambit;
mod hitmap;
mod horizontal;
mod vertical;

pub use self::ambit::reset_ambit_control_rows;
pub use self::hitmap::place_hitmap;
pub use self::vertical::read_bitplane_item;

use crate::error::{ConfigError, RangeError, Result};
use crate::layout::RowRange;
use crate::memory::{Bank, Word};
use log::info;
use serde::{Deserialize, Serialize};

/// How items are laid out in a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementPolicy {
    /// Items back to back, split across row boundaries.
    PackedHorizontal,
    /// Items never straddle a row boundary.
    AlignedHorizontal,
    /// Items transposed into bit-plane rows, most significant bit first.
    BitPlaneVertical,
}

impl PlacementPolicy {
    /// Short name used in layout names.
    pub const fn name(&self) -> &'static str {
        match self {
            PlacementPolicy::PackedHorizontal => "packed",
            PlacementPolicy::AlignedHorizontal => "aligned",
            PlacementPolicy::BitPlaneVertical => "bitweave",
        }
    }
}

/// Outcome of a placement pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Placed {
    /// Items written completely
    pub items: usize,
    /// Rows written, including padded rows
    pub rows: usize,
}

/// Places up to `limit` items of `width` bytes into `region` of `bank`.
///
/// Placement stops at whichever comes first: `limit` items, the end of the
/// region, or the end of `items`. Unused row space is padded with the bank's
/// default byte.
///
/// # Arguments
///
/// * `policy` - Encoding to use
/// * `region` - Destination rows
/// * `width` - Item width in bytes
/// * `items` - Item values; each must fit into `width` bytes
/// * `bank` - Destination bank
/// * `limit` - Maximum number of items to place
///
/// # Errors
///
/// * [`ConfigError::Zero`] if `width` is zero
/// * [`RangeError::Region`] if the region lies outside the bank
/// * [`RangeError::Width`] if an item does not fit `width` bytes
pub fn place(
    policy: PlacementPolicy,
    region: RowRange,
    width: usize,
    items: impl Iterator<Item = Word>,
    bank: &mut Bank,
    limit: usize,
) -> Result<Placed> {
    if width == 0 {
        return Err(ConfigError::Zero { field: "item width" }.into());
    }
    check_region(bank, region)?;
    let placed = match policy {
        PlacementPolicy::PackedHorizontal => horizontal::place_packed(region, width, items, bank, limit)?,
        PlacementPolicy::AlignedHorizontal => horizontal::place_aligned(region, width, items, bank, limit)?,
        PlacementPolicy::BitPlaneVertical => vertical::place_bitplane(region, width, items, bank, limit)?,
    };
    info!(
        "{} placement into rows {}..{}: {} items of {} B in {} rows",
        policy.name(),
        region.start,
        region.end(),
        placed.items,
        width,
        placed.rows
    );
    Ok(placed)
}

pub(crate) fn check_region(bank: &Bank, region: RowRange) -> std::result::Result<(), RangeError> {
    let bank_rows = bank.row_count();
    if region.end() > bank_rows {
        return Err(RangeError::Region {
            start: region.start,
            rows: region.rows,
            bank_rows,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareProfile;
    use crate::memory::DEFAULT_BYTE;
    use crate::records::{FieldGenerator, ItemKind, RecordGenerator, RecordSource};
    use crate::util::{Rng, Size};

    fn bank(rows: usize, row_bytes: usize) -> Bank {
        let hw = HardwareProfile::new(Size::B(rows * row_bytes), Size::B(row_bytes), 1.0, 1.0, 1.0).unwrap();
        Bank::new(hw, DEFAULT_BYTE).unwrap()
    }

    fn random_records(record: usize, total: usize) -> RecordGenerator {
        RecordGenerator::new(
            record,
            record / 2,
            FieldGenerator::UniformRandom(Rng::from_seed(11)),
            FieldGenerator::UniformRandom(Rng::from_seed(12)),
        )
        .with_total(total)
    }

    #[test]
    fn test_packed_equals_aligned_when_records_divide_rows() {
        for (record, total) in [(4, 40), (8, 13), (16, 16)] {
            let region = RowRange::new(1, 6);
            let mut packed = bank(8, 16);
            let mut aligned = bank(8, 16);
            let a = place(
                PlacementPolicy::PackedHorizontal,
                region,
                record,
                random_records(record, total).items(ItemKind::Record),
                &mut packed,
                total,
            )
            .unwrap();
            let b = place(
                PlacementPolicy::AlignedHorizontal,
                region,
                record,
                random_records(record, total).items(ItemKind::Record),
                &mut aligned,
                total,
            )
            .unwrap();
            assert_eq!(a, b);
            assert_eq!(packed, aligned);
        }
    }

    #[test]
    fn test_region_outside_bank_rejected() {
        let mut bank = bank(4, 4);
        let result = place(
            PlacementPolicy::AlignedHorizontal,
            RowRange::new(2, 3),
            4,
            std::iter::empty(),
            &mut bank,
            1,
        );
        assert!(matches!(
            result,
            Err(crate::Error::Range(RangeError::Region { start: 2, rows: 3, bank_rows: 4 }))
        ));
    }

    #[test]
    fn test_oversized_item_rejected() {
        let mut bank = bank(4, 4);
        let item = Word::from_u128(0x1_0000, 3).unwrap();
        let result = place(
            PlacementPolicy::PackedHorizontal,
            RowRange::new(0, 4),
            2,
            std::iter::once(item),
            &mut bank,
            1,
        );
        assert!(matches!(result, Err(crate::Error::Range(RangeError::Width { .. }))));
    }
}
