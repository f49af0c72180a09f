use super::{Placed, check_region};
use crate::error::{ConfigError, RangeError, Result};
use crate::layout::RowRange;
use crate::memory::{Bank, Word};
use log::debug;

/// Transposes items into bit-plane rows.
///
/// Row `r` of the region belongs to page `r / item_bits` and carries bit
/// `r % item_bits` of each of the page's `row_buffer_bits` items. Items are
/// pulled from the iterator one page at a time; positions past `limit` or past
/// the end of the iterator keep the default byte's bit pattern.
pub(super) fn place_bitplane(
    region: RowRange,
    width: usize,
    items: impl Iterator<Item = Word>,
    bank: &mut Bank,
    limit: usize,
) -> Result<Placed> {
    let item_bits = width * 8;
    let rb = bank.row_bytes();
    let rb_bits = bank.row_bits();
    let default_byte = bank.default_byte();
    let mut items = items.take(limit);
    let mut page_items: Vec<Word> = Vec::with_capacity(rb_bits);
    let mut placed = Placed::default();

    for r in 0..region.rows {
        let bit = r % item_bits;
        if bit == 0 {
            page_items.clear();
            for item in items.by_ref().take(rb_bits) {
                page_items.push(item.resized(width)?);
            }
            debug!("bit-plane page {}: {} items", r / item_bits, page_items.len());
        }
        let mut row = Word::filled(rb, default_byte);
        for (j, item) in page_items.iter().enumerate() {
            row.set_msb_bit(j, item.msb_bit(bit));
        }
        bank.set_row(region.start + r, &row)?;
        placed.rows += 1;
        if bit == item_bits - 1 {
            placed.items += page_items.len();
        }
    }
    Ok(placed)
}

/// Reconstructs item `k` of `width` bytes from a bit-plane region.
///
/// # Errors
///
/// * [`ConfigError::Zero`] if `width` is zero
/// * [`RangeError::Region`] if the region lies outside the bank
/// * [`RangeError::Item`] if the page holding item `k` is not fully inside the region
pub fn read_bitplane_item(bank: &Bank, region: RowRange, width: usize, k: usize) -> Result<Word> {
    if width == 0 {
        return Err(ConfigError::Zero { field: "item width" }.into());
    }
    check_region(bank, region)?;
    let item_bits = width * 8;
    let rb_bits = bank.row_bits();
    let page = k / rb_bits;
    let column = k % rb_bits;
    if (page + 1) * item_bits > region.rows {
        return Err(RangeError::Item {
            index: k,
            capacity: region.rows / item_bits * rb_bits,
        }
        .into());
    }
    let mut item = Word::zero(width);
    for bit in 0..item_bits {
        let row = bank.row(region.start + page * item_bits + bit)?;
        let set = (row[column / 8] >> (7 - column % 8)) & 1 == 1;
        item.set_msb_bit(bit, set);
    }
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareProfile;
    use crate::memory::DEFAULT_BYTE;
    use crate::records::{FieldGenerator, ItemKind, RecordGenerator, RecordSource};
    use crate::util::{Rng, Size};

    fn bank(rows: usize, row_bytes: usize, default_byte: u8) -> Bank {
        let hw = HardwareProfile::new(Size::B(rows * row_bytes), Size::B(row_bytes), 1.0, 1.0, 1.0).unwrap();
        Bank::new(hw, default_byte).unwrap()
    }

    #[test]
    fn test_bitplane_transposes_msb_first() {
        // one-byte rows hold eight items per page
        let mut bank = bank(8, 1, 0x00);
        let items: Vec<Word> = [0b10, 0b01, 0b11]
            .iter()
            .map(|&v| Word::from_u128(v, 1).unwrap())
            .collect();
        let placed = place_bitplane(RowRange::new(0, 8), 1, items.into_iter(), &mut bank, 3).unwrap();
        assert_eq!(placed, Placed { items: 3, rows: 8 });
        for r in 0..6 {
            assert_eq!(bank.row(r).unwrap(), &[0]);
        }
        assert_eq!(bank.row(6).unwrap(), &[0b1010_0000]);
        assert_eq!(bank.row(7).unwrap(), &[0b0110_0000]);
    }

    #[test]
    fn test_bitplane_pads_with_default_pattern() {
        let mut bank = bank(8, 1, 0b1100_1010);
        let items = std::iter::once(Word::from_u128(0xFF, 1).unwrap());
        place_bitplane(RowRange::new(0, 8), 1, items, &mut bank, 1).unwrap();
        assert_eq!(bank.row(0).unwrap(), &[0b1100_1010]);
        let items = std::iter::once(Word::zero(1));
        place_bitplane(RowRange::new(0, 8), 1, items, &mut bank, 1).unwrap();
        assert_eq!(bank.row(0).unwrap(), &[0b0100_1010]);
    }

    #[test]
    fn test_bitplane_roundtrip() {
        let total = 150;
        let mut records = RecordGenerator::new(
            3,
            2,
            FieldGenerator::UniformRandom(Rng::from_seed(3)),
            FieldGenerator::UniformRandom(Rng::from_seed(4)),
        )
        .with_total(total);
        // 8-byte rows give 64 items per page; 150 items need 3 pages of 16 rows
        let mut bank = bank(64, 8, DEFAULT_BYTE);
        let region = RowRange::new(4, 48);
        let placed =
            place_bitplane(region, 2, records.items(ItemKind::Index), &mut bank, total).unwrap();
        assert_eq!(placed, Placed { items: 150, rows: 48 });

        records.rewind();
        for (k, index) in records.items(ItemKind::Index).enumerate() {
            assert_eq!(read_bitplane_item(&bank, region, 2, k).unwrap(), index);
        }
        assert!(matches!(
            read_bitplane_item(&bank, region, 2, 192),
            Err(crate::Error::Range(RangeError::Item { index: 192, capacity: 192 }))
        ));
    }
}
