use super::{Placed, check_region};
use crate::error::Result;
use crate::layout::RowRange;
use crate::memory::{Bank, Word};

/// Initializes a hitmap of `limit` bits in `region`, one bit per record.
///
/// Full rows are set to all ones when `value` is true and all zeros otherwise.
/// A final partial row carries `value` in its leading `limit % row_buffer_bits`
/// bits and `!value` in the padding bits. Rows past the hitmap are untouched.
///
/// # Errors
///
/// Returns [`crate::error::RangeError::Region`] if the region lies outside the bank.
pub fn place_hitmap(bank: &mut Bank, region: RowRange, value: bool, limit: usize) -> Result<Placed> {
    check_region(bank, region)?;
    let rb = bank.row_bytes();
    let rb_bits = bank.row_bits();
    let mut placed = Placed::default();

    for r in 0..region.rows {
        if placed.items >= limit {
            break;
        }
        let row = if placed.items + rb_bits <= limit {
            placed.items += rb_bits;
            if value { Word::ones(rb) } else { Word::zero(rb) }
        } else {
            let remainder = limit - placed.items;
            let mut row = if value { Word::zero(rb) } else { Word::ones(rb) };
            for bit in 0..remainder {
                row.set_msb_bit(bit, value);
            }
            placed.items += remainder;
            row
        };
        bank.set_row(region.start + r, &row)?;
        placed.rows += 1;
    }
    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareProfile;
    use crate::memory::DEFAULT_BYTE;
    use crate::util::Size;

    fn bank() -> Bank {
        let hw = HardwareProfile::new(Size::B(8), Size::B(2), 1.0, 1.0, 1.0).unwrap();
        Bank::new(hw, DEFAULT_BYTE).unwrap()
    }

    #[test]
    fn test_hitmap_partial_row_padding() {
        let mut bank = bank();
        let placed = place_hitmap(&mut bank, RowRange::new(0, 3), true, 20).unwrap();
        assert_eq!(placed, Placed { items: 20, rows: 2 });
        assert_eq!(bank.row(0).unwrap(), &[0xFF, 0xFF]);
        assert_eq!(bank.row(1).unwrap(), &[0xF0, 0x00]);

        let placed = place_hitmap(&mut bank, RowRange::new(0, 3), false, 20).unwrap();
        assert_eq!(placed.rows, 2);
        assert_eq!(bank.row(0).unwrap(), &[0x00, 0x00]);
        assert_eq!(bank.row(1).unwrap(), &[0x0F, 0xFF]);
        assert_eq!(bank.row(2).unwrap(), &[0xFF, 0xFF]);
    }

    #[test]
    fn test_hitmap_limited_by_region() {
        let mut bank = bank();
        let placed = place_hitmap(&mut bank, RowRange::new(1, 1), false, 100).unwrap();
        assert_eq!(placed, Placed { items: 16, rows: 1 });
        assert_eq!(bank.row(1).unwrap(), &[0x00, 0x00]);
        assert_eq!(bank.row(2).unwrap(), &[0xFF, 0xFF]);
    }
}
