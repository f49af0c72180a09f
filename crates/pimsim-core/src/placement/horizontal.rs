use super::Placed;
use crate::error::Result;
use crate::layout::RowRange;
use crate::memory::{Bank, Word};
use log::trace;

/// Packs items into a byte stream and flushes it every `row_buffer_size_bytes`.
pub(super) fn place_packed(
    region: RowRange,
    width: usize,
    items: impl Iterator<Item = Word>,
    bank: &mut Bank,
    limit: usize,
) -> Result<Placed> {
    let rb = bank.row_bytes();
    let mut buffer = Vec::with_capacity(rb);
    let mut placed = Placed::default();

    'items: for item in items.take(limit) {
        let item = item.resized(width)?;
        for &byte in item.as_bytes() {
            if placed.rows == region.rows {
                break 'items;
            }
            buffer.push(byte);
            if buffer.len() == rb {
                bank.set_row(region.start + placed.rows, &Word::from_be_bytes(buffer.split_off(0)))?;
                placed.rows += 1;
            }
        }
        placed.items += 1;
    }

    if !buffer.is_empty() && placed.rows < region.rows {
        trace!("padding final packed row with {} bytes", rb - buffer.len());
        buffer.resize(rb, bank.default_byte());
        bank.set_row(region.start + placed.rows, &Word::from_be_bytes(buffer))?;
        placed.rows += 1;
    }
    Ok(placed)
}

/// Places whole items per row, or whole rows per item for items wider than a row.
pub(super) fn place_aligned(
    region: RowRange,
    width: usize,
    items: impl Iterator<Item = Word>,
    bank: &mut Bank,
    limit: usize,
) -> Result<Placed> {
    let rb = bank.row_bytes();
    let default_byte = bank.default_byte();
    let mut placed = Placed::default();
    let per_row = rb / width;

    if per_row >= 1 {
        let mut items = items.take(limit).peekable();
        while placed.rows < region.rows && items.peek().is_some() {
            let mut buffer = Vec::with_capacity(rb);
            while buffer.len() + width <= rb {
                let Some(item) = items.next() else {
                    break;
                };
                buffer.extend_from_slice(item.resized(width)?.as_bytes());
                placed.items += 1;
            }
            buffer.resize(rb, default_byte);
            bank.set_row(region.start + placed.rows, &Word::from_be_bytes(buffer))?;
            placed.rows += 1;
        }
    } else {
        let rows_per_item = width.div_ceil(rb);
        for item in items.take(limit) {
            if placed.rows >= region.rows {
                break;
            }
            let mut bytes = item.resized(width)?.into_bytes();
            bytes.resize(rows_per_item * rb, default_byte);
            let mut chunks = 0;
            for chunk in bytes.chunks_exact(rb).take(region.rows - placed.rows) {
                bank.set_row(region.start + placed.rows, &Word::from_be_bytes(chunk))?;
                placed.rows += 1;
                chunks += 1;
            }
            if chunks == rows_per_item {
                placed.items += 1;
            }
        }
    }
    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareProfile;
    use crate::util::Size;

    fn bank(rows: usize, row_bytes: usize) -> Bank {
        let hw = HardwareProfile::new(Size::B(rows * row_bytes), Size::B(row_bytes), 1.0, 1.0, 1.0).unwrap();
        Bank::new(hw, 0xEE).unwrap()
    }

    fn words(values: &[u128], width: usize) -> Vec<Word> {
        values.iter().map(|&v| Word::from_u128(v, width).unwrap()).collect()
    }

    #[test]
    fn test_packed_straddles_rows() {
        let mut bank = bank(4, 4);
        let items = words(&[0x010203, 0x040506, 0x070809], 3);
        let placed = place_packed(RowRange::new(1, 3), 3, items.into_iter(), &mut bank, 10).unwrap();
        assert_eq!(placed, Placed { items: 3, rows: 3 });
        assert_eq!(bank.row(0).unwrap(), &[0xEE; 4]);
        assert_eq!(bank.row(1).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(bank.row(2).unwrap(), &[5, 6, 7, 8]);
        assert_eq!(bank.row(3).unwrap(), &[9, 0xEE, 0xEE, 0xEE]);
    }

    #[test]
    fn test_packed_stops_at_region_end() {
        let mut bank = bank(4, 4);
        let items = words(&[0x010203, 0x040506, 0x070809], 3);
        let placed = place_packed(RowRange::new(0, 2), 3, items.into_iter(), &mut bank, 10).unwrap();
        assert_eq!(placed, Placed { items: 2, rows: 2 });
        assert_eq!(bank.row(1).unwrap(), &[5, 6, 7, 8]);
        assert_eq!(bank.row(2).unwrap(), &[0xEE; 4]);
    }

    #[test]
    fn test_aligned_pads_row_tail() {
        let mut bank = bank(4, 4);
        let items = words(&[0x0102, 0x0304, 0x0506], 2);
        let placed = place_aligned(RowRange::new(0, 4), 2, items.into_iter(), &mut bank, 10).unwrap();
        assert_eq!(placed, Placed { items: 3, rows: 2 });
        assert_eq!(bank.row(0).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(bank.row(1).unwrap(), &[5, 6, 0xEE, 0xEE]);
    }

    #[test]
    fn test_aligned_three_byte_items() {
        let mut bank = bank(4, 4);
        let items = words(&[0x010203, 0x040506], 3);
        let placed = place_aligned(RowRange::new(0, 4), 3, items.into_iter(), &mut bank, 1).unwrap();
        assert_eq!(placed, Placed { items: 1, rows: 1 });
        assert_eq!(bank.row(0).unwrap(), &[1, 2, 3, 0xEE]);
        assert_eq!(bank.row(1).unwrap(), &[0xEE; 4]);
    }

    #[test]
    fn test_aligned_wide_items_chunked_from_top() {
        let mut bank = bank(6, 2);
        let items = words(&[0x0102030405, 0x060708090A], 5);
        let placed = place_aligned(RowRange::new(0, 5), 5, items.into_iter(), &mut bank, 10).unwrap();
        assert_eq!(placed, Placed { items: 1, rows: 5 });
        assert_eq!(bank.row(0).unwrap(), &[1, 2]);
        assert_eq!(bank.row(1).unwrap(), &[3, 4]);
        assert_eq!(bank.row(2).unwrap(), &[5, 0xEE]);
        assert_eq!(bank.row(3).unwrap(), &[6, 7]);
        assert_eq!(bank.row(4).unwrap(), &[8, 9]);
        assert_eq!(bank.row(5).unwrap(), &[0xEE, 0xEE]);
    }
}
