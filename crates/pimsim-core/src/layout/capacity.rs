//! Row and record arithmetic behind the planner.
//!
//! All functions work on row counts; `rb` is the row buffer width in bytes and
//! `rb_bits` the same width in bits, i.e. the number of items in one bit-plane page.

use crate::error::{ConfigError, InvariantViolation};
use crate::records::ItemKind;
use crate::util::row_buffer_aligned;
use log::trace;

/// Rejects items that neither divide nor are divided by the row buffer.
pub(crate) fn check_alignment(item: ItemKind, item_bytes: usize, rb: usize) -> Result<(), ConfigError> {
    if row_buffer_aligned(item_bytes, rb) {
        Ok(())
    } else {
        Err(ConfigError::NotRowBufferAligned {
            item: item.name(),
            item_bytes,
            row_buffer_bytes: rb,
        })
    }
}

/// Records a packed region of `rows` rows holds.
pub(crate) const fn packed_records(rows: usize, item_bytes: usize, rb: usize) -> usize {
    rows * rb / item_bytes
}

/// Rows `records` packed items occupy.
pub(crate) const fn packed_rows(records: usize, item_bytes: usize, rb: usize) -> usize {
    (records * item_bytes).div_ceil(rb)
}

/// Records and used rows of an aligned region of `rows` rows.
///
/// Items no wider than a row are counted whole per row. Wider items take
/// `ceil(item / rb)` rows each and the rows left over are not used.
pub(crate) const fn aligned(rows: usize, item_bytes: usize, rb: usize) -> (usize, usize) {
    let per_row = rb / item_bytes;
    if per_row >= 1 {
        (per_row * rows, rows)
    } else {
        let rows_per_item = item_bytes.div_ceil(rb);
        (rows / rows_per_item, rows - rows % rows_per_item)
    }
}

/// Rows `records` aligned items occupy.
pub(crate) const fn aligned_rows(records: usize, item_bytes: usize, rb: usize) -> usize {
    let per_row = rb / item_bytes;
    if per_row >= 1 {
        records.div_ceil(per_row)
    } else {
        records * item_bytes.div_ceil(rb)
    }
}

/// Records held by the whole bit-plane pages fitting into `rows` rows.
pub(crate) const fn bitplane_records(rows: usize, item_bits: usize, rb_bits: usize) -> usize {
    rb_bits * (rows / item_bits)
}

/// Rows of the bit-plane pages needed for `records` items; one row per item bit and page.
pub(crate) const fn bitplane_rows(records: usize, item_bits: usize, rb_bits: usize) -> usize {
    records.div_ceil(rb_bits) * item_bits
}

/// Row split produced by the greedy block heuristic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Blocks {
    /// Bit-plane primary index rows
    pub pi: usize,
    /// Row-aligned record rows
    pub data: usize,
    /// Hitmap rows
    pub hit: usize,
    /// Records the blocks hold
    pub records: usize,
}

impl Blocks {
    pub(crate) const fn rows(&self) -> usize {
        self.pi + self.data + self.hit
    }

    /// Caps the block split at `records`, shrinking every part to what the
    /// capped count needs.
    pub(crate) fn capped(self, records: usize, record_bytes: usize, pi_bits: usize, hitmap_count: usize, rb: usize) -> Blocks {
        if records >= self.records {
            return self;
        }
        let pages = records.div_ceil(rb * 8);
        Blocks {
            pi: self.pi.min(pages * pi_bits),
            data: self.data.min(aligned_rows(records, record_bytes, rb)),
            hit: self.hit.min(pages * hitmap_count),
            records,
        }
    }
}

/// Greedy block heuristic for records placed row-aligned next to optional
/// bit-plane primary index rows and hitmap rows.
///
/// A block holds one page of `rb_bits` records: `pi_bits` index rows,
/// `hitmap_count` hitmap rows and `8 * record_bytes` record rows. Whole blocks
/// are added while they fit strictly below `free`. The last, partial block
/// still gets its full index and hitmap rows and fills the remaining rows with
/// as many records as fit.
///
/// # Errors
///
/// Returns [`InvariantViolation::HeuristicOverflow`] if the blocks exceed `free`.
pub(crate) fn greedy_blocks(
    free: usize,
    record_bytes: usize,
    rb: usize,
    pi_bits: usize,
    hitmap_count: usize,
) -> Result<Blocks, InvariantViolation> {
    let mut b = Blocks::default();
    let ratio = record_bytes as f64 / rb as f64;

    while b.rows() < free {
        let new_pi = pi_bits;
        let new_hit = hitmap_count;
        let new_data = 8 * record_bytes;

        if new_pi + b.pi + new_hit + b.hit + new_data + b.data < free {
            b.pi += new_pi;
            b.hit += new_hit;
            b.data += new_data;
            b.records += rb * 8;
            continue;
        } else if new_pi + b.pi + new_hit + b.hit + b.data < free {
            if ratio >= 1.0 && (new_pi + b.pi + new_hit + b.hit + b.data) as f64 + ratio > free as f64 {
                break;
            }
            b.pi += new_pi;
            b.hit += new_hit;
            let remaining = free - b.pi - b.hit - b.data;
            if ratio <= 1.0 {
                b.records += remaining * (rb / record_bytes);
                b.data += remaining;
            } else {
                let rows_per_record = record_bytes / rb;
                let n = remaining / rows_per_record;
                b.records += n;
                b.data += n * rows_per_record;
            }
            break;
        } else {
            break;
        }
    }
    trace!("greedy blocks over {} free rows: {:?}", free, b);

    if b.rows() > free {
        return Err(InvariantViolation::HeuristicOverflow {
            placed: b.rows(),
            free,
        });
    }
    Ok(b)
}

/// Shrinks a bit-plane region with hitmaps until both fit into `free` rows.
///
/// Records are cut back to the previous page boundary, or by a whole page when
/// already on one. Returns `(records, item_rows, hitmap_rows)`.
pub(crate) fn shrink_bitplane_with_hitmaps(
    free: usize,
    records: usize,
    item_bits: usize,
    rb_bits: usize,
    hitmap_count: usize,
) -> (usize, usize, usize) {
    let mut records = records;
    let sizes = |records: usize| {
        (
            bitplane_rows(records, item_bits, rb_bits),
            records.div_ceil(rb_bits) * hitmap_count,
        )
    };
    let (mut data, mut hit) = sizes(records);
    while hit + data > free && records > 0 {
        if records % rb_bits == 0 {
            records -= rb_bits;
        } else {
            records -= records % rb_bits;
        }
        (data, hit) = sizes(records);
    }
    (records, data, hit)
}

/// Row split of a hybrid layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Hybrid {
    /// Row-aligned record rows
    pub horizontal: usize,
    /// Bit-plane index rows
    pub vertical: usize,
    /// Hitmap rows
    pub hit: usize,
    /// Records placed in both encodings
    pub records: usize,
}

/// Shrinks a hybrid split (aligned records, bit-plane indices, hitmaps) one
/// record at a time until it fits into `free` rows.
pub(crate) fn shrink_hybrid(
    free: usize,
    records: usize,
    record_bytes: usize,
    index_bits: usize,
    rb: usize,
    hitmap_count: usize,
) -> Hybrid {
    let rb_bits = rb * 8;
    let split = |records: usize| Hybrid {
        horizontal: aligned_rows(records, record_bytes, rb),
        vertical: bitplane_rows(records, index_bits, rb_bits),
        hit: records.div_ceil(rb_bits) * hitmap_count,
        records,
    };
    let mut hybrid = split(records);
    while hybrid.horizontal + hybrid.vertical + hybrid.hit > free && hybrid.records > 0 {
        hybrid = split(hybrid.records - 1);
    }
    hybrid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_arithmetic() {
        assert_eq!(aligned(32768, 64, 1024), (524288, 32768));
        assert_eq!(aligned(10, 3072, 1024), (3, 9));
        assert_eq!(aligned_rows(17, 64, 1024), 2);
        assert_eq!(aligned_rows(3, 2048, 1024), 6);
    }

    #[test]
    fn test_packed_arithmetic() {
        assert_eq!(packed_records(3, 3, 4), 4);
        assert_eq!(packed_rows(4, 3, 4), 3);
        assert_eq!(packed_rows(5, 3, 4), 4);
    }

    #[test]
    fn test_greedy_full_blocks() {
        // rb 64, record 32: one block is 256 record rows + 1 hitmap row
        let b = greedy_blocks(1000, 32, 64, 0, 1).unwrap();
        assert_eq!(b.data, 256 * 3 + 228);
        assert_eq!(b.hit, 4);
        assert_eq!(b.records, 512 * 3 + 228 * 2);
        assert_eq!(b.rows(), 1000);
    }

    #[test]
    fn test_greedy_partial_block_wide_records() {
        // rb 64, record 128: two rows per record
        let b = greedy_blocks(1030, 128, 64, 32, 2).unwrap();
        assert_eq!(b.pi, 32);
        assert_eq!(b.hit, 2);
        assert_eq!(b.data, 996);
        assert_eq!(b.records, 498);
        assert!(b.rows() <= 1030);
    }

    #[test]
    fn test_greedy_no_room() {
        let b = greedy_blocks(10, 128, 64, 8, 1).unwrap();
        assert_eq!(b, Blocks::default());
    }

    #[test]
    fn test_bitplane_hitmap_shrink() {
        // 8-bit items with one hitmap in 20 rows: 2 pages need 16 + 2 rows
        assert_eq!(shrink_bitplane_with_hitmaps(20, 16, 8, 8, 1), (16, 16, 2));
        // 3 pages need 24 + 3 rows, cut to 2 pages
        assert_eq!(shrink_bitplane_with_hitmaps(20, 24, 8, 8, 1), (16, 16, 2));
        // a partial page is first cut back to the page boundary
        assert_eq!(shrink_bitplane_with_hitmaps(20, 20, 8, 8, 1), (16, 16, 2));
        assert_eq!(shrink_bitplane_with_hitmaps(5, 8, 8, 8, 1), (0, 0, 0));
    }

    #[test]
    fn test_hybrid_shrink() {
        // rb 8, record 4, index 1 byte: two records per row, 8 index rows per 64 records
        let h = shrink_hybrid(40, 80, 4, 8, 8, 0);
        assert_eq!(h.records, 64);
        assert_eq!(h.horizontal, 32);
        assert_eq!(h.vertical, 8);
        assert!(h.horizontal + h.vertical <= 40);
    }
}
