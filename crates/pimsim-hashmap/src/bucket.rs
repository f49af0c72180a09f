use pimsim_core::RangeError;
use pimsim_core::memory::Word;
use serde::{Deserialize, Serialize};

/// Field widths of a bucket as it is stored in bank rows.
///
/// A packed bucket is `capacity` key/value pairs, then the active count, then
/// the index of the next bucket in the chain. All fields are big-endian. The
/// all-ones value of the next-bucket field marks the end of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketFormat {
    /// Key/value slots per bucket
    #[serde(rename = "bucket_capacity")]
    pub capacity: usize,
    /// Key width in bytes
    pub key_bytes: usize,
    /// Value width in bytes, zero for hash sets
    pub value_bytes: usize,
    /// Active count width in bytes
    pub count_bytes: usize,
    /// Next bucket index width in bytes
    pub next_bytes: usize,
}

impl BucketFormat {
    /// BLIMP hash set bucket: 31 32-bit keys, 8-bit count, 24-bit next index.
    pub const BLIMP: BucketFormat = BucketFormat {
        capacity: 31,
        key_bytes: 4,
        value_bytes: 0,
        count_bytes: 1,
        next_bytes: 3,
    };

    /// BLIMP hash map bucket: 15 32-bit key/value pairs, 32-bit count and next index.
    pub const BLIMP_KV: BucketFormat = BucketFormat {
        capacity: 15,
        key_bytes: 4,
        value_bytes: 4,
        count_bytes: 4,
        next_bytes: 4,
    };

    /// Bytes of one key/value pair.
    pub const fn pair_bytes(&self) -> usize {
        self.key_bytes + self.value_bytes
    }

    /// Bytes of one packed bucket.
    pub const fn bucket_bytes(&self) -> usize {
        self.capacity * self.pair_bytes() + self.count_bytes + self.next_bytes
    }

    /// Value of the next-bucket field that ends a chain.
    pub fn null_next(&self) -> u128 {
        match self.next_bytes {
            0 => 0,
            n if n >= 16 => u128::MAX,
            n => (1u128 << (n * 8)) - 1,
        }
    }

    /// Buckets sharing one row of `row_buffer_bytes`, zero if a bucket spans rows.
    pub const fn buckets_per_row(&self, row_buffer_bytes: usize) -> usize {
        row_buffer_bytes / self.bucket_bytes()
    }

    /// Rows one bucket spans when it is wider than a row.
    pub const fn rows_per_bucket(&self, row_buffer_bytes: usize) -> usize {
        self.bucket_bytes().div_ceil(row_buffer_bytes)
    }

    /// Row offset of `bucket` when buckets are stored row-aligned from row zero.
    pub const fn bucket_row(&self, bucket: usize, row_buffer_bytes: usize) -> usize {
        match self.buckets_per_row(row_buffer_bytes) {
            0 => bucket * self.rows_per_bucket(row_buffer_bytes),
            per_row => bucket / per_row,
        }
    }

    /// Rows needed to store `buckets` buckets row-aligned.
    pub const fn rows_for(&self, buckets: usize, row_buffer_bytes: usize) -> usize {
        match self.buckets_per_row(row_buffer_bytes) {
            0 => buckets * self.rows_per_bucket(row_buffer_bytes),
            per_row => buckets.div_ceil(per_row),
        }
    }

    /// Buckets that fit row-aligned into `rows` rows.
    pub const fn maximum_buckets_for(&self, rows: usize, row_buffer_bytes: usize) -> usize {
        match self.buckets_per_row(row_buffer_bytes) {
            0 => rows / self.rows_per_bucket(row_buffer_bytes),
            per_row => rows * per_row,
        }
    }

    pub(crate) fn check_key(&self, key: u64) -> Result<(), RangeError> {
        Word::from_u64(key, self.key_bytes).map(|_| ())
    }

    pub(crate) fn check_value(&self, value: u64) -> Result<(), RangeError> {
        Word::from_u64(value, self.value_bytes).map(|_| ())
    }
}

/// One key/value slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Key
    #[serde(rename = "k")]
    pub key: u64,
    /// Value, zero in hash sets
    #[serde(rename = "v")]
    pub value: u64,
}

/// A fixed-capacity bucket. Only active slots are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bucket {
    pub(crate) slots: Vec<Slot>,
    pub(crate) next: Option<usize>,
}

impl Bucket {
    /// Active slots in insertion order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of active slots.
    pub fn active_count(&self) -> usize {
        self.slots.len()
    }

    /// Next bucket in the chain.
    pub fn next_bucket(&self) -> Option<usize> {
        self.next
    }

    /// Scans the active slots for `key`, returning its position.
    pub fn position(&self, key: u64) -> Option<usize> {
        self.slots.iter().position(|slot| slot.key == key)
    }

    /// Packs the bucket into `format.bucket_bytes()` bytes.
    ///
    /// Inactive slots are zero.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::Width`] if a field does not fit its width.
    pub fn to_word(&self, format: &BucketFormat) -> Result<Word, RangeError> {
        let mut bytes = Vec::with_capacity(format.bucket_bytes());
        for i in 0..format.capacity {
            let slot = self.slots.get(i).copied().unwrap_or(Slot { key: 0, value: 0 });
            bytes.extend(Word::from_u64(slot.key, format.key_bytes)?.into_bytes());
            bytes.extend(Word::from_u64(slot.value, format.value_bytes)?.into_bytes());
        }
        bytes.extend(Word::from_u128(self.slots.len() as u128, format.count_bytes)?.into_bytes());
        let next = self.next.map_or(format.null_next(), |n| n as u128);
        bytes.extend(Word::from_u128(next, format.next_bytes)?.into_bytes());
        Ok(Word::from_be_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_fill_128_bytes() {
        assert_eq!(BucketFormat::BLIMP.bucket_bytes(), 128);
        assert_eq!(BucketFormat::BLIMP_KV.bucket_bytes(), 128);
        assert_eq!(BucketFormat::BLIMP.null_next(), 0xFF_FFFF);
    }

    #[test]
    fn test_row_addressing() {
        let format = BucketFormat::BLIMP;
        assert_eq!(format.bucket_row(0, 1024), 0);
        assert_eq!(format.bucket_row(7, 1024), 0);
        assert_eq!(format.bucket_row(8, 1024), 1);
        assert_eq!(format.bucket_row(3, 64), 6);
        assert_eq!(format.rows_for(9, 1024), 2);
        assert_eq!(format.maximum_buckets_for(4, 1024), 32);
        assert_eq!(format.maximum_buckets_for(5, 64), 2);
    }

    #[test]
    fn test_packed_layout() {
        let format = BucketFormat {
            capacity: 2,
            key_bytes: 2,
            value_bytes: 1,
            count_bytes: 1,
            next_bytes: 1,
        };
        let bucket = Bucket {
            slots: vec![Slot { key: 0x0102, value: 0x03 }],
            next: Some(4),
        };
        let word = bucket.to_word(&format).unwrap();
        assert_eq!(word.as_bytes(), &[0x01, 0x02, 0x03, 0, 0, 0, 0x01, 0x04]);

        let last = Bucket::default();
        assert_eq!(last.to_word(&format).unwrap().as_bytes()[7], 0xFF);
    }
}
