use crate::bucket::{Bucket, BucketFormat, Slot};
use crate::{Error, Result};
use log::{debug, info};
use pimsim_core::layout::{PlacementPolicy, RowRange};
use pimsim_core::memory::{Bank, Word};
use pimsim_core::placement::{Placed, place};
use pimsim_core::{CapacityError, ConfigError, RangeError};

const HASH_MULTIPLIER: u64 = 3634946921;
const HASH_INCREMENT: u64 = 2096170329;

/// Buckets visited by a lookup and what scanning each of them cost.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    /// Visited bucket indices in chain order
    pub buckets: Vec<usize>,
    /// Slots scanned per visited bucket: the hit position plus one, or the
    /// bucket's active count on a miss
    pub scans: Vec<usize>,
    /// Value found, if any
    pub value: Option<u64>,
}

impl Trace {
    /// Slots scanned over the whole chain.
    pub fn total_scans(&self) -> usize {
        self.scans.iter().sum()
    }
}

/// Hash table of fixed-capacity buckets with overflow chaining.
///
/// Keys hash to one of the `initial_buckets` home buckets. When the last
/// bucket of a chain is full, a new bucket is appended to the bucket array
/// and linked by index, up to `maximum_buckets` buckets in total.
///
/// # Examples
///
/// ```
/// use pimsim_hashmap::{BucketFormat, ChainedHashTable};
///
/// let mut table = ChainedHashTable::new(BucketFormat::BLIMP_KV, 4, 8).unwrap();
/// table.insert(42, 7).unwrap();
/// assert_eq!(table.fetch(42), Some(7));
/// assert_eq!(table.fetch(43), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainedHashTable {
    pub(crate) format: BucketFormat,
    pub(crate) initial_buckets: usize,
    pub(crate) maximum_buckets: usize,
    pub(crate) buckets: Vec<Bucket>,
}

impl ChainedHashTable {
    /// Creates a table with `initial_buckets` empty buckets.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::BucketCount`] if `initial_buckets` is not a non-zero power of two
    /// * [`ConfigError::BucketBounds`] if `initial_buckets > maximum_buckets`
    /// * [`RangeError::Width`] if bucket indices up to `maximum_buckets` do not
    ///   fit the format's next-bucket field
    pub fn new(format: BucketFormat, initial_buckets: usize, maximum_buckets: usize) -> Result<Self> {
        check_bounds(&format, initial_buckets, maximum_buckets)?;
        Ok(Self {
            format,
            initial_buckets,
            maximum_buckets,
            buckets: vec![Bucket::default(); initial_buckets],
        })
    }

    /// Creates a table whose maximum bucket count fills `rows` rows.
    ///
    /// # Errors
    ///
    /// See [`ChainedHashTable::new`].
    pub fn for_rows(
        format: BucketFormat,
        initial_buckets: usize,
        rows: usize,
        row_buffer_bytes: usize,
    ) -> Result<Self> {
        Self::new(
            format,
            initial_buckets,
            format.maximum_buckets_for(rows, row_buffer_bytes),
        )
    }

    /// Bucket format.
    pub fn format(&self) -> &BucketFormat {
        &self.format
    }

    /// Number of home buckets.
    pub fn initial_buckets(&self) -> usize {
        self.initial_buckets
    }

    /// Upper bound on the bucket count.
    pub fn maximum_buckets(&self) -> usize {
        self.maximum_buckets
    }

    /// Mask applied to hashed keys.
    pub fn mask(&self) -> u64 {
        self.initial_buckets as u64 - 1
    }

    /// All buckets; home buckets first, overflow buckets in allocation order.
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Current size of the packed table in bytes.
    pub fn size_bytes(&self) -> usize {
        self.buckets.len() * self.format.bucket_bytes()
    }

    /// Size of the packed table at its maximum bucket count.
    pub fn maximum_size_bytes(&self) -> usize {
        self.maximum_buckets * self.format.bucket_bytes()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Bucket::active_count).sum()
    }

    /// Returns `true` if no key is stored.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.slots.is_empty())
    }

    /// Home bucket of `key`.
    pub fn hash(&self, key: u64) -> usize {
        (HASH_MULTIPLIER.wrapping_mul(key).wrapping_add(HASH_INCREMENT) & self.mask()) as usize
    }

    fn chain(&self, key: u64) -> impl Iterator<Item = (usize, &Bucket)> + '_ {
        let mut current = Some(self.hash(key));
        std::iter::from_fn(move || {
            let index = current?;
            let bucket = &self.buckets[index];
            current = bucket.next;
            Some((index, bucket))
        })
    }

    /// Inserts `key` with `value`, replacing the value of an existing key.
    ///
    /// # Errors
    ///
    /// * [`RangeError::Width`] if the key or value does not fit its field
    /// * [`CapacityError::Buckets`] if the chain is full and every bucket is in use
    pub fn insert(&mut self, key: u64, value: u64) -> Result<()> {
        self.format.check_key(key)?;
        self.format.check_value(value)?;

        let mut last = self.hash(key);
        let mut stored = None;
        for (index, bucket) in self.chain(key) {
            if let Some(pos) = bucket.position(key) {
                stored = Some((index, pos));
                break;
            }
            last = index;
        }
        if let Some((index, pos)) = stored {
            self.buckets[index].slots[pos].value = value;
            return Ok(());
        }

        if self.buckets[last].active_count() == self.format.capacity {
            if self.buckets.len() == self.maximum_buckets {
                return Err(CapacityError::Buckets {
                    maximum: self.maximum_buckets,
                }
                .into());
            }
            let new = self.buckets.len();
            debug!("bucket {} full, chaining bucket {}", last, new);
            self.buckets[last].next = Some(new);
            self.buckets.push(Bucket::default());
            last = new;
        }
        self.buckets[last].slots.push(Slot { key, value });
        Ok(())
    }

    /// Looks up `key`.
    pub fn fetch(&self, key: u64) -> Option<u64> {
        self.chain(key).find_map(|(_, bucket)| {
            bucket
                .position(key)
                .map(|pos| bucket.slots[pos].value)
        })
    }

    /// Looks up `key` and records which buckets were scanned and how far.
    pub fn traced_fetch(&self, key: u64) -> Trace {
        let mut trace = Trace::default();
        for (index, bucket) in self.chain(key) {
            trace.buckets.push(index);
            match bucket.position(key) {
                Some(pos) => {
                    trace.scans.push(pos + 1);
                    trace.value = Some(bucket.slots[pos].value);
                    break;
                }
                None => trace.scans.push(bucket.active_count()),
            }
        }
        trace
    }

    /// Row offset of `bucket` inside a region the table was placed into.
    pub fn bucket_row(&self, bucket: usize, row_buffer_bytes: usize) -> usize {
        self.format.bucket_row(bucket, row_buffer_bytes)
    }

    /// Packs every bucket, in bucket order.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::Width`] if a field does not fit its width.
    pub fn to_words(&self) -> std::result::Result<Vec<Word>, RangeError> {
        self.buckets
            .iter()
            .map(|bucket| bucket.to_word(&self.format))
            .collect()
    }

    /// Writes the packed buckets row-aligned into `region` of `bank`.
    ///
    /// Bucket `b` lands in row `region.start + bucket_row(b, rb)`.
    ///
    /// # Errors
    ///
    /// * [`CapacityError::RegionExhausted`] if the region has too few rows
    /// * [`pimsim_core::Error`] if the region lies outside the bank
    pub fn place(&self, bank: &mut Bank, region: RowRange) -> Result<Placed> {
        let needed = self.format.rows_for(self.buckets.len(), bank.row_bytes());
        if needed > region.rows {
            return Err(CapacityError::RegionExhausted {
                rows: region.rows,
                needed,
            }
            .into());
        }
        let words = self.to_words()?;
        let placed = place(
            PlacementPolicy::AlignedHorizontal,
            region,
            self.format.bucket_bytes(),
            words.into_iter(),
            bank,
            self.buckets.len(),
        )?;
        info!(
            "placed {} buckets ({} keys) into rows {}..{}",
            placed.items,
            self.len(),
            region.start,
            region.start + placed.rows
        );
        Ok(placed)
    }
}

pub(crate) fn check_bounds(format: &BucketFormat, initial_buckets: usize, maximum_buckets: usize) -> Result<()> {
    if !initial_buckets.is_power_of_two() {
        return Err(ConfigError::BucketCount(initial_buckets).into());
    }
    if initial_buckets > maximum_buckets {
        return Err(ConfigError::BucketBounds {
            initial: initial_buckets,
            maximum: maximum_buckets,
        }
        .into());
    }
    if format.capacity == 0 {
        return Err(Error::Config(ConfigError::Zero {
            field: "bucket_capacity",
        }));
    }
    Word::from_u128(format.capacity as u128, format.count_bytes)?;
    Word::from_u128(maximum_buckets as u128, format.next_bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pimsim_core::config::HardwareProfile;
    use pimsim_core::memory::DEFAULT_BYTE;
    use pimsim_core::util::Size;
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_overflow_chains_new_bucket() {
        let mut table = ChainedHashTable::new(BucketFormat::BLIMP, 1, 2).unwrap();
        for key in 0..32 {
            table.insert(key, 0).unwrap();
        }
        assert_eq!(table.buckets().len(), 2);
        assert_eq!(table.buckets()[0].next_bucket(), Some(1));
        assert_eq!(table.buckets()[0].active_count(), 31);
        assert_eq!(table.buckets()[1].active_count(), 1);
        assert_eq!(table.buckets()[1].next_bucket(), None);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut table = ChainedHashTable::new(BucketFormat::BLIMP, 1, 2).unwrap();
        for key in 0..62 {
            table.insert(key, 0).unwrap();
        }
        assert!(matches!(
            table.insert(62, 0),
            Err(Error::Capacity(CapacityError::Buckets { maximum: 2 }))
        ));
        // updating a stored key needs no slot
        table.insert(61, 0).unwrap();
        assert_eq!(table.len(), 62);
    }

    #[test]
    fn test_fetch_returns_last_value() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut table = ChainedHashTable::new(BucketFormat::BLIMP_KV, 8, 64).unwrap();
        let mut expected = std::collections::HashMap::new();
        for _ in 0..500 {
            let key = rng.random_range(0..300u64);
            let value = rng.random_range(0..u32::MAX as u64);
            table.insert(key, value).unwrap();
            expected.insert(key, value);
        }
        for (key, value) in &expected {
            assert_eq!(table.fetch(*key), Some(*value));
        }
        for key in 300..400 {
            assert_eq!(table.fetch(key), None);
        }
        assert_eq!(table.len(), expected.len());
    }

    #[test]
    fn test_traced_fetch_costs() {
        let mut table = ChainedHashTable::new(BucketFormat::BLIMP, 1, 4).unwrap();
        for key in 0..40 {
            table.insert(key, 0).unwrap();
        }
        let hit_home = table.traced_fetch(2);
        assert_eq!(hit_home.buckets, vec![0]);
        assert_eq!(hit_home.scans, vec![3]);
        assert_eq!(hit_home.value, Some(0));

        let hit_overflow = table.traced_fetch(33);
        assert_eq!(hit_overflow.buckets, vec![0, 1]);
        assert_eq!(hit_overflow.scans, vec![31, 3]);

        let miss = table.traced_fetch(1000);
        assert_eq!(miss.buckets, vec![0, 1]);
        assert_eq!(miss.scans, vec![31, 9]);
        assert_eq!(miss.value, None);
        assert_eq!(miss.total_scans(), 40);
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(matches!(
            ChainedHashTable::new(BucketFormat::BLIMP, 3, 8),
            Err(Error::Config(ConfigError::BucketCount(3)))
        ));
        assert!(matches!(
            ChainedHashTable::new(BucketFormat::BLIMP, 0, 8),
            Err(Error::Config(ConfigError::BucketCount(0)))
        ));
        assert!(matches!(
            ChainedHashTable::new(BucketFormat::BLIMP, 16, 8),
            Err(Error::Config(ConfigError::BucketBounds { .. }))
        ));
        assert!(matches!(
            ChainedHashTable::new(BucketFormat::BLIMP, 1, 1 << 24),
            Err(Error::Range(RangeError::Width { .. }))
        ));
    }

    #[test]
    fn test_key_must_fit_field() {
        let mut table = ChainedHashTable::new(BucketFormat::BLIMP, 1, 1).unwrap();
        assert!(matches!(
            table.insert(1 << 32, 0),
            Err(Error::Range(RangeError::Width { needed: 5, width: 4 }))
        ));
        assert!(matches!(
            table.insert(1, 1),
            Err(Error::Range(RangeError::Width { width: 0, .. }))
        ));
    }

    #[test]
    fn test_place_into_bank() {
        let hardware = HardwareProfile::new(Size::KB(4), Size::B(256), 1.0, 1.0, 1.0).unwrap();
        let mut bank = Bank::new(hardware, DEFAULT_BYTE).unwrap();
        let mut table = ChainedHashTable::new(BucketFormat::BLIMP_KV, 2, 6).unwrap();
        for key in 0..40 {
            table.insert(key, key * 10).unwrap();
        }
        let region = RowRange::new(4, 3);
        let placed = table.place(&mut bank, region).unwrap();
        assert_eq!(placed.items, table.buckets().len());

        for (b, bucket) in table.buckets().iter().enumerate() {
            let row = bank.get_row(region.start + table.bucket_row(b, 256)).unwrap();
            let offset = (b % 2) * 128;
            assert_eq!(
                &row.as_bytes()[offset..offset + 128],
                bucket.to_word(table.format()).unwrap().as_bytes()
            );
        }

        let too_small = RowRange::new(0, 1);
        assert!(matches!(
            table.place(&mut bank, too_small),
            Err(Error::Capacity(CapacityError::RegionExhausted { rows: 1, .. }))
        ));
    }
}
