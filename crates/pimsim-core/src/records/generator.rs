use super::RecordSource;
use crate::config::DatabaseProfile;
use crate::error::{RangeError, Result};
use crate::memory::Word;
use crate::util::Rng;
use log::debug;

/// Produces the values of one record field.
#[derive(Clone, Debug)]
pub enum FieldGenerator {
    /// Counts up from zero, wrapping at the field width.
    Incremental,
    /// Draws uniformly random values.
    UniformRandom(Rng),
    /// Repeats the same value.
    Constant(u128),
}

impl FieldGenerator {
    fn generate(&mut self, sequence: usize, width: usize) -> Word {
        match self {
            FieldGenerator::Incremental => truncated(sequence as u128, width),
            FieldGenerator::UniformRandom(rng) => Word::from_be_bytes(rng.random_bytes(width)),
            FieldGenerator::Constant(value) => truncated(*value, width),
        }
    }
}

/// The low `width` bytes of `value`, zero extended past 16 bytes.
fn truncated(value: u128, width: usize) -> Word {
    let bytes = value.to_be_bytes();
    let take = width.min(bytes.len());
    Word::zero(width - take).concat(&Word::from_be_bytes(&bytes[bytes.len() - take..]))
}

/// Synthetic [`RecordSource`] built from one generator per field.
///
/// Records are generated on first access and cached, so the record, index and
/// data cursors all observe the same sequence regardless of the order in which
/// they are advanced.
///
/// # Examples
///
/// ```
/// use pimsim_core::records::{FieldGenerator, RecordGenerator, RecordSource};
///
/// let mut records = RecordGenerator::new(2, 1, FieldGenerator::Incremental, FieldGenerator::Constant(0xAB))
///     .with_total(3);
/// assert_eq!(records.next_record().unwrap().to_u128(), Some(0x00AB));
/// assert_eq!(records.next_index().unwrap().to_u128(), Some(0));
/// assert_eq!(records.next_record().unwrap().to_u128(), Some(0x01AB));
/// ```
#[derive(Clone, Debug)]
pub struct RecordGenerator {
    index_bytes: usize,
    data_bytes: usize,
    index_generator: FieldGenerator,
    data_generator: FieldGenerator,
    total: Option<usize>,
    cache: Vec<(Word, Word)>,
    record_cursor: usize,
    index_cursor: usize,
    data_cursor: usize,
}

impl RecordGenerator {
    /// Creates an unbounded generator for records of `record_bytes` with an
    /// index of `index_bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `index_bytes > record_bytes`.
    pub fn new(
        record_bytes: usize,
        index_bytes: usize,
        index_generator: FieldGenerator,
        data_generator: FieldGenerator,
    ) -> Self {
        assert!(index_bytes <= record_bytes, "index wider than record");
        Self {
            index_bytes,
            data_bytes: record_bytes - index_bytes,
            index_generator,
            data_generator,
            total: None,
            cache: Vec::new(),
            record_cursor: 0,
            index_cursor: 0,
            data_cursor: 0,
        }
    }

    /// Creates a generator shaped after `database`.
    pub fn for_database(
        database: &DatabaseProfile,
        index_generator: FieldGenerator,
        data_generator: FieldGenerator,
    ) -> Self {
        Self::new(
            database.total_record_size_bytes,
            database.total_index_size_bytes,
            index_generator,
            data_generator,
        )
    }

    /// Creates a finite source replaying explicit `(index, data)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::Width`] if a field does not fit its width.
    pub fn from_records(
        record_bytes: usize,
        index_bytes: usize,
        records: impl IntoIterator<Item = (u128, u128)>,
    ) -> Result<Self> {
        let mut generator = Self::new(
            record_bytes,
            index_bytes,
            FieldGenerator::Constant(0),
            FieldGenerator::Constant(0),
        );
        let data_bytes = generator.data_bytes;
        generator.cache = records
            .into_iter()
            .map(|(index, data)| {
                Ok::<_, RangeError>((
                    Word::from_u128(index, index_bytes)?,
                    Word::from_u128(data, data_bytes)?,
                ))
            })
            .collect::<std::result::Result<_, _>>()?;
        generator.total = Some(generator.cache.len());
        Ok(generator)
    }

    /// Limits the generator to `total` records.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    /// Rewinds all three cursors to the first record.
    pub fn rewind(&mut self) {
        self.record_cursor = 0;
        self.index_cursor = 0;
        self.data_cursor = 0;
    }

    /// Index and data field of record `k`, generating up to it if needed.
    pub fn get(&mut self, k: usize) -> Option<(&Word, &Word)> {
        if self.total.is_some_and(|total| k >= total) {
            return None;
        }
        if k >= self.cache.len() {
            debug!("generating records {}..={}", self.cache.len(), k);
        }
        while self.cache.len() <= k {
            let sequence = self.cache.len();
            let index = self.index_generator.generate(sequence, self.index_bytes);
            let data = self.data_generator.generate(sequence, self.data_bytes);
            self.cache.push((index, data));
        }
        self.cache.get(k).map(|(index, data)| (index, data))
    }
}

impl RecordSource for RecordGenerator {
    fn record_bytes(&self) -> usize {
        self.index_bytes + self.data_bytes
    }

    fn index_bytes(&self) -> usize {
        self.index_bytes
    }

    fn next_record(&mut self) -> Option<Word> {
        let k = self.record_cursor;
        let record = self.get(k).map(|(index, data)| index.concat(data))?;
        self.record_cursor += 1;
        Some(record)
    }

    fn next_index(&mut self) -> Option<Word> {
        let k = self.index_cursor;
        let index = self.get(k).map(|(index, _)| index.clone())?;
        self.index_cursor += 1;
        Some(index)
    }

    fn next_data(&mut self) -> Option<Word> {
        let k = self.data_cursor;
        let data = self.get(k).map(|(_, data)| data.clone())?;
        self.data_cursor += 1;
        Some(data)
    }

    fn max_records(&self) -> Option<usize> {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ItemKind;

    #[test]
    fn test_incremental_wraps_at_field_width() {
        let mut records =
            RecordGenerator::new(2, 1, FieldGenerator::Incremental, FieldGenerator::Incremental);
        let indices: Vec<u128> = records
            .items(ItemKind::Index)
            .take(258)
            .map(|w| w.to_u128().unwrap())
            .collect();
        assert_eq!(indices[255], 255);
        assert_eq!(indices[256], 0);
        assert_eq!(indices[257], 1);
    }

    #[test]
    fn test_cursors_are_independent() {
        let mut records = RecordGenerator::new(
            4,
            2,
            FieldGenerator::UniformRandom(Rng::from_seed(7)),
            FieldGenerator::Incremental,
        )
        .with_total(4);
        let all: Vec<Word> = records.items(ItemKind::Record).collect();
        assert_eq!(all.len(), 4);
        let indices: Vec<Word> = records.items(ItemKind::Index).collect();
        let data: Vec<Word> = records.items(ItemKind::Data).collect();
        for ((record, index), data) in all.iter().zip(&indices).zip(&data) {
            assert_eq!(record, &index.concat(data));
        }
        assert_eq!(data[3].to_u128(), Some(3));
    }

    #[test]
    fn test_explicit_records() {
        let mut records = RecordGenerator::from_records(3, 1, [(1, 0x0203), (4, 0x0506)]).unwrap();
        assert_eq!(records.max_records(), Some(2));
        assert_eq!(records.next_record().unwrap().as_bytes(), &[1, 2, 3]);
        assert_eq!(records.next_record().unwrap().as_bytes(), &[4, 5, 6]);
        assert!(records.next_record().is_none());
        records.rewind();
        assert_eq!(records.next_index().unwrap().to_u128(), Some(1));
        assert!(RecordGenerator::from_records(3, 1, [(0x100, 0)]).is_err());
    }

    #[test]
    fn test_zero_width_fields_yield_zero() {
        let mut records =
            RecordGenerator::new(4, 4, FieldGenerator::Incremental, FieldGenerator::Incremental);
        let data = records.next_data().unwrap();
        assert_eq!(data.width(), 0);
        assert!(data.is_zero());
    }
}
