//! Record streams consumed by the placement engine.
//!
//! A record is an index (primary key) field followed by a data field, both
//! fixed width. Placement reads records through the [`RecordSource`] trait, one
//! field kind at a time; [`RecordGenerator`] is the provided synthetic source.

mod generator;

pub use self::generator::{FieldGenerator, RecordGenerator};

use crate::config::DatabaseProfile;
use crate::memory::Word;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of a record is placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// The whole record, index followed by data
    Record,
    /// The index field only
    Index,
    /// The data field only
    Data,
}

impl ItemKind {
    /// Width of this item in bytes under `database`.
    pub fn bytes(&self, database: &DatabaseProfile) -> usize {
        match self {
            ItemKind::Record => database.total_record_size_bytes,
            ItemKind::Index => database.total_index_size_bytes,
            ItemKind::Data => database.total_data_size_bytes(),
        }
    }

    /// Width of this item in bits under `database`.
    pub fn bits(&self, database: &DatabaseProfile) -> usize {
        self.bytes(database) * 8
    }

    /// Name used in error messages and logs.
    pub const fn name(&self) -> &'static str {
        match self {
            ItemKind::Record => "record",
            ItemKind::Index => "index",
            ItemKind::Data => "data",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lazy, finite source of fixed-width records.
///
/// The three accessors advance independent cursors over the same sequence of
/// records, so a layout can stream the index fields into one region and the
/// whole records into another.
pub trait RecordSource {
    /// Width of a whole record in bytes.
    fn record_bytes(&self) -> usize;

    /// Width of the index field in bytes.
    fn index_bytes(&self) -> usize;

    /// Width of the data field in bytes.
    fn data_bytes(&self) -> usize {
        self.record_bytes() - self.index_bytes()
    }

    /// Next raw record, `index << data_bits | data`.
    fn next_record(&mut self) -> Option<Word>;

    /// Next index field.
    fn next_index(&mut self) -> Option<Word>;

    /// Next data field.
    fn next_data(&mut self) -> Option<Word>;

    /// Upper bound on the records this source yields, if known.
    fn max_records(&self) -> Option<usize> {
        None
    }

    /// Streams items of `kind` from this source.
    fn items(&mut self, kind: ItemKind) -> Items<'_>
    where
        Self: Sized,
    {
        Items::new(self, kind)
    }
}

/// Iterator over one field kind of a [`RecordSource`].
pub struct Items<'a> {
    source: &'a mut dyn RecordSource,
    kind: ItemKind,
}

impl<'a> Items<'a> {
    /// Streams items of `kind` from `source`.
    pub fn new(source: &'a mut dyn RecordSource, kind: ItemKind) -> Self {
        Self { source, kind }
    }

    /// Width of the streamed items in bytes.
    pub fn width(&self) -> usize {
        match self.kind {
            ItemKind::Record => self.source.record_bytes(),
            ItemKind::Index => self.source.index_bytes(),
            ItemKind::Data => self.source.data_bytes(),
        }
    }
}

impl Iterator for Items<'_> {
    type Item = Word;

    fn next(&mut self) -> Option<Word> {
        match self.kind {
            ItemKind::Record => self.source.next_record(),
            ItemKind::Index => self.source.next_index(),
            ItemKind::Data => self.source.next_data(),
        }
    }
}
