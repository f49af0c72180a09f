use crate::error::{ConfigError, InvariantViolation};
use itertools::Itertools;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A contiguous block of rows, `rows` rows starting at `start`.
///
/// Serialized as the pair `[start, rows]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct RowRange {
    /// First row
    pub start: usize,
    /// Number of rows
    pub rows: usize,
}

impl RowRange {
    /// Creates a range of `rows` rows starting at `start`.
    pub const fn new(start: usize, rows: usize) -> Self {
        Self { start, rows }
    }

    /// One past the last row.
    pub const fn end(&self) -> usize {
        self.start + self.rows
    }

    /// Returns `true` if the range holds no rows.
    pub const fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Row indices covered by the range.
    pub fn iter(&self) -> std::ops::Range<usize> {
        self.start..self.end()
    }

    /// Returns `true` if both ranges share at least one row.
    pub const fn overlaps(&self, other: &RowRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end() && other.start < self.end()
    }
}

impl From<(usize, usize)> for RowRange {
    fn from((start, rows): (usize, usize)) -> Self {
        Self { start, rows }
    }
}

impl From<RowRange> for (usize, usize) {
    fn from(range: RowRange) -> Self {
        (range.start, range.rows)
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.rows)
    }
}

/// Named bank regions a layout can map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    /// Records, indices or data, depending on the layout
    Data,
    /// BLIMP program code
    BlimpCode,
    /// BLIMP scratch space
    BlimpTemp,
    /// Hitmaps, one bit per record each
    Hitmaps,
    /// AMBIT control group C0/C1
    AmbitControlRows,
    /// AMBIT dual-contact-cell pairs
    AmbitDccRows,
    /// AMBIT compute (T) registers
    AmbitComputeRows,
    /// AMBIT temporaries (D group)
    AmbitTempRows,
    /// Horizontally placed records of a hybrid layout
    Horizontal,
    /// Bit-plane index rows of a hybrid layout
    Vertical,
    /// Bit-plane primary index rows next to horizontally placed records
    PiField,
}

impl Region {
    /// Every region, in declaration order.
    pub const ALL: [Region; 11] = [
        Region::Data,
        Region::BlimpCode,
        Region::BlimpTemp,
        Region::Hitmaps,
        Region::AmbitControlRows,
        Region::AmbitDccRows,
        Region::AmbitComputeRows,
        Region::AmbitTempRows,
        Region::Horizontal,
        Region::Vertical,
        Region::PiField,
    ];

    /// Name used in layout configuration files.
    pub const fn name(&self) -> &'static str {
        match self {
            Region::Data => "data",
            Region::BlimpCode => "blimp_code_region",
            Region::BlimpTemp => "blimp_temp_region",
            Region::Hitmaps => "hitmaps",
            Region::AmbitControlRows => "ambit_control_rows",
            Region::AmbitDccRows => "ambit_dcc_rows",
            Region::AmbitComputeRows => "ambit_compute_rows",
            Region::AmbitTempRows => "ambit_temp_rows",
            Region::Horizontal => "horizontal_region",
            Region::Vertical => "vertical_region",
            Region::PiField => "pi_field",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|region| region.name() == s)
            .ok_or_else(|| ConfigError::UnknownRegion(s.to_string()))
    }
}

/// Ordered set of named row ranges describing which rows hold what.
///
/// Entries keep the order in which a layout lays them out, top of the bank
/// first. The hybrid layouts store their records in a vertical and a horizontal
/// region; for them [`RowMapping::data`] reports the span covering both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowMapping {
    entries: Vec<(Region, RowRange)>,
}

impl RowMapping {
    /// An empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `region`, replacing an earlier entry of the same name.
    pub fn insert(&mut self, region: Region, range: RowRange) {
        match self.entries.iter_mut().find(|(r, _)| *r == region) {
            Some(entry) => entry.1 = range,
            None => self.entries.push((region, range)),
        }
    }

    /// Builder form of [`RowMapping::insert`].
    pub fn with(mut self, region: Region, range: RowRange) -> Self {
        self.insert(region, range);
        self
    }

    /// The range mapped for `region`.
    pub fn get(&self, region: Region) -> Option<RowRange> {
        self.entries
            .iter()
            .find(|(r, _)| *r == region)
            .map(|(_, range)| *range)
    }

    /// Rows holding the layout's items.
    ///
    /// For hybrid layouts this is the span from the start of the vertical region
    /// to the end of the horizontal region.
    pub fn data(&self) -> Option<RowRange> {
        if let Some(data) = self.get(Region::Data) {
            return Some(data);
        }
        let vertical = self.get(Region::Vertical)?;
        let horizontal = self.get(Region::Horizontal)?;
        Some(RowRange::new(vertical.start, vertical.rows + horizontal.rows))
    }

    /// Iterates over the entries in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (Region, RowRange)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total rows claimed by all entries.
    pub fn mapped_rows(&self) -> usize {
        self.entries.iter().map(|(_, range)| range.rows).sum()
    }

    /// Checks that every range lies inside the bank and no two ranges share a row.
    ///
    /// # Errors
    ///
    /// * [`InvariantViolation::OutOfBank`] for a range past the last row
    /// * [`InvariantViolation::Overlap`] for two overlapping ranges
    pub fn validate(&self, bank_rows: usize) -> Result<(), InvariantViolation> {
        for (region, range) in &self.entries {
            if range.end() > bank_rows {
                return Err(InvariantViolation::OutOfBank {
                    name: region.to_string(),
                    start: range.start,
                    rows: range.rows,
                    bank_rows,
                });
            }
        }
        if let Some(((a, _), (b, _))) = self
            .entries
            .iter()
            .tuple_combinations()
            .find(|((_, x), (_, y))| x.overlaps(y))
        {
            return Err(InvariantViolation::Overlap {
                a: a.to_string(),
                b: b.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for RowMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.entries
                .iter()
                .map(|(region, range)| format!("{}: {}", region, range))
                .join(", ")
        )
    }
}

impl Serialize for RowMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (region, range) in &self.entries {
            map.serialize_entry(region.name(), range)?;
        }
        map.end()
    }
}

struct RowMappingVisitor;

impl<'de> Visitor<'de> for RowMappingVisitor {
    type Value = RowMapping;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of region names to [start, rows] pairs")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut mapping = RowMapping::new();
        while let Some((name, range)) = access.next_entry::<String, RowRange>()? {
            let region = name.parse::<Region>().map_err(serde::de::Error::custom)?;
            mapping.insert(region, range);
        }
        Ok(mapping)
    }
}

impl<'de> Deserialize<'de> for RowMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RowMappingVisitor)
    }
}
