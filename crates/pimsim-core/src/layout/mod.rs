//! Address-space layout planning.
//!
//! Given a [`HardwareProfile`] and a [`DatabaseProfile`], the [`LayoutPlanner`]
//! decides which rows of a bank hold code, scratch space, records, hitmaps and
//! the AMBIT reserved rows. The result is a [`Layout`]: the [`RowMapping`] with
//! named row ranges plus the [`LayoutMetadata`] capacity figures.
//!
//! A layout is immutable once planned. [`Layout::perform`] fills a bank
//! according to the layout, and layouts round-trip through JSON files with
//! [`Layout::save`] and [`Layout::from_jsonfile`].

mod capacity;
mod kind;
mod mapping;
mod metadata;
mod planner;

pub use self::kind::LayoutKind;
pub use self::mapping::{Region, RowMapping, RowRange};
pub use self::metadata::LayoutMetadata;
pub use self::planner::LayoutPlanner;
pub use crate::placement::PlacementPolicy;
pub use crate::records::ItemKind;

use crate::config::{DatabaseProfile, HardwareProfile, read_json, write_json};
use crate::error::{ConfigError, Result};
use crate::memory::Bank;
use crate::placement::{Placed, place, place_hitmap, reset_ambit_control_rows};
use crate::records::{Items, RecordSource};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mapping and metadata of a planned layout, as stored under `meta`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutMeta {
    /// Named row ranges
    pub row_mapping_set: RowMapping,
    /// Capacity figures
    pub layout_metadata: LayoutMetadata,
}

/// A planned bank layout together with the profiles it was planned for.
///
/// Serialized as
/// `{"hardware": {..}, "database": {..}, "layout": "<kind>", "meta": {"row_mapping_set": {..}, "layout_metadata": {..}}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Hardware the layout was planned for
    pub hardware: HardwareProfile,
    /// Schema the layout was planned for
    pub database: DatabaseProfile,
    /// Layout kind
    #[serde(rename = "layout")]
    pub kind: LayoutKind,
    /// Row mapping and capacity
    pub meta: LayoutMeta,
}

impl Layout {
    pub(crate) fn new(
        hardware: HardwareProfile,
        database: DatabaseProfile,
        kind: LayoutKind,
        mapping: RowMapping,
        metadata: LayoutMetadata,
    ) -> Self {
        Self {
            hardware,
            database,
            kind,
            meta: LayoutMeta {
                row_mapping_set: mapping,
                layout_metadata: metadata,
            },
        }
    }

    /// Named row ranges of the layout.
    pub fn mapping(&self) -> &RowMapping {
        &self.meta.row_mapping_set
    }

    /// Capacity figures of the layout.
    pub fn metadata(&self) -> &LayoutMetadata {
        &self.meta.layout_metadata
    }

    /// Loads a layout configuration file and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if a profile is
    /// invalid, or if the stored mapping is not disjoint and inside the bank.
    pub fn from_jsonfile(filepath: impl AsRef<Path>) -> Result<Layout> {
        let layout: Layout = read_json(filepath)?;
        layout.hardware.validate()?;
        layout.database.validate()?;
        layout.kind.check_capabilities(&layout.hardware)?;
        layout.mapping().validate(layout.hardware.bank_rows())?;
        Ok(layout)
    }

    /// Writes the layout configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save(&self, filepath: impl AsRef<Path>) -> Result<()> {
        write_json(&filepath, self)?;
        info!("layout {} saved to {}", self.kind, filepath.as_ref().display());
        Ok(())
    }

    fn region(&self, region: Region) -> RowRange {
        self.mapping().get(region).unwrap_or_default()
    }

    fn place_items(
        &self,
        policy: PlacementPolicy,
        region: Region,
        item: ItemKind,
        bank: &mut Bank,
        source: &mut dyn RecordSource,
    ) -> Result<Placed> {
        let items = Items::new(source, item);
        let width = items.width();
        place(
            policy,
            self.region(region),
            width,
            items,
            bank,
            self.metadata().total_records_processable,
        )
    }

    fn place_hitmaps(&self, bank: &mut Bank, value: bool) -> Result<()> {
        let hitmap_count = self.database.hitmap_count;
        if hitmap_count == 0 {
            return Ok(());
        }
        let hitmaps = self.region(Region::Hitmaps);
        let rows_per_hitmap = hitmaps.rows / hitmap_count;
        for hitmap in 0..hitmap_count {
            let region = RowRange::new(hitmaps.start + hitmap * rows_per_hitmap, rows_per_hitmap);
            place_hitmap(bank, region, value, self.metadata().total_records_processable)?;
        }
        Ok(())
    }

    /// Fills `bank` with records from `source` according to this layout.
    ///
    /// Items are placed with the layout's encoding into its data regions, at
    /// most `total_records_processable` of them. Hitmap layouts initialize their
    /// hitmaps (set for BLIMP-placed records, cleared for AMBIT bit-plane ones)
    /// and AMBIT layouts reset their control rows.
    ///
    /// Returns the outcome of placing the layout's primary items.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Mismatch`] if the bank or the source does not match the
    ///   profiles the layout was planned for
    /// * [`crate::error::RangeError`] if a record does not fit its field width
    pub fn perform(&self, bank: &mut Bank, source: &mut dyn RecordSource) -> Result<Placed> {
        check_match("row buffer bytes", self.hardware.row_buffer_size_bytes, bank.row_bytes())?;
        check_match("bank rows", self.hardware.bank_rows(), bank.row_count())?;
        check_match("record bytes", self.database.total_record_size_bytes, source.record_bytes())?;
        check_match("index bytes", self.database.total_index_size_bytes, source.index_bytes())?;
        if let Some(max) = source.max_records()
            && max < self.metadata().total_records_processable
        {
            warn!(
                "source holds {} records, layout has room for {}",
                max,
                self.metadata().total_records_processable
            );
        }
        info!("performing {} layout", self.kind);

        let placed = match self.kind {
            LayoutKind::Standard { policy, item } => {
                self.place_items(policy, Region::Data, item, bank, source)?
            }
            LayoutKind::Blimp { item, hitmaps } => {
                let placed =
                    self.place_items(PlacementPolicy::AlignedHorizontal, Region::Data, item, bank, source)?;
                if hitmaps {
                    self.place_hitmaps(bank, true)?;
                }
                placed
            }
            LayoutKind::Ambit { item, hitmaps } => {
                let placed =
                    self.place_items(PlacementPolicy::BitPlaneVertical, Region::Data, item, bank, source)?;
                if hitmaps {
                    self.place_hitmaps(bank, false)?;
                }
                reset_ambit_control_rows(bank, self.mapping())?;
                placed
            }
            LayoutKind::BlimpAmbit { item, hitmaps } => {
                let mut placed = self.place_items(
                    PlacementPolicy::BitPlaneVertical,
                    Region::Vertical,
                    ItemKind::Index,
                    bank,
                    source,
                )?;
                if item == ItemKind::Record {
                    placed = self.place_items(
                        PlacementPolicy::AlignedHorizontal,
                        Region::Horizontal,
                        ItemKind::Record,
                        bank,
                        source,
                    )?;
                }
                if hitmaps {
                    self.place_hitmaps(bank, false)?;
                }
                reset_ambit_control_rows(bank, self.mapping())?;
                placed
            }
            LayoutKind::BlimpAmbitPiField => {
                self.place_items(
                    PlacementPolicy::BitPlaneVertical,
                    Region::PiField,
                    ItemKind::Index,
                    bank,
                    source,
                )?;
                let placed = self.place_items(
                    PlacementPolicy::AlignedHorizontal,
                    Region::Data,
                    ItemKind::Record,
                    bank,
                    source,
                )?;
                self.place_hitmaps(bank, true)?;
                reset_ambit_control_rows(bank, self.mapping())?;
                placed
            }
        };
        Ok(placed)
    }
}

fn check_match(what: &'static str, expected: usize, actual: usize) -> std::result::Result<(), ConfigError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConfigError::Mismatch {
            what,
            expected,
            actual,
        })
    }
}
