use super::capacity::{self, Blocks};
use super::{Layout, LayoutKind, LayoutMetadata, Region, RowMapping, RowRange};
use crate::config::{AMBIT_CONTROL_GROUP_ROWS, AmbitCaps, DatabaseProfile, HardwareProfile};
use crate::error::{ConfigError, Result};
use crate::placement::PlacementPolicy;
use crate::records::ItemKind;
use log::{debug, info};

/// Plans bank layouts for one hardware and database profile pair.
///
/// # Examples
///
/// ```
/// use pimsim_core::config::{DatabaseProfile, HardwareProfile};
/// use pimsim_core::layout::{LayoutKind, LayoutPlanner};
/// use pimsim_core::util::Size;
///
/// let hardware = HardwareProfile::new(Size::MB(32), Size::KB(1), 32.0, 14.0, 14.0).unwrap();
/// let database = DatabaseProfile::new(64, 8).unwrap();
/// let layout = LayoutPlanner::new(&hardware, &database)
///     .plan("cpu-aligned".parse::<LayoutKind>().unwrap())
///     .unwrap();
/// assert_eq!(layout.metadata().total_records_processable, 524288);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct LayoutPlanner<'a> {
    hardware: &'a HardwareProfile,
    database: &'a DatabaseProfile,
    record_hint: Option<usize>,
}

/// Reserved region sizes shared by the BLIMP and AMBIT kinds.
struct Reserved {
    blimp_code: usize,
    blimp_temp: usize,
    ambit_temp: usize,
    ambit_tail: usize,
}

impl<'a> LayoutPlanner<'a> {
    /// Creates a planner for `hardware` and `database`.
    pub fn new(hardware: &'a HardwareProfile, database: &'a DatabaseProfile) -> Self {
        Self {
            hardware,
            database,
            record_hint: None,
        }
    }

    /// Caps the planned record count at `hint`.
    ///
    /// Regions are shrunk to what the capped count needs; they never grow.
    pub fn with_record_hint(mut self, hint: Option<usize>) -> Self {
        self.record_hint = hint;
        self
    }

    /// Plans the row mapping and capacity of `kind`.
    ///
    /// # Errors
    ///
    /// * [`ConfigError`] if a profile is invalid, a needed capability is
    ///   missing, reserved regions do not fit the bank, an item is not row buffer
    ///   aligned where the layout requires it, or no record can be placed
    /// * [`crate::error::InvariantViolation`] if the resulting mapping is inconsistent
    pub fn plan(&self, kind: LayoutKind) -> Result<Layout> {
        self.hardware.validate()?;
        self.database.validate()?;
        kind.check_capabilities(self.hardware)?;

        let (mapping, metadata) = match kind {
            LayoutKind::Standard { policy, item } => self.plan_standard(policy, item)?,
            LayoutKind::Blimp { item, hitmaps: false } => self.plan_blimp(item)?,
            LayoutKind::Blimp { item, hitmaps: true } => self.plan_blimp_hitmap(item)?,
            LayoutKind::Ambit { item, hitmaps } => self.plan_ambit(item, hitmaps)?,
            LayoutKind::BlimpAmbit { item, hitmaps } => self.plan_blimp_ambit(kind, item, hitmaps)?,
            LayoutKind::BlimpAmbitPiField => self.plan_pi_field()?,
        };

        mapping.validate(self.hardware.bank_rows())?;
        info!("planned {}: {}", kind, metadata);
        debug!("row mapping: {}", mapping);
        Ok(Layout::new(
            self.hardware.clone(),
            self.database.clone(),
            kind,
            mapping,
            metadata,
        ))
    }

    fn rb(&self) -> usize {
        self.hardware.row_buffer_size_bytes
    }

    fn rb_bits(&self) -> usize {
        self.hardware.row_buffer_bits()
    }

    fn bank_rows(&self) -> usize {
        self.hardware.bank_rows()
    }

    fn ambit(&self) -> Option<&AmbitCaps> {
        self.hardware.ambit.as_ref()
    }

    fn item_bytes(&self, item: ItemKind) -> std::result::Result<usize, ConfigError> {
        match item.bytes(self.database) {
            0 => Err(ConfigError::Zero {
                field: match item {
                    ItemKind::Record => "total_record_size_bytes",
                    ItemKind::Index => "total_index_size_bytes",
                    ItemKind::Data => "data size",
                },
            }),
            bytes => Ok(bytes),
        }
    }

    fn cap(&self, records: usize) -> usize {
        self.record_hint.map_or(records, |hint| records.min(hint))
    }

    fn reserved(&self) -> Reserved {
        Reserved {
            blimp_code: self.database.blimp_code_rows(self.rb()),
            blimp_temp: self.database.blimp_temporary_rows(self.rb()),
            ambit_temp: self.database.ambit_temporary_bits,
            ambit_tail: self.hardware.ambit_reserved_rows(),
        }
    }

    fn free_rows(&self, reserved: usize) -> std::result::Result<usize, ConfigError> {
        let bank_rows = self.bank_rows();
        bank_rows
            .checked_sub(reserved)
            .ok_or(ConfigError::InsufficientRows { reserved, bank_rows })
    }

    fn nonzero(records: usize) -> std::result::Result<usize, ConfigError> {
        if records == 0 {
            Err(ConfigError::NoRecordsPlaceable)
        } else {
            Ok(records)
        }
    }

    /// Maps the AMBIT compute, DCC and control rows upwards from the last row.
    fn map_ambit_tail(&self, mapping: &mut RowMapping) {
        let Some(ambit) = self.ambit() else {
            return;
        };
        let mut base = self.bank_rows();
        base -= ambit.ambit_compute_register_rows;
        let compute = RowRange::new(base, ambit.ambit_compute_register_rows);
        base -= ambit.ambit_dcc_rows * 2;
        let dcc = RowRange::new(base, ambit.ambit_dcc_rows * 2);
        base -= AMBIT_CONTROL_GROUP_ROWS;
        let control = RowRange::new(base, AMBIT_CONTROL_GROUP_ROWS);
        mapping.insert(Region::AmbitComputeRows, compute);
        mapping.insert(Region::AmbitDccRows, dcc);
        mapping.insert(Region::AmbitControlRows, control);
    }

    fn plan_standard(
        &self,
        policy: PlacementPolicy,
        item: ItemKind,
    ) -> Result<(RowMapping, LayoutMetadata)> {
        let bytes = self.item_bytes(item)?;
        let (rb, rb_bits) = (self.rb(), self.rb_bits());
        let free = self.bank_rows();
        let (records, rows) = match policy {
            PlacementPolicy::PackedHorizontal => (capacity::packed_records(free, bytes, rb), free),
            PlacementPolicy::AlignedHorizontal => capacity::aligned(free, bytes, rb),
            PlacementPolicy::BitPlaneVertical => (capacity::bitplane_records(free, bytes * 8, rb_bits), free),
        };
        let capped = Self::nonzero(self.cap(records))?;
        let rows = if capped < records {
            rows.min(match policy {
                PlacementPolicy::PackedHorizontal => capacity::packed_rows(capped, bytes, rb),
                PlacementPolicy::AlignedHorizontal => capacity::aligned_rows(capped, bytes, rb),
                PlacementPolicy::BitPlaneVertical => capacity::bitplane_rows(capped, bytes * 8, rb_bits),
            })
        } else {
            rows
        };
        let mapping = RowMapping::new().with(Region::Data, RowRange::new(0, rows));
        Ok((mapping, LayoutMetadata::new(rows, capped)))
    }

    fn blimp_head(&self, r: &Reserved) -> (RowMapping, LayoutMetadata) {
        let mapping = RowMapping::new()
            .with(Region::BlimpCode, RowRange::new(0, r.blimp_code))
            .with(Region::BlimpTemp, RowRange::new(r.blimp_code, r.blimp_temp));
        let metadata = LayoutMetadata {
            total_rows_for_blimp_code_region: Some(r.blimp_code),
            total_rows_for_blimp_temp_region: Some(r.blimp_temp),
            ..Default::default()
        };
        (mapping, metadata)
    }

    fn plan_blimp(&self, item: ItemKind) -> Result<(RowMapping, LayoutMetadata)> {
        let bytes = self.item_bytes(item)?;
        let rb = self.rb();
        let r = self.reserved();
        let free = self.free_rows(r.blimp_code + r.blimp_temp)?;
        capacity::check_alignment(item, bytes, rb)?;

        let (records, rows) = capacity::aligned(free, bytes, rb);
        let capped = Self::nonzero(self.cap(records))?;
        let rows = rows.min(capacity::aligned_rows(capped, bytes, rb));

        let (mut mapping, mut metadata) = self.blimp_head(&r);
        mapping.insert(Region::Data, RowRange::new(r.blimp_code + r.blimp_temp, rows));
        metadata.total_rows_for_records = rows;
        metadata.total_records_processable = capped;
        metadata.total_rows_for_configurable_data = Some(free);
        Ok((mapping, metadata))
    }

    fn plan_blimp_hitmap(&self, item: ItemKind) -> Result<(RowMapping, LayoutMetadata)> {
        let bytes = self.item_bytes(item)?;
        let rb = self.rb();
        let hitmap_count = self.database.hitmap_count;
        let r = self.reserved();
        let free = self.free_rows(r.blimp_code + r.blimp_temp)?;
        capacity::check_alignment(item, bytes, rb)?;

        let blocks = capacity::greedy_blocks(free, bytes, rb, 0, hitmap_count)?;
        let blocks: Blocks = blocks.capped(self.cap(blocks.records), bytes, 0, hitmap_count, rb);
        Self::nonzero(blocks.records)?;

        let base = r.blimp_code + r.blimp_temp;
        let (mut mapping, mut metadata) = self.blimp_head(&r);
        mapping.insert(Region::Data, RowRange::new(base, blocks.data));
        mapping.insert(Region::Hitmaps, RowRange::new(base + blocks.data, blocks.hit));
        metadata.total_rows_for_records = blocks.data;
        metadata.total_records_processable = blocks.records;
        metadata.total_rows_for_configurable_data = Some(free);
        metadata.total_rows_for_hitmaps = Some(blocks.hit);
        Ok((mapping, metadata))
    }

    fn plan_ambit(&self, item: ItemKind, hitmaps: bool) -> Result<(RowMapping, LayoutMetadata)> {
        let bits = self.item_bytes(item)? * 8;
        let rb_bits = self.rb_bits();
        let r = self.reserved();
        let free = self.free_rows(r.ambit_tail + r.ambit_temp)?;

        let records = capacity::bitplane_records(free, bits, rb_bits);
        let (records, data, hit) = if hitmaps {
            capacity::shrink_bitplane_with_hitmaps(
                free,
                self.cap(records),
                bits,
                rb_bits,
                self.database.hitmap_count,
            )
        } else {
            let capped = self.cap(records);
            let data = if capped < records {
                free.min(capacity::bitplane_rows(capped, bits, rb_bits))
            } else {
                free
            };
            (capped, data, 0)
        };
        Self::nonzero(records)?;

        let mut mapping = RowMapping::new().with(Region::Data, RowRange::new(0, data));
        let mut base = data;
        if hitmaps {
            mapping.insert(Region::Hitmaps, RowRange::new(base, hit));
            base += hit;
        }
        mapping.insert(Region::AmbitTempRows, RowRange::new(base, r.ambit_temp));
        self.map_ambit_tail(&mut mapping);

        let metadata = LayoutMetadata {
            total_rows_for_records: data,
            total_records_processable: records,
            total_rows_for_configurable_data: Some(free),
            total_rows_for_hitmaps: hitmaps.then_some(hit),
            total_rows_for_ambit_temp_region: Some(r.ambit_temp),
            total_rows_for_ambit_compute_region: Some(r.ambit_tail),
            ..Default::default()
        };
        Ok((mapping, metadata))
    }

    fn plan_blimp_ambit(
        &self,
        kind: LayoutKind,
        item: ItemKind,
        hitmaps: bool,
    ) -> Result<(RowMapping, LayoutMetadata)> {
        let rb = self.rb();
        let rb_bits = self.rb_bits();
        let index_bits = self.item_bytes(ItemKind::Index)? * 8;
        let hitmap_count = if hitmaps { self.database.hitmap_count } else { 0 };
        let r = self.reserved();
        let free = self.free_rows(r.ambit_tail + r.ambit_temp + r.blimp_code + r.blimp_temp)?;

        let split = match item {
            ItemKind::Record => {
                let bytes = self.item_bytes(ItemKind::Record)?;
                let (records, _) = capacity::aligned(free, bytes, rb);
                capacity::shrink_hybrid(free, self.cap(records), bytes, index_bits, rb, hitmap_count)
            }
            ItemKind::Index => {
                let records = self.cap(capacity::bitplane_records(free, index_bits, rb_bits));
                let (records, vertical, hit) =
                    capacity::shrink_bitplane_with_hitmaps(free, records, index_bits, rb_bits, hitmap_count);
                capacity::Hybrid {
                    horizontal: 0,
                    vertical,
                    hit,
                    records,
                }
            }
            ItemKind::Data => {
                return Err(ConfigError::UnsupportedItem {
                    layout: kind.name(),
                    item: item.name(),
                }
                .into());
            }
        };
        Self::nonzero(split.records)?;

        let (mut mapping, mut metadata) = self.blimp_head(&r);
        let mut base = r.blimp_code + r.blimp_temp;
        mapping.insert(Region::Vertical, RowRange::new(base, split.vertical));
        base += split.vertical;
        mapping.insert(Region::Horizontal, RowRange::new(base, split.horizontal));
        base += split.horizontal;
        if hitmaps {
            mapping.insert(Region::Hitmaps, RowRange::new(base, split.hit));
            base += split.hit;
        }
        mapping.insert(Region::AmbitTempRows, RowRange::new(base, r.ambit_temp));
        self.map_ambit_tail(&mut mapping);

        metadata.total_rows_for_records = split.horizontal + split.vertical;
        metadata.total_records_processable = split.records;
        metadata.total_rows_for_configurable_data = Some(free);
        metadata.total_rows_for_horizontal_data = Some(split.horizontal);
        metadata.total_rows_for_vertical_data = Some(split.vertical);
        metadata.total_rows_for_hitmaps = hitmaps.then_some(split.hit);
        metadata.total_rows_for_ambit_temp_region = Some(r.ambit_temp);
        metadata.total_rows_for_ambit_compute_region = Some(r.ambit_tail);
        Ok((mapping, metadata))
    }

    fn plan_pi_field(&self) -> Result<(RowMapping, LayoutMetadata)> {
        let rb = self.rb();
        let bytes = self.item_bytes(ItemKind::Record)?;
        let pi_bits = self.database.total_index_size_bytes * 8;
        let hitmap_count = self.database.hitmap_count;
        let r = self.reserved();
        let free = self.free_rows(r.ambit_tail + r.ambit_temp + r.blimp_code)?;
        capacity::check_alignment(ItemKind::Record, bytes, rb)?;

        let blocks = capacity::greedy_blocks(free, bytes, rb, pi_bits, hitmap_count)?;
        let blocks = blocks.capped(self.cap(blocks.records), bytes, pi_bits, hitmap_count, rb);
        Self::nonzero(blocks.records)?;

        let mut mapping = RowMapping::new().with(Region::BlimpCode, RowRange::new(0, r.blimp_code));
        let mut base = r.blimp_code;
        mapping.insert(Region::PiField, RowRange::new(base, blocks.pi));
        base += blocks.pi;
        mapping.insert(Region::AmbitTempRows, RowRange::new(base, r.ambit_temp));
        base += r.ambit_temp;
        mapping.insert(Region::Data, RowRange::new(base, blocks.data));
        base += blocks.data;
        mapping.insert(Region::Hitmaps, RowRange::new(base, blocks.hit));
        self.map_ambit_tail(&mut mapping);

        let metadata = LayoutMetadata {
            total_rows_for_records: blocks.data,
            total_records_processable: blocks.records,
            total_rows_for_configurable_data: Some(free),
            total_rows_for_blimp_code_region: Some(r.blimp_code),
            total_rows_for_hitmaps: Some(blocks.hit),
            total_rows_for_ambit_temp_region: Some(r.ambit_temp),
            total_rows_for_ambit_compute_region: Some(r.ambit_tail),
            total_rows_for_ambit_pi_field: Some(blocks.pi),
            ..Default::default()
        };
        Ok((mapping, metadata))
    }
}
