use serde::{Deserialize, Serialize};
use std::fmt;

/// Capacity figures computed by the planner.
///
/// The two totals are always present; per-region row counts are only set for
/// the layouts that have the region and are left out of the JSON otherwise.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutMetadata {
    /// Rows holding records, indices or data
    pub total_rows_for_records: usize,
    /// Records the layout can hold
    pub total_records_processable: usize,
    /// Rows left after fixed reservations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows_for_configurable_data: Option<usize>,
    /// Rows of BLIMP program code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows_for_blimp_code_region: Option<usize>,
    /// Rows of BLIMP scratch space
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows_for_blimp_temp_region: Option<usize>,
    /// Rows of all hitmaps together
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows_for_hitmaps: Option<usize>,
    /// Rows of AMBIT temporaries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows_for_ambit_temp_region: Option<usize>,
    /// Rows AMBIT reserves at the tail (control, DCC, compute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows_for_ambit_compute_region: Option<usize>,
    /// Rows of horizontally placed records in a hybrid layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows_for_horizontal_data: Option<usize>,
    /// Rows of bit-plane indices in a hybrid layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows_for_vertical_data: Option<usize>,
    /// Rows of bit-plane primary indices
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows_for_ambit_pi_field: Option<usize>,
}

impl LayoutMetadata {
    /// Metadata with only the two totals set.
    pub fn new(total_rows_for_records: usize, total_records_processable: usize) -> Self {
        Self {
            total_rows_for_records,
            total_records_processable,
            ..Default::default()
        }
    }
}

impl fmt::Display for LayoutMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records in {} rows",
            self.total_records_processable, self.total_rows_for_records
        )?;
        let optional = [
            ("configurable", self.total_rows_for_configurable_data),
            ("blimp code", self.total_rows_for_blimp_code_region),
            ("blimp temp", self.total_rows_for_blimp_temp_region),
            ("hitmaps", self.total_rows_for_hitmaps),
            ("ambit temp", self.total_rows_for_ambit_temp_region),
            ("ambit reserved", self.total_rows_for_ambit_compute_region),
            ("horizontal", self.total_rows_for_horizontal_data),
            ("vertical", self.total_rows_for_vertical_data),
            ("pi field", self.total_rows_for_ambit_pi_field),
        ];
        for (name, rows) in optional {
            if let Some(rows) = rows {
                write!(f, ", {} {}", name, rows)?;
            }
        }
        Ok(())
    }
}
