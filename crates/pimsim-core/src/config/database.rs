use crate::error::ConfigError;
use crate::util::rows_for_bytes;
use serde::{Deserialize, Serialize};

/// Logical schema constants of the database stored in a bank.
///
/// A record is an index (primary key) field followed by a data field. Region
/// sizes that do not apply to an architecture stay zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseProfile {
    /// Full record width in bytes
    pub total_record_size_bytes: usize,
    /// Index (PI / key) field width in bytes
    pub total_index_size_bytes: usize,
    /// Hitmaps kept next to the records, one bit per record each
    #[serde(default)]
    pub hitmap_count: usize,
    /// Bytes reserved for BLIMP program code
    #[serde(default)]
    pub blimp_code_region_size_bytes: usize,
    /// Bytes reserved for BLIMP scratch space
    #[serde(default)]
    pub blimp_temporary_region_size_bytes: usize,
    /// Rows reserved for AMBIT temporaries (the D group)
    #[serde(default)]
    pub ambit_temporary_bits: usize,
}

impl DatabaseProfile {
    /// Creates a schema without reserved regions or hitmaps.
    ///
    /// # Errors
    ///
    /// See [`DatabaseProfile::validate`].
    pub fn new(record_bytes: usize, index_bytes: usize) -> Result<Self, ConfigError> {
        let profile = Self {
            total_record_size_bytes: record_bytes,
            total_index_size_bytes: index_bytes,
            hitmap_count: 0,
            blimp_code_region_size_bytes: 0,
            blimp_temporary_region_size_bytes: 0,
            ambit_temporary_bits: 0,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Sets the number of hitmaps.
    pub fn with_hitmaps(mut self, hitmap_count: usize) -> Self {
        self.hitmap_count = hitmap_count;
        self
    }

    /// Sets the BLIMP code and scratch region sizes in bytes.
    pub fn with_blimp_regions(mut self, code_bytes: usize, temporary_bytes: usize) -> Self {
        self.blimp_code_region_size_bytes = code_bytes;
        self.blimp_temporary_region_size_bytes = temporary_bytes;
        self
    }

    /// Sets the number of AMBIT temporary rows.
    pub fn with_ambit_temporaries(mut self, bits: usize) -> Self {
        self.ambit_temporary_bits = bits;
        self
    }

    /// Checks `record >= index` and `record > 0`.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Zero`] for an empty record
    /// * [`ConfigError::IndexLargerThanRecord`] if the index does not fit the record
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_record_size_bytes == 0 {
            return Err(ConfigError::Zero {
                field: "total_record_size_bytes",
            });
        }
        if self.total_index_size_bytes > self.total_record_size_bytes {
            return Err(ConfigError::IndexLargerThanRecord {
                record_bytes: self.total_record_size_bytes,
                index_bytes: self.total_index_size_bytes,
            });
        }
        Ok(())
    }

    /// Width of the data (non-index) part of a record.
    pub fn total_data_size_bytes(&self) -> usize {
        self.total_record_size_bytes - self.total_index_size_bytes
    }

    /// Rows for the BLIMP code region.
    pub fn blimp_code_rows(&self, row_buffer_bytes: usize) -> usize {
        rows_for_bytes(self.blimp_code_region_size_bytes, row_buffer_bytes)
    }

    /// Rows for the BLIMP scratch region.
    pub fn blimp_temporary_rows(&self, row_buffer_bytes: usize) -> usize {
        rows_for_bytes(self.blimp_temporary_region_size_bytes, row_buffer_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_size() {
        let db = DatabaseProfile::new(64, 8).unwrap();
        assert_eq!(db.total_data_size_bytes(), 56);
    }

    #[test]
    fn test_index_larger_than_record() {
        assert_eq!(
            DatabaseProfile::new(4, 8),
            Err(ConfigError::IndexLargerThanRecord {
                record_bytes: 4,
                index_bytes: 8
            })
        );
    }

    #[test]
    fn test_blimp_region_rows() {
        let db = DatabaseProfile::new(32, 4)
            .unwrap()
            .with_blimp_regions(2048, 1025);
        assert_eq!(db.blimp_code_rows(1024), 2);
        assert_eq!(db.blimp_temporary_rows(1024), 2);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let db: DatabaseProfile = serde_json::from_str(
            r#"{"total_record_size_bytes": 16, "total_index_size_bytes": 4}"#,
        )
        .unwrap();
        assert_eq!(db.hitmap_count, 0);
        assert_eq!(db.ambit_temporary_bits, 0);
    }
}
