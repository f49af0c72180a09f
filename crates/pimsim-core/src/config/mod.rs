//! Hardware and database profiles and their JSON persistence.
//!
//! A system configuration file holds both profiles under the keys `hardware`
//! and `database`; each is a flat map of the profile's field names.

mod database;
mod hardware;

pub use self::database::DatabaseProfile;
pub use self::hardware::{
    AMBIT_CONTROL_GROUP_ROWS, AmbitCaps, BlimpCaps, BlimpVectorCaps, HardwareProfile,
};

use crate::error::Result;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Hardware and database profile pair describing one simulated bank.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Physical bank constants
    pub hardware: HardwareProfile,
    /// Logical schema constants
    pub database: DatabaseProfile,
}

impl SystemConfig {
    /// Loads and validates a configuration from a JSON file.
    ///
    /// # Arguments
    ///
    /// * `filepath` - Path to the JSON configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if either
    /// profile fails validation.
    pub fn from_jsonfile(filepath: impl AsRef<Path>) -> Result<SystemConfig> {
        let config: SystemConfig = read_json(filepath)?;
        config.hardware.validate()?;
        config.database.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save(&self, filepath: impl AsRef<Path>) -> Result<()> {
        write_json(filepath, self)
    }
}

/// Reads a JSON document into `T`.
pub(crate) fn read_json<T: DeserializeOwned>(filepath: impl AsRef<Path>) -> Result<T> {
    let filepath = filepath.as_ref();
    debug!("reading {}", filepath.display());
    let mut file = File::open(filepath)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Writes `value` as pretty-printed JSON.
pub(crate) fn write_json<T: Serialize>(filepath: impl AsRef<Path>, value: &T) -> Result<()> {
    let filepath = filepath.as_ref();
    debug!("writing {}", filepath.display());
    let file = File::create(filepath)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Size;

    #[test]
    fn test_system_config_roundtrip() -> anyhow::Result<()> {
        let config = SystemConfig {
            hardware: HardwareProfile::new(Size::MB(1), Size::KB(1), 32.0, 14.0, 14.0)?
                .with_ambit(AmbitCaps {
                    ambit_compute_register_rows: 4,
                    ambit_dcc_rows: 2,
                }),
            database: DatabaseProfile::new(32, 4)?.with_hitmaps(1),
        };
        let path = std::env::temp_dir().join("pimsim-system-config-roundtrip.json");
        config.save(&path)?;
        let loaded = SystemConfig::from_jsonfile(&path)?;
        std::fs::remove_file(&path)?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_invalid_profile_rejected_on_load() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join("pimsim-system-config-invalid.json");
        std::fs::write(
            &path,
            r#"{
                "hardware": {
                    "bank_size_bytes": 1000, "row_buffer_size_bytes": 64,
                    "time_to_row_activate_ns": 1, "time_to_column_activate_ns": 1,
                    "time_to_precharge_ns": 1, "time_to_bank_communicate_ns": 1,
                    "cpu_frequency": 1
                },
                "database": {"total_record_size_bytes": 8, "total_index_size_bytes": 4}
            }"#,
        )?;
        let result = SystemConfig::from_jsonfile(&path);
        std::fs::remove_file(&path)?;
        assert!(matches!(
            result,
            Err(crate::Error::Config(
                crate::error::ConfigError::BankNotRowAligned { .. }
            ))
        ));
        Ok(())
    }
}
