use crate::error::ConfigError;
use crate::util::Size;
use serde::{Deserialize, Serialize};

/// Rows in the AMBIT control group (C0 all zeros, C1 all ones).
pub const AMBIT_CONTROL_GROUP_ROWS: usize = 2;

/// Physical constants of one simulated DRAM bank.
///
/// The profile is a flat record: BLIMP and AMBIT capability fields are stored
/// next to the base fields when serialized, and a capability is present when
/// all of its fields are.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HardwareProfile {
    /// Bank size in bytes
    pub bank_size_bytes: usize,
    /// Row buffer width in bytes
    pub row_buffer_size_bytes: usize,
    /// tRAS, row activation time
    pub time_to_row_activate_ns: f64,
    /// tCAS, column access time
    pub time_to_column_activate_ns: f64,
    /// tRP, precharge time
    pub time_to_precharge_ns: f64,
    /// Time to move one row buffer between the bank and the host
    pub time_to_bank_communicate_ns: f64,
    /// Host CPU frequency in Hz
    pub cpu_frequency: u64,
    /// BLIMP bit-serial processor attached to the bank
    #[serde(flatten)]
    pub blimp: Option<BlimpCaps>,
    /// AMBIT triple-row-activation support
    #[serde(flatten)]
    pub ambit: Option<AmbitCaps>,
}

/// BLIMP processor constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlimpCaps {
    /// BLIMP core frequency in Hz
    pub blimp_frequency: u64,
    /// Time to transfer a row into the BLIMP V0 register
    pub time_to_v0_transfer_ns: f64,
    /// Native word size of the BLIMP core in bits
    pub blimp_processor_bit_architecture: usize,
    /// Vector extension (BLIMP-V)
    #[serde(flatten)]
    pub vector: Option<BlimpVectorCaps>,
}

impl BlimpCaps {
    /// Duration of one BLIMP cycle.
    pub fn time_per_blimp_cycle_ns(&self) -> f64 {
        1.0 / self.blimp_frequency as f64 * 1_000_000_000.0
    }
}

/// BLIMP-V vector unit constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct BlimpVectorCaps {
    #[serde(rename = "number_of_vALUs")]
    pub number_of_valus: usize,
    #[serde(rename = "number_of_vFPUs")]
    pub number_of_vfpus: usize,
    /// Widest selected element width in bytes
    pub blimpv_sew_max_bytes: usize,
    /// Narrowest selected element width in bytes
    pub blimpv_sew_min_bytes: usize,
}

impl BlimpVectorCaps {
    /// Elements of `sew_bytes` held by one row buffer, if the width is supported.
    pub fn elements_per_row(&self, row_buffer_bytes: usize, sew_bytes: usize) -> Option<usize> {
        if sew_bytes < self.blimpv_sew_min_bytes || sew_bytes > self.blimpv_sew_max_bytes {
            return None;
        }
        Some(row_buffer_bytes / sew_bytes)
    }
}

/// AMBIT reserved-row constants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbitCaps {
    /// Compute (T) register rows
    pub ambit_compute_register_rows: usize,
    /// Dual-contact-cell pairs; each pair takes two rows
    pub ambit_dcc_rows: usize,
}

impl AmbitCaps {
    /// Rows of the control group.
    pub const fn ambit_control_group_rows(&self) -> usize {
        AMBIT_CONTROL_GROUP_ROWS
    }

    /// All rows AMBIT pins to the tail of the bank: control, DCC and compute.
    pub const fn reserved_rows(&self) -> usize {
        self.ambit_dcc_rows * 2 + AMBIT_CONTROL_GROUP_ROWS + self.ambit_compute_register_rows
    }
}

impl HardwareProfile {
    /// Creates a CPU-only profile with the given geometry and timings.
    ///
    /// # Arguments
    ///
    /// * `bank` - Bank size
    /// * `row_buffer` - Row buffer size
    /// * `t_ras`, `t_cas`, `t_rp` - Row activation, column access and precharge times in ns
    ///
    /// # Errors
    ///
    /// Returns an error if the bank is not a whole number of rows, see [`HardwareProfile::validate`].
    pub fn new(
        bank: Size,
        row_buffer: Size,
        t_ras: f64,
        t_cas: f64,
        t_rp: f64,
    ) -> Result<Self, ConfigError> {
        let profile = Self {
            bank_size_bytes: bank.bytes(),
            row_buffer_size_bytes: row_buffer.bytes(),
            time_to_row_activate_ns: t_ras,
            time_to_column_activate_ns: t_cas,
            time_to_precharge_ns: t_rp,
            time_to_bank_communicate_ns: 0.0,
            cpu_frequency: 0,
            blimp: None,
            ambit: None,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Adds BLIMP capabilities.
    pub fn with_blimp(mut self, blimp: BlimpCaps) -> Self {
        self.blimp = Some(blimp);
        self
    }

    /// Adds AMBIT capabilities.
    pub fn with_ambit(mut self, ambit: AmbitCaps) -> Self {
        self.ambit = Some(ambit);
        self
    }

    /// Checks the geometry and timing constants.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Zero`] if the row buffer or bank is empty
    /// * [`ConfigError::BankNotRowAligned`] if the bank is not a whole number of rows
    /// * [`ConfigError::Timing`] if a timing constant is negative or not finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.row_buffer_size_bytes == 0 {
            return Err(ConfigError::Zero {
                field: "row_buffer_size_bytes",
            });
        }
        if self.bank_size_bytes == 0 {
            return Err(ConfigError::Zero {
                field: "bank_size_bytes",
            });
        }
        if self.bank_size_bytes % self.row_buffer_size_bytes != 0 {
            return Err(ConfigError::BankNotRowAligned {
                bank_bytes: self.bank_size_bytes,
                row_buffer_bytes: self.row_buffer_size_bytes,
            });
        }
        let mut timings = vec![
            ("time_to_row_activate_ns", self.time_to_row_activate_ns),
            ("time_to_column_activate_ns", self.time_to_column_activate_ns),
            ("time_to_precharge_ns", self.time_to_precharge_ns),
            ("time_to_bank_communicate_ns", self.time_to_bank_communicate_ns),
        ];
        if let Some(blimp) = &self.blimp {
            timings.push(("time_to_v0_transfer_ns", blimp.time_to_v0_transfer_ns));
            if blimp.blimp_frequency == 0 {
                return Err(ConfigError::Zero {
                    field: "blimp_frequency",
                });
            }
        }
        for (field, value) in timings {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Timing { field, value });
            }
        }
        Ok(())
    }

    /// Rows in the bank.
    pub fn bank_rows(&self) -> usize {
        self.bank_size_bytes / self.row_buffer_size_bytes
    }

    /// Row buffer width in bits; also the number of items in one bit-plane page.
    pub fn row_buffer_bits(&self) -> usize {
        self.row_buffer_size_bytes * 8
    }

    /// Rows AMBIT reserves at the tail of the bank, zero without AMBIT.
    pub fn ambit_reserved_rows(&self) -> usize {
        self.ambit.as_ref().map_or(0, AmbitCaps::reserved_rows)
    }

    /// Duration of an AAP (activate-activate-precharge) row clone.
    pub fn time_for_aap_rowclone_ns(&self) -> f64 {
        self.time_to_row_activate_ns * 2.0 + self.time_to_precharge_ns
    }

    /// Duration of a triple-row-activation majority.
    pub fn time_for_tra_maj_ns(&self) -> f64 {
        self.time_to_row_activate_ns + self.time_to_precharge_ns
    }

    /// Duration of one host CPU cycle, `None` if no CPU frequency is configured.
    pub fn time_per_cpu_cycle_ns(&self) -> Option<f64> {
        (self.cpu_frequency > 0).then(|| 1_000_000_000.0 / self.cpu_frequency as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> HardwareProfile {
        HardwareProfile::new(Size::MB(32), Size::KB(1), 32.0, 14.0, 14.0).unwrap()
    }

    #[test]
    fn test_bank_rows() {
        assert_eq!(base().bank_rows(), 32768);
        assert_eq!(base().row_buffer_bits(), 8192);
    }

    #[test]
    fn test_unaligned_bank_rejected() {
        let err = HardwareProfile::new(Size::B(1000), Size::B(64), 1.0, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::BankNotRowAligned { .. }));
    }

    #[test]
    fn test_negative_timing_rejected() {
        let err = HardwareProfile::new(Size::KB(4), Size::KB(1), -1.0, 1.0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Timing {
                field: "time_to_row_activate_ns",
                ..
            }
        ));
    }

    #[test]
    fn test_ambit_timings() {
        let hw = base().with_ambit(AmbitCaps {
            ambit_compute_register_rows: 6,
            ambit_dcc_rows: 2,
        });
        assert_eq!(hw.time_for_aap_rowclone_ns(), 78.0);
        assert_eq!(hw.time_for_tra_maj_ns(), 46.0);
        assert_eq!(hw.ambit_reserved_rows(), 12);
    }

    #[test]
    fn test_flat_serialization() {
        let hw = base().with_blimp(BlimpCaps {
            blimp_frequency: 200_000_000,
            time_to_v0_transfer_ns: 5.0,
            blimp_processor_bit_architecture: 64,
            vector: None,
        });
        let json = serde_json::to_value(&hw).unwrap();
        assert_eq!(json["blimp_frequency"], 200_000_000);
        assert!(json.get("ambit_dcc_rows").is_none());
        let back: HardwareProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, hw);
        let cycle = back.blimp.unwrap().time_per_blimp_cycle_ns();
        assert!((cycle - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_cpu_cycle() {
        let mut hw = base();
        assert_eq!(hw.time_per_cpu_cycle_ns(), None);
        hw.cpu_frequency = 2_000_000_000;
        assert_eq!(hw.time_per_cpu_cycle_ns(), Some(0.5));
    }

    #[test]
    fn test_vector_elements_per_row() {
        let vector = BlimpVectorCaps {
            number_of_valus: 32,
            number_of_vfpus: 0,
            blimpv_sew_max_bytes: 8,
            blimpv_sew_min_bytes: 1,
        };
        assert_eq!(vector.elements_per_row(1024, 4), Some(256));
        assert_eq!(vector.elements_per_row(1024, 16), None);
        let json = serde_json::to_value(&vector).unwrap();
        assert_eq!(json["number_of_vALUs"], 32);
    }
}
