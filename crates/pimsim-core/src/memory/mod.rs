//! The `memory` module provides the simulated DRAM bank and its row value type.
//!
//! - [`Word`]: a fixed-width big-endian unsigned value used for rows, records and buckets.
//! - [`Bank`]: a row-addressable bank backed by one contiguous byte arena, with
//!   width-checked row access and the AMBIT row primitives (copy, invert, and
//!   triple-row activation).
//!
//! Banks can be written to and read from the text dump format, see [`Bank::save`].
mod dump;
mod word;

pub use self::word::Word;

use crate::config::HardwareProfile;
use crate::error::{RangeError, Result};
use log::{debug, trace};

/// Byte every row is initialized with unless configured otherwise.
pub const DEFAULT_BYTE: u8 = 0xFF;

/// A simulated DRAM bank.
///
/// Rows are `row_buffer_size_bytes` wide and live back to back in a single
/// allocation. Row access is bounds checked and every write is width checked.
#[derive(Clone, PartialEq)]
pub struct Bank {
    hardware: HardwareProfile,
    default_byte: u8,
    memory: Vec<u8>,
}

impl std::fmt::Debug for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bank")
            .field("rows", &self.row_count())
            .field("row_buffer_bytes", &self.row_bytes())
            .field("default_byte", &format_args!("{:#04x}", self.default_byte))
            .finish()
    }
}

impl Bank {
    /// Creates a bank with every byte set to `default_byte`.
    ///
    /// # Errors
    ///
    /// Returns an error if the hardware profile is invalid.
    pub fn new(hardware: HardwareProfile, default_byte: u8) -> Result<Self> {
        hardware.validate()?;
        let memory = vec![default_byte; hardware.bank_size_bytes];
        debug!(
            "bank of {} rows x {} B initialized to {:#04x}",
            hardware.bank_rows(),
            hardware.row_buffer_size_bytes,
            default_byte
        );
        Ok(Self {
            hardware,
            default_byte,
            memory,
        })
    }

    /// Creates a bank from explicit row values.
    ///
    /// # Errors
    ///
    /// * [`RangeError::RowIndex`] if the number of rows differs from the bank's row count
    /// * [`RangeError::Width`] if a row value does not fit the row buffer
    pub fn from_rows(hardware: HardwareProfile, default_byte: u8, rows: &[Word]) -> Result<Self> {
        hardware.validate()?;
        let bank_rows = hardware.bank_rows();
        if rows.len() != bank_rows {
            return Err(RangeError::RowIndex {
                index: rows.len(),
                rows: bank_rows,
            }
            .into());
        }
        let mut bank = Self {
            memory: Vec::with_capacity(hardware.bank_size_bytes),
            hardware,
            default_byte,
        };
        let width = bank.row_bytes();
        for row in rows {
            let row = row.resized(width)?;
            bank.memory.extend_from_slice(row.as_bytes());
        }
        Ok(bank)
    }

    /// The hardware profile this bank was built from.
    pub fn hardware(&self) -> &HardwareProfile {
        &self.hardware
    }

    /// Byte used to pad partially filled rows.
    pub fn default_byte(&self) -> u8 {
        self.default_byte
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.hardware.bank_rows()
    }

    /// Row width in bytes.
    pub fn row_bytes(&self) -> usize {
        self.hardware.row_buffer_size_bytes
    }

    /// Row width in bits.
    pub fn row_bits(&self) -> usize {
        self.hardware.row_buffer_bits()
    }

    fn span(&self, index: usize) -> std::result::Result<std::ops::Range<usize>, RangeError> {
        let rows = self.row_count();
        if index >= rows {
            return Err(RangeError::RowIndex { index, rows });
        }
        let start = index * self.row_bytes();
        Ok(start..start + self.row_bytes())
    }

    /// Borrowed view of a row's bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::RowIndex`] if `index` is out of bounds.
    pub fn row(&self, index: usize) -> Result<&[u8]> {
        let span = self.span(index)?;
        Ok(&self.memory[span])
    }

    /// Reads a row.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::RowIndex`] if `index` is out of bounds.
    pub fn get_row(&self, index: usize) -> Result<Word> {
        Ok(Word::from_be_bytes(self.row(index)?))
    }

    /// Writes a row.
    ///
    /// Narrower values are zero extended; wider values are accepted as long as
    /// the extra leading bytes are zero.
    ///
    /// # Errors
    ///
    /// * [`RangeError::RowIndex`] if `index` is out of bounds
    /// * [`RangeError::Width`] if `value >= 2^(row_buffer_bits)`
    pub fn set_row(&mut self, index: usize, value: &Word) -> Result<()> {
        let span = self.span(index)?;
        let value = value.resized(self.row_bytes())?;
        trace!("set row {} ({:#010x})", index, span.start);
        self.memory[span].copy_from_slice(value.as_bytes());
        Ok(())
    }

    /// Sets every byte of a row to `byte`.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::RowIndex`] if `index` is out of bounds.
    pub fn fill_row(&mut self, index: usize, byte: u8) -> Result<()> {
        let span = self.span(index)?;
        self.memory[span].fill(byte);
        Ok(())
    }

    /// Bitwise complement of a row, masked to the row width.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::RowIndex`] if `index` is out of bounds.
    pub fn invert(&self, index: usize) -> Result<Word> {
        debug!("inverting row {:#010x}", index * self.row_bytes());
        Ok(!&self.get_row(index)?)
    }

    /// Copies row `src` over row `dst` (AMBIT RowClone).
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::RowIndex`] if either row is out of bounds.
    pub fn copy_row(&mut self, src: usize, dst: usize) -> Result<()> {
        let from = self.span(src)?;
        let to = self.span(dst)?;
        debug!(
            "copying row {:#010x} to row {:#010x}",
            from.start, to.start
        );
        self.memory.copy_within(from, to.start);
        Ok(())
    }

    /// Triple-row activation.
    ///
    /// Computes the bitwise majority of rows `a`, `b` and `c`, optionally
    /// complemented, and writes the result to all three rows. Returns the
    /// value written.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::RowIndex`] if any row is out of bounds.
    pub fn triple_row_activate(&mut self, a: usize, b: usize, c: usize, invert: bool) -> Result<Word> {
        let rb = self.row_bytes();
        debug!(
            "TRA rows {:#010x}, {:#010x}, {:#010x}{}",
            a * rb,
            b * rb,
            c * rb,
            if invert { " (inverted)" } else { "" }
        );
        let majority = Word::majority(&self.get_row(a)?, &self.get_row(b)?, &self.get_row(c)?);
        let result = if invert { !&majority } else { majority };
        for row in [a, b, c] {
            self.set_row(row, &result)?;
        }
        Ok(result)
    }
}
