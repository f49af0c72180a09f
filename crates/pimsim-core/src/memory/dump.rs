use super::{Bank, DEFAULT_BYTE, Word};
use crate::config::HardwareProfile;
use crate::error::{Error, Result};
use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

fn ascii(byte: u8) -> char {
    if (0x20..=0x7E).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}

fn malformed(line: usize, reason: impl Into<String>) -> Error {
    Error::Dump {
        line,
        reason: reason.into(),
    }
}

impl Bank {
    /// Writes the bank in its text dump format.
    ///
    /// The first line holds the hardware profile as a JSON object. Every row
    /// follows on its own line as
    /// `AAAAAAAA:  XX XX .. XX  ascii`, where `AAAAAAAA` is the byte address of
    /// the row in uppercase hex and the ASCII column shows printable bytes as
    /// themselves and everything else as `.`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_dump<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_json::to_writer(&mut *writer, &self.hardware)?;
        writer.write_all(b"\n")?;
        let rb = self.row_bytes();
        for (index, row) in self.memory.chunks_exact(rb).enumerate() {
            write!(writer, "{:08X}:  ", index * rb)?;
            for byte in row {
                write!(writer, "{:02X} ", byte)?;
            }
            writer.write_all(b" ")?;
            let text: String = row.iter().map(|&b| ascii(b)).collect();
            writer.write_all(text.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Saves the bank dump to a file, see [`Bank::write_dump`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_dump(&mut writer)?;
        writer.flush()?;
        info!("bank dump saved to {}", path.display());
        Ok(())
    }

    /// Parses a bank dump produced by [`Bank::write_dump`].
    ///
    /// Only the address and hex columns are read; the ASCII column is ignored.
    /// Rows are initialized with [`DEFAULT_BYTE`] as the padding byte.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile line is not valid JSON, if a row line is
    /// malformed or out of order, or if the row count or widths do not match
    /// the profile.
    pub fn read_dump<R: BufRead>(reader: R) -> Result<Bank> {
        let mut lines = reader.lines();
        let header = lines
            .next()
            .ok_or_else(|| malformed(1, "missing hardware profile"))??;
        let hardware: HardwareProfile = serde_json::from_str(&header)?;
        hardware.validate()?;
        let rb = hardware.row_buffer_size_bytes;
        let mut rows = Vec::with_capacity(hardware.bank_rows());
        for (index, line) in lines.enumerate() {
            let line = line?;
            let lineno = index + 2;
            if line.is_empty() {
                continue;
            }
            let mut parts = line.splitn(3, "  ");
            let address = parts
                .next()
                .and_then(|a| a.strip_suffix(':'))
                .ok_or_else(|| malformed(lineno, "missing address"))?;
            let address = usize::from_str_radix(address, 16)
                .map_err(|e| malformed(lineno, format!("bad address: {}", e)))?;
            if address != rows.len() * rb {
                return Err(malformed(
                    lineno,
                    format!("expected address {:08X}", rows.len() * rb),
                ));
            }
            let hex = parts
                .next()
                .ok_or_else(|| malformed(lineno, "missing row bytes"))?;
            let bytes = hex
                .split_whitespace()
                .map(|b| u8::from_str_radix(b, 16))
                .collect::<std::result::Result<Vec<u8>, _>>()
                .map_err(|e| malformed(lineno, format!("bad byte: {}", e)))?;
            if bytes.len() != rb {
                return Err(malformed(
                    lineno,
                    format!("row has {} bytes, expected {}", bytes.len(), rb),
                ));
            }
            rows.push(Word::from_be_bytes(bytes));
        }
        Bank::from_rows(hardware, DEFAULT_BYTE, &rows)
    }

    /// Loads a bank dump from a file, see [`Bank::read_dump`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Bank> {
        let file = File::open(path.as_ref())?;
        Bank::read_dump(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::HardwareProfile;
    use crate::memory::{Bank, DEFAULT_BYTE, Word};
    use crate::util::Size;

    fn bank() -> Bank {
        let hw = HardwareProfile::new(Size::B(32), Size::B(8), 1.0, 2.0, 3.0).unwrap();
        let mut bank = Bank::new(hw, DEFAULT_BYTE).unwrap();
        bank.set_row(0, &Word::from_be_bytes(*b"pimsim  ")).unwrap();
        bank.set_row(2, &Word::from_u128(0x0001_0203_0405_0607, 8).unwrap())
            .unwrap();
        bank
    }

    #[test]
    fn test_dump_format() {
        let mut out = Vec::new();
        bank().write_dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with('{'));
        assert_eq!(lines[1], "00000000:  70 69 6D 73 69 6D 20 20  pimsim  ");
        assert_eq!(lines[2], "00000008:  FF FF FF FF FF FF FF FF  ........");
        assert_eq!(lines[3], "00000010:  00 01 02 03 04 05 06 07  ........");
    }

    #[test]
    fn test_dump_roundtrip() {
        let original = bank();
        let mut out = Vec::new();
        original.write_dump(&mut out).unwrap();
        let loaded = Bank::read_dump(out.as_slice()).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_truncated_dump_rejected() {
        let mut out = Vec::new();
        bank().write_dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let truncated: String = text.lines().take(3).map(|l| format!("{}\n", l)).collect();
        assert!(Bank::read_dump(truncated.as_bytes()).is_err());
    }
}
