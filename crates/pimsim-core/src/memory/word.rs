use crate::error::RangeError;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// Fixed-width unsigned value stored as big-endian bytes.
///
/// Row buffers are several KiB wide, far beyond native integers, so rows,
/// records and packed hash buckets are all carried as `Word`s. Bit positions
/// are counted from the most significant bit, the order in which rows are
/// transposed by the bit-plane encoder.
///
/// # Examples
///
/// ```
/// use pimsim_core::memory::Word;
///
/// let w = Word::from_u128(0b1010_0000, 1).unwrap();
/// assert!(w.msb_bit(0));
/// assert!(!w.msb_bit(1));
/// assert_eq!((!&w).to_u128(), Some(0b0101_1111));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Word {
    bytes: Vec<u8>,
}

impl Word {
    /// A zero value `width` bytes wide.
    pub fn zero(width: usize) -> Self {
        Self::filled(width, 0x00)
    }

    /// An all-ones value `width` bytes wide.
    pub fn ones(width: usize) -> Self {
        Self::filled(width, 0xFF)
    }

    /// A value of `width` bytes, each set to `byte`.
    pub fn filled(width: usize, byte: u8) -> Self {
        Self {
            bytes: vec![byte; width],
        }
    }

    /// Wraps big-endian bytes; the width is the number of bytes.
    pub fn from_be_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Encodes `value` into `width` big-endian bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::Width`] if `value` needs more than `width` bytes.
    pub fn from_u128(value: u128, width: usize) -> Result<Self, RangeError> {
        let needed = (128 - value.leading_zeros() as usize).div_ceil(8);
        if needed > width {
            return Err(RangeError::Width { needed, width });
        }
        let mut bytes = vec![0u8; width];
        let be = value.to_be_bytes();
        let take = width.min(be.len());
        bytes[width - take..].copy_from_slice(&be[be.len() - take..]);
        Ok(Self { bytes })
    }

    /// Encodes `value` into `width` big-endian bytes, see [`Word::from_u128`].
    pub fn from_u64(value: u64, width: usize) -> Result<Self, RangeError> {
        Self::from_u128(value as u128, width)
    }

    /// The value as a `u128`, or `None` if it does not fit.
    pub fn to_u128(&self) -> Option<u128> {
        if self.significant_bytes() > 16 {
            return None;
        }
        Some(
            self.bytes
                .iter()
                .fold(0u128, |acc, &b| (acc << 8) | b as u128),
        )
    }

    /// The value as a `u64`, or `None` if it does not fit.
    pub fn to_u64(&self) -> Option<u64> {
        self.to_u128().and_then(|v| u64::try_from(v).ok())
    }

    /// Width in bytes.
    pub fn width(&self) -> usize {
        self.bytes.len()
    }

    /// Width in bits.
    pub fn bits(&self) -> usize {
        self.bytes.len() * 8
    }

    /// Big-endian byte view.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the word, returning its big-endian bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Bytes needed to represent the value without leading zero bytes.
    pub fn significant_bytes(&self) -> usize {
        self.bytes.len() - self.bytes.iter().take_while(|&&b| b == 0).count()
    }

    /// Returns `true` if every bit is zero.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Bit `index`, counted from the most significant bit.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.bits()`.
    pub fn msb_bit(&self, index: usize) -> bool {
        (self.bytes[index / 8] >> (7 - index % 8)) & 1 == 1
    }

    /// Sets bit `index`, counted from the most significant bit.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.bits()`.
    pub fn set_msb_bit(&mut self, index: usize, bit: bool) {
        let mask = 1u8 << (7 - index % 8);
        if bit {
            self.bytes[index / 8] |= mask;
        } else {
            self.bytes[index / 8] &= !mask;
        }
    }

    /// Re-encodes the value with a different width.
    ///
    /// Narrowing drops leading zero bytes; widening prepends zero bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::Width`] if the value does not fit into `width` bytes.
    pub fn resized(&self, width: usize) -> Result<Word, RangeError> {
        let len = self.bytes.len();
        if width >= len {
            let mut bytes = vec![0u8; width - len];
            bytes.extend_from_slice(&self.bytes);
            return Ok(Word { bytes });
        }
        let needed = self.significant_bytes();
        if needed > width {
            return Err(RangeError::Width { needed, width });
        }
        Ok(Word {
            bytes: self.bytes[len - width..].to_vec(),
        })
    }

    /// Concatenates `self` (high part) with `low`.
    pub fn concat(&self, low: &Word) -> Word {
        let mut bytes = Vec::with_capacity(self.width() + low.width());
        bytes.extend_from_slice(&self.bytes);
        bytes.extend_from_slice(&low.bytes);
        Word { bytes }
    }

    /// Splits into a high part of `high_width` bytes and the remaining low part.
    ///
    /// # Panics
    ///
    /// Panics if `high_width > self.width()`.
    pub fn split(&self, high_width: usize) -> (Word, Word) {
        let (high, low) = self.bytes.split_at(high_width);
        (Word::from_be_bytes(high), Word::from_be_bytes(low))
    }

    /// Bitwise majority of three values: `(a & b) | (b & c) | (c & a)`.
    pub fn majority(a: &Word, b: &Word, c: &Word) -> Word {
        let width = a.width().max(b.width()).max(c.width());
        let (a, b, c) = (a.widened(width), b.widened(width), c.widened(width));
        let bytes = a
            .bytes
            .iter()
            .zip(b.bytes.iter())
            .zip(c.bytes.iter())
            .map(|((&a, &b), &c)| (a & b) | (b & c) | (c & a))
            .collect();
        Word { bytes }
    }

    fn widened(&self, width: usize) -> Word {
        if self.width() >= width {
            return self.clone();
        }
        let mut bytes = vec![0u8; width - self.width()];
        bytes.extend_from_slice(&self.bytes);
        Word { bytes }
    }

    fn zip_with(&self, rhs: &Word, f: impl Fn(u8, u8) -> u8) -> Word {
        let width = self.width().max(rhs.width());
        let (a, b) = (self.widened(width), rhs.widened(width));
        Word {
            bytes: a
                .bytes
                .iter()
                .zip(b.bytes.iter())
                .map(|(&x, &y)| f(x, y))
                .collect(),
        }
    }
}

impl Not for &Word {
    type Output = Word;

    fn not(self) -> Word {
        Word {
            bytes: self.bytes.iter().map(|b| !b).collect(),
        }
    }
}

impl BitAnd for &Word {
    type Output = Word;

    fn bitand(self, rhs: &Word) -> Word {
        self.zip_with(rhs, |a, b| a & b)
    }
}

impl BitOr for &Word {
    type Output = Word;

    fn bitor(self, rhs: &Word) -> Word {
        self.zip_with(rhs, |a, b| a | b)
    }
}

impl BitXor for &Word {
    type Output = Word;

    fn bitxor(self, rhs: &Word) -> Word {
        self.zip_with(rhs, |a, b| a ^ b)
    }
}

impl fmt::UpperHex for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.bytes {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

impl fmt::LowerHex for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.bytes {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width() <= 16 {
            write!(f, "Word({}B, {:#x})", self.width(), self.to_u128().unwrap_or(0))
        } else {
            write!(f, "Word({}B, 0x{:x})", self.width(), self)
        }
    }
}
