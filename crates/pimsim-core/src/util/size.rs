use serde::{Deserialize, Serialize};

/// Byte size representation supporting common units.
///
/// All units use binary (base-2) multipliers (1 KB = 1024 bytes). Bank and row
/// buffer sizes in hardware profiles are plain byte counts; `Size` is a
/// convenience for building them and for printing them.
///
/// # Examples
///
/// ```
/// use pimsim_core::util::Size;
///
/// let bank = Size::MB(32);
/// assert_eq!(bank.bytes(), 32 * 1024 * 1024);
/// assert_eq!(bank.rows(Size::KB(1).bytes()), 32768);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Size {
    /// Size in bytes
    B(usize),
    /// Size in kilobytes (1 KB = 1024 bytes)
    KB(usize),
    /// Size in megabytes (1 MB = 1024 KB)
    MB(usize),
    /// Size in gigabytes (1 GB = 1024 MB)
    GB(usize),
}

impl Size {
    /// Converts this size to bytes.
    pub const fn bytes(&self) -> usize {
        match self {
            Size::B(bytes) => *bytes,
            Size::KB(kb) => *kb * (1 << 10),
            Size::MB(mb) => *mb * (1 << 20),
            Size::GB(gb) => *gb * (1 << 30),
        }
    }

    /// Number of whole rows of `row_buffer_bytes` this size spans.
    pub const fn rows(&self, row_buffer_bytes: usize) -> usize {
        self.bytes() / row_buffer_bytes
    }

    /// Expresses `bytes` in the largest unit that represents it exactly.
    ///
    /// ```
    /// use pimsim_core::util::Size;
    ///
    /// assert_eq!(Size::from_bytes(8192), Size::KB(8));
    /// assert_eq!(Size::from_bytes(1 << 30), Size::GB(1));
    /// assert_eq!(Size::from_bytes(1000), Size::B(1000));
    /// ```
    pub const fn from_bytes(bytes: usize) -> Size {
        if bytes != 0 && bytes % (1 << 30) == 0 {
            Size::GB(bytes >> 30)
        } else if bytes != 0 && bytes % (1 << 20) == 0 {
            Size::MB(bytes >> 20)
        } else if bytes != 0 && bytes % (1 << 10) == 0 {
            Size::KB(bytes >> 10)
        } else {
            Size::B(bytes)
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Size::B(bytes) => write!(f, "{} B", bytes),
            Size::KB(kb) => write!(f, "{} KB", kb),
            Size::MB(mb) => write!(f, "{} MB", mb),
            Size::GB(gb) => write!(f, "{} GB", gb),
        }
    }
}
