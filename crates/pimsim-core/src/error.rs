//! Error taxonomy shared by the planner, the bank substrate and the placement engine.
//!
//! Every failure is fatal for the run that produced it. The four classes are kept
//! apart so callers can tell a bad configuration ([`ConfigError`]) from a
//! programming defect ([`RangeError`], [`InvariantViolation`]) and from a bank
//! that is simply too small ([`CapacityError`]).

use thiserror::Error;

/// Invalid hardware or database configuration, raised while building profiles or planning.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The bank size is not a whole number of rows.
    #[error("bank size {bank_bytes} B is not a multiple of the row buffer size {row_buffer_bytes} B")]
    BankNotRowAligned {
        /// Configured bank size in bytes
        bank_bytes: usize,
        /// Configured row buffer size in bytes
        row_buffer_bytes: usize,
    },
    /// A size that must be positive is zero.
    #[error("{field} must be greater than zero")]
    Zero {
        /// Name of the offending field
        field: &'static str,
    },
    /// A timing constant is negative or not finite.
    #[error("{field} must be a finite, non-negative number of nanoseconds (got {value})")]
    Timing {
        /// Name of the offending field
        field: &'static str,
        /// Configured value
        value: f64,
    },
    /// The index field is larger than the record it belongs to.
    #[error("index size {index_bytes} B exceeds record size {record_bytes} B")]
    IndexLargerThanRecord {
        /// Configured record size in bytes
        record_bytes: usize,
        /// Configured index size in bytes
        index_bytes: usize,
    },
    /// Reserved regions do not fit into the bank.
    #[error("not enough bank rows to satisfy static row constraints ({reserved} reserved, {bank_rows} available)")]
    InsufficientRows {
        /// Rows claimed by fixed-size regions
        reserved: usize,
        /// Rows in the bank
        bank_rows: usize,
    },
    /// Variable regions leave no room for a single record.
    #[error("not enough bank rows to satisfy dynamic row constraints")]
    NoRecordsPlaceable,
    /// Item size and row buffer size do not divide each other.
    #[error("{item} size {item_bytes} B must be row buffer aligned to at least a power of two (row buffer {row_buffer_bytes} B)")]
    NotRowBufferAligned {
        /// Which item was checked ("record" or "index")
        item: &'static str,
        /// Item size in bytes
        item_bytes: usize,
        /// Row buffer size in bytes
        row_buffer_bytes: usize,
    },
    /// The layout needs a hardware capability the profile does not provide.
    #[error("layout {layout} requires {capability} hardware capabilities")]
    MissingCapability {
        /// Layout that was requested
        layout: String,
        /// Missing capability ("BLIMP" or "AMBIT")
        capability: &'static str,
    },
    /// The layout name could not be parsed.
    #[error("unknown layout kind '{0}'")]
    UnknownLayout(String),
    /// A region name in a layout file could not be parsed.
    #[error("unknown region '{0}'")]
    UnknownRegion(String),
    /// The layout cannot place the requested item kind.
    #[error("layout {layout} cannot place {item} items")]
    UnsupportedItem {
        /// Layout that was requested
        layout: String,
        /// Item kind that was requested
        item: &'static str,
    },
    /// A bank or record source does not match the profiles a layout was planned for.
    #[error("{what} mismatch: layout expects {expected}, got {actual}")]
    Mismatch {
        /// What was compared
        what: &'static str,
        /// Value from the layout's profiles
        expected: usize,
        /// Value found
        actual: usize,
    },
    /// Hash table bucket counts are invalid.
    #[error("initial bucket count {0} must be a non-zero power of two")]
    BucketCount(usize),
    /// The initial bucket count exceeds the maximum.
    #[error("initial bucket count {initial} exceeds maximum bucket count {maximum}")]
    BucketBounds {
        /// Requested initial buckets
        initial: usize,
        /// Requested maximum buckets
        maximum: usize,
    },
}

/// Out-of-range row index, row value or field value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// Row index beyond the end of the bank.
    #[error("row {index} is out of bounds for a bank of {rows} rows")]
    RowIndex {
        /// Requested row
        index: usize,
        /// Rows in the bank
        rows: usize,
    },
    /// A value does not fit into the declared byte width.
    #[error("value needs {needed} bytes but the field is only {width} bytes wide")]
    Width {
        /// Significant bytes of the value
        needed: usize,
        /// Declared width in bytes
        width: usize,
    },
    /// A region reaches past the end of the bank.
    #[error("region ({start}, {rows}) exceeds a bank of {bank_rows} rows")]
    Region {
        /// First row of the region
        start: usize,
        /// Rows in the region
        rows: usize,
        /// Rows in the bank
        bank_rows: usize,
    },
    /// Item index beyond the items stored in a region.
    #[error("item {index} is outside the {capacity} items stored in the region")]
    Item {
        /// Requested item
        index: usize,
        /// Items the region can hold
        capacity: usize,
    },
}

/// A structure outgrew the space it was given.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapacityError {
    /// The hash table already uses all of its buckets.
    #[error("hashmap capacity exceeded ({maximum} buckets)")]
    Buckets {
        /// Maximum bucket count of the table
        maximum: usize,
    },
    /// A region has fewer rows than the data written into it.
    #[error("region of {rows} rows cannot hold {needed} rows of output")]
    RegionExhausted {
        /// Rows available
        rows: usize,
        /// Rows needed
        needed: usize,
    },
}

/// The planner produced an inconsistent result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The greedy heuristic placed more rows than were free.
    #[error("heuristic placement failed: {placed} rows placed but only {free} free")]
    HeuristicOverflow {
        /// Rows placed by the heuristic
        placed: usize,
        /// Rows available to it
        free: usize,
    },
    /// Two mapped regions share rows.
    #[error("regions {a} and {b} overlap")]
    Overlap {
        /// First region name
        a: String,
        /// Second region name
        b: String,
    },
    /// A mapped region lies outside the bank.
    #[error("region {name} ({start}, {rows}) lies outside a bank of {bank_rows} rows")]
    OutOfBank {
        /// Region name
        name: String,
        /// First row of the region
        start: usize,
        /// Rows in the region
        rows: usize,
        /// Rows in the bank
        bank_rows: usize,
    },
}

/// Errors returned by `pimsim-core`.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    #[error("malformed bank dump at line {line}: {reason}")]
    Dump { line: usize, reason: String },
}

/// Result type used throughout `pimsim-core`.
pub type Result<T> = std::result::Result<T, Error>;
