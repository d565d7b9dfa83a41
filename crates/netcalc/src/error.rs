//! Netcalc errors

use thiserror::Error;

/// Errors produced by range parsing and subnet arithmetic
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetCalcError {
    /// A tag range item could not be parsed (non-numeric, too many dashes, ...)
    #[error("invalid {kind} range \"{item}\", expected e.g. \"10-50,70,100-120\"")]
    InvalidRange {
        /// Tag kind the range was parsed for ("vlan" or "vxlan")
        kind: &'static str,
        /// The offending item as it appeared in the input
        item: String,
    },

    /// A parsed range has min > max
    #[error("invalid {kind} range {min}-{max}: min exceeds max")]
    RangeInverted {
        /// Tag kind the range was parsed for
        kind: &'static str,
        /// Lower bound as parsed
        min: u32,
        /// Upper bound as parsed
        max: u32,
    },

    /// A tag value falls outside the id space for its kind
    #[error("{kind} id {value} outside valid range {lo}-{hi}")]
    TagOutOfBounds {
        /// Tag kind the range was parsed for
        kind: &'static str,
        /// The out-of-bounds value
        value: u32,
        /// Lowest valid id for this kind
        lo: u32,
        /// Highest valid id for this kind
        hi: u32,
    },

    /// The subnet pool base is not a valid IPv4 address
    #[error("invalid subnet pool address: {0}")]
    InvalidPoolAddress(String),

    /// Prefix lengths are inconsistent (subnet_len > alloc_subnet_len or > 32)
    #[error("invalid prefix lengths /{subnet_len} -> /{alloc_subnet_len}")]
    InvalidPrefixLengths {
        /// Prefix length of the whole pool
        subnet_len: u32,
        /// Prefix length of each allocated subnet
        alloc_subnet_len: u32,
    },

    /// An allocation index is outside the pool's capacity
    #[error("subnet index {index} outside pool capacity {capacity}")]
    IndexOutOfRange {
        /// The offending index
        index: u32,
        /// Number of allocatable subnets in the pool
        capacity: u64,
    },

    /// An address does not belong to the pool or is not allocation-aligned
    #[error("address {addr} is not an allocation boundary of pool {pool}/{subnet_len}")]
    AddressNotInPool {
        /// The offending address
        addr: String,
        /// Pool base address
        pool: String,
        /// Prefix length of the whole pool
        subnet_len: u32,
    },
}
