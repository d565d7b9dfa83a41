//! Allocation engine errors
//!
//! None of these is fatal to the process: validation errors reject a
//! configuration wholesale, exhaustion errors leave the pools unchanged and
//! are the caller's cue to retry after a free elsewhere.

use thiserror::Error;

use netcalc::NetCalcError;
use statestore::StoreError;

/// Errors that can occur validating configuration or operating the pools
#[derive(Debug, Error)]
pub enum PoolError {
    /// The configured subnet pool base is not a valid IPv4 address
    #[error("invalid subnet pool address: {0}")]
    InvalidSubnetPool(String),

    /// The configured default network type is neither "vlan" nor "vxlan"
    #[error("unsupported network type: {0}")]
    UnsupportedNetType(String),

    /// Inconsistent subnet prefix lengths
    #[error("pool prefix /{subnet_len} cannot be split into /{alloc_subnet_len} subnets")]
    InvalidSubnetLens {
        /// Prefix length of the whole pool
        subnet_len: u32,
        /// Prefix length of each allocated subnet
        alloc_subnet_len: u32,
    },

    /// The configuration carries a version this engine does not understand
    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    /// The configuration names no tenant
    #[error("tenant name is empty")]
    EmptyTenant,

    /// The shared VLAN pool has no free id left
    #[error("no vlans available")]
    NoVlansAvailable,

    /// The local VLAN pool has no free id left
    #[error("no local vlans available")]
    NoLocalVlansAvailable,

    /// The VXLAN pool has no free id left
    #[error("no vxlans available")]
    NoVxlansAvailable,

    /// The subnet pool has no free index left
    #[error("subnet pool exhausted")]
    SubnetExhausted,

    /// An explicitly requested VLAN id is already allocated or out of range
    #[error("vlan {0} is not available")]
    VlanNotAvailable(u32),

    /// Range parsing or subnet arithmetic failed
    #[error("calculation error: {0}")]
    Calc(#[from] NetCalcError),

    /// The state backend failed
    #[error("state store error: {0}")]
    Store(#[from] StoreError),

    /// A state record could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
