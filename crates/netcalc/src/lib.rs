//! Network calculation utilities
//!
//! Pure helper functions shared by the netpool allocation engine:
//! - **Tag ranges**: parsing of human-readable VLAN/VXLAN range strings
//!   (`"10-20,30"`) into validated `{min, max}` pairs
//! - **Subnet arithmetic**: bidirectional mapping between allocation pool
//!   indexes and dotted IPv4 subnet addresses
//!
//! Everything in this crate is synchronous and side-effect free.

pub mod error;
pub mod ranges;
pub mod subnet;

pub use error::NetCalcError;
pub use ranges::{TagKind, TagRange, parse_tag_ranges};
pub use subnet::{subnet_index, subnet_ip};
