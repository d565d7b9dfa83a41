//! Tenant-global network resource pools
//!
//! The allocation core of the fabric control plane: a tenant's declarative
//! network configuration ([`GlobalConfig`]) is validated once and transformed
//! into a live operational record ([`GlobalOper`]) owning four first-fit
//! allocation pools — subnets, shared VLANs, local VLANs and VXLANs — that
//! arbitrate id allocation for the rest of the deployment's lifetime.
//!
//! Allocation semantics:
//! - **First-fit**: every allocation returns the lowest available id, so
//!   allocation sequences are deterministic and reproducible.
//! - **Idempotent free**: freeing an already-free id is a no-op.
//! - **Coupled VXLAN allocation**: a VXLAN id is always paired with a local
//!   VLAN id, allocated all-or-nothing across both pools.
//! - **Reserved VLANs**: ids 0 and 4095 are never allocatable.
//!
//! The engine contains no internal locking: callers must serialize all
//! operations against one tenant's [`GlobalOper`] record (one lock or actor
//! per tenant). Records of different tenants are fully independent.
//! Persistence is explicit — mutate, then `write` through a
//! [`statestore::StateDriver`].

pub mod bitset;
pub mod config;
pub mod error;
pub mod oper;

#[cfg(test)]
mod oper_test;

pub use bitset::BitPool;
pub use config::{
    AutoParams, DeployParams, GlobalConfig, NET_TYPE_VLAN, NET_TYPE_VXLAN, SUPPORTED_VERSION,
    read_all_global_config,
};
pub use error::PoolError;
pub use oper::GlobalOper;
