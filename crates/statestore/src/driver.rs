//! StateDriver trait
//!
//! Object-safe async trait over an ordered key/value store. Callers own
//! (de)serialization; the driver only moves bytes. One record per key.

use crate::error::StoreError;

/// Byte-oriented key/value driver for persisted control-plane state.
///
/// Implementations must be safe to share across tasks (`Send + Sync`);
/// the engine itself serializes access per tenant record, not per driver.
#[async_trait::async_trait]
pub trait StateDriver: Send + Sync {
    /// Write (create or replace) the record under `key`
    async fn write_state(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Read the record under `key`; `KeyNotFound` if absent
    async fn read_state(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Read every record whose key starts with `prefix`, in key order
    async fn read_all_state(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StoreError>;

    /// Remove the record under `key`; `KeyNotFound` if absent
    async fn clear_state(&self, key: &str) -> Result<(), StoreError>;
}
