//! In-memory state driver for unit testing
//!
//! Stores records in an ordered map so prefix enumeration behaves like an
//! etcd-style backend. Cloning the driver shares the underlying store,
//! matching how a handle to a real backend would behave.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::driver::StateDriver;
use crate::error::StoreError;

/// In-memory `StateDriver` for tests
#[derive(Debug, Clone, Default)]
pub struct MemStateDriver {
    records: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemStateDriver {
    /// Create an empty driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored (for test assertions)
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no records are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[allow(clippy::unwrap_used, reason = "test-util: a poisoned store mutex is unrecoverable")]
    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.records.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl StateDriver for MemStateDriver {
    async fn write_state(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        debug!("writing state key {key} ({} bytes)", value.len());
        self.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn read_state(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    async fn read_all_state(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        let store = self.lock();
        Ok(store
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, value)| value.clone())
            .collect())
    }

    async fn clear_state(&self, key: &str) -> Result<(), StoreError> {
        debug!("clearing state key {key}");
        self.lock()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let driver = MemStateDriver::new();
        driver.write_state("/t/a", b"alpha").await.unwrap();

        assert_eq!(driver.read_state("/t/a").await.unwrap(), b"alpha");
    }

    #[tokio::test]
    async fn test_read_missing_key() {
        let driver = MemStateDriver::new();
        assert!(matches!(
            driver.read_state("/t/missing").await.unwrap_err(),
            StoreError::KeyNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_read_all_by_prefix() {
        let driver = MemStateDriver::new();
        driver.write_state("/t/config/a", b"a").await.unwrap();
        driver.write_state("/t/config/b", b"b").await.unwrap();
        driver.write_state("/t/oper/a", b"o").await.unwrap();

        let records = driver.read_all_state("/t/config/").await.unwrap();
        assert_eq!(records, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[tokio::test]
    async fn test_clear_removes_record() {
        let driver = MemStateDriver::new();
        driver.write_state("/t/a", b"alpha").await.unwrap();
        driver.clear_state("/t/a").await.unwrap();

        assert!(driver.is_empty());
        assert!(matches!(
            driver.clear_state("/t/a").await.unwrap_err(),
            StoreError::KeyNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_clones_share_the_store() {
        let driver = MemStateDriver::new();
        let handle = driver.clone();
        handle.write_state("/t/a", b"alpha").await.unwrap();

        assert_eq!(driver.len(), 1);
    }
}
