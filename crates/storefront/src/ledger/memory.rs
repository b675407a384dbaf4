//! In-memory ledger store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{LedgerError, LedgerStore};

/// Process-local [`LedgerStore`]; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryLedgerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryLedgerStore::new();
        assert!(store.is_empty().await);
        assert_eq!(store.get("purchased_a").await.unwrap(), None);

        store.set("purchased_a", "[]").await.unwrap();
        store.set("purchased_a", "[1]").await.unwrap();

        assert_eq!(store.get("purchased_a").await.unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.len().await, 1);
    }
}
