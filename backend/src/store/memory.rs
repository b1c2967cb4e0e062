//! In-process result store

use super::{ResultStore, StoreError};
use crate::models::result::AnalysisResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Results kept in a map keyed by transaction id
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    results: RwLock<HashMap<String, AnalysisResult>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.results.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.results.read().await.is_empty()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn insert(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        let mut results = self.results.write().await;
        if results.contains_key(&result.transaction_id) {
            return Err(StoreError::DuplicateTransaction(result.transaction_id.clone()));
        }
        results.insert(result.transaction_id.clone(), result.clone());
        Ok(())
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<AnalysisResult>, StoreError> {
        Ok(self.results.read().await.get(transaction_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::result;

    #[tokio::test]
    async fn test_insert_is_write_once() {
        let store = InMemoryResultStore::new();
        store.insert(&result("tx-1")).await.unwrap();

        let mut changed = result("tx-1");
        changed.message = "other".into();
        let err = store.insert(&changed).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTransaction(id) if id == "tx-1"));

        let stored = store.get("tx-1").await.unwrap().unwrap();
        assert_eq!(stored, result("tx-1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemoryResultStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }
}
