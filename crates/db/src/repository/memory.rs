//! In-process store backed by a `HashMap`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::GraphStore;
use crate::{DbError, WorkflowRecord};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, WorkflowRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for InMemoryStore {
    async fn load_workflow(&self, id: &str) -> Result<WorkflowRecord, DbError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DbError::NotFound(id.to_owned()))
    }

    async fn save_workflow(&self, record: WorkflowRecord) -> Result<(), DbError> {
        self.records.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn list_workflows(&self) -> Result<Vec<String>, DbError> {
        let mut ids: Vec<String> = self.records.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn record(id: &str) -> WorkflowRecord {
        WorkflowRecord {
            id: id.into(),
            definition: json!({ "nodes": [], "edges": [] }),
            execution_order: vec![],
            dag_structure: vec![],
            saved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_then_load_returns_same_record() {
        let store = InMemoryStore::new();
        let rec = record("wf-1");
        store.save_workflow(rec.clone()).await.unwrap();
        assert_eq!(store.load_workflow("wf-1").await.unwrap(), rec);
    }

    #[tokio::test]
    async fn missing_workflow_is_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.load_workflow("nope").await,
            Err(DbError::NotFound(id)) if id == "nope"
        ));
    }

    #[tokio::test]
    async fn list_is_sorted() {
        let store = InMemoryStore::new();
        store.save_workflow(record("b")).await.unwrap();
        store.save_workflow(record("a")).await.unwrap();
        assert_eq!(store.list_workflows().await.unwrap(), vec!["a", "b"]);
    }
}
