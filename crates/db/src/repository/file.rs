//! JSON-file store: one pretty-printed document per workflow id.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use super::GraphStore;
use crate::{DbError, WorkflowRecord};

const EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Use `root` as the storage directory; it is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, DbError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DbError::InvalidId(id.to_owned()));
        }
        Ok(self.root.join(format!("{id}.{EXTENSION}")))
    }
}

#[async_trait]
impl GraphStore for FileStore {
    async fn load_workflow(&self, id: &str) -> Result<WorkflowRecord, DbError> {
        let path = self.path_for(id)?;
        debug!("Loading workflow from {}", path.display());
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DbError::NotFound(id.to_owned()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save_workflow(&self, record: WorkflowRecord) -> Result<(), DbError> {
        let path = self.path_for(&record.id)?;
        tokio::fs::create_dir_all(&self.root).await?;
        let json = serde_json::to_vec_pretty(&record)?;
        tokio::fs::write(&path, json).await?;
        info!("Saved workflow '{}' to {}", record.id, path.display());
        Ok(())
    }

    async fn list_workflows(&self) -> Result<Vec<String>, DbError> {
        let mut ids = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_owned());
                }
            }
        }
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
            definition: json!({ "nodes": [{ "id": "t" }], "edges": [] }),
            execution_order: vec!["t".into()],
            dag_structure: vec![vec!["t".into()]],
            saved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("workflows"));

        let rec = record("daily-digest");
        store.save_workflow(rec.clone()).await.unwrap();

        assert_eq!(store.load_workflow("daily-digest").await.unwrap(), rec);
        assert_eq!(store.list_workflows().await.unwrap(), vec!["daily-digest"]);
    }

    #[tokio::test]
    async fn path_traversal_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(
            store.load_workflow("../etc/passwd").await,
            Err(DbError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent"));
        assert!(store.list_workflows().await.unwrap().is_empty());
        assert!(matches!(
            store.load_workflow("x").await,
            Err(DbError::NotFound(_))
        ));
    }
}
