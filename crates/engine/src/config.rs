//! Engine configuration, loaded from a JSON document.
//!
//! Every field has a default, so `{}` (or no file at all) is a valid config.
//!
//! ```json
//! {
//!   "validation": { "maxNodes": 20, "maxTriggerFanout": 3, "maxTriggerActionChildren": 5 },
//!   "executor":   { "resetGraceMs": 1500, "nodeTimeoutMs": 30000 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::executor::ExecutorConfig;
use crate::validation::ValidationConfig;
use crate::EngineError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub validation: ValidationConfig,
    pub executor: ExecutorConfig,
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read and parse a config file.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let config = Self::from_json_str(&raw)?;
        info!("Loaded engine config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.validation.max_nodes, 20);
        assert_eq!(config.executor.reset_grace_ms, 1500);
        assert!(config.executor.node_timeout_ms.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "validation": { "maxTriggerFanout": 6 }, "executor": { "nodeTimeoutMs": 250 } }"#,
        )
        .unwrap();
        assert_eq!(config.validation.max_trigger_fanout, 6);
        assert_eq!(config.validation.max_trigger_action_children, 5);
        assert_eq!(config.executor.node_timeout_ms, Some(250));
        assert_eq!(config.executor.reset_grace_ms, 1500);
    }

    #[test]
    fn malformed_document_is_a_serde_error() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, EngineError::Serde(_)));
    }

    #[tokio::test]
    async fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "executor": {{ "resetGraceMs": 10 }} }}"#).unwrap();

        let config = EngineConfig::from_file(file.path()).await.unwrap();
        assert_eq!(config.executor.reset_grace_ms, 10);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = EngineConfig::from_file("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
