//! Typed per-subtype node configuration.
//!
//! Every known subtype gets its own struct; anything else is carried
//! verbatim in [`NodeConfig::Custom`] so unrecognised nodes still load and
//! validate (with an info-level note) instead of failing outright.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MANUAL_TRIGGER: &str = "manual-trigger";
pub const EMAIL_TRIGGER: &str = "email-trigger";
pub const TRELLO_ACTION: &str = "trello-action";
pub const ASANA_ACTION: &str = "asana-action";
pub const CONDITION: &str = "condition";
pub const AI_PROMPT: &str = "ai-prompt";

/// Configuration of a node, discriminated by subtype.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeConfig {
    ManualTrigger,
    EmailTrigger(EmailTriggerConfig),
    TrelloAction(TrelloActionConfig),
    AsanaAction(AsanaActionConfig),
    Condition(ConditionConfig),
    AiPrompt(AiPromptConfig),
    Custom { subtype: String, values: Value },
}

impl NodeConfig {
    /// Build the typed config from a wire `subtype` + `config` pair.
    ///
    /// A `null` config block is read as `{}` for known subtypes.
    pub fn from_parts(subtype: &str, config: Value) -> Result<Self, serde_json::Error> {
        let config = if config.is_null() {
            Value::Object(Map::new())
        } else {
            config
        };

        Ok(match subtype {
            MANUAL_TRIGGER => Self::ManualTrigger,
            EMAIL_TRIGGER => Self::EmailTrigger(serde_json::from_value(config)?),
            TRELLO_ACTION => Self::TrelloAction(serde_json::from_value(config)?),
            ASANA_ACTION => Self::AsanaAction(serde_json::from_value(config)?),
            CONDITION => Self::Condition(serde_json::from_value(config)?),
            AI_PROMPT => Self::AiPrompt(serde_json::from_value(config)?),
            other => Self::Custom {
                subtype: other.to_owned(),
                values: config,
            },
        })
    }

    /// Config for a subtype this crate knows nothing about.
    pub fn custom(subtype: impl Into<String>) -> Self {
        Self::Custom {
            subtype: subtype.into(),
            values: Value::Object(Map::new()),
        }
    }

    pub fn subtype(&self) -> &str {
        match self {
            Self::ManualTrigger => MANUAL_TRIGGER,
            Self::EmailTrigger(_) => EMAIL_TRIGGER,
            Self::TrelloAction(_) => TRELLO_ACTION,
            Self::AsanaAction(_) => ASANA_ACTION,
            Self::Condition(_) => CONDITION,
            Self::AiPrompt(_) => AI_PROMPT,
            Self::Custom { subtype, .. } => subtype,
        }
    }

    /// JSON wire form of the config block, as handed to executors.
    pub fn to_value(&self) -> Value {
        let value = match self {
            Self::ManualTrigger => Ok(Value::Object(Map::new())),
            Self::EmailTrigger(c) => serde_json::to_value(c),
            Self::TrelloAction(c) => serde_json::to_value(c),
            Self::AsanaAction(c) => serde_json::to_value(c),
            Self::Condition(c) => serde_json::to_value(c),
            Self::AiPrompt(c) => serde_json::to_value(c),
            Self::Custom { values, .. } => Ok(values.clone()),
        };
        // Plain structs of strings and JSON values always serialize.
        value.unwrap_or(Value::Null)
    }
}

/// True when `value` is present and not just whitespace.
pub(crate) fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailTriggerConfig {
    /// Absent means the trigger would match every message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<EmailFilters>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub keywords: Vec<String>,
}

impl EmailFilters {
    pub fn is_empty(&self) -> bool {
        !is_filled(&self.sender)
            && !is_filled(&self.subject)
            && self.keywords.iter().all(|k| k.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrelloActionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    /// Template for the card title, e.g. `"{{email.subject}}"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AsanaActionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Logic / AI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    Exists,
    GreaterThan,
    LessThan,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConditionConfig {
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiPromptConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
