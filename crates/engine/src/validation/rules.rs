//! Per-subtype configuration rules.
//!
//! Rules are looked up by subtype string in a [`RuleRegistry`] built once at
//! startup. Subtypes without a rule fall through to [`UnknownSubtypeRule`],
//! which notes the node at info level instead of blocking validation.

use std::collections::HashMap;
use std::sync::Arc;

use super::{IssueCategory, Issues, Severity, ValidationIssue};
use crate::models::{Node, NodeKind};
use crate::node_config::{
    is_filled, NodeConfig, AI_PROMPT, ASANA_ACTION, CONDITION, EMAIL_TRIGGER, MANUAL_TRIGGER,
    TRELLO_ACTION,
};

const CATEGORY: IssueCategory = IssueCategory::Configuration;

/// A configuration check for one subtype.
pub trait ConfigRule: Send + Sync {
    fn check(&self, node: &Node, issues: &mut Issues);
}

/// Subtype → rule lookup with a catch-all fallback.
#[derive(Clone)]
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn ConfigRule>>,
    fallback: Arc<dyn ConfigRule>,
}

impl RuleRegistry {
    /// A registry with no rules: every subtype hits the fallback.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
            fallback: Arc::new(UnknownSubtypeRule),
        }
    }

    /// Rules for every subtype this crate knows.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(MANUAL_TRIGGER, ManualTriggerRule);
        registry.register(EMAIL_TRIGGER, EmailTriggerRule);
        registry.register(TRELLO_ACTION, TrelloActionRule);
        registry.register(ASANA_ACTION, AsanaActionRule);
        registry.register(CONDITION, ConditionRule);
        registry.register(AI_PROMPT, AiPromptRule);
        registry
    }

    pub fn register(&mut self, subtype: impl Into<String>, rule: impl ConfigRule + 'static) {
        self.rules.insert(subtype.into(), Arc::new(rule));
    }

    pub fn rule_for(&self, subtype: &str) -> &dyn ConfigRule {
        self.rules
            .get(subtype)
            .map_or(self.fallback.as_ref(), |r| r.as_ref())
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ---------------------------------------------------------------------------
// Built-in rules
// ---------------------------------------------------------------------------

/// Manual triggers carry no configuration.
pub struct ManualTriggerRule;

impl ConfigRule for ManualTriggerRule {
    fn check(&self, _node: &Node, _issues: &mut Issues) {}
}

/// An email trigger needs at least one of sender, subject or keywords.
pub struct EmailTriggerRule;

impl ConfigRule for EmailTriggerRule {
    fn check(&self, node: &Node, issues: &mut Issues) {
        let NodeConfig::EmailTrigger(cfg) = &node.config else {
            return;
        };
        match &cfg.filters {
            None => issues.push(
                ValidationIssue::error(
                    "email-filters-missing",
                    CATEGORY,
                    Severity::High,
                    format!("Email trigger '{}' has no filters configured", node.label),
                )
                .on_node(&node.id)
                .suggest("Set a sender, subject or keywords to match"),
            ),
            Some(filters) if filters.is_empty() => issues.push(
                ValidationIssue::warning(
                    "email-filters-empty",
                    CATEGORY,
                    Severity::Medium,
                    format!(
                        "Email trigger '{}' filters are all empty and will match every message",
                        node.label
                    ),
                )
                .on_node(&node.id)
                .suggest("Fill in at least one of sender, subject or keywords"),
            ),
            Some(_) => {}
        }
    }
}

/// A Trello action needs a board and a list; a card title is advised.
pub struct TrelloActionRule;

impl ConfigRule for TrelloActionRule {
    fn check(&self, node: &Node, issues: &mut Issues) {
        let NodeConfig::TrelloAction(cfg) = &node.config else {
            return;
        };
        let mut missing = Vec::new();
        if !is_filled(&cfg.board_id) {
            missing.push("board");
        }
        if !is_filled(&cfg.list_id) {
            missing.push("list");
        }
        if !missing.is_empty() {
            issues.push(
                ValidationIssue::error(
                    "trello-target-missing",
                    CATEGORY,
                    Severity::High,
                    format!("Trello action '{}' is missing: {}", node.label, missing.join(", ")),
                )
                .on_node(&node.id)
                .suggest("Pick the board and list the card should be created in"),
            );
        }
        if !is_filled(&cfg.card_title) {
            issues.push(
                ValidationIssue::warning(
                    "trello-title-missing",
                    CATEGORY,
                    Severity::Low,
                    format!("Trello action '{}' has no card title template", node.label),
                )
                .on_node(&node.id)
                .suggest("Use a template such as {{email.subject}}"),
            );
        }
    }
}

/// An Asana action needs a task name; a project id is advised.
pub struct AsanaActionRule;

impl ConfigRule for AsanaActionRule {
    fn check(&self, node: &Node, issues: &mut Issues) {
        let NodeConfig::AsanaAction(cfg) = &node.config else {
            return;
        };
        if !is_filled(&cfg.task_name) {
            issues.push(
                ValidationIssue::error(
                    "asana-task-name-missing",
                    CATEGORY,
                    Severity::High,
                    format!("Asana action '{}' has no task name template", node.label),
                )
                .on_node(&node.id),
            );
        }
        if !is_filled(&cfg.project_id) {
            issues.push(
                ValidationIssue::warning(
                    "asana-project-missing",
                    CATEGORY,
                    Severity::Low,
                    format!("Asana action '{}' has no project; tasks land in My Tasks", node.label),
                )
                .on_node(&node.id),
            );
        }
    }
}

/// A condition node must test something.
pub struct ConditionRule;

impl ConfigRule for ConditionRule {
    fn check(&self, node: &Node, issues: &mut Issues) {
        let NodeConfig::Condition(cfg) = &node.config else {
            return;
        };
        if cfg.conditions.is_empty() {
            issues.push(
                ValidationIssue::error(
                    "conditions-missing",
                    CATEGORY,
                    Severity::High,
                    format!("Condition '{}' has no conditions", node.label),
                )
                .on_node(&node.id)
                .suggest("Add at least one field comparison"),
            );
        }
        for (i, condition) in cfg.conditions.iter().enumerate() {
            if condition.field.trim().is_empty() {
                issues.push(
                    ValidationIssue::warning(
                        "condition-field-empty",
                        CATEGORY,
                        Severity::Medium,
                        format!("Condition #{} of '{}' does not name a field", i + 1, node.label),
                    )
                    .on_node(&node.id),
                );
            }
        }
    }
}

/// An AI prompt node needs a prompt.
pub struct AiPromptRule;

impl ConfigRule for AiPromptRule {
    fn check(&self, node: &Node, issues: &mut Issues) {
        let NodeConfig::AiPrompt(cfg) = &node.config else {
            return;
        };
        if !is_filled(&cfg.prompt) {
            issues.push(
                ValidationIssue::error(
                    "ai-prompt-missing",
                    CATEGORY,
                    Severity::High,
                    format!("AI node '{}' has no prompt", node.label),
                )
                .on_node(&node.id),
            );
        }
    }
}

/// Fallback for subtypes without a registered rule.
pub struct UnknownSubtypeRule;

impl ConfigRule for UnknownSubtypeRule {
    fn check(&self, node: &Node, issues: &mut Issues) {
        let message = if node.kind == NodeKind::Logic {
            format!(
                "Logic node '{}' has unrecognised subtype '{}'; its conditions cannot be checked",
                node.label,
                node.subtype()
            )
        } else {
            format!(
                "Node '{}' has unrecognised subtype '{}'; configuration not checked",
                node.label,
                node.subtype()
            )
        };
        issues.push(ValidationIssue::info("unknown-subtype", CATEGORY, message).on_node(&node.id));
    }
}
