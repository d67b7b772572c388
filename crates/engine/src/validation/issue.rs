//! Validation issue and report types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Structure,
    Configuration,
    Connection,
    Logic,
    Performance,
}

/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Score penalty for an error of this severity.
    pub fn error_penalty(self) -> u32 {
        match self {
            Self::Critical => 25,
            Self::High => 15,
            Self::Medium => 10,
            Self::Low => 5,
        }
    }

    /// Score penalty for a warning of this severity.
    pub fn warning_penalty(self) -> u32 {
        match self {
            Self::Critical => 15,
            Self::High => 10,
            Self::Medium => 5,
            Self::Low => 2,
        }
    }
}

/// One finding about the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// Unique within a report.
    pub id: String,
    /// Stable machine-readable name of the check that fired.
    pub code: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub category: IssueCategory,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    fn new(
        code: &str,
        issue_type: IssueType,
        category: IssueCategory,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            code: code.to_owned(),
            issue_type,
            category,
            severity,
            message: message.into(),
            node_id: None,
            edge_id: None,
            suggestion: None,
        }
    }

    pub fn error(
        code: &str,
        category: IssueCategory,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self::new(code, IssueType::Error, category, severity, message)
    }

    pub fn warning(
        code: &str,
        category: IssueCategory,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self::new(code, IssueType::Warning, category, severity, message)
    }

    pub fn info(code: &str, category: IssueCategory, message: impl Into<String>) -> Self {
        Self::new(code, IssueType::Info, category, Severity::Low, message)
    }

    pub fn on_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn on_edge(mut self, edge_id: impl Into<String>) -> Self {
        self.edge_id = Some(edge_id.into());
        self
    }

    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Accumulates issues and hands out report-unique ids.
#[derive(Debug, Default)]
pub struct Issues {
    items: Vec<ValidationIssue>,
}

impl Issues {
    pub fn push(&mut self, mut issue: ValidationIssue) {
        issue.id = format!("{}-{}", issue.code, self.items.len() + 1);
        self.items.push(issue);
    }

    pub fn into_vec(self) -> Vec<ValidationIssue> {
        self.items
    }
}

/// Outcome of validating one graph snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub info: Vec<ValidationIssue>,
    /// 0–100, informational only.
    pub score: u8,
}

impl ValidationReport {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut info = Vec::new();
        for issue in issues {
            match issue.issue_type {
                IssueType::Error => errors.push(issue),
                IssueType::Warning => warnings.push(issue),
                IssueType::Info => info.push(issue),
            }
        }

        let score = score(&errors, &warnings);
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            info,
            score,
        }
    }

    /// Every issue, errors first.
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(&self.warnings).chain(&self.info)
    }

    pub fn issues_for_node<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a ValidationIssue> + 'a {
        self.issues().filter(move |i| i.node_id.as_deref() == Some(node_id))
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.issues().any(|i| i.code == code)
    }
}

/// 100 minus severity-weighted penalties, clamped to `[0, 100]`.
pub fn score(errors: &[ValidationIssue], warnings: &[ValidationIssue]) -> u8 {
    let penalty: u32 = errors.iter().map(|e| e.severity.error_penalty()).sum::<u32>()
        + warnings.iter().map(|w| w.severity.warning_penalty()).sum::<u32>();
    100u32.saturating_sub(penalty) as u8
}
