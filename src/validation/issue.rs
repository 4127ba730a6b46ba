use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    /// The workflow should not be submitted as is.
    Error,
    /// Something is missing that lowers execution quality; saving is still fine.
    Wanting,
}

/// Machine-readable cause of an issue.
///
/// Consumers switch on these codes, and new codes may appear at any time, so
/// unrecognized codes deserialize into [`ReasonCode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReasonCode {
    ValueRequired,
    ValueTypeNotMatch,
    DoWhileEmptyLoopOver,
    ReferencedUnknownTask,
    MissingCredential,
    InvalidValue,
    SubWorkflowParamMissing,
    Other(String),
}

impl ReasonCode {
    pub fn as_str(&self) -> &str {
        match self {
            ReasonCode::ValueRequired => "VALUE_REQUIRED",
            ReasonCode::ValueTypeNotMatch => "VALUE_TYPE_NOT_MATCH",
            ReasonCode::DoWhileEmptyLoopOver => "DO_WHILE_EMPTY_LOOP_OVER",
            ReasonCode::ReferencedUnknownTask => "REFERENCED_UNKNOWN_TASK",
            ReasonCode::MissingCredential => "MISSING_CREDENTIAL",
            ReasonCode::InvalidValue => "INVALID_VALUE",
            ReasonCode::SubWorkflowParamMissing => "SUB_WORKFLOW_PARAM_MISSING",
            ReasonCode::Other(code) => code,
        }
    }
}

impl From<&str> for ReasonCode {
    fn from(code: &str) -> Self {
        match code {
            "VALUE_REQUIRED" => ReasonCode::ValueRequired,
            "VALUE_TYPE_NOT_MATCH" => ReasonCode::ValueTypeNotMatch,
            "DO_WHILE_EMPTY_LOOP_OVER" => ReasonCode::DoWhileEmptyLoopOver,
            "REFERENCED_UNKNOWN_TASK" => ReasonCode::ReferencedUnknownTask,
            "MISSING_CREDENTIAL" => ReasonCode::MissingCredential,
            "INVALID_VALUE" => ReasonCode::InvalidValue,
            "SUB_WORKFLOW_PARAM_MISSING" => ReasonCode::SubWorkflowParamMissing,
            other => ReasonCode::Other(other.to_string()),
        }
    }
}

impl From<String> for ReasonCode {
    fn from(code: String) -> Self {
        ReasonCode::from(code.as_str())
    }
}

impl From<ReasonCode> for String {
    fn from(code: ReasonCode) -> Self {
        match code {
            ReasonCode::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason code plus the name of the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    #[serde(rename = "type")]
    pub code: ReasonCode,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HumanMessage {
    pub en: String,
    pub zh: String,
}

impl HumanMessage {
    pub fn new(en: impl Into<String>, zh: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            zh: zh.into(),
        }
    }
}

/// One diagnostic about one task, identified by its reference name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub task_reference_name: String,
    pub issue_type: IssueType,
    pub reason: Reason,
    pub human_message: HumanMessage,
    /// Structured extra context, e.g. the offending expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ValidationIssue {
    pub fn new(
        task_reference_name: impl Into<String>,
        issue_type: IssueType,
        code: ReasonCode,
        name: impl Into<String>,
        human_message: HumanMessage,
    ) -> Self {
        Self {
            task_reference_name: task_reference_name.into(),
            issue_type,
            reason: Reason {
                code,
                name: name.into(),
            },
            human_message,
            details: None,
        }
    }

    pub fn error(
        task_reference_name: impl Into<String>,
        code: ReasonCode,
        name: impl Into<String>,
        human_message: HumanMessage,
    ) -> Self {
        Self::new(task_reference_name, IssueType::Error, code, name, human_message)
    }

    pub fn wanting(
        task_reference_name: impl Into<String>,
        code: ReasonCode,
        name: impl Into<String>,
        human_message: HumanMessage,
    ) -> Self {
        Self::new(task_reference_name, IssueType::Wanting, code, name, human_message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn is_error(&self) -> bool {
        self.issue_type == IssueType::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.issue_type {
            IssueType::Error => "error",
            IssueType::Wanting => "wanting",
        };
        write!(
            f,
            "{} [{}] {}.{}: {}",
            severity, self.reason.code, self.task_reference_name, self.reason.name, self.human_message.en
        )
    }
}

/// All issues found in one workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// `true` iff no issue is an [`IssueType::Error`].
    pub validated: bool,
    pub validation_issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn from_issues(validation_issues: Vec<ValidationIssue>) -> Self {
        Self {
            validated: !validation_issues.iter().any(ValidationIssue::is_error),
            validation_issues,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.validation_issues.iter().filter(|issue| issue.is_error())
    }

    pub fn wanting(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.validation_issues.iter().filter(|issue| !issue.is_error())
    }

    /// Issues attributed to `task_reference_name`.
    pub fn issues_for<'a>(&'a self, task_reference_name: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.validation_issues
            .iter()
            .filter(move |issue| issue.task_reference_name == task_reference_name)
    }

    pub fn is_empty(&self) -> bool {
        self.validation_issues.is_empty()
    }
}
