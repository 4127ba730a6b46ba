//! `${...}` references between tasks.
//!
//! A task input such as `${fetch_1.output.body}` reads the output of the task whose
//! reference name is the first dotted segment. `workflow` names the workflow's own
//! input, and names containing `_loopItemRef` are bound by an enclosing loop.

use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z0-9_.*\[\]@?'$()]+)(?:\(\))?\}").expect("expression pattern is valid")
});

/// Reference name of the workflow's own input.
pub const WORKFLOW_REFERENCE: &str = "workflow";
/// Marker of loop-bound item references.
pub const LOOP_ITEM_REFERENCE: &str = "_loopItemRef";

/// One `${...}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The whole expression, braces included.
    pub expression: String,
    /// Reference name of the task the expression reads from.
    pub task_reference_name: String,
}

impl Reference {
    /// Whether the reference resolves outside the task list.
    pub fn is_external(&self) -> bool {
        self.task_reference_name == WORKFLOW_REFERENCE || self.task_reference_name.contains(LOOP_ITEM_REFERENCE)
    }
}

/// Strings are matched as is; any other value through its JSON text.
fn as_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Whether `value` contains at least one reference.
pub fn is_expression(value: &Value) -> bool {
    EXPRESSION.is_match(&as_text(value))
}

/// Every reference in `value`, in order of appearance.
pub fn references(value: &Value) -> Vec<Reference> {
    let text = as_text(value);
    EXPRESSION
        .captures_iter(&text)
        .filter_map(|captures| {
            let expression = captures.get(0)?.as_str().to_string();
            let body = captures.get(1)?.as_str();
            let task_reference_name = body.split('.').next().unwrap_or(body).to_string();
            Some(Reference {
                expression,
                task_reference_name,
            })
        })
        .collect()
}
