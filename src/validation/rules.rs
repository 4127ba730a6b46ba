//! Individual checks run by the [`Validator`](super::Validator).

use super::expression::{self, Reference};
use super::issue::{HumanMessage, ReasonCode, ValidationIssue};
use super::schema::{BlockDefinition, BlockProperty, PropertyType};
use crate::task::{TaskDefinition, TaskKind, WorkflowOutputValue};
use ahash::AHashSet;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Reference name that workflow-output issues are attributed to.
pub const WORKFLOW_END: &str = "workflow_end";

/// `null`, `false`, `0`, `NaN` and `""` carry no value worth type-checking.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) | Value::Object(_) => "object",
    }
}

/// Value a property reads from `task`. A loop's `loopCondition` lives outside the inputs.
fn property_value(task: &TaskDefinition, name: &str) -> Option<Value> {
    if task.kind == TaskKind::DoWhile && name == "loopCondition" {
        return task.loop_condition.clone().map(Value::String);
    }
    task.input_parameters.get(name).cloned()
}

/// Whether `property` must be filled in, and whether its value checks are skipped.
///
/// A property with display options is only required while it is displayed, and its
/// value is never checked.
fn requirement(task: &TaskDefinition, property: &BlockProperty) -> (bool, bool) {
    let Some(display) = &property.display_options else {
        return (property.required, false);
    };
    let satisfied = |conditions: &BTreeMap<String, Vec<Value>>| {
        conditions.iter().all(|(sibling, accepted)| {
            property_value(task, sibling).is_some_and(|current| accepted.contains(&current))
        })
    };
    if let Some(hide) = &display.hide {
        (property.required && !satisfied(hide), true)
    } else if let Some(show) = &display.show {
        (property.required && satisfied(show), true)
    } else {
        (property.required, true)
    }
}

fn type_matches(property: &BlockProperty, value: &Value) -> bool {
    match &property.kind {
        PropertyType::Boolean => value.is_boolean(),
        PropertyType::String if property.type_options.multiple_values => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
        PropertyType::String => value.is_string(),
        PropertyType::Number => value.is_number(),
        PropertyType::Json => value.is_object() || value.is_array(),
        PropertyType::Options => property.options.iter().any(|option| option.value == *value),
        PropertyType::Notice | PropertyType::Other(_) => true,
    }
}

fn unknown_reference(value: &Value, known: &AHashSet<&str>) -> Option<Reference> {
    expression::references(value)
        .into_iter()
        .find(|reference| !reference.is_external() && !known.contains(reference.task_reference_name.as_str()))
}

pub(crate) fn sub_workflow(task: &TaskDefinition) -> Vec<ValidationIssue> {
    let reference_name = task.id();
    let Some(param) = &task.sub_workflow_param else {
        return vec![ValidationIssue::error(
            reference_name,
            ReasonCode::SubWorkflowParamMissing,
            "subWorkflowParam",
            HumanMessage::new(
                "Sub workflow error: subWorkflowParam is missing",
                "子流程数据结构错误: subWorkflowParam 不存在",
            ),
        )];
    };

    let mut issues = Vec::new();
    if param.name.as_deref().is_none_or(str::is_empty) {
        issues.push(ValidationIssue::error(
            reference_name,
            ReasonCode::ValueRequired,
            "name",
            HumanMessage::new("Sub workflow error: name is missing", "子流程数据结构错误: name 不存在"),
        ));
    }
    let has_definition = param.workflow_definition.as_ref().is_some_and(is_truthy);
    let has_version = param.version.is_some_and(|version| version != 0);
    if !has_definition && !has_version {
        issues.push(ValidationIssue::error(
            reference_name,
            ReasonCode::ValueRequired,
            "version",
            HumanMessage::new("Sub workflow error: version is missing", "子流程数据结构错误: version 未设置"),
        ));
    }
    issues
}

pub(crate) fn structure(task: &TaskDefinition) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if task.kind != TaskKind::DoWhile {
        return issues;
    }

    if task.loop_over.iter().all(TaskDefinition::is_stub) {
        issues.push(ValidationIssue::wanting(
            task.id(),
            ReasonCode::DoWhileEmptyLoopOver,
            "loopOver",
            HumanMessage::new(
                "DO_WHILE Task must contain at least one block in loopOver",
                "循环节点循环体必须包含至少一个 Block",
            ),
        ));
    }

    let list_mode = task.input_parameters.get("mode").and_then(Value::as_str) == Some("list");
    if list_mode {
        let list = task.input_parameters.get("listToLoopOver");
        if !list.is_some_and(expression::is_expression) {
            issues.push(ValidationIssue::error(
                task.id(),
                ReasonCode::InvalidValue,
                "listToLoopOver",
                HumanMessage::new(
                    "DO_WHILE task listToLoopOver is not a valid list",
                    "循环列表值不是一个合法的列表",
                ),
            ));
        }
    }
    issues
}

fn input_parameter(
    task: &TaskDefinition,
    property: &BlockProperty,
    known: &AHashSet<&str>,
) -> Option<ValidationIssue> {
    let name = property.name.as_str();
    let display_name = if property.display_name.is_empty() {
        name
    } else {
        property.display_name.as_str()
    };
    let value = property_value(task, name);
    let (required, skip_value_checks) = requirement(task, property);

    if required && is_missing(value.as_ref()) {
        return Some(ValidationIssue::error(
            task.id(),
            ReasonCode::ValueRequired,
            name,
            HumanMessage::new(
                format!("Property {} is required.", name),
                format!("{}必填参数未配置", display_name),
            ),
        ));
    }

    let value = value.filter(is_truthy)?;
    if skip_value_checks {
        return None;
    }

    if expression::is_expression(&value) {
        let reference = unknown_reference(&value, known)?;
        return Some(
            ValidationIssue::error(
                task.id(),
                ReasonCode::ReferencedUnknownTask,
                name,
                HumanMessage::new(
                    format!("Property {} referenced an unknown block: {}", name, reference.task_reference_name),
                    format!("{}参数中引用了一个不存在的 Block：{}", display_name, reference.task_reference_name),
                ),
            )
            .with_details(json!({
                "invalidReferenceExpression": reference.expression,
                "referencedTaskName": reference.task_reference_name,
            })),
        );
    }

    if type_matches(property, &value) {
        return None;
    }
    let received = type_name(&value);
    Some(
        ValidationIssue::error(
            task.id(),
            ReasonCode::ValueTypeNotMatch,
            name,
            HumanMessage::new(
                format!("Property {} requires {} type, but received {}", name, property.kind, received),
                format!("{}参数需要 {} 类型数据，但是填入的数据类型为 {}", display_name, property.kind, received),
            ),
        )
        .with_details(json!({
            "requiredType": property.kind.as_str(),
            "receivedType": received,
        })),
    )
}

pub(crate) fn input_parameters(
    task: &TaskDefinition,
    block: &BlockDefinition,
    known: &AHashSet<&str>,
    ignored: &[PropertyType],
) -> Vec<ValidationIssue> {
    block
        .input
        .iter()
        .filter(|property| !ignored.contains(&property.kind))
        .filter_map(|property| input_parameter(task, property, known))
        .collect()
}

pub(crate) fn credentials(task: &TaskDefinition, block: &BlockDefinition) -> Vec<ValidationIssue> {
    let supplied = task
        .input_parameters
        .get("credential")
        .and_then(|credential| credential.get("type"))
        .and_then(Value::as_str);
    block
        .credentials
        .iter()
        .filter(|credential| credential.required && supplied != Some(credential.name.as_str()))
        .map(|_| {
            ValidationIssue::error(
                task.id(),
                ReasonCode::MissingCredential,
                "credential",
                HumanMessage::new("Missing Credential Data", "缺少密钥信息"),
            )
        })
        .collect()
}

pub(crate) fn workflow_output(output: &[WorkflowOutputValue], known: &AHashSet<&str>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for WorkflowOutputValue { key, value } in output {
        for reference in expression::references(value) {
            if reference.is_external() || known.contains(reference.task_reference_name.as_str()) {
                continue;
            }
            issues.push(
                ValidationIssue::error(
                    WORKFLOW_END,
                    ReasonCode::ReferencedUnknownTask,
                    key.as_str(),
                    HumanMessage::new(
                        format!("Property {} referenced an unknown block: {}", key, reference.task_reference_name),
                        format!("{}参数中引用了一个不存在的 Block：{}", key, reference.task_reference_name),
                    ),
                )
                .with_details(json!({
                    "invalidReferenceExpression": reference.expression,
                    "referencedTaskName": reference.task_reference_name,
                })),
            );
        }
    }
    issues
}
