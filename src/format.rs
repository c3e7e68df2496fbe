use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::labels::{LabelResolver, humanize_key, title_case};
use crate::model::{AttachmentRef, FieldValue};

/// Keys carrying bookkeeping rather than answers.
const RESERVED_KEYS: &[&str] = &[
    "internalSessionId",
    "surveyId",
    "sessionId",
    "formId",
    "submissionId",
    "userId",
];

const NAME_KEYS: &[&str] = &["name", "fileName", "filename", "originalName"];
const URL_KEYS: &[&str] = &["url", "href", "fileUrl", "downloadUrl", "src"];
const SUBJECT_NAME_KEYS: &[&str] = &["fullName", "name", "patientName", "participantName"];

/// Collaborators the composer consults for every submission.
pub trait SubmissionFormatter {
    fn resolve_label(&self, key: &str) -> String;

    fn format_value(&self, raw: &Value) -> FieldValue;

    /// Name shown in the document header, if the answers contain one.
    fn extract_subject_name(&self, _data: &Map<String, Value>) -> Option<String> {
        None
    }

    fn is_reserved(&self, key: &str) -> bool {
        is_reserved_key(key)
    }
}

/// Default presentation: [`LabelResolver`] labels and [`format_value`].
#[derive(Clone, Debug, Default)]
pub struct StandardFormatter {
    labels: LabelResolver,
}

impl StandardFormatter {
    pub fn new(label_overrides: HashMap<String, String>) -> Self {
        Self {
            labels: LabelResolver::new(label_overrides),
        }
    }
}

impl SubmissionFormatter for StandardFormatter {
    fn resolve_label(&self, key: &str) -> String {
        self.labels.resolve(key)
    }

    fn format_value(&self, raw: &Value) -> FieldValue {
        format_value(raw)
    }

    fn extract_subject_name(&self, data: &Map<String, Value>) -> Option<String> {
        extract_subject_name(data)
    }
}

pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with('_') || RESERVED_KEYS.contains(&key)
}

pub fn format_value(raw: &Value) -> FieldValue {
    match raw {
        Value::Array(items) => {
            if let Some(files) = attachment_list(items) {
                FieldValue::AttachmentList(files)
            } else if items.iter().all(is_scalar) {
                FieldValue::MultiValue(
                    items
                        .iter()
                        .map(format_scalar)
                        .filter(|s| !s.is_empty())
                        .collect(),
                )
            } else {
                FieldValue::Unknown(structured_text(raw))
            }
        }
        Value::Object(_) => FieldValue::Unknown(structured_text(raw)),
        _ => FieldValue::Scalar(format_scalar(raw)),
    }
}

pub fn extract_subject_name(data: &Map<String, Value>) -> Option<String> {
    let text = |key: &str| {
        data.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    if let Some(name) = SUBJECT_NAME_KEYS.iter().find_map(|k| text(*k)) {
        return Some(name.to_string());
    }
    let parts: Vec<&str> = ["firstName", "lastName"]
        .iter()
        .filter_map(|k| text(*k))
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn is_scalar(v: &Value) -> bool {
    !matches!(v, Value::Array(_) | Value::Object(_))
}

fn format_scalar(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format_text(s.trim()),
        Value::Array(_) | Value::Object(_) => structured_text(v),
    }
}

/// `very-satisfied` → "Very Satisfied". Only single tokens whose parts are
/// all letters qualify, so dates, ids and free text pass through.
fn format_text(s: &str) -> String {
    let is_token = s.contains(['-', '_'])
        && s.split(['-', '_'])
            .all(|part| !part.is_empty() && part.chars().all(char::is_alphabetic));
    if !is_token {
        return s.to_string();
    }
    s.split(['-', '_'])
        .map(|part| title_case(&part.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn attachment_list(items: &[Value]) -> Option<Vec<AttachmentRef>> {
    if items.is_empty() {
        return None;
    }
    items.iter().map(attachment_ref).collect()
}

fn attachment_ref(item: &Value) -> Option<AttachmentRef> {
    let obj = item.as_object()?;
    let field = |keys: &[&str]| {
        keys.iter().find_map(|k| {
            obj.get(*k)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
    };
    Some(AttachmentRef {
        name: field(NAME_KEYS)?.to_string(),
        url: field(URL_KEYS)?.to_string(),
    })
}

/// Flatten nested content to `Label: value` pairs. Never fails.
fn structured_text(v: &Value) -> String {
    match v {
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, inner)| {
                let text = structured_text(inner);
                (!text.is_empty()).then(|| format!("{}: {}", humanize_key(k), text))
            })
            .collect::<Vec<_>>()
            .join("; "),
        Value::Array(items) => items
            .iter()
            .map(structured_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(if items.iter().all(is_scalar) { ", " } else { "; " }),
        _ => format_scalar(v),
    }
}
