use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// One submission to export, plus optional per-key label overrides.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub title: String,
    pub submission_id: String,
    pub submitted_at: DateTime<Utc>,
    /// Raw answers keyed by field key, in form order.
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub field_labels: Option<HashMap<String, String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    pub url: String,
}

/// A raw answer after classification at the data boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Scalar(String),
    MultiValue(Vec<String>),
    AttachmentList(Vec<AttachmentRef>),
    /// Content with no dedicated presentation, already flattened to text.
    Unknown(String),
}

impl FieldValue {
    /// Text drawn under the field label. `None` for attachment lists, which
    /// are rendered in their own section.
    pub fn display_text(&self) -> Option<String> {
        match self {
            FieldValue::Scalar(s) | FieldValue::Unknown(s) => Some(s.clone()),
            FieldValue::MultiValue(items) => Some(items.join(", ")),
            FieldValue::AttachmentList(_) => None,
        }
    }
}

pub(crate) struct FieldEntry {
    pub(crate) key: String,
    pub(crate) label: String,
    pub(crate) value: FieldValue,
}

/// Attachment lists pulled out of the field section, drawn after it.
pub(crate) struct AttachmentGroup {
    pub(crate) label: String,
    pub(crate) files: Vec<AttachmentRef>,
}
