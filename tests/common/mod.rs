#![allow(dead_code)]

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use serde_json::Value;
use submission_pdf::{
    Document, ExportRequest, FontStyle, RenderOptions, StandardFormatter, TextOp, compose,
};

pub const TITLE: &str = "Feedback";
pub const SUBMISSION_ID: &str = "abc123";

pub fn request(data: Value) -> ExportRequest {
    let Value::Object(data) = data else {
        panic!("fixture data must be a JSON object");
    };
    ExportRequest {
        title: TITLE.to_string(),
        submission_id: SUBMISSION_ID.to_string(),
        submitted_at: Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap(),
        data,
        field_labels: None,
    }
}

pub fn compose_default(request: &ExportRequest) -> Document {
    let formatter =
        StandardFormatter::new(request.field_labels.clone().unwrap_or_default());
    compose(request, &RenderOptions::default(), &formatter).expect("compose")
}

pub fn compose_with_labels(request: &ExportRequest, labels: &[(&str, &str)]) -> Document {
    let overrides: HashMap<String, String> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    compose(request, &RenderOptions::default(), &StandardFormatter::new(overrides))
        .expect("compose")
}

pub fn is_footer(t: &TextOp) -> bool {
    t.text.starts_with("Page ") && t.text.contains(" of ")
}

fn is_header(t: &TextOp) -> bool {
    t.text == TITLE
        || t.text.starts_with("Name: ")
        || t.text.starts_with("Submission ID: ")
        || t.text.starts_with("Submitted: ")
}

/// All text drawn outside the header block and the footers, in draw order.
pub fn body_texts(doc: &Document) -> Vec<&TextOp> {
    doc.pages()
        .iter()
        .flat_map(|p| p.texts())
        .filter(|t| !is_footer(t) && !is_header(t))
        .collect()
}

pub fn labels(doc: &Document) -> Vec<&str> {
    body_texts(doc)
        .into_iter()
        .filter(|t| t.style == FontStyle::Bold)
        .map(|t| t.text.as_str())
        .collect()
}

/// Field value lines: regular weight and default (black) color.
pub fn value_lines(doc: &Document) -> Vec<&TextOp> {
    body_texts(doc)
        .into_iter()
        .filter(|t| t.style == FontStyle::Regular && t.color.is_none() && t.text != "\u{2022}")
        .collect()
}

pub fn footers(doc: &Document) -> Vec<String> {
    doc.pages()
        .iter()
        .map(|p| {
            p.texts()
                .filter(|t| is_footer(t))
                .map(|t| t.text.clone())
                .collect::<Vec<_>>()
                .join("|")
        })
        .collect()
}

/// Deterministic prose of `n` words.
pub fn paragraph(n: usize) -> String {
    const VOCAB: &[&str] = &[
        "the", "ward", "staff", "were", "attentive", "and", "explained", "each", "step",
        "of", "my", "treatment", "clearly", "although", "waiting", "times", "in", "outpatients",
        "felt", "long",
    ];
    (0..n)
        .map(|i| VOCAB[(i * 7 + i / 3) % VOCAB.len()])
        .collect::<Vec<_>>()
        .join(" ")
}
