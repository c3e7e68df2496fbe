use std::collections::HashMap;

/// Labels for the field keys the intake forms share.
const BUILTIN_LABELS: &[(&str, &str)] = &[
    ("rating", "Overall Care Rating"),
    ("npsScore", "Likelihood to Recommend"),
    ("hospitalInteraction", "Hospital Interaction"),
    ("staffInteraction", "Interaction with Staff"),
    ("waitTime", "Waiting Time"),
    ("improvementSuggestions", "Suggestions for Improvement"),
    ("comments", "Additional Comments"),
    ("fullName", "Full Name"),
    ("firstName", "First Name"),
    ("lastName", "Last Name"),
    ("dateOfBirth", "Date of Birth"),
    ("email", "Email Address"),
    ("phone", "Phone Number"),
    ("nhsNumber", "NHS Number"),
    ("gpPractice", "GP Practice"),
    ("contactConsent", "Consent to Contact"),
    ("photos", "Photos"),
    ("documents", "Supporting Documents"),
];

const ACRONYMS: &[&str] = &["id", "gp", "nhs", "dob", "icu", "url", "nps"];

/// Resolves field keys to display labels: caller overrides first, then the
/// built-in table, then [`humanize_key`].
#[derive(Clone, Debug, Default)]
pub struct LabelResolver {
    overrides: HashMap<String, String>,
}

impl LabelResolver {
    pub fn new(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }

    pub fn resolve(&self, key: &str) -> String {
        if let Some(label) = self.overrides.get(key) {
            return label.clone();
        }
        BUILTIN_LABELS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, label)| label.to_string())
            .unwrap_or_else(|| humanize_key(key))
    }
}

/// `patientGpName` → "Patient GP Name", `follow_up-date` → "Follow Up Date".
pub fn humanize_key(key: &str) -> String {
    split_words(key)
        .iter()
        .map(|w| {
            let lower = w.to_lowercase();
            if ACRONYMS.contains(&lower.as_str()) {
                lower.to_uppercase()
            } else {
                title_case(&lower)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split on `_`, `-`, whitespace, lower→upper and letter↔digit boundaries.
/// A run of capitals stays together except for its last letter when a
/// lowercase letter follows (`HTMLParser` → `HTML`, `Parser`).
fn split_words(key: &str) -> Vec<String> {
    let chars: Vec<char> = key.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(prev) = current.chars().last() {
            let next = chars.get(i + 1).copied();
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_alphabetic() && c.is_ascii_digit())
                || (prev.is_ascii_digit() && c.is_alphabetic())
                || (prev.is_uppercase()
                    && c.is_uppercase()
                    && next.is_some_and(|n| n.is_lowercase()));
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
