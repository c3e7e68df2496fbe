use pdf_writer::Rect;

use super::page::LinkAnnotation;

/// Vertical slack added above and below a link's glyph box.
const LINK_PADDING: f32 = 2.0;

/// Greedy word-wrap. `measure` returns the rendered width of a string.
///
/// A word wider than `max_width` on its own is emitted as a line by itself
/// rather than split; it overflows the right edge.
pub(super) fn wrap_lines(
    text: &str,
    max_width: f32,
    measure: impl Fn(&str) -> f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending = String::new();

    for word in text.split_whitespace() {
        let candidate = if pending.is_empty() {
            word.to_string()
        } else {
            format!("{pending} {word}")
        };
        if measure(&candidate) > max_width && !pending.is_empty() {
            lines.push(std::mem::take(&mut pending));
            pending.push_str(word);
        } else {
            pending = candidate;
        }
    }
    if !pending.is_empty() {
        lines.push(pending);
    }
    lines
}

/// Shorten `text` with a trailing ellipsis until it fits `max_width`.
pub(super) fn truncate_to_width(
    text: &str,
    max_width: f32,
    measure: impl Fn(&str) -> f32,
) -> String {
    if measure(text) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().chain(['\u{2026}'].iter()).collect();
        if measure(&candidate) <= max_width {
            return candidate;
        }
    }
    "\u{2026}".to_string()
}

/// Clickable region over text drawn at baseline `y` starting at `x`.
pub(super) fn link_for_text(
    x: f32,
    y: f32,
    width: f32,
    font_size: f32,
    url: &str,
) -> LinkAnnotation {
    let bottom = y - font_size * 0.2 - LINK_PADDING;
    let top = y + font_size * 0.8 + LINK_PADDING;
    LinkAnnotation {
        rect: Rect::new(x, bottom, x + width, top),
        url: url.to_string(),
    }
}
