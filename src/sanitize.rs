use crate::fonts::char_to_winansi;

/// Drawn in place of any char the page fonts cannot encode.
pub const PLACEHOLDER: char = '?';

/// Replace every char outside WinAnsi with [`PLACEHOLDER`]. Line breaks and
/// tabs pass through so the composer can still split paragraphs. The result
/// has the same number of chars as the input.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => c,
            _ if char_to_winansi(c) != 0 => c,
            _ => PLACEHOLDER,
        })
        .collect()
}
