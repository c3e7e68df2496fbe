mod common;

use serde_json::{Map, Value, json};
use submission_pdf::{Document, FontStyle, LINE_RESERVE};

const LONG_QUESTION: &str = "Before you left, did a member of staff explain what to do if you \
    were worried about your condition or treatment after you got home, including anything \
    about medication changes, follow-up appointments, and who to call out of hours?";

fn many_fields(n: usize) -> Value {
    let mut data = Map::new();
    for i in 0..n {
        data.insert(
            format!("question{i}"),
            Value::String(format!("Answer number {i}. {}", common::paragraph(25 + i % 40))),
        );
    }
    Value::Object(data)
}

/// `n` one-line answers followed by a `k`-line one, to walk the cursor down
/// the page in small steps before whatever comes next.
fn filler(n: usize, k: usize) -> Map<String, Value> {
    let mut data = Map::new();
    for i in 0..n {
        data.insert(format!("filler{i}"), Value::String(format!("Answer {i}")));
    }
    if k > 0 {
        let lines: Vec<String> = (0..k).map(|j| format!("Line {j}")).collect();
        data.insert("notes".into(), Value::String(lines.join("\n")));
    }
    data
}

fn file(name: &str) -> Value {
    json!({ "name": name, "url": format!("https://store/{name}") })
}

fn assert_no_page_ends_in_bold(doc: &Document, case: &str) {
    for (i, page) in doc.pages().iter().enumerate() {
        let last = page
            .texts()
            .filter(|t| !common::is_footer(t))
            .last()
            .expect("page has content");
        assert_ne!(
            last.style,
            FontStyle::Bold,
            "{case}: page {} ends with {:?} at y={}",
            i + 1,
            last.text,
            last.y
        );
    }
}

#[test]
fn footers_number_every_page() {
    let doc = common::compose_default(&common::request(many_fields(60)));
    let n = doc.page_count();
    assert!(n >= 3, "expected several pages, got {n}");
    let expected: Vec<String> = (1..=n).map(|i| format!("Page {i} of {n}")).collect();
    assert_eq!(common::footers(&doc), expected);
}

#[test]
fn nothing_is_drawn_below_bottom_margin() {
    let doc = common::compose_default(&common::request(many_fields(60)));
    let setup = *doc.setup();
    for (i, page) in doc.pages().iter().enumerate() {
        for t in page.texts().filter(|t| !common::is_footer(t)) {
            assert!(
                t.y >= setup.margin_bottom + LINE_RESERVE - 0.01,
                "page {}: {:?} at y={} is inside the bottom margin",
                i + 1,
                t.text,
                t.y
            );
            assert!(t.y <= setup.top());
        }
    }
}

#[test]
fn field_labels_are_never_orphaned() {
    let doc = common::compose_default(&common::request(many_fields(60)));
    assert_no_page_ends_in_bold(&doc, "60 fields");
}

#[test]
fn every_field_is_rendered_once() {
    let doc = common::compose_default(&common::request(many_fields(60)));
    let labels = common::labels(&doc);
    let expected: Vec<String> = (0..60).map(|i| format!("Question {i}")).collect();
    assert_eq!(labels, expected);
}

#[test]
fn links_land_on_the_page_their_filename_was_drawn() {
    let files: Vec<Value> = (0..90)
        .map(|i| {
            json!({
                "name": format!("scan-{i:03}.png"),
                "url": format!("https://store/scan-{i:03}.png"),
            })
        })
        .collect();
    let mut data = match many_fields(30) {
        Value::Object(m) => m,
        _ => unreachable!(),
    };
    data.insert("photos".into(), Value::Array(files));
    let doc = common::compose_default(&common::request(Value::Object(data)));

    let mut seen = Vec::new();
    let mut pages_with_links = 0;
    for page in doc.pages() {
        let names: Vec<_> = page.texts().filter(|t| t.text.starts_with("scan-")).collect();
        assert_eq!(names.len(), page.links().len());
        if !page.links().is_empty() {
            pages_with_links += 1;
        }
        for (name, link) in names.iter().zip(page.links()) {
            assert_eq!(link.url, format!("https://store/{}", name.text));
            assert_eq!(link.rect.x1, name.x);
            assert!(link.rect.y1 < name.y && name.y < link.rect.y2);
            seen.push(link.url.clone());
        }
    }
    assert!(pages_with_links >= 2, "attachments should span a page break");
    let expected: Vec<String> = (0..90).map(|i| format!("https://store/scan-{i:03}.png")).collect();
    assert_eq!(seen, expected);
}

#[test]
fn overwide_word_overflows_on_its_own_line() {
    let word = "x".repeat(160);
    let doc = common::compose_default(&common::request(json!({
        "comments": format!("before {word} after"),
    })));
    let content_width = doc.setup().content_width();
    let values: Vec<_> = common::value_lines(&doc);
    let texts: Vec<&str> = values.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, ["before", word.as_str(), "after"]);
    assert!(values[1].width > content_width);
}

#[test]
fn long_attachment_names_are_truncated() {
    let name = format!("{}.pdf", "discharge-summary-".repeat(12));
    let doc = common::compose_default(&common::request(json!({
        "documents": [{ "name": name, "url": "https://store/discharge.pdf" }],
    })));
    let setup = *doc.setup();
    let drawn = doc.pages()[0]
        .texts()
        .find(|t| t.text.starts_with("discharge-summary-"))
        .expect("filename drawn");
    assert!(drawn.text.ends_with('\u{2026}'));
    assert!(drawn.x + drawn.width <= setup.width - setup.margin_right + 1e-3);
    assert_eq!(doc.links().count(), 1);
}

#[test]
fn attachments_header_stays_with_its_first_group() {
    for n in 0..20 {
        for k in 0..14 {
            let mut data = filler(n, k);
            data.insert("photos".into(), json!([file("a.png")]));
            let doc = common::compose_default(&common::request(Value::Object(data)));
            assert_no_page_ends_in_bold(&doc, &format!("n={n} k={k}"));
            assert_eq!(doc.links().count(), 1);
        }
    }
}

#[test]
fn group_labels_stay_with_their_first_file() {
    for n in 0..20 {
        for k in 0..14 {
            let mut data = filler(n, k);
            data.insert("photos".into(), json!([file("a.png"), file("b.png")]));
            data.insert("documents".into(), json!([file("c.pdf")]));
            data.insert("scans".into(), json!([file("d.png")]));
            let doc = common::compose_with_labels(
                &common::request(Value::Object(data)),
                &[("scans", LONG_QUESTION)],
            );
            assert_no_page_ends_in_bold(&doc, &format!("n={n} k={k}"));
            assert_eq!(doc.links().count(), 4);
        }
    }
}

#[test]
fn long_label_overrides_keep_a_value_line() {
    let single = common::compose_with_labels(
        &common::request(json!({ "followUp": "Yes please" })),
        &[("followUp", LONG_QUESTION)],
    );
    assert!(common::labels(&single).len() >= 3, "label should wrap to several lines");

    for n in 0..20 {
        for k in 0..14 {
            let mut data = filler(n, k);
            data.insert("followUp".into(), Value::String("Yes please".into()));
            data.insert("closing".into(), Value::String("Thanks".into()));
            let doc = common::compose_with_labels(
                &common::request(Value::Object(data)),
                &[("followUp", LONG_QUESTION)],
            );
            assert_no_page_ends_in_bold(&doc, &format!("n={n} k={k}"));
        }
    }
}
