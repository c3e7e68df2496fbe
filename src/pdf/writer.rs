use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Timelike, Utc};
use pdf_writer::{Content, Date, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use super::page::{Document, DrawOp, Page};
use crate::error::Error;
use crate::fonts::{FontEntry, FontSet, FontStyle, register_font};

pub(super) struct DocumentInfo<'a> {
    pub(super) title: &'a str,
    pub(super) subject: &'a str,
    pub(super) created: DateTime<Utc>,
}

const STYLES: [FontStyle; 2] = [FontStyle::Regular, FontStyle::Bold];

pub(super) fn write_pdf(
    doc: &Document,
    fonts: &FontSet,
    info: &DocumentInfo,
) -> Result<Vec<u8>, Error> {
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // Collect used characters per style for subsetting
    let mut used_chars: HashMap<FontStyle, HashSet<char>> = HashMap::new();
    for page in doc.pages() {
        for text in page.texts() {
            used_chars.entry(text.style).or_default().extend(text.text.chars());
        }
    }

    let mut font_entries: Vec<(FontStyle, FontEntry)> = Vec::with_capacity(STYLES.len());
    for (i, style) in STYLES.into_iter().enumerate() {
        let mut chars = used_chars.remove(&style).unwrap_or_default();
        chars.insert(' ');
        let entry = register_font(
            &mut pdf,
            fonts.get(style),
            format!("F{}", i + 1),
            &mut alloc,
            &chars,
        )?;
        font_entries.push((style, entry));
    }

    let n = doc.page_count();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    let page_annot_refs: Vec<Vec<Ref>> = doc
        .pages()
        .iter()
        .map(|page| {
            page.links()
                .iter()
                .map(|link| {
                    let annot_ref = alloc();
                    let mut annot = pdf.annotation(annot_ref);
                    annot
                        .subtype(pdf_writer::types::AnnotationType::Link)
                        .rect(link.rect)
                        .border(0.0, 0.0, 0.0, None);
                    annot
                        .action()
                        .action_type(pdf_writer::types::ActionType::Uri)
                        .uri(Str(link.url.as_bytes()));
                    annot_ref
                })
                .collect()
        })
        .collect();

    for (i, page) in doc.pages().iter().enumerate() {
        let raw = page_content(page, &font_entries).finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    let page_count = i32::try_from(n).map_err(|_| Error::Pdf(format!("too many pages: {n}")))?;
    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_count);

    let setup = doc.setup();
    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, setup.width, setup.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        if !page_annot_refs[i].is_empty() {
            page.annotations(page_annot_refs[i].iter().copied());
        }
        let mut resources = page.resources();
        let mut font_dict = resources.fonts();
        for (_, entry) in &font_entries {
            font_dict.pair(Name(entry.pdf_name.as_bytes()), entry.font_ref);
        }
    }

    pdf.document_info(info_id)
        .title(TextStr(info.title))
        .subject(TextStr(info.subject))
        .creator(TextStr(concat!("submission-pdf ", env!("CARGO_PKG_VERSION"))))
        .creation_date(pdf_date(info.created));

    Ok(pdf.finish())
}

fn pdf_date(t: DateTime<Utc>) -> Date {
    Date::new(t.year().clamp(0, 9999) as u16)
        .month(t.month() as u8)
        .day(t.day() as u8)
        .hour(t.hour() as u8)
        .minute(t.minute() as u8)
        .second(t.second() as u8)
        .utc_offset_hour(0)
}

fn page_content(page: &Page, fonts: &[(FontStyle, FontEntry)]) -> Content {
    let mut content = Content::new();
    for op in page.ops() {
        match op {
            DrawOp::Text(t) => {
                let Some((_, entry)) = fonts.iter().find(|(style, _)| *style == t.style) else {
                    continue;
                };
                if let Some([r, g, b]) = t.color {
                    content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
                } else {
                    content.set_fill_gray(0.0);
                }
                content.begin_text();
                content.set_font(Name(entry.pdf_name.as_bytes()), t.size);
                content.next_line(t.x, t.y);
                content.show(Str(&entry.encode(&t.text)));
                content.end_text();
            }
            DrawOp::Rule {
                x0,
                x1,
                y,
                thickness,
                color: [r, g, b],
            } => {
                content.save_state();
                content.set_stroke_rgb(*r as f32 / 255.0, *g as f32 / 255.0, *b as f32 / 255.0);
                content.set_line_width(*thickness);
                content.move_to(*x0, *y);
                content.line_to(*x1, *y);
                content.stroke();
                content.restore_state();
            }
        }
    }
    content
}
