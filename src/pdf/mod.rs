mod layout;
mod page;
mod writer;

use crate::error::Error;
use crate::fonts::{FontSet, FontSource, FontStyle};
use crate::format::SubmissionFormatter;
use crate::model::{AttachmentGroup, AttachmentRef, ExportRequest, FieldEntry, FieldValue};
use crate::sanitize::sanitize_text;

pub use page::{Document, DrawOp, LinkAnnotation, Page, PageSetup, TextOp};

use layout::{link_for_text, truncate_to_width, wrap_lines};
use page::{PageFlow, PageId};

// Minimum space requested before each kind of block. Headings additionally
// reserve their own wrapped height plus the reserve of what follows them, so
// a label never sits alone at the bottom of a page. Keep the ordering.
pub const FIELD_BLOCK_RESERVE: f32 = 60.0;
pub const ATTACHMENTS_HEADER_RESERVE: f32 = 50.0;
pub const ATTACHMENT_GROUP_RESERVE: f32 = 40.0;
pub const ATTACHMENT_LINE_RESERVE: f32 = 30.0;
pub const LINE_RESERVE: f32 = 20.0;

const TITLE_SIZE: f32 = 18.0;
const TITLE_LINE_H: f32 = 24.0;
const META_SIZE: f32 = 10.0;
const META_LINE_H: f32 = 14.0;
const LABEL_SIZE: f32 = 11.0;
const LABEL_LINE_H: f32 = 16.0;
const VALUE_SIZE: f32 = 10.0;
const VALUE_LINE_H: f32 = 14.0;
const VALUE_INDENT: f32 = 10.0;
const ENTRY_SPACING: f32 = 8.0;
const SECTION_SIZE: f32 = 14.0;
const SECTION_LINE_H: f32 = 22.0;
const RULE_GAP: f32 = 20.0;
const FOOTER_SIZE: f32 = 9.0;

const ATTACHMENT_MARKER: &str = "\u{2022}";
const META_COLOR: [u8; 3] = [85, 85, 85];
const LINK_COLOR: [u8; 3] = [26, 84, 204];
const RULE_COLOR: [u8; 3] = [179, 179, 179];

#[derive(Clone, Debug, Default)]
pub struct RenderOptions {
    pub page: PageSetup,
    pub fonts: FontSource,
}

/// Lay out a submission without serializing it.
pub fn compose(
    request: &ExportRequest,
    options: &RenderOptions,
    formatter: &dyn SubmissionFormatter,
) -> Result<Document, Error> {
    let fonts = FontSet::load(&options.fonts)?;
    compose_with(request, options.page, &fonts, formatter)
}

pub(crate) fn render(
    request: &ExportRequest,
    options: &RenderOptions,
    formatter: &dyn SubmissionFormatter,
) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let fonts = FontSet::load(&options.fonts)?;
    let t_fonts = t0.elapsed();

    let doc = compose_with(request, options.page, &fonts, formatter)?;
    let t_layout = t0.elapsed();

    let info = writer::DocumentInfo {
        title: &request.title,
        subject: &request.submission_id,
        created: request.submitted_at,
    };
    let bytes = writer::write_pdf(&doc, &fonts, &info)?;
    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: fonts={:.1}ms, layout={:.1}ms, assembly={:.1}ms ({} pages)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_layout - t_fonts).as_secs_f64() * 1000.0,
        (t_assembly - t_layout).as_secs_f64() * 1000.0,
        doc.page_count(),
    );

    Ok(bytes)
}

fn compose_with(
    request: &ExportRequest,
    setup: PageSetup,
    fonts: &FontSet,
    formatter: &dyn SubmissionFormatter,
) -> Result<Document, Error> {
    if setup.top() - setup.margin_bottom < FIELD_BLOCK_RESERVE {
        return Err(Error::Layout(format!(
            "page body is shorter than a field block ({FIELD_BLOCK_RESERVE}pt)"
        )));
    }
    let mut composer = Composer {
        flow: PageFlow::new(setup)?,
        fonts,
    };

    log::debug!("compose {}: header", request.submission_id);
    let subject = formatter.extract_subject_name(&request.data);
    composer.header(request, subject.as_deref());

    log::debug!("compose {}: fields", request.submission_id);
    let mut deferred: Vec<AttachmentGroup> = Vec::new();
    for FieldEntry { key, label, value } in field_entries(request, formatter) {
        let text = match value {
            FieldValue::AttachmentList(files) => {
                deferred.push(AttachmentGroup { label, files });
                continue;
            }
            other => other.display_text().unwrap_or_default(),
        };
        let text = sanitize_text(&text);
        if text.trim().is_empty() {
            log::debug!("skipping empty field {key}");
            continue;
        }
        composer.field(&label, &text);
    }

    if !deferred.is_empty() {
        log::debug!(
            "compose {}: {} attachment group(s)",
            request.submission_id,
            deferred.len()
        );
        composer.attachments(&deferred);
    }

    log::debug!("compose {}: footers", request.submission_id);
    let Composer { flow, fonts } = composer;
    Ok(flow.finish(|page_num, total| footer(fonts, &setup, page_num, total)))
}

fn field_entries<'a>(
    request: &'a ExportRequest,
    formatter: &'a dyn SubmissionFormatter,
) -> impl Iterator<Item = FieldEntry> + 'a {
    request
        .data
        .iter()
        .filter(|(key, _)| !formatter.is_reserved(key))
        .map(|(key, raw)| FieldEntry {
            key: key.clone(),
            label: sanitize_text(&formatter.resolve_label(key)),
            value: formatter.format_value(raw),
        })
}

fn footer(fonts: &FontSet, setup: &PageSetup, page_num: usize, total: usize) -> DrawOp {
    let text = format!("Page {page_num} of {total}");
    let width = fonts.get(FontStyle::Regular).text_width(&text, FOOTER_SIZE);
    DrawOp::Text(TextOp {
        x: (setup.width - width) / 2.0,
        y: setup.margin_bottom / 2.0,
        text,
        style: FontStyle::Regular,
        size: FOOTER_SIZE,
        width,
        color: Some(META_COLOR),
    })
}

struct Composer<'a> {
    flow: PageFlow,
    fonts: &'a FontSet,
}

impl Composer<'_> {
    /// Draw one line at the cursor without moving it.
    fn line(
        &mut self,
        x: f32,
        text: &str,
        style: FontStyle,
        size: f32,
        color: Option<[u8; 3]>,
    ) -> (PageId, f32) {
        let width = self.fonts.get(style).text_width(text, size);
        let page = self.flow.draw(DrawOp::Text(TextOp {
            x,
            y: self.flow.cursor(),
            text: text.to_string(),
            style,
            size,
            width,
            color,
        }));
        (page, width)
    }

    /// Word-wrap `text` into `max_width` and draw it line by line, breaking
    /// pages as needed. Each line of the input starts a new paragraph.
    /// Returns the cursor after the last line.
    fn wrapped(
        &mut self,
        x: f32,
        max_width: f32,
        text: &str,
        style: FontStyle,
        size: f32,
        line_h: f32,
        color: Option<[u8; 3]>,
    ) -> f32 {
        let metrics = self.fonts.get(style);
        for paragraph in text.lines() {
            for line in wrap_lines(paragraph, max_width, |s| metrics.text_width(s, size)) {
                self.flow.ensure_space(LINE_RESERVE);
                self.line(x, &line, style, size, color);
                self.flow.advance(line_h);
            }
        }
        self.flow.cursor()
    }

    fn header(&mut self, request: &ExportRequest, subject: Option<&str>) {
        let setup = *self.flow.setup();
        let x = setup.margin_left;

        let title = sanitize_text(&request.title);
        self.wrapped(
            x,
            setup.content_width(),
            &title,
            FontStyle::Bold,
            TITLE_SIZE,
            TITLE_LINE_H,
            None,
        );

        if let Some(name) = subject {
            let name = sanitize_text(name);
            self.wrapped(
                x,
                setup.content_width(),
                &format!("Name: {name}"),
                FontStyle::Regular,
                LABEL_SIZE,
                LABEL_LINE_H,
                None,
            );
        }

        let meta = [
            format!("Submission ID: {}", sanitize_text(&request.submission_id)),
            format!(
                "Submitted: {}",
                request.submitted_at.format("%d %B %Y, %H:%M UTC")
            ),
        ];
        for text in &meta {
            self.flow.ensure_space(LINE_RESERVE);
            self.line(x, text, FontStyle::Regular, META_SIZE, Some(META_COLOR));
            self.flow.advance(META_LINE_H);
        }

        self.flow.ensure_space(LINE_RESERVE);
        let y = self.flow.cursor() + META_LINE_H / 2.0;
        self.flow.draw(DrawOp::Rule {
            x0: x,
            x1: setup.width - setup.margin_right,
            y,
            thickness: 1.0,
            color: RULE_COLOR,
        });
        self.flow.advance(RULE_GAP);
    }

    /// Lines `text` occupies once wrapped, counting each paragraph.
    fn line_count(&self, text: &str, max_width: f32, style: FontStyle, size: f32) -> usize {
        let metrics = self.fonts.get(style);
        text.lines()
            .map(|p| wrap_lines(p, max_width, |s| metrics.text_width(s, size)).len())
            .sum()
    }

    /// Height of a bold label wrapped to the content width.
    fn label_height(&self, label: &str) -> f32 {
        let width = self.flow.setup().content_width();
        self.line_count(label, width, FontStyle::Bold, LABEL_SIZE) as f32 * LABEL_LINE_H
    }

    /// Space a group needs so its label is followed by at least one file.
    fn group_reserve(&self, group: &AttachmentGroup) -> f32 {
        ATTACHMENT_GROUP_RESERVE.max(self.label_height(&group.label) + ATTACHMENT_LINE_RESERVE)
    }

    fn field(&mut self, label: &str, text: &str) {
        let setup = *self.flow.setup();
        let reserve = FIELD_BLOCK_RESERVE.max(self.label_height(label) + LINE_RESERVE);
        self.flow.ensure_space(reserve);
        self.wrapped(
            setup.margin_left,
            setup.content_width(),
            label,
            FontStyle::Bold,
            LABEL_SIZE,
            LABEL_LINE_H,
            None,
        );
        self.wrapped(
            setup.margin_left + VALUE_INDENT,
            setup.content_width() - VALUE_INDENT,
            text,
            FontStyle::Regular,
            VALUE_SIZE,
            VALUE_LINE_H,
            None,
        );
        self.flow.advance(ENTRY_SPACING);
    }

    fn attachments(&mut self, groups: &[AttachmentGroup]) {
        let setup = *self.flow.setup();
        let x = setup.margin_left;

        let first_group = groups.first().map_or(0.0, |g| self.group_reserve(g));
        self.flow
            .ensure_space(ATTACHMENTS_HEADER_RESERVE.max(SECTION_LINE_H + first_group));
        self.line(x, "Attachments", FontStyle::Bold, SECTION_SIZE, None);
        self.flow.advance(SECTION_LINE_H);

        for group in groups {
            let reserve = self.group_reserve(group);
            self.flow.ensure_space(reserve);
            self.wrapped(
                x,
                setup.content_width(),
                &group.label,
                FontStyle::Bold,
                LABEL_SIZE,
                LABEL_LINE_H,
                None,
            );
            for file in &group.files {
                self.attachment_line(x + VALUE_INDENT, file);
            }
            self.flow.advance(ENTRY_SPACING);
        }
    }

    /// Marker plus underlined filename, with a link over the filename on
    /// whichever page it lands.
    fn attachment_line(&mut self, x: f32, file: &AttachmentRef) {
        let setup = *self.flow.setup();
        let metrics = self.fonts.get(FontStyle::Regular);
        let name_x = x + metrics.text_width(&format!("{ATTACHMENT_MARKER} "), VALUE_SIZE);
        let max_width = setup.width - setup.margin_right - name_x;
        let name = sanitize_text(&file.name).replace(['\n', '\r', '\t'], " ");
        let name = truncate_to_width(&name, max_width, |s| metrics.text_width(s, VALUE_SIZE));

        self.flow.ensure_space(ATTACHMENT_LINE_RESERVE);
        self.line(x, ATTACHMENT_MARKER, FontStyle::Regular, VALUE_SIZE, None);
        let (page, width) =
            self.line(name_x, &name, FontStyle::Regular, VALUE_SIZE, Some(LINK_COLOR));
        let y = self.flow.cursor();
        self.flow.draw(DrawOp::Rule {
            x0: name_x,
            x1: name_x + width,
            y: y - 1.5,
            thickness: 0.5,
            color: LINK_COLOR,
        });
        self.flow
            .add_link(page, link_for_text(name_x, y, width, VALUE_SIZE, &file.url));
        self.flow.advance(VALUE_LINE_H);
    }
}
