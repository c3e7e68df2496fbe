mod error;
mod fonts;
mod format;
mod labels;
mod model;
mod pdf;
mod sanitize;

pub use error::Error;
pub use fonts::{FontSource, FontStyle};
pub use format::{
    StandardFormatter, SubmissionFormatter, extract_subject_name, format_value, is_reserved_key,
};
pub use labels::{LabelResolver, humanize_key};
pub use model::{AttachmentRef, ExportRequest, FieldValue};
pub use pdf::{
    ATTACHMENT_GROUP_RESERVE, ATTACHMENT_LINE_RESERVE, ATTACHMENTS_HEADER_RESERVE, Document,
    DrawOp, FIELD_BLOCK_RESERVE, LINE_RESERVE, LinkAnnotation, Page, PageSetup, RenderOptions,
    TextOp, compose,
};
pub use sanitize::{PLACEHOLDER, sanitize_text};

use std::path::Path;
use std::time::Instant;

/// Render a submission with the default page setup, builtin fonts and the
/// request's own label overrides. `None` means the render failed; the cause
/// has been logged.
pub fn render_submission(request: &ExportRequest) -> Option<Vec<u8>> {
    let formatter = StandardFormatter::new(request.field_labels.clone().unwrap_or_default());
    render_submission_with(request, &RenderOptions::default(), &formatter)
}

/// Like [`render_submission`] with explicit options and collaborators. The
/// formatter alone decides labels; `request.field_labels` is not consulted.
pub fn render_submission_with(
    request: &ExportRequest,
    options: &RenderOptions,
    formatter: &dyn SubmissionFormatter,
) -> Option<Vec<u8>> {
    match try_render_submission(request, options, formatter) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::error!(
                "PDF export of submission {} failed: {e}",
                request.submission_id
            );
            None
        }
    }
}

pub fn try_render_submission(
    request: &ExportRequest,
    options: &RenderOptions,
    formatter: &dyn SubmissionFormatter,
) -> Result<Vec<u8>, Error> {
    pdf::render(request, options, formatter)
}

/// Read an [`ExportRequest`] JSON file and write the rendered PDF.
pub fn convert_json_to_pdf(
    input: &Path,
    output: &Path,
    options: &RenderOptions,
) -> Result<(), Error> {
    let t0 = Instant::now();

    let json = std::fs::read_to_string(input).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, input.display()),
        ))
    })?;
    let request: ExportRequest = serde_json::from_str(&json)?;
    let t_parse = t0.elapsed();

    let formatter = StandardFormatter::new(request.field_labels.clone().unwrap_or_default());
    let bytes = try_render_submission(&request, options, &formatter)?;
    let t_render = t0.elapsed();

    std::fs::write(output, &bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t_render - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}
