use pdf_writer::Rect;

use crate::error::Error;
use crate::fonts::FontStyle;

/// Page size and margins, in points. The origin is the bottom-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSetup {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageSetup {
    pub fn a4() -> Self {
        Self::with_margins(595.28, 841.89, 50.0)
    }

    pub fn letter() -> Self {
        Self::with_margins(612.0, 792.0, 50.0)
    }

    pub fn with_margins(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin_top: margin,
            margin_bottom: margin,
            margin_left: margin,
            margin_right: margin,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// Baseline of the first line on a fresh page.
    pub fn top(&self) -> f32 {
        self.height - self.margin_top
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.content_width() <= 0.0 || self.top() <= self.margin_bottom {
            return Err(Error::Layout(format!(
                "margins leave no content area on a {}x{} page",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextOp {
    pub x: f32,
    /// Baseline.
    pub y: f32,
    pub text: String,
    pub style: FontStyle,
    pub size: f32,
    /// Measured advance width of `text` at `size`.
    pub width: f32,
    pub color: Option<[u8; 3]>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Text(TextOp),
    /// Horizontal line from `x0` to `x1`.
    Rule {
        x0: f32,
        x1: f32,
        y: f32,
        thickness: f32,
        color: [u8; 3],
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkAnnotation {
    pub rect: Rect,
    pub url: String,
}

#[derive(Clone, Debug, Default)]
pub struct Page {
    ops: Vec<DrawOp>,
    links: Vec<LinkAnnotation>,
}

impl Page {
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn links(&self) -> &[LinkAnnotation] {
        &self.links
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextOp> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(t) => Some(t),
            DrawOp::Rule { .. } => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.text.contains(needle))
    }
}

/// Index of a page within the flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PageId(pub(crate) usize);

/// Slack for accumulated rounding in the cursor arithmetic.
const FIT_TOLERANCE: f32 = 0.01;

/// Owns the growing page list and the vertical write cursor while a
/// document is being composed. The cursor is the baseline of the next line.
pub(crate) struct PageFlow {
    setup: PageSetup,
    pages: Vec<Page>,
    cursor: f32,
}

impl PageFlow {
    pub(crate) fn new(setup: PageSetup) -> Result<Self, Error> {
        setup.validate()?;
        Ok(Self {
            setup,
            pages: vec![Page::default()],
            cursor: setup.top(),
        })
    }

    pub(crate) fn setup(&self) -> &PageSetup {
        &self.setup
    }

    pub(crate) fn cursor(&self) -> f32 {
        self.cursor
    }

    /// Move the cursor down. It stops at the bottom margin, so trailing
    /// spacing at a page end makes the next block start a new page.
    pub(crate) fn advance(&mut self, dy: f32) {
        self.cursor = (self.cursor - dy).max(self.setup.margin_bottom);
    }

    pub(crate) fn current(&self) -> PageId {
        PageId(self.pages.len() - 1)
    }

    /// Start a new page when fewer than `required` points remain above the
    /// bottom margin. Returns the page to draw on. A page with nothing on it
    /// is never left behind, even when `required` exceeds the page body.
    pub(crate) fn ensure_space(&mut self, required: f32) -> PageId {
        let remaining = self.cursor - self.setup.margin_bottom;
        if remaining + FIT_TOLERANCE < required && !self.current_is_blank() {
            self.pages.push(Page::default());
            self.cursor = self.setup.top();
            log::debug!("page break → page {}", self.pages.len());
        }
        self.current()
    }

    fn current_is_blank(&self) -> bool {
        self.pages.last().is_none_or(|p| p.ops.is_empty())
    }

    pub(crate) fn draw(&mut self, op: DrawOp) -> PageId {
        let id = self.current();
        self.pages[id.0].ops.push(op);
        id
    }

    pub(crate) fn add_link(&mut self, page: PageId, link: LinkAnnotation) {
        self.pages[page.0].links.push(link);
    }

    /// Close the flow. `footer` is called once per page with the 1-based page
    /// number and the final page count.
    pub(crate) fn finish(mut self, footer: impl Fn(usize, usize) -> DrawOp) -> Document {
        let total = self.pages.len();
        for (i, page) in self.pages.iter_mut().enumerate() {
            page.ops.push(footer(i + 1, total));
        }
        Document {
            setup: self.setup,
            pages: self.pages,
        }
    }
}

/// A composed, paginated document. Read-only once produced.
#[derive(Clone, Debug)]
pub struct Document {
    setup: PageSetup,
    pages: Vec<Page>,
}

impl Document {
    pub fn setup(&self) -> &PageSetup {
        &self.setup
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn links(&self) -> impl Iterator<Item = &LinkAnnotation> {
        self.pages.iter().flat_map(|p| p.links.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_op(y: f32) -> DrawOp {
        DrawOp::Text(TextOp {
            x: 50.0,
            y,
            text: "x".into(),
            style: FontStyle::Regular,
            size: 10.0,
            width: 5.0,
            color: None,
        })
    }

    #[test]
    fn ensure_space_keeps_page_when_room_remains() {
        let mut flow = PageFlow::new(PageSetup::a4()).unwrap();
        let first = flow.ensure_space(60.0);
        assert_eq!(first, PageId(0));
        assert_eq!(flow.cursor(), PageSetup::a4().top());
    }

    #[test]
    fn ensure_space_breaks_when_block_does_not_fit() {
        let setup = PageSetup::a4();
        let mut flow = PageFlow::new(setup).unwrap();
        flow.draw(text_op(setup.top()));
        flow.advance(setup.top() - setup.margin_bottom - 40.0);
        assert_eq!(flow.ensure_space(30.0), PageId(0));
        assert_eq!(flow.ensure_space(60.0), PageId(1));
        assert_eq!(flow.cursor(), setup.top());
    }

    #[test]
    fn blank_page_is_never_skipped() {
        let setup = PageSetup::a4();
        let mut flow = PageFlow::new(setup).unwrap();
        assert_eq!(flow.ensure_space(10_000.0), PageId(0));
        flow.draw(text_op(setup.top()));
        assert_eq!(flow.ensure_space(10_000.0), PageId(1));
        assert_eq!(flow.ensure_space(10_000.0), PageId(1));
        assert_eq!(flow.finish(|_, _| text_op(25.0)).page_count(), 2);
    }

    #[test]
    fn cursor_stops_at_bottom_margin() {
        let setup = PageSetup::a4();
        let mut flow = PageFlow::new(setup).unwrap();
        flow.draw(text_op(setup.top()));
        flow.advance(setup.top() - setup.margin_bottom - 12.0);
        flow.advance(20.0);
        assert_eq!(flow.cursor(), setup.margin_bottom);
        assert_eq!(flow.ensure_space(1.0), PageId(1));
    }

    #[test]
    fn rounding_does_not_force_a_break() {
        let setup = PageSetup::a4();
        let mut flow = PageFlow::new(setup).unwrap();
        flow.draw(text_op(setup.top()));
        let remaining = setup.top() - setup.margin_bottom;
        flow.advance(remaining - 68.0);
        flow.advance(22.0);
        assert_eq!(flow.ensure_space(46.0), PageId(0));
    }

    #[test]
    fn links_attach_to_requested_page() {
        let mut flow = PageFlow::new(PageSetup::a4()).unwrap();
        let first = flow.draw(text_op(700.0));
        flow.advance(10_000.0);
        let second = flow.ensure_space(20.0);
        let link = |url: &str| LinkAnnotation {
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            url: url.into(),
        };
        flow.add_link(first, link("a"));
        flow.add_link(second, link("b"));
        flow.add_link(second, link("c"));
        let doc = flow.finish(|_, _| text_op(25.0));
        assert_eq!(doc.pages()[0].links().len(), 1);
        let urls: Vec<&str> = doc.pages()[1].links().iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, ["b", "c"]);
    }

    #[test]
    fn footer_sees_final_page_count() {
        let mut flow = PageFlow::new(PageSetup::letter()).unwrap();
        for _ in 0..2 {
            flow.draw(text_op(700.0));
            flow.advance(10_000.0);
            flow.ensure_space(20.0);
        }
        let doc = flow.finish(|i, n| {
            let mut op = text_op(25.0);
            if let DrawOp::Text(t) = &mut op {
                t.text = format!("{i}/{n}");
            }
            op
        });
        let footers: Vec<String> = doc
            .pages()
            .iter()
            .map(|p| p.texts().last().unwrap().text.clone())
            .collect();
        assert_eq!(footers, ["1/3", "2/3", "3/3"]);
    }

    #[test]
    fn degenerate_margins_are_rejected() {
        let setup = PageSetup::with_margins(100.0, 100.0, 60.0);
        assert!(matches!(PageFlow::new(setup), Err(Error::Layout(_))));
    }
}
