use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::error::Error;

/// Where the regular and bold faces come from.
#[derive(Clone, Debug, Default)]
pub enum FontSource {
    /// The standard Helvetica pair, not embedded.
    #[default]
    Builtin,
    /// TrueType/OpenType files, subset and embedded. Without a bold file the
    /// regular face is used for labels too.
    TrueType {
        regular: PathBuf,
        bold: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
}

struct FaceData {
    bytes: Vec<u8>,
    face_index: u32,
    family: String,
}

/// Layout metrics for one face. Widths are indexed by WinAnsi byte - 32,
/// which covers everything the sanitizer lets through.
pub(crate) struct FontMetrics {
    widths_1000: Vec<f32>,
    base_font: &'static str,
    face: Option<FaceData>,
}

impl FontMetrics {
    fn builtin(style: FontStyle) -> Self {
        let (widths_1000, base_font) = match style {
            FontStyle::Regular => (helvetica_widths(), "Helvetica"),
            FontStyle::Bold => (helvetica_bold_widths(), "Helvetica-Bold"),
        };
        FontMetrics {
            widths_1000,
            base_font,
            face: None,
        }
    }

    fn load_truetype(path: &Path) -> Result<Self, Error> {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::Font(format!("cannot read {}: {e}", path.display()))
        })?;
        let face = Face::parse(&bytes, 0)
            .map_err(|e| Error::Font(format!("cannot parse {}: {e}", path.display())))?;

        let units = face.units_per_em() as f32;
        let widths_1000: Vec<f32> = (32u8..=255u8)
            .map(|byte| {
                face.glyph_index(winansi_to_char(byte))
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| adv as f32 / units * 1000.0)
                    .unwrap_or(0.0)
            })
            .collect();
        let family = font_family_name(&face).unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Embedded".to_string())
        });

        Ok(FontMetrics {
            widths_1000,
            base_font: "Helvetica",
            face: Some(FaceData {
                bytes,
                face_index: 0,
                family,
            }),
        })
    }

    pub(crate) fn text_width(&self, text: &str, font_size: f32) -> f32 {
        to_winansi_bytes(text)
            .iter()
            .filter(|&&b| b >= 32)
            .map(|&b| self.widths_1000[(b - 32) as usize] * font_size / 1000.0)
            .sum()
    }
}

/// The faces one render call lays out and embeds with.
pub(crate) struct FontSet {
    regular: FontMetrics,
    bold: FontMetrics,
}

impl FontSet {
    pub(crate) fn load(source: &FontSource) -> Result<Self, Error> {
        let t0 = std::time::Instant::now();
        let set = match source {
            FontSource::Builtin => FontSet {
                regular: FontMetrics::builtin(FontStyle::Regular),
                bold: FontMetrics::builtin(FontStyle::Bold),
            },
            FontSource::TrueType { regular, bold } => FontSet {
                regular: FontMetrics::load_truetype(regular)?,
                bold: FontMetrics::load_truetype(bold.as_deref().unwrap_or(regular))?,
            },
        };
        log::debug!(
            "FontSet::load: {source:?} → {:.1}ms",
            t0.elapsed().as_secs_f64() * 1000.0,
        );
        Ok(set)
    }

    pub(crate) fn get(&self, style: FontStyle) -> &FontMetrics {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
        }
    }
}

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

/// The 0x80..=0x9F block of Windows-1252, where bytes and codepoints differ.
/// 0x81, 0x8D, 0x8F, 0x90 and 0x9D are unassigned.
const WINANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

fn winansi_to_char(byte: u8) -> char {
    WINANSI_HIGH
        .iter()
        .find(|&&(b, _)| b == byte)
        .map_or(byte as char, |&(_, c)| c)
}

/// WinAnsi byte for `c`, or 0 when the builtin fonts cannot show it.
pub(crate) fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x20..=0x7E | 0xA0..=0xFF => c as u8,
        _ => WINANSI_HIGH
            .iter()
            .find(|&&(_, ch)| ch == c)
            .map_or(0, |&(b, _)| b),
    }
}

/// Unmappable chars are dropped; sanitize first.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b != 0)
        .collect()
}

/// Big-endian glyph ids for an Identity-H font. Chars missing from the
/// subset map to .notdef.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    text.chars()
        .flat_map(|ch| char_to_gid.get(&ch).copied().unwrap_or(0).to_be_bytes())
        .collect()
}

/// Helvetica AFM widths at 1000 units/em for WinAnsi chars 32..=255.
/// Exact for printable ASCII, approximate above it.
fn helvetica_widths() -> Vec<f32> {
    const ASCII: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // sp..'/'
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
        278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
        278, 278, 278, 469, 556, 333, // '['..'`'
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
        334, 260, 334, 584, // '{'..'~'
    ];
    extend_latin1(&ASCII, 350.0)
}

/// Helvetica-Bold AFM widths, same layout as [`helvetica_widths`].
fn helvetica_bold_widths() -> Vec<f32> {
    const ASCII: [u16; 95] = [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        333, 333, 584, 584, 584, 611, 975,
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        333, 278, 333, 584, 556, 333,
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        389, 280, 389, 584,
    ];
    extend_latin1(&ASCII, 350.0)
}

fn extend_latin1(ascii: &[u16; 95], bullet: f32) -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| match b {
            32..=126 => ascii[(b - 32) as usize] as f32,
            0x85 => 1000.0, // ellipsis
            0x95 => bullet,
            0x96 => 556.0,
            0x97 => 1000.0,
            0x91 | 0x92 => 222.0,
            0xC0..=0xDE => 722.0,
            _ => 556.0,
        })
        .collect()
}

/// Converts font units to the 1000/em glyph space PDF expects.
struct EmScale(f32);

impl EmScale {
    fn of(face: &Face) -> Self {
        EmScale(1000.0 / face.units_per_em() as f32)
    }

    fn apply(&self, units: impl Into<f32>) -> f32 {
        units.into() * self.0
    }
}

fn identity_system_info() -> pdf_writer::types::SystemInfo<'static> {
    pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    }
}

/// Write `face_data` as a Type0 font over a subset CID font (Identity-H)
/// and return the char → subset glyph id map used to encode text for it.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    face_data: &FaceData,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<HashMap<char, u16>, Error> {
    let family = face_data.family.as_str();
    let face = Face::parse(&face_data.bytes, face_data.face_index)
        .map_err(|e| Error::Font(format!("{family}: {e}")))?;
    let em = EmScale::of(&face);

    // Sorted so glyph ids, and therefore the output bytes, are stable.
    let mut chars: Vec<char> = used_chars.iter().copied().collect();
    chars.sort_unstable();

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::with_capacity(chars.len());
    let mut widths: Vec<(u16, f32)> = Vec::with_capacity(chars.len());
    for ch in chars {
        let Some(gid) = face.glyph_index(ch) else {
            continue;
        };
        let subset_gid = remapper.remap(gid.0);
        if char_to_gid.insert(ch, subset_gid).is_none() {
            let advance = face.glyph_hor_advance(gid).unwrap_or(0);
            widths.push((subset_gid, em.apply(advance)));
        }
    }
    widths.sort_by_key(|&(gid, _)| gid);
    widths.dedup_by_key(|&mut (gid, _)| gid);

    let program = match subsetter::subset(&face_data.bytes, face_data.face_index, &remapper) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("subsetting {family} failed ({e}), embedding the whole font");
            face_data.bytes.clone()
        }
    };
    let program_len = i32::try_from(program.len())
        .map_err(|_| Error::Font(format!("{family}: font program too large")))?;

    let descriptor_ref = alloc();
    let program_ref = alloc();
    let cid_font_ref = alloc();
    let cmap_ref = alloc();
    let base_font = family.replace(' ', "");

    pdf.stream(program_ref, &program)
        .pair(Name(b"Length1"), program_len);

    let bb = face.global_bounding_box();
    pdf.font_descriptor(descriptor_ref)
        .name(Name(base_font.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(Rect::new(
            em.apply(bb.x_min),
            em.apply(bb.y_min),
            em.apply(bb.x_max),
            em.apply(bb.y_max),
        ))
        .italic_angle(0.0)
        .ascent(em.apply(face.ascender()))
        .descent(em.apply(face.descender()))
        .cap_height(face.capital_height().map_or(700.0, |h| em.apply(h)))
        .stem_v(80.0)
        .font_file2(program_ref);

    let mut cid = pdf.cid_font(cid_font_ref);
    cid.subtype(pdf_writer::types::CidFontType::Type2)
        .base_font(Name(base_font.as_bytes()))
        .system_info(identity_system_info())
        .font_descriptor(descriptor_ref)
        .default_width(0.0)
        .cid_to_gid_map_predefined(Name(b"Identity"));
    if !widths.is_empty() {
        let mut w = cid.widths();
        for &(gid, width) in &widths {
            w.consecutive(gid, [width]);
        }
    }
    drop(cid);

    let cmap_name = format!("{base_font}-UTF16");
    let mut cmap =
        pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), identity_system_info());
    for (&ch, &gid) in &char_to_gid {
        cmap.pair(gid, ch);
    }
    pdf.stream(cmap_ref, cmap.finish().as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(base_font.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(cmap_ref);

    Ok(char_to_gid)
}

/// A face written into the output file.
pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    char_to_gid: Option<HashMap<char, u16>>,
}

impl FontEntry {
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

pub(crate) fn register_font(
    pdf: &mut Pdf,
    metrics: &FontMetrics,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &HashSet<char>,
) -> Result<FontEntry, Error> {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let char_to_gid = match &metrics.face {
        Some(face_data) => Some(embed_truetype(pdf, font_ref, face_data, used_chars, alloc)?),
        None => {
            pdf.type1_font(font_ref)
                .base_font(Name(metrics.base_font.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            None
        }
    };

    log::debug!(
        "register_font: {pdf_name} ({} chars) → {:.1}ms",
        used_chars.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(FontEntry {
        pdf_name,
        font_ref,
        char_to_gid,
    })
}
