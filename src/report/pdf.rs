//! PDF rendering of a [`Document`] via `printpdf`.
//!
//! Layout runs first as a pure pass ([`layout`]) that places every wrapped
//! line on a page; drawing then replays the placed lines. US Letter pages,
//! one-inch margins, built-in Times fonts.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::{BuiltinFont, Mm, PdfDocument};

use super::document::{Document, Spacing};
use super::ReportError;

const PAGE_WIDTH_MM: f32 = 215.9;
const PAGE_HEIGHT_MM: f32 = 279.4;
const MARGIN_MM: f32 = 25.4;
const PT_TO_MM: f32 = 0.3528;
const LINE_SPACING: f32 = 1.15;
/// Gap after a `Spacing::Normal` paragraph.
const PARAGRAPH_GAP_PT: f32 = 8.0;
/// Usable text width between the side margins.
const COLUMN_WIDTH_PT: f32 = (PAGE_WIDTH_MM - 2.0 * MARGIN_MM) / PT_TO_MM;
/// Advance assumed for glyphs outside the tables below (a full em).
const FALLBACK_GLYPH_UNITS: u32 = 1000;

/// Times-Roman advance widths for ASCII 0x20..=0x7E, in 1/1000 em (Adobe AFM).
#[rustfmt::skip]
const TIMES_ROMAN_UNITS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 333, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

/// Times-Bold advance widths for ASCII 0x20..=0x7E, in 1/1000 em (Adobe AFM).
#[rustfmt::skip]
const TIMES_BOLD_UNITS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 333, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

/// A wrapped line at its final position. `y_mm` is the text baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub page: usize,
    pub y_mm: f32,
    pub text: String,
    pub bold: bool,
}

/// Place every line of `document`, breaking pages at the bottom margin.
pub fn layout(document: &Document) -> Vec<PlacedLine> {
    let font_size = document.typography.font_size_pt;
    let line_height = font_size * LINE_SPACING * PT_TO_MM;
    let max_units = column_units(font_size);
    let paragraph_gap = PARAGRAPH_GAP_PT * PT_TO_MM;
    let top = PAGE_HEIGHT_MM - MARGIN_MM;

    let mut placed = Vec::new();
    let mut page = 0;
    let mut y = top;

    for paragraph in &document.paragraphs {
        for source_line in paragraph.lines() {
            for line in wrap_text(source_line, max_units, paragraph.bold) {
                if y - line_height < MARGIN_MM {
                    page += 1;
                    y = top;
                }
                y -= line_height;
                placed.push(PlacedLine {
                    page,
                    y_mm: y,
                    text: line,
                    bold: paragraph.bold,
                });
            }
        }
        if paragraph.spacing == Spacing::Normal {
            y -= paragraph_gap;
        }
    }
    placed
}

/// Renders the document to PDF. Returns PDF bytes.
pub fn render_pdf(document: &Document) -> Result<Vec<u8>, ReportError> {
    let (doc, page1, layer1) = PdfDocument::new(
        &document.title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::TimesRoman)
        .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::TimesBold)
        .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;
    let size = document.typography.font_size_pt;

    let lines = layout(document);
    let mut layers = vec![doc.get_page(page1).get_layer(layer1)];

    for line in &lines {
        while layers.len() <= line.page {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            layers.push(doc.get_page(page).get_layer(layer));
        }
        if line.text.is_empty() {
            continue;
        }
        let face = if line.bold { &bold } else { &font };
        layers[line.page].use_text(line.text.as_str(), size, Mm(MARGIN_MM), Mm(line.y_mm), face);
    }

    tracing::debug!(pages = layers.len(), lines = lines.len(), "Report PDF rendered");
    drop(layers);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ReportError::Pdf(format!("buffer error: {e}")))
}

/// Writes PDF bytes to `dir/filename`, creating `dir` if needed.
///
/// An existing file with the same name is overwritten.
pub fn export_pdf_to_file(
    pdf_bytes: &[u8],
    filename: &str,
    dir: &Path,
) -> Result<PathBuf, ReportError> {
    if filename.is_empty() || filename.contains(['/', '\\']) || filename == ".." {
        return Err(ReportError::InvalidFilename(filename.to_string()));
    }

    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    std::fs::write(&path, pdf_bytes)?;

    tracing::info!(path = %path.display(), bytes = pdf_bytes.len(), "Report exported");
    Ok(path)
}

fn glyph_units(c: char, bold: bool) -> u32 {
    let table = if bold { &TIMES_BOLD_UNITS } else { &TIMES_ROMAN_UNITS };
    (c as usize)
        .checked_sub(0x20)
        .and_then(|i| table.get(i))
        .map_or(FALLBACK_GLYPH_UNITS, |w| u32::from(*w))
}

/// Width of `text` in 1/1000 em of the Times face.
fn text_units(text: &str, bold: bool) -> u32 {
    text.chars().map(|c| glyph_units(c, bold)).sum()
}

/// Column width in 1/1000 em at `font_size_pt`.
fn column_units(font_size_pt: f32) -> u32 {
    (COLUMN_WIDTH_PT * 1000.0 / font_size_pt) as u32
}

/// Greedy word wrap by glyph width. Words wider than the column are split
/// at character boundaries so nothing runs past the right margin.
fn wrap_text(text: &str, max_units: u32, bold: bool) -> Vec<String> {
    let space = glyph_units(' ', bold);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut width = 0;

    for word in text.split_whitespace() {
        let word_width = text_units(word, bold);
        if !current.is_empty() && width + space + word_width > max_units {
            lines.push(std::mem::take(&mut current));
            width = 0;
        }

        if word_width > max_units {
            for c in word.chars() {
                let w = glyph_units(c, bold);
                if !current.is_empty() && width + w > max_units {
                    lines.push(std::mem::take(&mut current));
                    width = 0;
                }
                current.push(c);
                width += w;
            }
            continue;
        }

        if !current.is_empty() {
            current.push(' ');
            width += space;
        }
        current.push_str(word);
        width += word_width;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
