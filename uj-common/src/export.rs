//! Table export to CSV and PDF
//!
//! Both formats serialize a [`RenderedTable`], i.e. exactly the headers and
//! cell text a reader sees. The action column is never exported.
//!
//! CSV output joins cells with `,` and lines with `\n` and performs no
//! quoting or escaping. A cell containing a comma or a newline therefore
//! shifts or splits its row; callers who need round-trippable CSV must not
//! rely on this format.
//!
//! PDF output embeds a TrueType font so that Cyrillic and other non-Latin
//! text renders without substitution glyphs. DejaVu Sans ships inside the
//! crate; a configured font file replaces it (e.g. for CJK text, which
//! DejaVu Sans does not cover).

use printpdf::{Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb};
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::table::RenderedTable;
use crate::{Error, Result};

/// Output format of a table export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Download file name: `{title}.{ext}`
    pub fn file_name(&self, title: &str) -> String {
        format!("{}.{}", title, self.extension())
    }
}

/// Serialize headers and rows as comma-joined lines (no escaping)
pub fn to_csv(table: &RenderedTable) -> String {
    let mut lines = Vec::with_capacity(table.rows.len() + 1);
    lines.push(table.headers.join(","));
    lines.extend(table.rows.iter().map(|row| row.join(",")));
    lines.join("\n")
}

// ========================================
// PDF
// ========================================

/// DejaVu Sans 2.37 (Latin, Greek, Cyrillic); license in `fonts/LICENSE`
pub static BUNDLED_FONT: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

/// TrueType font embedded in exported PDFs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfFont {
    /// [`BUNDLED_FONT`], compiled into the binary
    Bundled,
    /// Font file chosen in the configuration
    File(PathBuf),
}

impl PdfFont {
    fn load(&self) -> Result<Cow<'static, [u8]>> {
        match self {
            PdfFont::Bundled => Ok(Cow::Borrowed(BUNDLED_FONT)),
            PdfFont::File(path) => fs::read(path).map(Cow::Owned).map_err(|e| {
                Error::Export(format!("Failed to read PDF font {}: {}", path.display(), e))
            }),
        }
    }
}

impl fmt::Display for PdfFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfFont::Bundled => write!(f, "bundled DejaVu Sans"),
            PdfFont::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Pick the PDF font: the configured file, else the bundled one
///
/// A configured path that is not a file is an error, never a silent
/// fallback.
pub fn resolve_font(configured: Option<&Path>) -> Result<PdfFont> {
    match configured {
        Some(path) if path.is_file() => Ok(PdfFont::File(path.to_path_buf())),
        Some(path) => Err(Error::Export(format!(
            "PDF font not found: {}",
            path.display()
        ))),
        None => Ok(PdfFont::Bundled),
    }
}

/// 1pt in mm
const PT_MM: f32 = 0.3528;

/// Fixed layout of exported PDF tables (A4 portrait)
#[derive(Debug, Clone)]
pub struct PdfStyle {
    pub font: PdfFont,
    pub font_size_pt: f32,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    /// Distance between baselines of wrapped cell lines
    pub line_height_mm: f32,
    pub cell_padding_mm: f32,
    /// Header background, RGB 0-255
    pub header_fill: [u8; 3],
    pub header_text: [u8; 3],
    pub body_text: [u8; 3],
    /// Background of every other body row
    pub stripe_fill: [u8; 3],
}

impl PdfStyle {
    pub fn new(font: PdfFont) -> Self {
        Self {
            font,
            font_size_pt: 8.0,
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_mm: 14.0,
            line_height_mm: 3.6,
            cell_padding_mm: 1.5,
            header_fill: [75, 85, 99],
            header_text: [255, 255, 255],
            body_text: [33, 33, 33],
            stripe_fill: [245, 245, 245],
        }
    }

    fn column_width_mm(&self, columns: usize) -> f32 {
        (self.page_width_mm - 2.0 * self.margin_mm) / columns.max(1) as f32
    }

    /// Conservative character count per cell line
    fn max_chars(&self, columns: usize) -> usize {
        // DejaVu Sans averages about 0.6 em per glyph
        let glyph_mm = self.font_size_pt * 0.6 * PT_MM;
        let text_mm = self.column_width_mm(columns) - 2.0 * self.cell_padding_mm;
        ((text_mm / glyph_mm).floor() as usize).max(1)
    }

    /// Height of a row whose tallest cell has `lines` lines
    pub fn row_height_mm(&self, lines: usize) -> f32 {
        lines.max(1) as f32 * self.line_height_mm + 2.0 * self.cell_padding_mm
    }

    /// Vertical space for body rows below a header of `header_height` mm
    fn body_height_mm(&self, header_height: f32) -> f32 {
        self.page_height_mm - 2.0 * self.margin_mm - header_height
    }
}

/// Split rows of the given heights into per-page ranges
///
/// Each page holds the repeated header plus as many whole rows as fit.
/// An empty table still yields one page holding just the header.
pub fn page_ranges(heights: &[f32], header_height: f32, style: &PdfStyle) -> Vec<Range<usize>> {
    let available = style.body_height_mm(header_height);
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut used = 0.0;

    for (i, &height) in heights.iter().enumerate() {
        if i > start && used + height > available {
            ranges.push(start..i);
            start = i;
            used = 0.0;
        }
        used += height;
    }
    ranges.push(start..heights.len());
    ranges
}

/// Break `text` into lines of at most `max_chars` characters
///
/// Breaks at whitespace where possible and inside words longer than a
/// line. Embedded newlines start a new line. Every non-whitespace
/// character of `text` appears in the output, in order.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                lines.push(word.drain(..max_chars).collect());
            }

            let needed = if line_len == 0 {
                word.len()
            } else {
                line_len + 1 + word.len()
            };
            if needed > max_chars {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.extend(word.iter());
            line_len += word.len();
        }
        lines.push(line);
    }
    lines
}

/// One drawn row: wrapped lines per cell
///
/// A body row taller than a page is split into several slices, all
/// sharing `source` so they keep the same stripe.
#[derive(Debug, Clone, PartialEq)]
struct RowSlice {
    source: usize,
    cells: Vec<Vec<String>>,
}

impl RowSlice {
    fn lines(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(1)
    }
}

fn wrap_row(cells: &[String], max_chars: usize) -> Vec<Vec<String>> {
    cells.iter().map(|cell| wrap_text(cell, max_chars)).collect()
}

/// Wrap every body row, splitting rows that cannot fit on one page
fn layout_rows(
    rows: &[Vec<String>],
    max_chars: usize,
    max_lines: usize,
) -> Vec<RowSlice> {
    let max_lines = max_lines.max(1);
    let mut slices = Vec::with_capacity(rows.len());

    for (source, row) in rows.iter().enumerate() {
        let cells = wrap_row(row, max_chars);
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1);
        if lines <= max_lines {
            slices.push(RowSlice { source, cells });
            continue;
        }
        for first in (0..lines).step_by(max_lines) {
            let cells: Vec<Vec<String>> = cells
                .iter()
                .map(|cell| {
                    cell.iter()
                        .skip(first)
                        .take(max_lines)
                        .cloned()
                        .collect::<Vec<String>>()
                })
                .collect();
            slices.push(RowSlice { source, cells });
        }
    }
    slices
}

fn rgb(c: [u8; 3]) -> Color {
    Color::Rgb(Rgb::new(
        c[0] as f32 / 255.0,
        c[1] as f32 / 255.0,
        c[2] as f32 / 255.0,
        None,
    ))
}

struct PageWriter<'a> {
    layer: PdfLayerReference,
    font: &'a IndirectFontRef,
    style: &'a PdfStyle,
    columns: usize,
}

impl PageWriter<'_> {
    /// Draw one row whose top edge is `top` mm from the page bottom;
    /// returns the row's bottom edge
    fn row(&self, top: f32, cells: &[Vec<String>], fill: Option<[u8; 3]>, text: [u8; 3]) -> f32 {
        let style = self.style;
        let left = style.margin_mm;
        let width = style.page_width_mm - 2.0 * style.margin_mm;
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1);
        let bottom = top - style.row_height_mm(lines);

        if let Some(fill) = fill {
            self.layer.set_fill_color(rgb(fill));
            self.layer
                .add_rect(Rect::new(Mm(left), Mm(bottom), Mm(left + width), Mm(top)));
        }

        self.layer.set_fill_color(rgb(text));
        let col_width = style.column_width_mm(self.columns);
        // First baseline sits about one ascent below the padded top
        let first_baseline = top - style.cell_padding_mm - style.line_height_mm * 0.75;

        for (i, cell) in cells.iter().enumerate() {
            let x = left + i as f32 * col_width + style.cell_padding_mm;
            for (n, line) in cell.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let baseline = first_baseline - n as f32 * style.line_height_mm;
                self.layer.use_text(
                    line.as_str(),
                    style.font_size_pt,
                    Mm(x),
                    Mm(baseline),
                    self.font,
                );
            }
        }
        bottom
    }
}

/// Render the table as a paginated A4 PDF document
///
/// Cell text wraps onto as many lines as it needs; rows grow to fit and
/// pages break between rows.
pub fn to_pdf(table: &RenderedTable, style: &PdfStyle) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        table.title.as_str(),
        Mm(style.page_width_mm),
        Mm(style.page_height_mm),
        "Table",
    );

    let font_bytes = style.font.load()?;
    let font = doc
        .add_external_font(Cursor::new(font_bytes.as_ref()))
        .map_err(|e| Error::Export(format!("Failed to load PDF font: {:?}", e)))?;

    let columns = table.headers.len();
    let max_chars = style.max_chars(columns);

    let header = wrap_row(&table.headers, max_chars);
    let header_lines = header.iter().map(Vec::len).max().unwrap_or(1);
    let header_height = style.row_height_mm(header_lines);

    let body_height = style.body_height_mm(header_height);
    let max_lines = ((body_height - 2.0 * style.cell_padding_mm) / style.line_height_mm)
        .floor()
        .max(1.0) as usize;
    let slices = layout_rows(&table.rows, max_chars, max_lines);
    let heights: Vec<f32> = slices
        .iter()
        .map(|slice| style.row_height_mm(slice.lines()))
        .collect();
    let ranges = page_ranges(&heights, header_height, style);

    for (page_no, range) in ranges.iter().enumerate() {
        let (page, layer) = if page_no == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(style.page_width_mm), Mm(style.page_height_mm), "Table")
        };

        let writer = PageWriter {
            layer: doc.get_page(page).get_layer(layer),
            font: &font,
            style,
            columns,
        };

        let mut top = style.page_height_mm - style.margin_mm;
        top = writer.row(top, &header, Some(style.header_fill), style.header_text);

        for slice in &slices[range.clone()] {
            let fill = (slice.source % 2 == 1).then_some(style.stripe_fill);
            top = writer.row(top, &slice.cells, fill, style.body_text);
        }
    }

    debug!(
        "Rendered {} rows of {} into {} PDF page(s)",
        table.rows.len(),
        table.title,
        ranges.len()
    );

    doc.save_to_bytes()
        .map_err(|e| Error::Export(format!("Failed to write PDF: {:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<Vec<&str>>) -> RenderedTable {
        RenderedTable {
            title: "Students".to_string(),
            headers: vec!["Last Name".to_string(), "First Name".to_string()],
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
            actions: Vec::new(),
        }
    }

    #[test]
    fn test_csv_headers_then_rows() {
        let csv = to_csv(&table(vec![vec!["Shevchenko", "Taras"]]));
        assert_eq!(csv, "Last Name,First Name\nShevchenko,Taras");
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn test_csv_empty_table_is_header_only() {
        assert_eq!(to_csv(&table(vec![])), "Last Name,First Name");
    }

    #[test]
    fn test_csv_does_not_escape_delimiters() {
        // Known limitation: embedded commas and newlines corrupt the layout
        let csv = to_csv(&table(vec![vec!["Kvitka-Osnovianenko, H.", "Hryhorii"]]));
        assert_eq!(csv, "Last Name,First Name\nKvitka-Osnovianenko, H.,Hryhorii");
        assert_eq!(csv.lines().nth(1).unwrap().split(',').count(), 3);

        let csv = to_csv(&table(vec![vec!["Line\nBreak", "Name"]]));
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_csv_does_not_quote() {
        let csv = to_csv(&table(vec![vec!["\"Quoted\"", "x"]]));
        assert_eq!(csv, "Last Name,First Name\n\"Quoted\",x");
    }

    #[test]
    fn test_export_file_names() {
        assert_eq!(ExportFormat::Csv.file_name("Grades"), "Grades.csv");
        assert_eq!(ExportFormat::Pdf.file_name("Grades"), "Grades.pdf");
        assert_eq!(ExportFormat::Pdf.content_type(), "application/pdf");
    }

    #[test]
    fn test_page_ranges_break_on_row_heights() {
        let style = PdfStyle::new(PdfFont::Bundled);
        // 297 - 2 * 14 - 10 = 259 mm of body per page
        let header = 10.0;

        assert_eq!(page_ranges(&[], header, &style), vec![0..0]);

        let uniform = vec![10.0; 60];
        assert_eq!(
            page_ranges(&uniform, header, &style),
            vec![0..25, 25..50, 50..60]
        );

        let mixed = [100.0, 100.0, 100.0, 20.0];
        assert_eq!(page_ranges(&mixed, header, &style), vec![0..2, 2..4]);
    }

    #[test]
    fn test_oversized_row_gets_its_own_page() {
        let style = PdfStyle::new(PdfFont::Bundled);
        let heights = [10.0, 400.0, 10.0];
        assert_eq!(
            page_ranges(&heights, 10.0, &style),
            vec![0..1, 1..2, 2..3]
        );
    }

    #[test]
    fn test_wrap_breaks_at_whitespace() {
        assert_eq!(wrap_text("short", 10), vec!["short"]);
        assert_eq!(
            wrap_text("Шевченко Тарас Григорович", 10),
            vec!["Шевченко", "Тарас", "Григорович"]
        );
        assert_eq!(wrap_text("Ivan Franko", 11), vec!["Ivan Franko"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn test_wrap_breaks_long_words_and_newlines() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("ab abcdefgh", 4), vec!["ab", "abcd", "efgh"]);
        assert_eq!(wrap_text("first\nsecond", 20), vec!["first", "second"]);
    }

    #[test]
    fn test_wrap_keeps_all_text() {
        let note = "Відмінна робота на семінарі, доповідь про Київську Русь; \
                    потребує доопрацювання висновків. Supercalifragilisticexpialidocious";
        for max_chars in [1, 3, 7, 16, 40] {
            let lines = wrap_text(note, max_chars);
            assert!(lines.iter().all(|l| l.chars().count() <= max_chars));

            let original: String = note.split_whitespace().collect();
            let wrapped: String = lines.iter().flat_map(|l| l.split_whitespace()).collect();
            assert_eq!(wrapped, original, "text lost at width {}", max_chars);
        }
    }

    #[test]
    fn test_tall_row_is_split_into_slices() {
        let rows = vec![
            vec!["a".to_string(), "one two three four five".to_string()],
            vec!["b".to_string(), "six".to_string()],
        ];
        let slices = layout_rows(&rows, 5, 2);

        // Five lines at two lines per slice, then the short row
        assert_eq!(slices.len(), 4);
        assert_eq!(
            slices[0].cells,
            vec![
                vec!["a".to_string()],
                vec!["one".to_string(), "two".to_string()]
            ]
        );
        assert!(slices[1].cells[0].is_empty());
        assert_eq!(slices[2].cells[1], vec!["five".to_string()]);
        assert!(slices[..3].iter().all(|s| s.source == 0));
        assert_eq!(slices[3].source, 1);
        assert_eq!(slices[3].lines(), 1);
    }

    #[test]
    fn test_row_height_grows_with_lines() {
        let style = PdfStyle::new(PdfFont::Bundled);
        assert!(style.row_height_mm(3) > style.row_height_mm(1));
        assert_eq!(style.row_height_mm(0), style.row_height_mm(1));
    }

    #[test]
    fn test_default_font_is_bundled() {
        assert_eq!(resolve_font(None).unwrap(), PdfFont::Bundled);
        assert!(BUNDLED_FONT.len() > 100_000);
        assert_eq!(PdfFont::Bundled.to_string(), "bundled DejaVu Sans");
    }

    #[test]
    fn test_configured_font_file_is_used() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), BUNDLED_FONT).unwrap();

        let font = resolve_font(Some(file.path())).unwrap();
        assert_eq!(font, PdfFont::File(file.path().to_path_buf()));

        let bytes = to_pdf(&table(vec![vec!["Shevchenko", "Taras"]]), &PdfStyle::new(font))
            .expect("PDF export should succeed");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_configured_font_must_exist() {
        let result = resolve_font(Some(Path::new("/nonexistent/font.ttf")));
        assert!(matches!(result, Err(Error::Export(_))));
    }

    #[test]
    fn test_missing_font_fails_export() {
        let style = PdfStyle::new(PdfFont::File(PathBuf::from("/nonexistent/font.ttf")));
        let result = to_pdf(&table(vec![vec!["Shevchenko", "Taras"]]), &style);
        assert!(matches!(result, Err(Error::Export(_))));
    }

    #[test]
    fn test_pdf_with_cyrillic_text() {
        let style = PdfStyle::new(resolve_font(None).unwrap());
        let rows: Vec<Vec<&str>> = (0..100).map(|_| vec!["Шевченко", "Тарас"]).collect();
        let bytes = to_pdf(&table(rows), &style).expect("PDF export should succeed");

        assert!(bytes.starts_with(b"%PDF"), "Output should be a PDF document");
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn test_pdf_with_cell_longer_than_a_page() {
        let style = PdfStyle::new(PdfFont::Bundled);
        let long_note = "Григорович ".repeat(2000);
        let rows = vec![vec!["Шевченко", long_note.as_str()], vec!["Франко", "Іван"]];
        let bytes = to_pdf(&table(rows), &style).expect("PDF export should succeed");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
