//! Fixed-layout PDF 1.4 output using the built-in Helvetica faces.

use std::fmt::Write as _;

use crate::reports::document::ReportDocument;
use crate::reports::locale::{format_date, format_timestamp};

use super::table::{detail_rows, header, metric_lines, CellStyle};
use super::RenderError;

pub const ATTRIBUTION: &str = "Generated by Dashboard Reports";

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 50.0;
const CONTENT_BOTTOM: f32 = 64.0;
const FOOTER_Y: f32 = 32.0;
const BODY_SIZE: f32 = 9.0;
const ROW_HEIGHT: f32 = 14.0;
const LINE_STEP: f32 = 11.0;
const CELL_PADDING: f32 = 6.0;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.52;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
}

impl Face {
    const fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }
}

#[derive(Debug)]
struct TextRun {
    x: f32,
    y: f32,
    size: f32,
    face: Face,
    text: String,
}

/// Top-down cursor over pages of text runs.
struct Layout {
    pages: Vec<Vec<TextRun>>,
    cursor: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Starts a new page when fewer than `height` points remain. Returns
    /// whether a break happened.
    fn reserve(&mut self, height: f32) -> bool {
        if self.cursor - height < CONTENT_BOTTOM {
            self.pages.push(Vec::new());
            self.cursor = PAGE_HEIGHT - MARGIN;
            true
        } else {
            false
        }
    }

    fn push(&mut self, x: f32, y: f32, size: f32, face: Face, text: &str) {
        let run = TextRun {
            x,
            y,
            size,
            face,
            text: text.to_string(),
        };
        if let Some(page) = self.pages.last_mut() {
            page.push(run);
        }
    }

    fn line(&mut self, text: &str, size: f32, face: Face) {
        let height = size + 6.0;
        self.reserve(height);
        self.cursor -= height;
        self.push(MARGIN, self.cursor, size, face, text);
    }

    fn gap(&mut self, height: f32) {
        self.cursor -= height;
    }

    fn row(&mut self, cells: &[Vec<String>], widths: &[f32], face: Face) {
        self.cursor -= ROW_HEIGHT;
        let mut x = MARGIN;
        for (lines, width) in cells.iter().zip(widths) {
            for (index, text) in lines.iter().enumerate() {
                let y = self.cursor - LINE_STEP * index as f32;
                self.push(x, y, BODY_SIZE, face, text);
            }
            x += width;
        }
        self.cursor -= row_height(cells) - ROW_HEIGHT;
    }

    /// Header row repeats at the top of every page the table spans.
    fn table(&mut self, headers: &[String], rows: &[Vec<String>]) {
        let widths = column_widths(headers, rows);
        let header_cells = wrap_cells(headers, &widths);

        self.reserve(row_height(&header_cells) + ROW_HEIGHT);
        self.row(&header_cells, &widths, Face::Bold);
        for cells in rows {
            let cells = wrap_cells(cells, &widths);
            if self.reserve(row_height(&cells)) {
                self.row(&header_cells, &widths, Face::Bold);
            }
            self.row(&cells, &widths, Face::Regular);
        }
    }
}

fn char_width() -> f32 {
    BODY_SIZE * GLYPH_WIDTH
}

/// Columns share the content width in proportion to their longest value.
fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<f32> {
    let natural: Vec<f32> = (0..headers.len())
        .map(|column| {
            let longest = std::iter::once(&headers[column])
                .chain(rows.iter().filter_map(|cells| cells.get(column)))
                .map(|text| text.chars().count())
                .max()
                .unwrap_or(0);
            longest.max(1) as f32 * char_width() + CELL_PADDING
        })
        .collect();
    let total: f32 = natural.iter().sum();
    let available = PAGE_WIDTH - 2.0 * MARGIN;
    if total <= 0.0 {
        return natural;
    }
    natural
        .into_iter()
        .map(|width| width * available / total)
        .collect()
}

fn wrap_cells(cells: &[String], widths: &[f32]) -> Vec<Vec<String>> {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let limit = ((width - CELL_PADDING) / char_width()).floor().max(1.0) as usize;
            wrap(cell, limit)
        })
        .collect()
}

fn row_height(cells: &[Vec<String>]) -> f32 {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
    ROW_HEIGHT + LINE_STEP * (lines - 1) as f32
}

/// Breaks at spaces where possible; words longer than `limit` are split.
fn wrap(text: &str, limit: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split(' ') {
        let joined = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if joined <= limit {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > limit {
            let rest = chars.split_off(limit);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        current = chars.into_iter().collect();
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

pub(super) fn render(document: &ReportDocument) -> Result<Vec<u8>, RenderError> {
    let mut layout = Layout::new();

    layout.line(&document.name, 18.0, Face::Bold);
    layout.line(
        &format!(
            "Generated {} | Period {} to {}",
            format_timestamp(document.generated_at),
            format_date(document.range_start.date_naive()),
            format_date(document.range_end.date_naive()),
        ),
        10.0,
        Face::Regular,
    );
    layout.gap(12.0);

    layout.line("Metrics", 13.0, Face::Bold);
    let metrics: Vec<Vec<String>> = metric_lines(document, CellStyle::Print)?
        .into_iter()
        .map(|line| vec![line.name.to_string(), line.value])
        .collect();
    layout.table(&["Name".to_string(), "Value".to_string()], &metrics);
    layout.gap(16.0);

    layout.line("Details", 13.0, Face::Bold);
    let headers: Vec<String> = header(document).into_iter().map(String::from).collect();
    let rows = detail_rows(document, CellStyle::Print)?;
    if rows.is_empty() {
        layout.line("No records in this period", BODY_SIZE, Face::Regular);
    } else {
        layout.table(&headers, &rows);
    }

    if !document.source_breakdown.is_empty() {
        layout.gap(16.0);
        layout.line("Lead Sources", 13.0, Face::Bold);
        let sources: Vec<Vec<String>> = document
            .source_breakdown
            .iter()
            .map(|entry| vec![entry.source.clone(), entry.count.to_string()])
            .collect();
        layout.table(&["Source".to_string(), "Leads".to_string()], &sources);
    }

    encode(document, layout.pages)
}

fn encode(document: &ReportDocument, pages: Vec<Vec<TextRun>>) -> Result<Vec<u8>, RenderError> {
    let page_count = pages.len();
    let first_page_object = 6;

    let mut objects: Vec<String> = Vec::with_capacity(5 + page_count * 2);
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());

    let kids = (0..page_count)
        .map(|index| format!("{} 0 R", first_page_object + index * 2))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push(format!("<< /Type /Pages /Kids [{kids}] /Count {page_count} >>"));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold >>".to_string());
    objects.push(format!(
        "<< /Title ({}) /Producer ({}) /CreationDate (D:{}Z) >>",
        escape_text(&document.name),
        escape_text(ATTRIBUTION),
        document.generated_at.format("%Y%m%d%H%M%S")
    ));

    for (index, runs) in pages.iter().enumerate() {
        let content_object = first_page_object + index * 2 + 1;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {content_object} 0 R >>"
        ));

        let mut stream = String::new();
        for run in runs {
            write_run(&mut stream, run)?;
        }
        let footer_page = TextRun {
            x: MARGIN,
            y: FOOTER_Y,
            size: 8.0,
            face: Face::Regular,
            text: format!("Page {} of {}", index + 1, page_count),
        };
        write_run(&mut stream, &footer_page)?;
        let footer_attribution = TextRun {
            x: PAGE_WIDTH - MARGIN - ATTRIBUTION.len() as f32 * 8.0 * GLYPH_WIDTH,
            y: FOOTER_Y,
            size: 8.0,
            face: Face::Regular,
            text: ATTRIBUTION.to_string(),
        };
        write_run(&mut stream, &footer_attribution)?;

        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            stream.len(),
            stream
        ));
    }

    let mut output = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(output.len());
        write!(output, "{} 0 obj\n{}\nendobj\n", index + 1, body)?;
    }

    let xref_offset = output.len();
    write!(output, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1)?;
    for offset in offsets {
        write!(output, "{offset:010} 00000 n \n")?;
    }
    write!(
        output,
        "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    )?;

    Ok(output.into_bytes())
}

fn write_run(stream: &mut String, run: &TextRun) -> Result<(), std::fmt::Error> {
    writeln!(
        stream,
        "BT /{} {:.1} Tf {:.2} {:.2} Td ({}) Tj ET",
        run.face.resource(),
        run.size,
        run.x,
        run.y,
        escape_text(&run.text)
    )
}

/// Restricts text to printable ASCII and escapes string delimiters.
fn escape_text(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            ' '..='~' => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}
