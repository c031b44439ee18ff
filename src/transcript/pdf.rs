//! Generic PDF renderer for a `LayoutDocument`.
//!
//! Blocks are placed top to bottom on US Letter pages with a fixed margin.
//! Text wraps at word boundaries and table rows grow to fit their tallest
//! cell. Tables break across pages and repeat their header row, signatures are
//! pinned near the bottom of the page they land on, and the footer is stamped
//! on every page once the page count is known.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use super::fonts::{base_font, encode_win_ansi, resource_name, text_width, wrap_to_width};
use super::layout::{Align, Block, FontWeight, LayoutDocument, Row, RowKind, Table, TextStyle};
use super::RenderError;

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 50.0;

/// Space kept free above the bottom margin for the footer
const FOOTER_RESERVE: f32 = 20.0;
const FOOTER_BASELINE: f32 = 35.0;
const FOOTER_SIZE: f32 = 8.0;
/// Signature line height measured from the page bottom
const SIGNATURE_LINE: f32 = 120.0;
const SIGNATURE_WIDTH: f32 = 150.0;
const CELL_PADDING: f32 = 5.0;
/// Line advance as a multiple of the font size inside wrapped cells
const CELL_LEADING: f32 = 1.2;

fn real(v: f32) -> Object {
    v.into()
}

/// Drawing state: finished pages plus the page being filled.
/// `y` is the distance from the top edge of the current page.
struct Canvas {
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: f32,
}

impl Canvas {
    fn new() -> Self {
        let mut canvas = Self {
            pages: Vec::new(),
            ops: Vec::new(),
            y: MARGIN,
        };
        canvas.start_page();
        canvas
    }

    fn start_page(&mut self) {
        self.ops.push(Operation::new("w", vec![real(0.5)]));
        self.y = MARGIN;
    }

    fn break_page(&mut self) {
        let finished = std::mem::take(&mut self.ops);
        self.pages.push(finished);
        self.start_page();
    }

    fn bottom_limit() -> f32 {
        PAGE_HEIGHT - MARGIN - FOOTER_RESERVE
    }

    /// Start a new page unless `height` more points fit. Returns true on a break.
    fn ensure(&mut self, height: f32) -> bool {
        if self.y + height > Self::bottom_limit() && self.y > MARGIN {
            self.break_page();
            true
        } else {
            false
        }
    }

    /// Text with its baseline `baseline` points below the top edge
    fn text(&mut self, x: f32, baseline: f32, style: TextStyle, text: &str) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![resource_name(style.weight).into(), real(style.size)],
        ));
        self.ops
            .push(Operation::new("Td", vec![real(x), real(PAGE_HEIGHT - baseline)]));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn aligned_text(&mut self, left: f32, width: f32, baseline: f32, style: TextStyle, align: Align, text: &str) {
        let text_w = text_width(text, style.weight, style.size);
        let x = match align {
            Align::Left => left,
            Align::Center => left + (width - text_w) / 2.0,
            Align::Right => left + width - text_w,
        };
        self.text(x, baseline, style, text);
    }

    fn rect(&mut self, x: f32, top: f32, width: f32, height: f32) {
        self.ops.push(Operation::new(
            "re",
            vec![real(x), real(PAGE_HEIGHT - top - height), real(width), real(height)],
        ));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.ops
            .push(Operation::new("m", vec![real(x1), real(PAGE_HEIGHT - y1)]));
        self.ops
            .push(Operation::new("l", vec![real(x2), real(PAGE_HEIGHT - y2)]));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        let last = std::mem::take(&mut self.ops);
        self.pages.push(last);
        self.pages
    }
}

fn content_width() -> f32 {
    PAGE_WIDTH - 2.0 * MARGIN
}

fn draw_text_block(canvas: &mut Canvas, text: &str, style: TextStyle, align: Align) {
    let line_height = style.size * 1.2;
    for line in wrap_to_width(text, style.weight, style.size, content_width()) {
        canvas.ensure(line_height);
        canvas.aligned_text(MARGIN, content_width(), canvas.y + style.size, style, align, &line);
        canvas.y += line_height;
    }
}

/// Bold label followed by its value; the value wraps under itself
fn draw_labeled_lines(canvas: &mut Canvas, lines: &[(String, String)], size: f32) {
    let line_height = size * 1.4;
    for (label, value) in lines {
        let label = format!("{}: ", label);
        let offset = text_width(&label, FontWeight::Bold, size);
        let wrapped = wrap_to_width(value, FontWeight::Regular, size, content_width() - offset);
        for (i, part) in wrapped.iter().enumerate() {
            canvas.ensure(line_height);
            let baseline = canvas.y + size;
            if i == 0 {
                canvas.text(MARGIN, baseline, TextStyle::bold(size), &label);
            }
            canvas.text(MARGIN + offset, baseline, TextStyle::regular(size), part);
            canvas.y += line_height;
        }
    }
}

fn row_style(kind: RowKind) -> TextStyle {
    match kind {
        RowKind::Header | RowKind::Summary => TextStyle::bold(10.0),
        RowKind::Body => TextStyle::regular(9.0),
    }
}

/// A row with every cell wrapped to its column and the height that fits them
struct RowLayout {
    style: TextStyle,
    cells: Vec<Vec<String>>,
    height: f32,
}

fn layout_row(table: &Table, row: &Row) -> RowLayout {
    let style = row_style(row.kind);
    let cells: Vec<Vec<String>> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let raw = row.cells.get(i).map(String::as_str).unwrap_or("");
            wrap_to_width(raw, style.weight, style.size, column.width - 2.0 * CELL_PADDING)
        })
        .collect();
    let most = cells.iter().map(Vec::len).max().unwrap_or(1) as f32;
    let needed = most * style.size * CELL_LEADING + 2.0 * CELL_PADDING;
    RowLayout {
        style,
        cells,
        height: table.row_height.max(needed),
    }
}

fn draw_row(canvas: &mut Canvas, table: &Table, row: &Row, layout: &RowLayout) {
    let style = layout.style;
    let leading = style.size * CELL_LEADING;
    let top = canvas.y;
    let mut x = MARGIN;

    for (column, lines) in table.columns.iter().zip(&layout.cells) {
        canvas.rect(x, top, column.width, layout.height);
        let inner = column.width - 2.0 * CELL_PADDING;
        let align = if row.kind == RowKind::Header { Align::Center } else { column.align };
        let block = (lines.len() as f32 - 1.0) * leading + style.size * 0.7;
        let mut baseline = top + (layout.height - block) / 2.0 + style.size * 0.7;
        for line in lines {
            canvas.aligned_text(x + CELL_PADDING, inner, baseline, style, align, line);
            baseline += leading;
        }
        x += column.width;
    }
    canvas.y += layout.height;
}

fn draw_table(canvas: &mut Canvas, table: &Table) {
    let header = table.header().map(|h| (h, layout_row(table, h)));
    for row in &table.rows {
        let layout = layout_row(table, row);
        if canvas.ensure(layout.height) && row.kind != RowKind::Header {
            if let Some((header, header_layout)) = &header {
                draw_row(canvas, table, header, header_layout);
            }
        }
        draw_row(canvas, table, row, &layout);
    }
}

fn draw_signatures(canvas: &mut Canvas, captions: &[String]) {
    if captions.is_empty() {
        return;
    }
    let line_top = PAGE_HEIGHT - SIGNATURE_LINE;
    if canvas.y + 10.0 > line_top {
        canvas.break_page();
    }
    let slot = content_width() / captions.len() as f32;
    let style = TextStyle::regular(10.0);
    for (i, caption) in captions.iter().enumerate() {
        let left = MARGIN + slot * i as f32 + (slot - SIGNATURE_WIDTH) / 2.0;
        canvas.line(left, line_top, left + SIGNATURE_WIDTH, line_top);
        canvas.aligned_text(left, SIGNATURE_WIDTH, line_top + 5.0 + style.size, style, Align::Center, caption);
    }
    canvas.y = line_top + 5.0 + style.size * 1.5;
}

/// Lay out the document into per-page content operations
pub(crate) fn paginate(document: &LayoutDocument) -> Vec<Vec<Operation>> {
    let mut canvas = Canvas::new();

    for block in &document.blocks {
        match block {
            Block::Text { text, style, align } => draw_text_block(&mut canvas, text, *style, *align),
            Block::Spacer(height) => canvas.y += *height,
            Block::LabeledLines { lines, size } => draw_labeled_lines(&mut canvas, lines, *size),
            Block::Table(table) => draw_table(&mut canvas, table),
            Block::Signatures(captions) => draw_signatures(&mut canvas, captions),
        }
    }

    let mut pages = canvas.finish();
    if let Some(footer) = &document.footer {
        let style = TextStyle::regular(FOOTER_SIZE);
        for ops in &mut pages {
            let mut stamp = Canvas { pages: Vec::new(), ops: std::mem::take(ops), y: 0.0 };
            stamp.aligned_text(MARGIN, content_width(), PAGE_HEIGHT - FOOTER_BASELINE, style, Align::Center, footer);
            *ops = stamp.ops;
        }
    }
    pages
}

/// Render a layout to PDF bytes
pub fn render_pdf(document: &LayoutDocument) -> Result<Vec<u8>, RenderError> {
    let pages = paginate(document);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font(FontWeight::Regular),
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font(FontWeight::Bold),
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            resource_name(FontWeight::Regular) => regular_id,
            resource_name(FontWeight::Bold) => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH as i64),
            Object::Integer(PAGE_HEIGHT as i64),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RenderError::Write(e.to_string()))?;
    Ok(bytes)
}
