//! Declarative page layout consumed by the PDF renderer.
//!
//! A document is a flat list of blocks laid out top to bottom. Blocks carry
//! content and style only; positions and page breaks are the renderer's job.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub weight: FontWeight,
}

impl TextStyle {
    pub const fn regular(size: f32) -> Self {
        Self { size, weight: FontWeight::Regular }
    }

    pub const fn bold(size: f32) -> Self {
        Self { size, weight: FontWeight::Bold }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text { text: String, style: TextStyle, align: Align },
    /// Vertical gap in points
    Spacer(f32),
    /// "Label: value" lines with a bold label
    LabeledLines { lines: Vec<(String, String)>, size: f32 },
    Table(Table),
    /// Signature lines with a caption under each, kept near the page bottom
    Signatures(Vec<String>),
}

impl Block {
    pub fn text(text: impl Into<String>, style: TextStyle, align: Align) -> Self {
        Block::Text { text: text.into(), style, align }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub width: f32,
    /// Alignment for body and summary cells; header cells are centered
    pub align: Align,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Repeated at the top of every page the table spans
    Header,
    Body,
    /// Bold totals row
    Summary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub kind: RowKind,
    pub cells: Vec<String>,
}

impl Row {
    pub fn new(kind: RowKind, cells: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            kind,
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub row_height: f32,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn width(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    pub fn header(&self) -> Option<&Row> {
        self.rows.iter().find(|r| r.kind == RowKind::Header)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutDocument {
    pub blocks: Vec<Block>,
    /// Printed centered at the bottom of every page
    pub footer: Option<String>,
}

impl LayoutDocument {
    pub fn push(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(table) => Some(table),
            _ => None,
        })
    }
}
