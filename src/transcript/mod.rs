pub mod fonts;
pub mod layout;
pub mod pdf;
pub mod report_card;

use thiserror::Error;

pub use layout::{Align, Block, Column, FontWeight, LayoutDocument, Row, RowKind, Table, TextStyle};
pub use pdf::render_pdf;
pub use report_card::{format_score, ReportCard};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF encoding failed: {0}")]
    Encode(String),

    #[error("PDF write failed: {0}")]
    Write(String),

    #[error("Render task failed: {0}")]
    Task(String),
}
