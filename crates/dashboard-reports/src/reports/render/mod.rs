//! Presentation of a [`ReportDocument`] as CSV, HTML or PDF.
//!
//! Metric order and detail column order come from the document; the
//! renderers only decide how a cell of a given kind is shown.

mod csv;
mod html;
mod pdf;
mod table;

use mime::Mime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use super::document::ReportDocument;
use super::error::ValidationError;

pub use pdf::ATTRIBUTION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Html,
    Pdf,
}

impl ExportFormat {
    pub const fn ordered() -> [Self; 3] {
        [Self::Csv, Self::Html, Self::Pdf]
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Html => "html",
            Self::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> Mime {
        match self {
            Self::Csv => mime::TEXT_CSV,
            Self::Html => mime::TEXT_HTML,
            Self::Pdf => mime::APPLICATION_PDF,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|format| format.extension() == normalized)
            .ok_or_else(|| ValidationError::UnknownFormat(value.to_string()))
    }
}

/// Rendered bytes ready for a transport to hand out.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: Mime,
    pub format: ExportFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("metric '{metric}' has a non-finite value")]
    NonFiniteMetric { metric: String },
    #[error("column '{column}' of row {row} has a non-finite value")]
    NonFiniteCell { column: &'static str, row: usize },
    #[error("csv serialization failed: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("csv buffer could not be flushed: {0}")]
    Buffer(String),
    #[error("document formatting failed")]
    Format(#[from] fmt::Error),
}

/// Renders `document` in `format`. Pure: the same document always yields
/// the same bytes.
pub fn render(document: &ReportDocument, format: ExportFormat) -> Result<RenderedReport, RenderError> {
    let bytes = match format {
        ExportFormat::Csv => csv::render(document)?,
        ExportFormat::Html => html::render(document)?,
        ExportFormat::Pdf => pdf::render(document)?,
    };

    info!(
        id = %document.id,
        %format,
        bytes = bytes.len(),
        "report rendered"
    );

    Ok(RenderedReport {
        bytes,
        filename: format!("{}.{}", sanitize_filename(&document.name), format.extension()),
        mime_type: format.mime_type(),
        format,
    })
}

/// Replaces every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}
