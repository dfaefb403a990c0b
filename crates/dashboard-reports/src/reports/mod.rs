//! Report scheduling, aggregation and multi-format export.

pub mod aggregate;
pub mod document;
mod domain;
pub mod error;
mod fields;
pub mod locale;
pub mod render;
pub mod schedule;
pub mod source;

pub use aggregate::ReportAggregator;
pub use document::{
    Cell, Column, ColumnKind, DetailTable, LeadRow, Metric, MetricFormat, MetricValue,
    ReportDocument, SalesRow, SourceCount, VisitRow,
};
pub use domain::{ReportKind, ReportType};
pub use error::{ReportError, ValidationError};
pub use fields::parse_timestamp;
pub use render::{
    render, sanitize_filename, ExportFormat, RenderError, RenderedReport, ATTRIBUTION,
};
pub use source::{DataSource, Entity, QueryError, RangeQuery, Record};
