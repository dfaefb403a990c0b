use chrono::{DateTime, Utc};

use super::render::RenderError;
use super::schedule::{DeliveryError, StoreError};
use super::source::QueryError;

/// Malformed input rejected before any collaborator is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown report type '{0}'")]
    UnknownReportType(String),
    #[error("unsupported frequency '{0}', expected daily, weekly or monthly")]
    InvalidFrequency(String),
    #[error("delivery time '{0}' must be HH:MM or HH:MM:SS")]
    InvalidDeliveryTime(String),
    #[error("unsupported export format '{0}', expected csv, html or pdf")]
    UnknownFormat(String),
    #[error("schedule name must not be blank")]
    EmptyName,
    #[error("schedule needs at least one recipient")]
    NoRecipients,
    #[error("recipient '{0}' is not a valid address")]
    InvalidRecipient(String),
    #[error("range start {start} is after range end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Umbrella error for report generation and schedule handling.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
