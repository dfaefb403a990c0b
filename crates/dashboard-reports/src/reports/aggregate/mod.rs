mod activity;
mod leads;
mod sales;

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::document::{DetailTable, Metric, ReportDocument, SourceCount};
use super::domain::{ReportKind, ReportType};
use super::error::{ReportError, ValidationError};
use super::locale::format_date;
use super::source::{DataSource, RangeQuery, Record};

/// Metrics and detail rows produced by one aggregation arm.
pub(crate) struct Summary {
    pub(crate) metrics: Vec<Metric>,
    pub(crate) detail: DetailTable,
    pub(crate) source_breakdown: Vec<SourceCount>,
}

static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_document_id() -> String {
    let id = DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("rpt-{id:06}")
}

/// Reads domain records for a report type and reduces them into a
/// [`ReportDocument`].
pub struct ReportAggregator<Q> {
    source: Arc<Q>,
}

impl<Q> ReportAggregator<Q>
where
    Q: DataSource + 'static,
{
    pub fn new(source: Arc<Q>) -> Self {
        Self { source }
    }

    pub fn generate(
        &self,
        report_type: ReportType,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<ReportDocument, ReportError> {
        self.generate_at(report_type, range_start, range_end, Utc::now())
    }

    /// Same as [`ReportAggregator::generate`] with an explicit generation time.
    pub fn generate_at(
        &self,
        report_type: ReportType,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
        generated_at: DateTime<Utc>,
    ) -> Result<ReportDocument, ReportError> {
        if range_start > range_end {
            return Err(ValidationError::InvalidRange {
                start: range_start,
                end: range_end,
            }
            .into());
        }

        let kind = report_type.kind();
        if kind.report_type() != report_type {
            warn!(
                requested = %report_type,
                "no aggregation for report type, summarising as activity"
            );
        }

        let query = RangeQuery {
            entity: kind.entity(),
            field: kind.timestamp_field(),
            gte: range_start,
            lte: range_end,
        };
        let records = self.source.query(&query)?;
        debug!(entity = %query.entity, records = records.len(), "domain records loaded");

        let Summary {
            metrics,
            detail,
            source_breakdown,
        } = summarize(kind, &records);

        let document = ReportDocument {
            id: next_document_id(),
            name: format!(
                "{} Report - {}",
                report_type.label(),
                format_date(generated_at.date_naive())
            ),
            report_type: kind,
            generated_at,
            range_start,
            range_end,
            metrics,
            detail,
            source_breakdown,
        };

        info!(
            id = %document.id,
            report_type = ?kind,
            rows = document.detail.len(),
            "report document generated"
        );

        Ok(document)
    }
}

fn summarize(kind: ReportKind, records: &[Record]) -> Summary {
    match kind {
        ReportKind::Sales => sales::summarize(records),
        ReportKind::Leads => leads::summarize(records),
        ReportKind::Activity => activity::summarize(records),
    }
}

/// `part / whole * 100`, rounded half away from zero; zero when `whole` is.
pub(crate) fn rounded_percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64 * 100.0).round()
    }
}
