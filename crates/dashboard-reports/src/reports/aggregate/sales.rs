use super::Summary;
use crate::reports::document::{DetailTable, Metric, MetricFormat, SalesRow};
use crate::reports::fields::{number_or_zero, text_or};
use crate::reports::source::Record;

pub(super) fn summarize(records: &[Record]) -> Summary {
    let rows: Vec<SalesRow> = records
        .iter()
        .map(|record| SalesRow {
            id: text_or(record, "id", ""),
            name: text_or(record, "name", ""),
            created_at: text_or(record, "created_at", ""),
            revenue: number_or_zero(record, "revenue"),
            status: text_or(record, "status", ""),
        })
        .collect();

    let total = rows.len();
    let completed = rows.iter().filter(|row| row.status == "completed").count();
    let revenue: f64 = rows.iter().map(|row| row.revenue).sum();
    let average = if total > 0 {
        (revenue / total as f64).round()
    } else {
        0.0
    };

    Summary {
        metrics: vec![
            Metric::count("Total Projects", total),
            Metric::count("Completed Projects", completed),
            Metric::number("Total Revenue", revenue, MetricFormat::Currency),
            Metric::number("Average Project Value", average, MetricFormat::Currency),
        ],
        detail: DetailTable::Sales(rows),
        source_breakdown: Vec::new(),
    }
}
