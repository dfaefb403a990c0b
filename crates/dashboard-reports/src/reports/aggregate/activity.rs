use super::{rounded_percentage, Summary};
use crate::reports::document::{DetailTable, Metric, VisitRow};
use crate::reports::fields::{number_or_zero, text_or};
use crate::reports::source::Record;

pub(super) fn summarize(records: &[Record]) -> Summary {
    let rows: Vec<VisitRow> = records
        .iter()
        .map(|record| VisitRow {
            id: text_or(record, "id", ""),
            project_id: text_or(record, "project_id", ""),
            user_id: text_or(record, "user_id", ""),
            visit_type: text_or(record, "visit_type", ""),
            status: text_or(record, "status", ""),
            scheduled_date: text_or(record, "scheduled_date", ""),
            duration_minutes: number_or_zero(record, "duration_minutes"),
        })
        .collect();

    let total = rows.len();
    let completed = rows.iter().filter(|row| row.status == "completed").count();
    let minutes: f64 = rows.iter().map(|row| row.duration_minutes).sum();
    let average_minutes = (minutes / total.max(1) as f64).round();

    Summary {
        metrics: vec![
            Metric::count("Total Visits", total),
            Metric::count("Completed Visits", completed),
            Metric::text(
                "Completion Rate",
                format!("{}%", rounded_percentage(completed, total)),
            ),
            Metric::text("Average Duration", format!("{average_minutes} minutes")),
        ],
        detail: DetailTable::Activity(rows),
        source_breakdown: Vec::new(),
    }
}
