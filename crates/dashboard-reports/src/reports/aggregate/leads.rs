use super::{rounded_percentage, Summary};
use crate::reports::document::{DetailTable, LeadRow, Metric, MetricFormat, SourceCount};
use crate::reports::fields::text_or;
use crate::reports::source::Record;

const UNKNOWN_SOURCE: &str = "Unknown";

pub(super) fn summarize(records: &[Record]) -> Summary {
    let rows: Vec<LeadRow> = records
        .iter()
        .map(|record| LeadRow {
            id: text_or(record, "id", ""),
            name: text_or(record, "name", ""),
            email: text_or(record, "email", ""),
            phone: text_or(record, "phone", ""),
            status: text_or(record, "status", ""),
            source: text_or(record, "source", UNKNOWN_SOURCE),
            created_at: text_or(record, "created_at", ""),
        })
        .collect();

    let total = rows.len();
    let converted = rows.iter().filter(|row| row.status == "converted").count();
    let source_breakdown = source_breakdown(&rows);

    Summary {
        metrics: vec![
            Metric::count("Total Leads", total),
            Metric::count("Converted Leads", converted),
            Metric::number(
                "Conversion Rate",
                rounded_percentage(converted, total),
                MetricFormat::Percent,
            ),
        ],
        detail: DetailTable::Leads(rows),
        source_breakdown,
    }
}

/// Lead counts per source, in first-seen order.
fn source_breakdown(rows: &[LeadRow]) -> Vec<SourceCount> {
    let mut counts: Vec<SourceCount> = Vec::new();
    for row in rows {
        match counts.iter_mut().find(|entry| entry.source == row.source) {
            Some(entry) => entry.count += 1,
            None => counts.push(SourceCount {
                source: row.source.clone(),
                count: 1,
            }),
        }
    }
    counts
}
