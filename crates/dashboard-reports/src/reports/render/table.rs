use crate::reports::document::{Cell, MetricFormat, MetricValue, ReportDocument};
use crate::reports::fields::parse_timestamp;
use crate::reports::locale::{format_currency, format_date, group_thousands, plain_number};

use super::RenderError;

/// How much presentation a renderer applies to cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CellStyle {
    /// Values as stored in the document.
    Raw,
    /// Dates in en-US form, numbers untouched.
    Locale,
    /// Dates in en-US form, numbers grouped, currency prefixed.
    Print,
}

pub(super) struct MetricLine<'a> {
    pub(super) name: &'a str,
    pub(super) value: String,
}

pub(super) fn metric_lines(
    document: &ReportDocument,
    style: CellStyle,
) -> Result<Vec<MetricLine<'_>>, RenderError> {
    document
        .metrics
        .iter()
        .map(|metric| {
            let value = match &metric.value {
                MetricValue::Text(text) => text.clone(),
                MetricValue::Number(number) if !number.is_finite() => {
                    return Err(RenderError::NonFiniteMetric {
                        metric: metric.name.clone(),
                    })
                }
                MetricValue::Number(number) => match (style, metric.format) {
                    (CellStyle::Print, MetricFormat::Currency) => format_currency(*number),
                    (CellStyle::Print, MetricFormat::Percent) => {
                        format!("{}%", group_thousands(*number))
                    }
                    (CellStyle::Print, MetricFormat::Plain) => group_thousands(*number),
                    (CellStyle::Raw | CellStyle::Locale, _) => plain_number(*number),
                },
            };
            Ok(MetricLine {
                name: &metric.name,
                value,
            })
        })
        .collect()
}

pub(super) fn header(document: &ReportDocument) -> Vec<&'static str> {
    document
        .detail
        .columns()
        .iter()
        .map(|column| column.label)
        .collect()
}

pub(super) fn detail_rows(
    document: &ReportDocument,
    style: CellStyle,
) -> Result<Vec<Vec<String>>, RenderError> {
    let columns = document.detail.columns();
    document
        .detail
        .rows()
        .into_iter()
        .enumerate()
        .map(|(row, cells)| {
            cells
                .into_iter()
                .zip(columns)
                .map(|(cell, column)| {
                    format_cell(cell, style).ok_or(RenderError::NonFiniteCell {
                        column: column.key,
                        row,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

fn format_cell(cell: Cell<'_>, style: CellStyle) -> Option<String> {
    let formatted = match cell {
        Cell::Text(text) => text.to_string(),
        Cell::Date(raw) => match style {
            CellStyle::Raw => raw.to_string(),
            CellStyle::Locale | CellStyle::Print => locale_date(raw),
        },
        Cell::Number(value) | Cell::Currency(value) if !value.is_finite() => return None,
        Cell::Number(value) => match style {
            CellStyle::Print => group_thousands(value),
            CellStyle::Raw | CellStyle::Locale => plain_number(value),
        },
        Cell::Currency(value) => match style {
            CellStyle::Print => format_currency(value),
            CellStyle::Raw | CellStyle::Locale => plain_number(value),
        },
    };
    Some(formatted)
}

/// Unparseable dates are shown as stored.
fn locale_date(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|at| format_date(at.date_naive()))
        .unwrap_or_else(|| raw.to_string())
}
