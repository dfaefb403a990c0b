use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::ReportKind;

/// Canonical, format-independent result of one report generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub id: String,
    pub name: String,
    pub report_type: ReportKind,
    pub generated_at: DateTime<Utc>,
    pub range_start: DateTime<Utc>,
    pub range_end: DateTime<Utc>,
    pub metrics: Vec<Metric>,
    pub detail: DetailTable,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_breakdown: Vec<SourceCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFormat {
    #[default]
    Plain,
    Currency,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: MetricValue,
    #[serde(default)]
    pub format: MetricFormat,
}

impl Metric {
    pub fn count(name: &str, value: usize) -> Self {
        Self::number(name, value as f64, MetricFormat::Plain)
    }

    pub fn number(name: &str, value: f64, format: MetricFormat) -> Self {
        Self {
            name: name.to_string(),
            value: MetricValue::Number(value),
            format,
        }
    }

    pub fn text(name: &str, value: String) -> Self {
        Self {
            name: name.to_string(),
            value: MetricValue::Text(value),
            format: MetricFormat::Plain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRow {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub revenue: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: String,
    pub source: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRow {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub visit_type: String,
    pub status: String,
    pub scheduled_date: String,
    pub duration_minutes: f64,
}

/// How a detail column is presented. Renderers format cells by kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Date,
    Number,
    Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ColumnKind,
}

const fn column(key: &'static str, label: &'static str, kind: ColumnKind) -> Column {
    Column { key, label, kind }
}

pub const SALES_COLUMNS: [Column; 5] = [
    column("id", "ID", ColumnKind::Text),
    column("name", "Name", ColumnKind::Text),
    column("created_at", "Created At", ColumnKind::Date),
    column("revenue", "Revenue", ColumnKind::Currency),
    column("status", "Status", ColumnKind::Text),
];

pub const LEAD_COLUMNS: [Column; 7] = [
    column("id", "ID", ColumnKind::Text),
    column("name", "Name", ColumnKind::Text),
    column("email", "Email", ColumnKind::Text),
    column("phone", "Phone", ColumnKind::Text),
    column("status", "Status", ColumnKind::Text),
    column("source", "Source", ColumnKind::Text),
    column("created_at", "Created At", ColumnKind::Date),
];

pub const VISIT_COLUMNS: [Column; 7] = [
    column("id", "ID", ColumnKind::Text),
    column("project_id", "Project ID", ColumnKind::Text),
    column("user_id", "User ID", ColumnKind::Text),
    column("visit_type", "Visit Type", ColumnKind::Text),
    column("status", "Status", ColumnKind::Text),
    column("scheduled_date", "Scheduled Date", ColumnKind::Date),
    column("duration_minutes", "Duration (min)", ColumnKind::Number),
];

/// Borrowed cell value, tagged by the kind of its column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Date(&'a str),
    Number(f64),
    Currency(f64),
}

/// Type-specific detail rows. Exactly one variant per document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "rows", rename_all = "snake_case")]
pub enum DetailTable {
    Sales(Vec<SalesRow>),
    Leads(Vec<LeadRow>),
    Activity(Vec<VisitRow>),
}

impl DetailTable {
    pub fn columns(&self) -> &'static [Column] {
        match self {
            Self::Sales(_) => &SALES_COLUMNS,
            Self::Leads(_) => &LEAD_COLUMNS,
            Self::Activity(_) => &VISIT_COLUMNS,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Sales(rows) => rows.len(),
            Self::Leads(rows) => rows.len(),
            Self::Activity(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows as cells, in the order of [`DetailTable::columns`].
    pub fn rows(&self) -> Vec<Vec<Cell<'_>>> {
        match self {
            Self::Sales(rows) => rows
                .iter()
                .map(|row| {
                    vec![
                        Cell::Text(&row.id),
                        Cell::Text(&row.name),
                        Cell::Date(&row.created_at),
                        Cell::Currency(row.revenue),
                        Cell::Text(&row.status),
                    ]
                })
                .collect(),
            Self::Leads(rows) => rows
                .iter()
                .map(|row| {
                    vec![
                        Cell::Text(&row.id),
                        Cell::Text(&row.name),
                        Cell::Text(&row.email),
                        Cell::Text(&row.phone),
                        Cell::Text(&row.status),
                        Cell::Text(&row.source),
                        Cell::Date(&row.created_at),
                    ]
                })
                .collect(),
            Self::Activity(rows) => rows
                .iter()
                .map(|row| {
                    vec![
                        Cell::Text(&row.id),
                        Cell::Text(&row.project_id),
                        Cell::Text(&row.user_id),
                        Cell::Text(&row.visit_type),
                        Cell::Text(&row.status),
                        Cell::Date(&row.scheduled_date),
                        Cell::Number(row.duration_minutes),
                    ]
                })
                .collect(),
        }
    }
}
