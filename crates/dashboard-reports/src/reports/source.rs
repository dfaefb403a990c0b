use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::fields::parse_timestamp;

/// Loosely typed row as returned by the hosted data platform.
pub type Record = Map<String, Value>;

/// Domain collections the aggregator reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Projects,
    Leads,
    Visits,
}

impl Entity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Leads => "leads",
            Self::Visits => "visits",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive `gte`/`lte` bound on one timestamp field of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    pub entity: Entity,
    pub field: &'static str,
    pub gte: DateTime<Utc>,
    pub lte: DateTime<Utc>,
}

impl RangeQuery {
    /// Whether `record` falls inside the bounds. Records whose field is
    /// missing or unparseable never match.
    pub fn matches(&self, record: &Record) -> bool {
        record
            .get(self.field)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .is_some_and(|at| at >= self.gte && at <= self.lte)
    }
}

/// Read-only access to domain records. Implementations own timeouts.
pub trait DataSource: Send + Sync {
    fn query(&self, query: &RangeQuery) -> Result<Vec<Record>, QueryError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error("{entity} query failed: {message}")]
    Backend { entity: Entity, message: String },
    #[error("{0} query timed out")]
    Timeout(Entity),
}
