use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use super::error::ValidationError;
use super::source::Entity;

/// Report categories a schedule can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Sales,
    Leads,
    Activity,
    Analytics,
    System,
    Feedback,
}

impl ReportType {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Sales,
            Self::Leads,
            Self::Activity,
            Self::Analytics,
            Self::System,
            Self::Feedback,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Leads => "leads",
            Self::Activity => "activity",
            Self::Analytics => "analytics",
            Self::System => "system",
            Self::Feedback => "feedback",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sales => "Sales",
            Self::Leads => "Leads",
            Self::Activity => "Activity",
            Self::Analytics => "Analytics",
            Self::System => "System",
            Self::Feedback => "Feedback",
        }
    }

    /// The aggregation arm this type is reduced by. Types without a
    /// dedicated arm are summarised as field activity.
    pub const fn kind(self) -> ReportKind {
        match self {
            Self::Sales => ReportKind::Sales,
            Self::Leads => ReportKind::Leads,
            Self::Activity | Self::Analytics | Self::System | Self::Feedback => {
                ReportKind::Activity
            }
        }
    }

    /// Parses stored or legacy values, falling back to `activity` for
    /// anything unrecognised.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            warn!(value = raw, "unknown report type, falling back to activity");
            Self::Activity
        })
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownReportType(value.to_string()))
    }
}

/// Report types that have a dedicated aggregation arm and detail table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Sales,
    Leads,
    Activity,
}

impl ReportKind {
    pub const fn report_type(self) -> ReportType {
        match self {
            Self::Sales => ReportType::Sales,
            Self::Leads => ReportType::Leads,
            Self::Activity => ReportType::Activity,
        }
    }

    pub const fn label(self) -> &'static str {
        self.report_type().label()
    }

    pub const fn entity(self) -> Entity {
        match self {
            Self::Sales => Entity::Projects,
            Self::Leads => Entity::Leads,
            Self::Activity => Entity::Visits,
        }
    }

    /// Timestamp field the range bounds apply to.
    pub const fn timestamp_field(self) -> &'static str {
        match self {
            Self::Sales | Self::Leads => "created_at",
            Self::Activity => "scheduled_date",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_rejects_unknown_values() {
        assert_eq!("Sales".parse::<ReportType>().unwrap(), ReportType::Sales);
        assert!(matches!(
            "quarterly".parse::<ReportType>(),
            Err(ValidationError::UnknownReportType(value)) if value == "quarterly"
        ));
    }

    #[test]
    fn lenient_parse_falls_back_to_activity() {
        assert_eq!(ReportType::parse_lenient("leads"), ReportType::Leads);
        assert_eq!(ReportType::parse_lenient("revenue"), ReportType::Activity);
    }

    #[test]
    fn types_without_an_arm_reduce_as_activity() {
        assert_eq!(ReportType::Analytics.kind(), ReportKind::Activity);
        assert_eq!(ReportType::Feedback.kind(), ReportKind::Activity);
        assert_eq!(ReportType::Sales.kind().entity(), Entity::Projects);
        assert_eq!(ReportKind::Activity.timestamp_field(), "scheduled_date");
    }
}
