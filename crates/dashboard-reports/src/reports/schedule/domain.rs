use chrono::{DateTime, Months, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::reports::domain::ReportType;
use crate::reports::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub const fn ordered() -> [Self; 3] {
        [Self::Daily, Self::Weekly, Self::Monthly]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Parses stored or legacy values, falling back to `daily` for anything
    /// unrecognised.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            warn!(value = raw, "unknown schedule frequency, falling back to daily");
            Self::Daily
        })
    }

    /// Start of the reporting period that ends at `end`: one cadence step back.
    pub fn period_start(self, end: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Daily => end - chrono::Duration::days(1),
            Self::Weekly => end - chrono::Duration::days(7),
            Self::Monthly => end
                .checked_sub_months(Months::new(1))
                .unwrap_or(end - chrono::Duration::days(30)),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidFrequency(value.to_string()))
    }
}

/// Time of day a scheduled report goes out, serialized as `HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeliveryTime(NaiveTime);

impl DeliveryTime {
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, second).map(Self)
    }

    pub const fn as_naive(self) -> NaiveTime {
        self.0
    }
}

impl Default for DeliveryTime {
    fn default() -> Self {
        Self(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN))
    }
}

impl fmt::Display for DeliveryTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

impl FromStr for DeliveryTime {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
            .map(Self)
            .map_err(|_| ValidationError::InvalidDeliveryTime(value.to_string()))
    }
}

impl Serialize for DeliveryTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeliveryTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleId(pub String);

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted configuration describing when and to whom a report is sent.
/// Stored rows with an unknown type or frequency still load; see
/// [`ReportType::parse_lenient`] and [`Frequency::parse_lenient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSchedule {
    pub id: ScheduleId,
    pub name: String,
    #[serde(deserialize_with = "lenient_report_type")]
    pub report_type: ReportType,
    #[serde(deserialize_with = "lenient_frequency")]
    pub frequency: Frequency,
    pub delivery_time: DeliveryTime,
    pub recipients: Vec<String>,
    pub is_active: bool,
    pub last_sent: Option<DateTime<Utc>>,
    pub next_send: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_template: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn lenient_report_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ReportType, D::Error> {
    String::deserialize(deserializer).map(|raw| ReportType::parse_lenient(&raw))
}

fn lenient_frequency<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Frequency, D::Error> {
    String::deserialize(deserializer).map(|raw| Frequency::parse_lenient(&raw))
}

impl ReportSchedule {
    pub fn send_stamp(&self) -> SendStamp {
        SendStamp {
            last_sent: self.last_sent,
            next_send: self.next_send,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.next_send <= now
    }
}

/// The pair of timestamps a send updates, compared as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendStamp {
    pub last_sent: Option<DateTime<Utc>>,
    pub next_send: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Create payload for a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSchedule {
    pub name: String,
    pub report_type: ReportType,
    pub frequency: Frequency,
    #[serde(default)]
    pub delivery_time: Option<DeliveryTime>,
    pub recipients: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub pdf_template: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub report_type: Option<ReportType>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub delivery_time: Option<DeliveryTime>,
    #[serde(default)]
    pub recipients: Option<Vec<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub pdf_template: Option<String>,
}

impl SchedulePatch {
    /// Whether applying the patch changes when the schedule fires.
    pub fn touches_cadence(&self) -> bool {
        self.frequency.is_some() || self.delivery_time.is_some()
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        Err(ValidationError::EmptyName)
    } else {
        Ok(())
    }
}

/// Trims, validates and de-duplicates recipients, keeping first-seen order.
pub(crate) fn normalize_recipients(recipients: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut normalized: Vec<String> = Vec::with_capacity(recipients.len());
    for raw in recipients {
        let address = raw.trim();
        if !is_address(address) {
            return Err(ValidationError::InvalidRecipient(raw.clone()));
        }
        if !normalized
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(address))
        {
            normalized.push(address.to_string());
        }
    }

    if normalized.is_empty() {
        return Err(ValidationError::NoRecipients);
    }
    Ok(normalized)
}

fn is_address(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn delivery_time_accepts_short_and_long_forms() {
        assert_eq!(
            "07:30".parse::<DeliveryTime>().unwrap(),
            DeliveryTime::from_hms(7, 30, 0).unwrap()
        );
        assert_eq!(
            "23:59:59".parse::<DeliveryTime>().unwrap().to_string(),
            "23:59:59"
        );
        assert!("25:00".parse::<DeliveryTime>().is_err());
        assert_eq!(DeliveryTime::default().to_string(), "09:00:00");
    }

    #[test]
    fn frequency_parsing() {
        assert_eq!("Weekly".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert!(matches!(
            "hourly".parse::<Frequency>(),
            Err(ValidationError::InvalidFrequency(_))
        ));
        assert_eq!(Frequency::parse_lenient("fortnightly"), Frequency::Daily);
    }

    #[test]
    fn stored_rows_with_unknown_values_fall_back() {
        let row = serde_json::json!({
            "id": "sch-legacy",
            "name": "Legacy digest",
            "report_type": "forecast",
            "frequency": "fortnightly",
            "delivery_time": "06:00:00",
            "recipients": ["ops@example.com"],
            "is_active": true,
            "last_sent": null,
            "next_send": "2024-01-02T06:00:00Z",
            "created_at": "2023-12-01T00:00:00Z",
            "updated_at": "2023-12-01T00:00:00Z"
        });
        let schedule: ReportSchedule = serde_json::from_value(row).expect("legacy row loads");
        assert_eq!(schedule.frequency, Frequency::Daily);
        assert_eq!(schedule.report_type, ReportType::Activity);

        let create = serde_json::json!({
            "name": "New digest",
            "report_type": "sales",
            "frequency": "fortnightly",
            "recipients": ["ops@example.com"]
        });
        assert!(serde_json::from_value::<NewSchedule>(create).is_err());
    }

    #[test]
    fn period_start_steps_back_one_cadence() {
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 9, 0, 0).unwrap();
        assert_eq!(
            Frequency::Weekly.period_start(end),
            Utc.with_ymd_and_hms(2024, 3, 24, 9, 0, 0).unwrap()
        );
        assert_eq!(
            Frequency::Monthly.period_start(end),
            Utc.with_ymd_and_hms(2024, 2, 29, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn recipients_are_validated_and_deduplicated() {
        let recipients = vec![
            " ops@example.com ".to_string(),
            "OPS@example.com".to_string(),
            "finance@example.com".to_string(),
        ];
        assert_eq!(
            normalize_recipients(&recipients).unwrap(),
            vec!["ops@example.com", "finance@example.com"]
        );
        assert_eq!(normalize_recipients(&[]), Err(ValidationError::NoRecipients));
        assert_eq!(
            normalize_recipients(&["not an address".to_string()]),
            Err(ValidationError::InvalidRecipient("not an address".to_string()))
        );
    }
}
