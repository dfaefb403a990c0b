use super::domain::{ReportSchedule, ScheduleId, SendStamp};
use crate::reports::render::RenderedReport;

/// Storage abstraction over persisted schedules.
pub trait ScheduleStore: Send + Sync {
    fn list(&self) -> Result<Vec<ReportSchedule>, StoreError>;
    fn get(&self, id: &ScheduleId) -> Result<Option<ReportSchedule>, StoreError>;
    fn create(&self, schedule: ReportSchedule) -> Result<ReportSchedule, StoreError>;
    fn update(&self, schedule: ReportSchedule) -> Result<ReportSchedule, StoreError>;
    fn delete(&self, id: &ScheduleId) -> Result<(), StoreError>;

    /// Writes `next` only when the stored send stamp still equals
    /// `expected`; otherwise fails with [`StoreError::Stale`].
    fn record_send(
        &self,
        id: &ScheduleId,
        expected: SendStamp,
        next: SendStamp,
    ) -> Result<ReportSchedule, StoreError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("schedule already exists")]
    Conflict,
    #[error("schedule not found")]
    NotFound,
    #[error("schedule was modified concurrently")]
    Stale,
    #[error("schedule store unavailable: {0}")]
    Unavailable(String),
}

/// Transport that hands a rendered report to a schedule's recipients
/// (e-mail, webhook, file drop).
pub trait ReportDelivery: Send + Sync {
    fn deliver(
        &self,
        schedule: &ReportSchedule,
        report: &RenderedReport,
    ) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery transport unavailable: {0}")]
    Transport(String),
    #[error("recipient {recipient} rejected the report: {reason}")]
    Rejected { recipient: String, reason: String },
}
