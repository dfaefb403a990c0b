pub mod clock;
mod domain;
mod repository;
mod service;

pub use clock::{next_send, next_send_from_anchor};
pub use domain::{
    DeliveryTime, Frequency, NewSchedule, ReportSchedule, ScheduleId, SchedulePatch, SendStamp,
};
pub use repository::{DeliveryError, ReportDelivery, ScheduleStore, StoreError};
pub use service::{FailedRun, ScheduleRun, ScheduleService, TickSummary};
