use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use super::clock::{next_send, next_send_from_anchor};
use super::domain::{
    normalize_recipients, validate_name, NewSchedule, ReportSchedule, ScheduleId, SchedulePatch,
    SendStamp,
};
use super::repository::{ReportDelivery, ScheduleStore, StoreError};
use crate::reports::aggregate::ReportAggregator;
use crate::reports::error::ReportError;
use crate::reports::render::{render, ExportFormat, RenderedReport};
use crate::reports::source::DataSource;

/// Service composing the schedule store, report generation and delivery.
pub struct ScheduleService<S, D, Q> {
    store: Arc<S>,
    delivery: Arc<D>,
    aggregator: Arc<ReportAggregator<Q>>,
}

static SCHEDULE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_schedule_id() -> ScheduleId {
    let id = SCHEDULE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ScheduleId(format!("sch-{id:06}"))
}

/// Outcome of one executed schedule.
#[derive(Debug, Clone)]
pub struct ScheduleRun {
    pub schedule: ReportSchedule,
    pub document_id: String,
    pub report: RenderedReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedRun {
    pub schedule_id: ScheduleId,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TickSummary {
    pub sent: Vec<ScheduleId>,
    /// Due schedules another run claimed first.
    pub skipped: Vec<ScheduleId>,
    pub failed: Vec<FailedRun>,
}

impl<S, D, Q> ScheduleService<S, D, Q>
where
    S: ScheduleStore + 'static,
    D: ReportDelivery + 'static,
    Q: DataSource + 'static,
{
    pub fn new(store: Arc<S>, delivery: Arc<D>, aggregator: Arc<ReportAggregator<Q>>) -> Self {
        Self {
            store,
            delivery,
            aggregator,
        }
    }

    pub fn aggregator(&self) -> &ReportAggregator<Q> {
        &self.aggregator
    }

    pub fn create(
        &self,
        input: NewSchedule,
        now: DateTime<Utc>,
    ) -> Result<ReportSchedule, ReportError> {
        validate_name(&input.name)?;
        let recipients = normalize_recipients(&input.recipients)?;
        let delivery_time = input.delivery_time.unwrap_or_default();

        let schedule = ReportSchedule {
            id: next_schedule_id(),
            name: input.name.trim().to_string(),
            report_type: input.report_type,
            frequency: input.frequency,
            delivery_time,
            recipients,
            is_active: input.is_active,
            last_sent: None,
            next_send: next_send(input.frequency, Some(delivery_time), now),
            pdf_template: input.pdf_template,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.create(schedule)?;
        info!(
            schedule = %stored.id,
            frequency = %stored.frequency,
            next_send = %stored.next_send,
            "report schedule created"
        );
        Ok(stored)
    }

    /// Applies `patch`. Changing the cadence, or re-activating a paused
    /// schedule, recomputes `next_send` from `now`.
    pub fn update(
        &self,
        id: &ScheduleId,
        patch: SchedulePatch,
        now: DateTime<Utc>,
    ) -> Result<ReportSchedule, ReportError> {
        let mut schedule = self.get(id)?;
        let reactivated = patch.is_active == Some(true) && !schedule.is_active;
        let reschedule = patch.touches_cadence() || reactivated;

        if let Some(name) = patch.name {
            validate_name(&name)?;
            schedule.name = name.trim().to_string();
        }
        if let Some(recipients) = patch.recipients {
            schedule.recipients = normalize_recipients(&recipients)?;
        }
        if let Some(report_type) = patch.report_type {
            schedule.report_type = report_type;
        }
        if let Some(frequency) = patch.frequency {
            schedule.frequency = frequency;
        }
        if let Some(delivery_time) = patch.delivery_time {
            schedule.delivery_time = delivery_time;
        }
        if let Some(is_active) = patch.is_active {
            schedule.is_active = is_active;
        }
        if let Some(template) = patch.pdf_template {
            schedule.pdf_template = Some(template).filter(|value| !value.trim().is_empty());
        }

        if reschedule {
            schedule.next_send = next_send(schedule.frequency, Some(schedule.delivery_time), now);
        }
        schedule.updated_at = now;

        Ok(self.store.update(schedule)?)
    }

    pub fn get(&self, id: &ScheduleId) -> Result<ReportSchedule, ReportError> {
        Ok(self.store.get(id)?.ok_or(StoreError::NotFound)?)
    }

    pub fn list(&self) -> Result<Vec<ReportSchedule>, ReportError> {
        Ok(self.store.list()?)
    }

    pub fn delete(&self, id: &ScheduleId) -> Result<(), ReportError> {
        self.store.delete(id)?;
        info!(schedule = %id, "report schedule deleted");
        Ok(())
    }

    /// Active schedules whose `next_send` has passed, earliest first.
    pub fn due(&self, now: DateTime<Utc>) -> Result<Vec<ReportSchedule>, ReportError> {
        let mut due: Vec<ReportSchedule> = self
            .store
            .list()?
            .into_iter()
            .filter(|schedule| schedule.is_due(now))
            .collect();
        due.sort_by(|a, b| a.next_send.cmp(&b.next_send).then_with(|| a.id.cmp(&b.id)));
        Ok(due)
    }

    /// Generates, renders and delivers one schedule right away.
    pub fn run(
        &self,
        id: &ScheduleId,
        format: ExportFormat,
        now: DateTime<Utc>,
    ) -> Result<ScheduleRun, ReportError> {
        let schedule = self.get(id)?;
        self.send(schedule, format, now)
    }

    /// One pass over every due schedule. Failures are collected per
    /// schedule rather than aborting the pass.
    pub fn tick(
        &self,
        format: ExportFormat,
        now: DateTime<Utc>,
    ) -> Result<TickSummary, ReportError> {
        let mut summary = TickSummary::default();
        for schedule in self.due(now)? {
            let schedule_id = schedule.id.clone();
            match self.send(schedule, format, now) {
                Ok(run) => summary.sent.push(run.schedule.id),
                Err(ReportError::Store(StoreError::Stale)) => summary.skipped.push(schedule_id),
                Err(err) => {
                    warn!(schedule = %schedule_id, error = %err, "scheduled report failed");
                    summary.failed.push(FailedRun {
                        schedule_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            sent = summary.sent.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "schedule tick finished"
        );
        Ok(summary)
    }

    /// Claims the slot with a compare-and-swap before delivering, so only
    /// one of several racing runs sends the report. A failed delivery hands
    /// the slot back.
    fn send(
        &self,
        schedule: ReportSchedule,
        format: ExportFormat,
        now: DateTime<Utc>,
    ) -> Result<ScheduleRun, ReportError> {
        let range_start = schedule.frequency.period_start(now);
        let document = self
            .aggregator
            .generate_at(schedule.report_type, range_start, now, now)?;
        let report = render(&document, format)?;

        let claimed = schedule.send_stamp();
        let next = SendStamp {
            last_sent: Some(now),
            next_send: following_send(&schedule, now),
        };
        let updated = self
            .store
            .record_send(&schedule.id, claimed, next)
            .map_err(|err| {
                if matches!(err, StoreError::Stale) {
                    warn!(
                        schedule = %schedule.id,
                        "slot already claimed by a concurrent run, not delivering"
                    );
                }
                err
            })?;

        if let Err(err) = self.delivery.deliver(&updated, &report) {
            if let Err(rollback) = self.store.record_send(&schedule.id, next, claimed) {
                warn!(
                    schedule = %schedule.id,
                    error = %rollback,
                    "could not release slot after failed delivery"
                );
            }
            return Err(err.into());
        }

        info!(
            schedule = %updated.id,
            document = %document.id,
            recipients = updated.recipients.len(),
            next_send = %updated.next_send,
            "scheduled report delivered"
        );

        Ok(ScheduleRun {
            schedule: updated,
            document_id: document.id,
            report,
        })
    }
}

/// Next slot after a send at `now`. A run ahead of the pending slot keeps
/// it; otherwise the cadence steps forward from the fulfilled slot until
/// it passes `now`.
fn following_send(schedule: &ReportSchedule, now: DateTime<Utc>) -> DateTime<Utc> {
    if schedule.next_send > now {
        return schedule.next_send;
    }

    let time = Some(schedule.delivery_time);
    let mut next = next_send_from_anchor(schedule.frequency, time, schedule.next_send);
    while next <= now {
        next = next_send_from_anchor(schedule.frequency, time, next);
    }
    next
}
