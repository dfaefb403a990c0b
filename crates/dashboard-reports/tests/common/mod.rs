#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use dashboard_reports::reports::schedule::{
    DeliveryError, ReportDelivery, ReportSchedule, ScheduleId, ScheduleStore, SendStamp,
    StoreError,
};
use dashboard_reports::reports::{
    DataSource, Entity, QueryError, RangeQuery, Record, RenderedReport,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

pub fn records(value: Value) -> Vec<Record> {
    value
        .as_array()
        .expect("array literal")
        .iter()
        .map(|item| item.as_object().cloned().expect("object literal"))
        .collect()
}

/// Data source returning fixed records per entity, filtered by the query.
#[derive(Default)]
pub struct FakeSource {
    data: HashMap<Entity, Vec<Record>>,
    failure: Option<QueryError>,
    queries: Mutex<Vec<RangeQuery>>,
}

impl FakeSource {
    pub fn with(mut self, entity: Entity, rows: Vec<Record>) -> Self {
        self.data.insert(entity, rows);
        self
    }

    pub fn failing(error: QueryError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<RangeQuery> {
        self.queries.lock().expect("queries mutex poisoned").clone()
    }
}

impl DataSource for FakeSource {
    fn query(&self, query: &RangeQuery) -> Result<Vec<Record>, QueryError> {
        self.queries
            .lock()
            .expect("queries mutex poisoned")
            .push(query.clone());
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self
            .data
            .get(&query.entity)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).cloned().collect())
            .unwrap_or_default())
    }
}

/// Data source that ignores bounds, for arithmetic-only checks.
pub struct UnboundedSource(pub Vec<Record>);

impl DataSource for UnboundedSource {
    fn query(&self, _query: &RangeQuery) -> Result<Vec<Record>, QueryError> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    schedules: Mutex<BTreeMap<ScheduleId, ReportSchedule>>,
}

impl ScheduleStore for MemoryStore {
    fn list(&self) -> Result<Vec<ReportSchedule>, StoreError> {
        Ok(self.schedules.lock().unwrap().values().cloned().collect())
    }

    fn get(&self, id: &ScheduleId) -> Result<Option<ReportSchedule>, StoreError> {
        Ok(self.schedules.lock().unwrap().get(id).cloned())
    }

    fn create(&self, schedule: ReportSchedule) -> Result<ReportSchedule, StoreError> {
        let mut guard = self.schedules.lock().unwrap();
        if guard.contains_key(&schedule.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(schedule.id.clone(), schedule.clone());
        Ok(schedule)
    }

    fn update(&self, schedule: ReportSchedule) -> Result<ReportSchedule, StoreError> {
        let mut guard = self.schedules.lock().unwrap();
        match guard.get_mut(&schedule.id) {
            Some(existing) => {
                *existing = schedule.clone();
                Ok(schedule)
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn delete(&self, id: &ScheduleId) -> Result<(), StoreError> {
        self.schedules
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn record_send(
        &self,
        id: &ScheduleId,
        expected: SendStamp,
        next: SendStamp,
    ) -> Result<ReportSchedule, StoreError> {
        let mut guard = self.schedules.lock().unwrap();
        let schedule = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        if schedule.send_stamp() != expected {
            return Err(StoreError::Stale);
        }
        schedule.last_sent = next.last_sent;
        schedule.next_send = next.next_send;
        Ok(schedule.clone())
    }
}

#[derive(Debug, Clone)]
pub struct Delivered {
    pub schedule_id: ScheduleId,
    pub recipients: Vec<String>,
    pub filename: String,
    pub bytes: usize,
}

#[derive(Default)]
pub struct MemoryDelivery {
    delivered: Mutex<Vec<Delivered>>,
}

impl MemoryDelivery {
    pub fn delivered(&self) -> Vec<Delivered> {
        self.delivered.lock().unwrap().clone()
    }
}

impl ReportDelivery for MemoryDelivery {
    fn deliver(
        &self,
        schedule: &ReportSchedule,
        report: &RenderedReport,
    ) -> Result<(), DeliveryError> {
        self.delivered.lock().unwrap().push(Delivered {
            schedule_id: schedule.id.clone(),
            recipients: schedule.recipients.clone(),
            filename: report.filename.clone(),
            bytes: report.bytes.len(),
        });
        Ok(())
    }
}

pub struct DownDelivery;

impl ReportDelivery for DownDelivery {
    fn deliver(
        &self,
        _schedule: &ReportSchedule,
        _report: &RenderedReport,
    ) -> Result<(), DeliveryError> {
        Err(DeliveryError::Transport("smtp relay refused connection".into()))
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
