use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use dashboard_reports::error::AppError;
use dashboard_reports::reports::schedule::{
    DeliveryError, ReportDelivery, ReportSchedule, ScheduleId, ScheduleService, ScheduleStore,
    SendStamp, StoreError,
};
use dashboard_reports::reports::{
    parse_timestamp, DataSource, Entity, ExportFormat, QueryError, RangeQuery, Record,
    RenderedReport, ReportAggregator,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ReportService =
    ScheduleService<InMemoryScheduleStore, OutboxDelivery, InMemoryDataSource>;

/// Shared handler state for the report and schedule routes.
pub(crate) struct ReportsApi<S, D, Q> {
    pub(crate) service: Arc<ScheduleService<S, D, Q>>,
    pub(crate) default_format: ExportFormat,
}

impl<S, D, Q> Clone for ReportsApi<S, D, Q> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            default_format: self.default_format,
        }
    }
}

/// JSON seed: domain collections plus optional pre-built schedules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct SeedData {
    #[serde(default)]
    pub(crate) projects: Vec<Record>,
    #[serde(default)]
    pub(crate) leads: Vec<Record>,
    #[serde(default)]
    pub(crate) visits: Vec<Record>,
    #[serde(default)]
    pub(crate) schedules: Vec<ReportSchedule>,
}

impl SeedData {
    pub(crate) fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let seed: SeedData = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            projects = seed.projects.len(),
            leads = seed.leads.len(),
            visits = seed.visits.len(),
            schedules = seed.schedules.len(),
            "seed data loaded"
        );
        Ok(seed)
    }
}

/// Read-only record store standing in for the hosted data platform.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryDataSource {
    collections: Arc<HashMap<Entity, Vec<Record>>>,
}

impl InMemoryDataSource {
    pub(crate) fn from_seed(seed: &SeedData) -> Self {
        let collections = HashMap::from([
            (Entity::Projects, seed.projects.clone()),
            (Entity::Leads, seed.leads.clone()),
            (Entity::Visits, seed.visits.clone()),
        ]);
        Self {
            collections: Arc::new(collections),
        }
    }
}

impl DataSource for InMemoryDataSource {
    fn query(&self, query: &RangeQuery) -> Result<Vec<Record>, QueryError> {
        Ok(self
            .collections
            .get(&query.entity)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| query.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryScheduleStore {
    schedules: Arc<Mutex<BTreeMap<ScheduleId, ReportSchedule>>>,
}

impl InMemoryScheduleStore {
    pub(crate) fn seeded(schedules: &[ReportSchedule]) -> Self {
        let map = schedules
            .iter()
            .map(|schedule| (schedule.id.clone(), schedule.clone()))
            .collect();
        Self {
            schedules: Arc::new(Mutex::new(map)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<ScheduleId, ReportSchedule>>, StoreError> {
        self.schedules
            .lock()
            .map_err(|_| StoreError::Unavailable("schedule store mutex poisoned".into()))
    }
}

impl ScheduleStore for InMemoryScheduleStore {
    fn list(&self) -> Result<Vec<ReportSchedule>, StoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn get(&self, id: &ScheduleId) -> Result<Option<ReportSchedule>, StoreError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn create(&self, schedule: ReportSchedule) -> Result<ReportSchedule, StoreError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&schedule.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(schedule.id.clone(), schedule.clone());
        Ok(schedule)
    }

    fn update(&self, schedule: ReportSchedule) -> Result<ReportSchedule, StoreError> {
        let mut guard = self.lock()?;
        match guard.get_mut(&schedule.id) {
            Some(existing) => {
                *existing = schedule.clone();
                Ok(schedule)
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn delete(&self, id: &ScheduleId) -> Result<(), StoreError> {
        self.lock()?
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
        let mut guard = self.lock()?;
        let schedule = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        if schedule.send_stamp() != expected {
            return Err(StoreError::Stale);
        }
        schedule.last_sent = next.last_sent;
        schedule.next_send = next.next_send;
        Ok(schedule.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct OutboxEntry {
    pub(crate) schedule_id: ScheduleId,
    pub(crate) recipients: Vec<String>,
    pub(crate) filename: String,
    pub(crate) content_type: String,
    pub(crate) size: usize,
}

/// Delivery transport that keeps rendered reports in memory and logs them.
#[derive(Default, Clone)]
pub(crate) struct OutboxDelivery {
    entries: Arc<Mutex<Vec<OutboxEntry>>>,
}

impl OutboxDelivery {
    pub(crate) fn entries(&self) -> Vec<OutboxEntry> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ReportDelivery for OutboxDelivery {
    fn deliver(
        &self,
        schedule: &ReportSchedule,
        report: &RenderedReport,
    ) -> Result<(), DeliveryError> {
        let entry = OutboxEntry {
            schedule_id: schedule.id.clone(),
            recipients: schedule.recipients.clone(),
            filename: report.filename.clone(),
            content_type: report.mime_type.to_string(),
            size: report.bytes.len(),
        };
        info!(
            schedule = %entry.schedule_id,
            recipients = %entry.recipients.join(", "),
            file = %entry.filename,
            bytes = entry.size,
            "report queued for delivery"
        );
        self.entries
            .lock()
            .map_err(|_| DeliveryError::Transport("outbox mutex poisoned".into()))?
            .push(entry);
        Ok(())
    }
}

pub(crate) fn build_service(seed: &SeedData) -> (Arc<ReportService>, OutboxDelivery) {
    let source = Arc::new(InMemoryDataSource::from_seed(seed));
    let store = Arc::new(InMemoryScheduleStore::seeded(&seed.schedules));
    let outbox = OutboxDelivery::default();
    let aggregator = Arc::new(ReportAggregator::new(source));
    let service = ScheduleService::new(store, Arc::new(outbox.clone()), aggregator);
    (Arc::new(service), outbox)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// RFC 3339 timestamp or bare date (midnight UTC).
pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw)
        .ok_or_else(|| format!("failed to parse '{raw}' as an RFC 3339 timestamp or YYYY-MM-DD"))
}

pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Last whole second of `date`, so a date-only upper bound covers the day.
pub(crate) fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(last))
}

pub(crate) fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw).map_err(serde::de::Error::custom)
}
