use crate::infra::SeedData;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use dashboard_reports::reports::schedule::{DeliveryTime, Frequency, ReportSchedule, ScheduleId};
use dashboard_reports::reports::{Record, ReportType};
use serde_json::{json, Value};

const PROJECT_STATUSES: [&str; 4] = ["completed", "in_progress", "completed", "open"];
const LEAD_STATUSES: [&str; 4] = ["new", "contacted", "converted", "converted"];
const LEAD_SOURCES: [Option<&str>; 5] = [
    Some("Referral"),
    Some("Website"),
    None,
    Some("Referral"),
    Some("Home Show"),
];
const VISIT_TYPES: [&str; 3] = ["estimate", "inspection", "install"];

/// Sample dashboard data covering the last thirty days before `now`, plus
/// two schedules that are already due.
pub(crate) fn demo_seed(now: DateTime<Utc>) -> SeedData {
    let stamp = |days_ago: i64, hour: i64| {
        (now - Duration::days(days_ago) + Duration::hours(hour))
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    };

    let projects = (0..12)
        .map(|i: usize| {
            json!({
                "id": format!("prj-{:03}", i + 1),
                "name": format!("Project {}", i + 1),
                "created_at": stamp(i as i64 * 2 + 1, 0),
                "revenue": 4_500 + (i as u64 * 1_250) % 9_000,
                "status": PROJECT_STATUSES[i % PROJECT_STATUSES.len()],
            })
        })
        .collect();

    let leads = (0..15)
        .map(|i: usize| {
            let mut lead = json!({
                "id": format!("lead-{:03}", i + 1),
                "name": format!("Prospect {}", i + 1),
                "email": format!("prospect{}@example.com", i + 1),
                "status": LEAD_STATUSES[i % LEAD_STATUSES.len()],
                "created_at": stamp(i as i64 + 1, 3),
            });
            if let Some(source) = LEAD_SOURCES[i % LEAD_SOURCES.len()] {
                lead["source"] = Value::from(source);
            }
            if i % 3 == 0 {
                lead["phone"] = Value::from(format!("555-01{:02}", i));
            }
            lead
        })
        .collect();

    let visits = (0..10)
        .map(|i: usize| {
            let completed = i % 3 != 2;
            let status = if completed { "completed" } else { "scheduled" };
            let duration = if completed { 30 + (i as u64 * 15) % 90 } else { 0 };
            json!({
                "id": format!("visit-{:03}", i + 1),
                "project_id": format!("prj-{:03}", i % 6 + 1),
                "user_id": format!("tech-{}", i % 3 + 1),
                "visit_type": VISIT_TYPES[i % VISIT_TYPES.len()],
                "status": status,
                "scheduled_date": stamp(i as i64 * 3, 0),
                "duration_minutes": duration,
            })
        })
        .collect();

    SeedData {
        projects: objects(projects),
        leads: objects(leads),
        visits: objects(visits),
        schedules: vec![
            demo_schedule(
                "sch-demo-sales",
                "Weekly sales summary",
                ReportType::Sales,
                Frequency::Weekly,
                now,
            ),
            demo_schedule(
                "sch-demo-leads",
                "Daily lead digest",
                ReportType::Leads,
                Frequency::Daily,
                now,
            ),
        ],
    }
}

fn objects(values: Vec<Value>) -> Vec<Record> {
    values
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

fn demo_schedule(
    id: &str,
    name: &str,
    report_type: ReportType,
    frequency: Frequency,
    now: DateTime<Utc>,
) -> ReportSchedule {
    let created = now - Duration::days(14);
    ReportSchedule {
        id: ScheduleId(id.to_string()),
        name: name.to_string(),
        report_type,
        frequency,
        delivery_time: DeliveryTime::default(),
        recipients: vec!["owner@example.com".to_string()],
        is_active: true,
        last_sent: None,
        next_send: now - Duration::hours(1),
        pdf_template: None,
        created_at: created,
        updated_at: created,
    }
}
