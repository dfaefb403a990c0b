use crate::infra::{deserialize_instant, AppState, ReportsApi};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use dashboard_reports::error::AppError;
use dashboard_reports::reports::schedule::{
    NewSchedule, ReportDelivery, ReportSchedule, ScheduleId, SchedulePatch, ScheduleStore,
    TickSummary,
};
use dashboard_reports::reports::{
    render, DataSource, ExportFormat, RenderedReport, ReportError, ReportType,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub(crate) struct ExportRequest {
    pub(crate) report_type: String,
    #[serde(deserialize_with = "deserialize_instant")]
    pub(crate) range_start: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_instant")]
    pub(crate) range_end: DateTime<Utc>,
    #[serde(default)]
    pub(crate) format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FormatQuery {
    #[serde(default)]
    pub(crate) format: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RunResponse {
    pub(crate) schedule: ReportSchedule,
    pub(crate) document_id: String,
    pub(crate) filename: String,
    pub(crate) content_type: String,
    pub(crate) size: usize,
}

pub(crate) fn with_report_routes<S, D, Q>(api: ReportsApi<S, D, Q>) -> Router
where
    S: ScheduleStore + 'static,
    D: ReportDelivery + 'static,
    Q: DataSource + 'static,
{
    Router::new()
        .route("/api/v1/reports/export", post(export_endpoint::<S, D, Q>))
        .route(
            "/api/v1/schedules",
            get(list_schedules::<S, D, Q>).post(create_schedule::<S, D, Q>),
        )
        .route("/api/v1/schedules/tick", post(tick_schedules::<S, D, Q>))
        .route(
            "/api/v1/schedules/:schedule_id",
            get(get_schedule::<S, D, Q>)
                .patch(update_schedule::<S, D, Q>)
                .delete(delete_schedule::<S, D, Q>),
        )
        .route(
            "/api/v1/schedules/:schedule_id/run",
            post(run_schedule::<S, D, Q>),
        )
        .with_state(api)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn resolve_format(raw: Option<&str>, fallback: ExportFormat) -> Result<ExportFormat, AppError> {
    match raw {
        Some(value) => Ok(value.parse::<ExportFormat>()?),
        None => Ok(fallback),
    }
}

fn attachment(report: RenderedReport) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", report.filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, report.mime_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.bytes,
    )
        .into_response()
}

pub(crate) async fn export_endpoint<S, D, Q>(
    State(api): State<ReportsApi<S, D, Q>>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, AppError>
where
    S: ScheduleStore + 'static,
    D: ReportDelivery + 'static,
    Q: DataSource + 'static,
{
    let report_type = request.report_type.parse::<ReportType>()?;
    let format = resolve_format(request.format.as_deref(), ExportFormat::default())?;

    let document = api
        .service
        .aggregator()
        .generate(report_type, request.range_start, request.range_end)?;
    let report = render(&document, format).map_err(ReportError::from)?;

    Ok(attachment(report))
}

pub(crate) async fn list_schedules<S, D, Q>(
    State(api): State<ReportsApi<S, D, Q>>,
    Query(filter): Query<ListQuery>,
) -> Result<Json<Vec<ReportSchedule>>, AppError>
where
    S: ScheduleStore + 'static,
    D: ReportDelivery + 'static,
    Q: DataSource + 'static,
{
    let schedules = api
        .service
        .list()?
        .into_iter()
        .filter(|schedule| filter.active.map_or(true, |active| schedule.is_active == active))
        .collect();
    Ok(Json(schedules))
}

pub(crate) async fn create_schedule<S, D, Q>(
    State(api): State<ReportsApi<S, D, Q>>,
    Json(input): Json<NewSchedule>,
) -> Result<(StatusCode, Json<ReportSchedule>), AppError>
where
    S: ScheduleStore + 'static,
    D: ReportDelivery + 'static,
    Q: DataSource + 'static,
{
    let schedule = api.service.create(input, Utc::now())?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

pub(crate) async fn get_schedule<S, D, Q>(
    State(api): State<ReportsApi<S, D, Q>>,
    Path(schedule_id): Path<String>,
) -> Result<Json<ReportSchedule>, AppError>
where
    S: ScheduleStore + 'static,
    D: ReportDelivery + 'static,
    Q: DataSource + 'static,
{
    Ok(Json(api.service.get(&ScheduleId(schedule_id))?))
}

pub(crate) async fn update_schedule<S, D, Q>(
    State(api): State<ReportsApi<S, D, Q>>,
    Path(schedule_id): Path<String>,
    Json(patch): Json<SchedulePatch>,
) -> Result<Json<ReportSchedule>, AppError>
where
    S: ScheduleStore + 'static,
    D: ReportDelivery + 'static,
    Q: DataSource + 'static,
{
    let schedule = api
        .service
        .update(&ScheduleId(schedule_id), patch, Utc::now())?;
    Ok(Json(schedule))
}

pub(crate) async fn delete_schedule<S, D, Q>(
    State(api): State<ReportsApi<S, D, Q>>,
    Path(schedule_id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: ScheduleStore + 'static,
    D: ReportDelivery + 'static,
    Q: DataSource + 'static,
{
    api.service.delete(&ScheduleId(schedule_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn run_schedule<S, D, Q>(
    State(api): State<ReportsApi<S, D, Q>>,
    Path(schedule_id): Path<String>,
    Query(query): Query<FormatQuery>,
) -> Result<Json<RunResponse>, AppError>
where
    S: ScheduleStore + 'static,
    D: ReportDelivery + 'static,
    Q: DataSource + 'static,
{
    let format = resolve_format(query.format.as_deref(), api.default_format)?;
    let run = api
        .service
        .run(&ScheduleId(schedule_id), format, Utc::now())?;

    Ok(Json(RunResponse {
        document_id: run.document_id,
        filename: run.report.filename,
        content_type: run.report.mime_type.to_string(),
        size: run.report.bytes.len(),
        schedule: run.schedule,
    }))
}

pub(crate) async fn tick_schedules<S, D, Q>(
    State(api): State<ReportsApi<S, D, Q>>,
    Query(query): Query<FormatQuery>,
) -> Result<Json<TickSummary>, AppError>
where
    S: ScheduleStore + 'static,
    D: ReportDelivery + 'static,
    Q: DataSource + 'static,
{
    let format = resolve_format(query.format.as_deref(), api.default_format)?;
    Ok(Json(api.service.tick(format, Utc::now())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_seed;
    use crate::infra::{build_service, OutboxDelivery, SeedData};
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(seed: SeedData) -> (Router, OutboxDelivery) {
        let (service, outbox) = build_service(&seed);
        let router = with_report_routes(ReportsApi {
            service,
            default_format: ExportFormat::Pdf,
        })
        .layer(Extension(AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }));
        (router, outbox)
    }

    async fn send(router: &Router, request: Request<Body>) -> Response {
        router
            .clone()
            .oneshot(request)
            .await
            .expect("route executes")
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn read_body(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .expect("read body")
            .to_vec()
    }

    async fn read_json_body(response: Response) -> Value {
        serde_json::from_slice(&read_body(response).await).expect("json payload")
    }

    fn sales_seed() -> SeedData {
        serde_json::from_value(json!({
            "projects": [
                { "id": "p1", "name": "Roof", "created_at": "2024-01-05T10:00:00Z", "revenue": 100, "status": "completed" },
                { "id": "p2", "name": "Deck", "created_at": "2024-01-06T10:00:00Z", "revenue": 50, "status": "open" }
            ]
        }))
        .unwrap()
    }

    fn new_schedule() -> Value {
        json!({
            "name": "Weekly leads",
            "report_type": "leads",
            "frequency": "weekly",
            "delivery_time": "07:30",
            "recipients": ["sales@example.com"]
        })
    }

    #[tokio::test]
    async fn export_returns_attachment_with_content_type() {
        let (router, _) = app(sales_seed());
        let response = send(
            &router,
            json_request(
                "POST",
                "/api/v1/reports/export",
                json!({
                    "report_type": "sales",
                    "range_start": "2024-01-01",
                    "range_end": "2024-01-31T23:59:59Z",
                    "format": "csv"
                }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"Sales_Report___"));
        assert!(disposition.ends_with(".csv\""));

        let body = String::from_utf8(read_body(response).await).unwrap();
        assert!(body.contains("Total Projects,2\n"));
        assert!(body.contains("Total Revenue,150\n"));
        assert!(body.contains("Average Project Value,75\n"));
    }

    #[tokio::test]
    async fn export_rejects_unknown_format_and_type() {
        let (router, _) = app(sales_seed());
        for body in [
            json!({ "report_type": "sales", "range_start": "2024-01-01", "range_end": "2024-01-31", "format": "xlsx" }),
            json!({ "report_type": "forecast", "range_start": "2024-01-01", "range_end": "2024-01-31" }),
            json!({ "report_type": "sales", "range_start": "2024-02-01", "range_end": "2024-01-01" }),
        ] {
            let response = send(&router, json_request("POST", "/api/v1/reports/export", body)).await;
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
            let payload = read_json_body(response).await;
            assert!(payload["error"].as_str().is_some());
        }
    }

    #[tokio::test]
    async fn schedule_crud_round_trip() {
        let (router, _) = app(SeedData::default());

        let response = send(&router, json_request("POST", "/api/v1/schedules", new_schedule())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = read_json_body(response).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["delivery_time"], "07:30:00");
        assert_eq!(created["is_active"], true);
        assert!(created["last_sent"].is_null());

        let response = send(
            &router,
            json_request(
                "PATCH",
                &format!("/api/v1/schedules/{id}"),
                json!({ "is_active": false }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json_body(response).await["is_active"], false);

        let response = send(&router, empty_request("GET", "/api/v1/schedules?active=true")).await;
        assert_eq!(read_json_body(response).await, json!([]));
        let response = send(&router, empty_request("GET", "/api/v1/schedules?active=false")).await;
        assert_eq!(read_json_body(response).await.as_array().unwrap().len(), 1);

        let response = send(&router, empty_request("DELETE", &format!("/api/v1/schedules/{id}"))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&router, empty_request("GET", &format!("/api/v1/schedules/{id}"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_rejects_schedules_without_recipients() {
        let (router, _) = app(SeedData::default());
        let mut body = new_schedule();
        body["recipients"] = json!([]);
        let response = send(&router, json_request("POST", "/api/v1/schedules", body)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn run_now_delivers_and_records_the_send() {
        let now = Utc::now();
        let (router, outbox) = app(demo_seed(now));

        let response = send(
            &router,
            empty_request("POST", "/api/v1/schedules/sch-demo-leads/run?format=html"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["content_type"], "text/html");
        assert!(payload["filename"].as_str().unwrap().ends_with(".html"));
        assert!(payload["schedule"]["last_sent"].is_string());

        let entries = outbox.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].recipients, vec!["owner@example.com"]);
    }

    #[tokio::test]
    async fn tick_sends_every_due_schedule() {
        let (router, outbox) = app(demo_seed(Utc::now()));
        let response = send(&router, empty_request("POST", "/api/v1/schedules/tick")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let summary = read_json_body(response).await;
        assert_eq!(summary["sent"].as_array().unwrap().len(), 2);
        assert!(outbox.entries().iter().all(|entry| entry.content_type == "application/pdf"));
    }

    #[tokio::test]
    async fn health_and_readiness_report_ok() {
        let (router, _) = app(SeedData::default());
        let response = send(&router, empty_request("GET", "/health")).await;
        assert_eq!(read_json_body(response).await, json!({ "status": "ok" }));

        let response = send(&router, empty_request("GET", "/ready")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
