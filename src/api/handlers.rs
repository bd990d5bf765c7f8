use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::report::{
    compose_district_rows, CrimeReport, DistrictRow, DistrictTable, PredictionReport, ReportFormat,
    SafetyReport, TabularReport,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        districts: state.snapshot.len(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub districts: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct FormatQuery {
    #[serde(default)]
    pub format: ReportFormat,
}

/// Snapshot rows joined with freshly computed overlays
pub async fn list_districts(
    State(state): State<AppState>,
    Query(query): Query<FormatQuery>,
) -> Result<Response> {
    let run = state
        .service
        .run_all_blocking(state.snapshot.clone())
        .await?;
    let table = DistrictTable {
        rows: compose_district_rows(
            &state.snapshot,
            &run.crime,
            &run.safety,
            &state.service.config().designations,
        ),
    };

    Ok(render(query.format, &table, DistrictTable::to_html, DistrictTable::to_text))
}

/// One district joined with its overlays
pub async fn get_district(
    State(state): State<AppState>,
    Path(district): Path<String>,
) -> Result<Json<DistrictRow>> {
    if state.snapshot.get(&district).is_none() {
        return Err(AppError::NotFound(format!("District '{}' not found", district)));
    }

    let run = state
        .service
        .run_all_blocking(state.snapshot.clone())
        .await?;
    compose_district_rows(
        &state.snapshot,
        &run.crime,
        &run.safety,
        &state.service.config().designations,
    )
    .into_iter()
    .find(|row| row.district == district)
    .map(Json)
    .ok_or_else(|| AppError::NotFound(format!("District '{}' not found", district)))
}

/// MAE and the largest per-district errors of the crime-count model
pub async fn crime_predictions(
    State(state): State<AppState>,
    Query(query): Query<FormatQuery>,
) -> Result<Response> {
    let forecast = state
        .service
        .forecast_crime_blocking(state.snapshot.clone())
        .await?;
    let report = CrimeReport::from_forecast(&forecast);

    Ok(render(query.format, &report, CrimeReport::to_html, CrimeReport::to_text))
}

/// Probe designations from the safety classifier
pub async fn safety_predictions(
    State(state): State<AppState>,
    Query(query): Query<FormatQuery>,
) -> Result<Response> {
    let assessment = state
        .service
        .assess_safety_blocking(state.snapshot.clone())
        .await?;
    let report = SafetyReport::from_assessment(&assessment, &state.service.config().designations);

    Ok(render(query.format, &report, SafetyReport::to_html, SafetyReport::to_text))
}

/// Both pipelines, as shown on the dashboard ML page
pub async fn predictions(
    State(state): State<AppState>,
    Query(query): Query<FormatQuery>,
) -> Result<Response> {
    let run = state
        .service
        .run_all_blocking(state.snapshot.clone())
        .await?;
    let report = PredictionReport::from_run(&run, &state.service.config().designations);
    debug!(run_id = %report.run_id, "Prediction report generated");

    Ok(render(query.format, &report, PredictionReport::to_html, PredictionReport::to_text))
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> (StatusCode, String) {
    let metrics = crate::metrics::gather_metrics();
    (StatusCode::OK, metrics)
}

fn render<T: Serialize>(
    format: ReportFormat,
    report: &T,
    html: impl FnOnce(&T) -> String,
    text: impl FnOnce(&T) -> String,
) -> Response {
    match format {
        ReportFormat::Json => Json(report).into_response(),
        ReportFormat::Html => Html(html(report)).into_response(),
        ReportFormat::Text => (
            [(header::CONTENT_TYPE, format.mime_type())],
            text(report),
        )
            .into_response(),
    }
}
