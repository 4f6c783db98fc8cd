use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use meter_core::domain::{GridStep, Reading};
use meter_core::estimator;
use time::PrimitiveDateTime;

use crate::sinks::usage_json::UsageRow;
use crate::store::{CsvReadingLog, ReadingStore};
use crate::timefmt;

/// Dashboard query surface. Both endpoints recompute from the store on
/// every request; the log itself is the only state.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<CsvReadingLog>,
    pub default_interval_hours: u32,
}

/// Serve `GET /readings` and `GET /usage` on `bind_addr`.
pub fn init(bind_addr: &str, state: ApiState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid dashboard api bind address: {e}"))?;

    let app = Router::new()
        .route("/readings", get(list_readings))
        .route("/usage", get(usage_series))
        .with_state(state);

    tokio::spawn(async move {
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    tracing::error!(error = %e, "dashboard api server error");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to bind dashboard api listener");
            }
        }
    });

    Ok(())
}

#[derive(serde::Serialize)]
struct ReadingRow {
    #[serde(serialize_with = "timefmt::serialize_timestamp")]
    taken_at: PrimitiveDateTime,
    value: f64,
    note: Option<String>,
}

impl From<Reading> for ReadingRow {
    fn from(r: Reading) -> Self {
        Self {
            taken_at: r.taken_at,
            value: r.value,
            note: r.note,
        }
    }
}

async fn list_readings(State(state): State<ApiState>) -> impl IntoResponse {
    let mut readings = match state.store.snapshot().await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "failed to load readings");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Newest first, the way the dashboard table shows them.
    readings.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
    let rows: Vec<ReadingRow> = readings.into_iter().map(ReadingRow::from).collect();
    Json(rows).into_response()
}

#[derive(serde::Deserialize)]
struct UsageParams {
    hours: Option<u32>,
}

async fn usage_series(
    State(state): State<ApiState>,
    Query(params): Query<UsageParams>,
) -> impl IntoResponse {
    metrics::counter!("usage_requests_total").increment(1);

    let hours = params.hours.unwrap_or(state.default_interval_hours);
    let step = match GridStep::from_hours(hours) {
        Ok(step) => step,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let readings = match state.store.snapshot().await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "failed to load readings");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // An empty series is the normal answer while fewer than two distinct
    // instants are on file.
    let series = estimator::estimate(&readings, step);
    let rows: Vec<UsageRow> = series.iter().map(UsageRow::from).collect();
    Json(rows).into_response()
}
