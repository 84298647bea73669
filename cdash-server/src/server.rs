//! # HTTP Read Surface
//!
//! Serve the latest round sum and stored daily averages. Handlers only read:
//! the accumulator is the single writer of both values.
//!
//! Routes:
//! - `/` - banner
//! - `/lastcnt` - latest valid round sum as plain text
//! - `/daycnt/:day` - stored mean for `YEAR-MONTH-DAY`, 404 when absent
//! - `/days` - every stored record as JSON
//! - `/stats` - sampling metrics as JSON
//! - `/health` - liveness

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use cdash_common::{CdashError, DayKey};
use cdash_engine::KVStore;

use crate::latest::LatestValue;
use crate::metrics::Metrics;

/// Shared state for HTTP handlers.
pub struct HttpState<K> {
    /// Daily-average store (read only here).
    pub store: Arc<K>,
    /// Latest valid round sum.
    pub latest: LatestValue,
    /// Sampling metrics.
    pub metrics: Arc<Metrics>,
    /// Daemon start time.
    pub started_at: Instant,
}

/// Result of looking up one day, with not-found kept apart from failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayLookup {
    Found(u64),
    NotFound,
    Error(CdashError),
}

/// Reads the latest round sum.
pub fn get_latest(latest: &LatestValue) -> u64 {
    latest.get()
}

/// Looks up the mean stored for `raw_day`.
///
/// An unparseable key is reported as `NotFound`: no record can exist for it.
pub fn get_day_average<K: KVStore>(store: &K, raw_day: &str) -> DayLookup {
    let Ok(day) = raw_day.parse::<DayKey>() else {
        return DayLookup::NotFound;
    };
    match store.day_average(&day) {
        Ok(Some(mean)) => DayLookup::Found(mean),
        Ok(None) => DayLookup::NotFound,
        Err(err) => DayLookup::Error(err),
    }
}

/// Creates the router for the read surface.
pub fn create_router<K: KVStore + 'static>(state: HttpState<K>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/lastcnt", get(latest_handler::<K>))
        .route("/daycnt/:day", get(day_handler::<K>))
        .route("/days", get(days_handler::<K>))
        .route("/stats", get(stats_handler::<K>))
        .route("/health", get(health_handler::<K>))
        .with_state(Arc::new(state))
}

async fn index_handler() -> &'static str {
    "counter dashboard"
}

async fn latest_handler<K: KVStore>(State(state): State<Arc<HttpState<K>>>) -> String {
    get_latest(&state.latest).to_string()
}

async fn day_handler<K: KVStore>(
    State(state): State<Arc<HttpState<K>>>,
    Path(day): Path<String>,
) -> impl IntoResponse {
    match get_day_average(state.store.as_ref(), &day) {
        DayLookup::Found(mean) => (StatusCode::OK, mean.to_string()),
        DayLookup::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
        DayLookup::Error(err) => {
            warn!(day = %day, error = %err, "day lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "corrupt record".to_string())
        }
    }
}

#[derive(Serialize)]
struct DayEntry {
    day: String,
    average: Option<u64>,
}

async fn days_handler<K: KVStore>(State(state): State<Arc<HttpState<K>>>) -> impl IntoResponse {
    match state.store.day_records() {
        Ok(records) => {
            let entries: Vec<DayEntry> = records
                .into_iter()
                .map(|record| DayEntry {
                    day: record.day,
                    average: record.average,
                })
                .collect();
            (StatusCode::OK, Json(entries)).into_response()
        }
        Err(err) => {
            warn!(error = %err, "listing records failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

async fn stats_handler<K: KVStore>(State(state): State<Arc<HttpState<K>>>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

async fn health_handler<K: KVStore>(State(state): State<Arc<HttpState<K>>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "latest": state.latest.get(),
    }))
}

/// Binds `addr` and serves until `shutdown` resolves.
pub async fn serve<K, F>(addr: SocketAddr, state: HttpState<K>, shutdown: F) -> std::io::Result<()>
where
    K: KVStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "http server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
