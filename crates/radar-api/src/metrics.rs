use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode};

use radar_types::api::{HealthResponse, MetricsSnapshot};

use crate::state::AppState;

/// Process-wide request counters. Reset on restart.
#[derive(Debug, Default)]
pub struct Metrics {
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    total_micros: AtomicU64,
}

impl Metrics {
    pub fn record(&self, status: StatusCode, elapsed: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if status.is_client_error() || status.is_server_error() {
            self.total_errors.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.total_micros.fetch_add(micros, Ordering::Relaxed);
    }

    /// Average response time is in milliseconds, rounded to two decimals.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let total_errors = self.total_errors.load(Ordering::Relaxed);
        let total_micros = self.total_micros.load(Ordering::Relaxed);

        let avg_response_time = if total_requests == 0 {
            0.0
        } else {
            let avg_ms = total_micros as f64 / total_requests as f64 / 1000.0;
            (avg_ms * 100.0).round() / 100.0
        };

        MetricsSnapshot {
            total_requests,
            total_errors,
            avg_response_time,
        }
    }
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".into() })
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
