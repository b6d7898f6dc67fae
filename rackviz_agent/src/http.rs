//! Plain HTTP endpoint: GET /metrics returns the cached sample as JSON.

use axum::{extract::State, Json};

use crate::metrics::current_sample;
use crate::state::AppState;
use crate::types::MetricsSample;

pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSample> {
    Json(current_sample(&state).await)
}
