//! Mock REST backend.
//!
//! Serves `/api/dashboard/` and `/api/spots/` from mutable state so tests
//! can change what the poller sees, inject failures and delay responses.

use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Backend {
    dashboard: Value,
    spots: HashMap<i64, Value>,
    failing: bool,
    dashboard_delay: Duration,
    hits: HashMap<String, usize>,
}

#[derive(Clone, Default)]
pub struct RestState(Arc<Mutex<Backend>>);

pub struct MockRestServer {
    base_url: String,
    state: RestState,
}

impl MockRestServer {
    pub async fn start(dashboard: Value) -> Self {
        let state = RestState::default();
        state.0.lock().dashboard = dashboard;

        let app = Router::new()
            .route("/api/dashboard/", get(dashboard_handler))
            .route("/api/spots/", get(spots_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    pub fn set_dashboard(&self, dashboard: Value) {
        self.state.0.lock().dashboard = dashboard;
    }

    pub fn set_spots(&self, lot_id: i64, spots: Value) {
        self.state.0.lock().spots.insert(lot_id, spots);
    }

    /// Answer every request with 503 while set.
    pub fn set_failing(&self, failing: bool) {
        self.state.0.lock().failing = failing;
    }

    pub fn set_dashboard_delay(&self, delay: Duration) {
        self.state.0.lock().dashboard_delay = delay;
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state.0.lock().hits.get(path).copied().unwrap_or(0)
    }
}

fn record_hit(state: &RestState, uri: &Uri) -> bool {
    let mut backend = state.0.lock();
    *backend.hits.entry(uri.path().to_string()).or_default() += 1;
    backend.failing
}

async fn dashboard_handler(
    State(state): State<RestState>,
    uri: Uri,
) -> Result<Json<Value>, StatusCode> {
    if record_hit(&state, &uri) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    // Capture the body before sleeping: a delayed response carries the
    // state as of the request.
    let (body, delay) = {
        let backend = state.0.lock();
        (backend.dashboard.clone(), backend.dashboard_delay)
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    Ok(Json(body))
}

async fn spots_handler(
    State(state): State<RestState>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    if record_hit(&state, &uri) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    let lot_id: i64 = params
        .get("parking_lot")
        .and_then(|v| v.parse().ok())
        .ok_or(StatusCode::BAD_REQUEST)?;
    let spots = state.0.lock().spots.get(&lot_id).cloned();
    Ok(Json(spots.unwrap_or_else(|| json!([]))))
}
