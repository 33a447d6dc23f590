//! Local HTTP server standing in for the agency

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "pw";
/// `Basic` credentials of alice:pw
const EXPECTED_AUTH: &str = "Basic YWxpY2U6cHc=";

#[derive(Default)]
pub struct MockAgency {
    batches: Vec<Value>,
    /// Batch records that answer with a server error
    broken: Vec<String>,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
}

impl MockAgency {
    pub fn new(batches: Vec<Value>) -> Self {
        Self {
            batches,
            ..Self::default()
        }
    }

    pub fn with_broken(mut self, batch_id: &str) -> Self {
        self.broken.push(batch_id.to_string());
        self
    }

    /// Serve on an ephemeral port, returning the base url
    pub async fn serve(self) -> (String, Arc<MockAgency>) {
        let agency = Arc::new(self);
        let app = Router::new()
            .route("/batches", get(list_batches))
            .route("/batches/{id}", get(batch_detail))
            .with_state(agency.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), agency)
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(EXPECTED_AUTH)
}

// Ignores the experimentId filter on purpose so clients must filter
async fn list_batches(
    State(agency): State<Arc<MockAgency>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if !query.contains_key("experimentId") {
        return Err(StatusCode::BAD_REQUEST);
    }
    agency.list_calls.fetch_add(1, Ordering::SeqCst);

    Ok(Json(
        agency
            .batches
            .iter()
            .map(|batch| {
                json!({
                    "_id": batch["_id"],
                    "experimentId": batch["experimentId"],
                    "state": batch["state"],
                })
            })
            .collect(),
    ))
}

async fn batch_detail(
    State(agency): State<Arc<MockAgency>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    agency.detail_calls.fetch_add(1, Ordering::SeqCst);

    if agency.broken.contains(&id) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    agency
        .batches
        .iter()
        .find(|batch| batch["_id"] == id.as_str())
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Agency record of a batch that passed every milestone
pub fn succeeded_batch(id: &str, experiment_id: &str, start: f64) -> Value {
    json!({
        "_id": id,
        "experimentId": experiment_id,
        "state": "succeeded",
        "node": format!("node-{id}"),
        "mount": true,
        "command": ["python", "run.py"],
        "history": [
            {"state": "registered", "time": start},
            {"state": "scheduled", "time": start + 2.0},
            {"state": "processing", "time": start + 5.0},
            {"state": "succeeded", "time": start + 10.0},
        ],
    })
}
