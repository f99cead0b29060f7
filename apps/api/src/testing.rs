//! Test doubles shared by unit and router tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

struct MockState {
    starts: Vec<Value>,
    status_calls: Vec<String>,
    reject_starts: bool,
    status: Value,
}

/// Evaluation service stand-in served on an ephemeral local port.
pub struct MockEvaluator {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
}

impl MockEvaluator {
    pub async fn spawn() -> Self {
        let state = Arc::new(Mutex::new(MockState {
            starts: Vec::new(),
            status_calls: Vec::new(),
            reject_starts: false,
            status: json!({"status": "in-progress"}),
        }));

        let app = Router::new()
            .route("/", post(accept_start))
            .route("/status/:job_id", get(report_status))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn reject_starts(&self) {
        self.state.lock().unwrap().reject_starts = true;
    }

    pub fn set_status(&self, status: Value) {
        self.state.lock().unwrap().status = status;
    }

    /// Bodies received on the start endpoint, in arrival order.
    pub fn starts(&self) -> Vec<Value> {
        self.state.lock().unwrap().starts.clone()
    }

    /// Job ids queried on the status endpoint.
    pub fn status_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().status_calls.clone()
    }
}

async fn accept_start(
    State(state): State<Arc<Mutex<MockState>>>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if state.reject_starts {
        return (StatusCode::SERVICE_UNAVAILABLE, "evaluator overloaded").into_response();
    }
    state.starts.push(body);
    (StatusCode::ACCEPTED, Json(json!({"accepted": true}))).into_response()
}

async fn report_status(
    State(state): State<Arc<Mutex<MockState>>>,
    Path(job_id): Path<String>,
) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.status_calls.push(job_id);
    Json(state.status.clone())
}

/// A local URL with nothing listening on it.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
