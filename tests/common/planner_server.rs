use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::Value;

#[derive(Clone)]
struct PlannerState {
    status: StatusCode,
    body: String,
    received: Arc<Mutex<Vec<Value>>>,
}

/// Local stand-in for the remote planner: answers every `POST /plan` with a
/// fixed status and body and keeps the request bodies it saw.
pub struct FakePlanner {
    pub base_url: String,
    received: Arc<Mutex<Vec<Value>>>,
}

impl FakePlanner {
    pub async fn start(status: u16, body: &str) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = PlannerState {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
            received: received.clone(),
        };

        let app = Router::new().route("/plan", post(plan)).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/", addr),
            received,
        }
    }

    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }
}

async fn plan(State(state): State<PlannerState>, Json(body): Json<Value>) -> (StatusCode, String) {
    state.received.lock().unwrap().push(body);
    (state.status, state.body.clone())
}
