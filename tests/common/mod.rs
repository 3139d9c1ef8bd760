#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use http_body_util::BodyExt;
use prep_proxy::{GenerationSettings, KeyPlacement};
use serde_json::{json, Value};

pub const TEST_KEY: &str = "test-key-123";

#[derive(Clone, Debug)]
pub enum Reply {
    Json(StatusCode, Value),
    Raw(StatusCode, &'static str),
    Stall(Duration),
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Json(
            StatusCode::OK,
            json!({ "candidates": [ { "content": { "parts": [ { "text": text } ] } } ] }),
        )
    }
}

#[derive(Clone, Debug)]
pub struct Seen {
    pub query_key: Option<String>,
    pub header_key: Option<String>,
    pub body: Value,
}

impl Seen {
    pub fn prompt(&self) -> &str {
        self.body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
    }
}

/// Scripted stand-in for the generation backend. Replies are consumed in
/// order; the last one repeats once the script runs out.
#[derive(Clone, Default)]
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<Reply>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockProvider {
    pub fn hits(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Reply {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap_or_else(|| Reply::text(""))
        }
    }
}

async fn generate_content(
    State(mock): State<MockProvider>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.seen.lock().unwrap().push(Seen {
        query_key: query.get("key").cloned(),
        header_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    match mock.next_reply() {
        Reply::Json(status, value) => (status, Json(value)).into_response(),
        Reply::Raw(status, text) => (status, text).into_response(),
        Reply::Stall(delay) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, Json(json!({}))).into_response()
        }
    }
}

/// Binds the mock on an ephemeral port and returns it with its endpoint URL.
pub async fn spawn_provider(replies: Vec<Reply>) -> (MockProvider, String) {
    let mock = MockProvider {
        script: Arc::new(Mutex::new(replies.into())),
        seen: Arc::default(),
    };
    let app = Router::new()
        .route("/v1beta/models/test:generateContent", post(generate_content))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (mock, format!("http://{addr}/v1beta/models/test:generateContent"))
}

pub fn settings(endpoint: &str) -> GenerationSettings {
    GenerationSettings {
        endpoint: endpoint.to_string(),
        api_key: Some(TEST_KEY.to_string()),
        key_placement: KeyPlacement::Query,
        timeout: Duration::from_secs(5),
        max_retries: 0,
        retry_base: Duration::from_millis(1),
    }
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn backend_developer() -> Value {
    json!({
        "userGoal": "Backend Developer",
        "timeAvailable": 8,
        "skillLevel": "beginner",
        "isBeginner": true
    })
}

pub async fn read_body(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn read_json(response: Response) -> (StatusCode, Value) {
    let (status, text) = read_body(response).await;
    (status, serde_json::from_str(&text).unwrap())
}
