#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use danci_study_client::model::UserIdentity;
use danci_study_client::{ClientStore, HttpGateway};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct Script {
    queued: HashMap<String, VecDeque<(u16, Value)>>,
    recorded: Vec<Recorded>,
}

/// In-process stand-in for the study backend. Responses are scripted per
/// `METHOD /path`; unscripted routes answer 404 like FastAPI does.
pub struct FakeBackend {
    pub base_url: String,
    script: Arc<Mutex<Script>>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let script = Arc::new(Mutex::new(Script::default()));
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&script));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            script,
        }
    }

    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.script
            .lock()
            .queued
            .entry(route_key(method, path))
            .or_default()
            .push_back((status, body));
    }

    pub fn requests(&self, path: &str) -> Vec<Recorded> {
        self.script
            .lock()
            .recorded
            .iter()
            .filter(|request| request.path == path)
            .cloned()
            .collect()
    }

    pub fn gateway(&self, store: ClientStore) -> HttpGateway {
        HttpGateway::with_base_url(&self.base_url, Duration::from_secs(5), store)
    }
}

pub fn signed_in_store() -> ClientStore {
    let store = ClientStore::in_memory();
    store
        .set_user(&UserIdentity {
            id: 7,
            username: "ayse".into(),
            account_type: Some("student".into()),
        })
        .unwrap();
    store.set_token("t-1").unwrap();
    store.set_course_id(2).unwrap();
    store
}

pub fn word_items(ids: &[i64]) -> Value {
    let items: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "word_id": id,
                "english": format!("word-{id}"),
                "turkish": format!("kelime-{id}"),
                "audio_en_url": format!("/assets/audio/{id}.mp3"),
                "type": "NEW"
            })
        })
        .collect();
    json!({ "items": items, "current_step": 1 })
}

fn route_key(method: &str, path: &str) -> String {
    format!("{} {}", method.to_ascii_uppercase(), path)
}

async fn handle(
    State(script): State<Arc<Mutex<Script>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    let mut script = script.lock();
    script.recorded.push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });

    let next = script
        .queued
        .get_mut(&route_key(method.as_str(), uri.path()))
        .and_then(VecDeque::pop_front);

    match next {
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        ),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" }))),
    }
}
