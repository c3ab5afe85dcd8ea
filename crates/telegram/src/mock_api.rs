//! Minimal Telegram Bot API stand-in for tests, served by axum.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::State,
        http::{StatusCode, Uri},
        routing::post,
    },
    serde_json::{Value, json},
    tokio::{sync::oneshot, task::JoinHandle},
};

pub const MESSAGE_NOT_MODIFIED: &str = "Bad Request: message is not modified: specified new message content and reply markup are exactly the same as a current content and reply markup of the message";

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Clone, Default)]
struct ApiState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    overrides: Arc<Mutex<VecDeque<(String, StatusCode, Value)>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    next_message_id: Arc<Mutex<i64>>,
}

pub struct MockTelegramApi {
    addr: SocketAddr,
    state: ApiState,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

pub fn api_error(code: u16, description: &str) -> (StatusCode, Value) {
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST),
        json!({ "ok": false, "error_code": code, "description": description }),
    )
}

pub fn retry_after(secs: u32) -> (StatusCode, Value) {
    (
        StatusCode::TOO_MANY_REQUESTS,
        json!({
            "ok": false,
            "error_code": 429,
            "description": format!("Too Many Requests: retry after {secs}"),
            "parameters": { "retry_after": secs }
        }),
    )
}

fn message_result(message_id: i64, chat_id: i64) -> Value {
    json!({
        "ok": true,
        "result": {
            "message_id": message_id,
            "date": 0,
            "chat": { "id": chat_id, "type": "private", "first_name": "Test" },
            "text": "ok"
        }
    })
}

async fn handler(
    State(state): State<ApiState>,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let method = uri.path().rsplit('/').next().unwrap_or_default().to_string();
    let body = String::from_utf8_lossy(&body).into_owned();
    state.requests.lock().unwrap().push(CapturedRequest {
        method: method.clone(),
        body: body.clone(),
    });

    let delay = state.delays.lock().unwrap().get(&method).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    {
        let mut overrides = state.overrides.lock().unwrap();
        if overrides.front().is_some_and(|(m, _, _)| *m == method)
            && let Some((_, status, value)) = overrides.pop_front()
        {
            return (status, Json(value));
        }
    }

    let chat_id = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["chat_id"].as_i64())
        .unwrap_or(42);

    match method.as_str() {
        "SendMessage" | "SendVideo" => {
            let id = {
                let mut next = state.next_message_id.lock().unwrap();
                *next += 1;
                *next
            };
            (StatusCode::OK, Json(message_result(id, chat_id)))
        },
        "EditMessageText" => {
            let id = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["message_id"].as_i64())
                .unwrap_or(1);
            (StatusCode::OK, Json(message_result(id, chat_id)))
        },
        "GetMe" => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "result": {
                    "id": 1,
                    "is_bot": true,
                    "first_name": "Reel",
                    "username": "reel_bot",
                    "can_join_groups": true,
                    "can_read_all_group_messages": false,
                    "supports_inline_queries": false,
                    "can_connect_to_business": false,
                    "has_main_web_app": false
                }
            })),
        ),
        "GetUpdates" => (StatusCode::OK, Json(json!({ "ok": true, "result": [] }))),
        _ => (StatusCode::OK, Json(json!({ "ok": true, "result": true }))),
    }
}

impl MockTelegramApi {
    pub async fn start() -> Self {
        let state = ApiState::default();
        let app = Router::new()
            .route("/{*path}", post(handler))
            .layer(axum::extract::DefaultBodyLimit::disable())
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
            server: Some(server),
        }
    }

    pub fn api_url(&self) -> reqwest::Url {
        reqwest::Url::parse(&format!("http://{}/", self.addr)).expect("parse api url")
    }

    pub fn bot(&self) -> teloxide::Bot {
        teloxide::Bot::new("test-token").set_api_url(self.api_url())
    }

    /// Hold every response to `method` for `delay`.
    pub fn delay(&self, method: &str, delay: Duration) {
        self.state
            .delays
            .lock()
            .unwrap()
            .insert(method.to_string(), delay);
    }

    /// Answer the next call to `method` with `response` instead of success.
    pub fn respond_once(&self, method: &str, response: (StatusCode, Value)) {
        let (status, value) = response;
        self.state
            .overrides
            .lock()
            .unwrap()
            .push_back((method.to_string(), status, value));
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.method).collect()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(server) = self.server.take() {
            server.await.expect("server join");
        }
    }
}
