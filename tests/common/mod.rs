//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Response, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use serde_json::Value;
use tokio::net::TcpListener;

use fdk_gateway::protocol::{Connection, Event, HeaderList};
use fdk_gateway::translate::{EventSink, EventSource, Handler, TranslateResult};

pub const JSON: &str = "application/json";

/// In-memory user store shared by both flavours of the demo application.
#[derive(Clone, Default)]
pub struct Users(Arc<Mutex<Vec<Value>>>);

impl Users {
    fn list(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }

    fn find(&self, username: &str) -> Option<Value> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .find(|user| user["username"] == username)
            .cloned()
    }

    fn add(&self, user: Value) {
        self.0.lock().unwrap().push(user);
    }
}

/// The demo application as an axum router.
pub fn users_app() -> Router {
    Router::new()
        .route("/", get(homepage))
        .route("/users", get(users_list))
        .route("/users/{username}", get(users_get).post(users_create))
        .with_state(Users::default())
}

async fn homepage() -> &'static str {
    "Hello, world!"
}

async fn users_list(State(users): State<Users>) -> Json<Vec<Value>> {
    Json(users.list())
}

async fn users_get(State(users): State<Users>, Path(username): Path<String>) -> impl IntoResponse {
    match users.find(&username) {
        Some(user) => Json(user).into_response(),
        None => (StatusCode::NOT_FOUND, "User not in database!").into_response(),
    }
}

async fn users_create(State(users): State<Users>, Json(payload): Json<Value>) -> impl IntoResponse {
    users.add(payload.clone());
    (StatusCode::CREATED, Json(payload))
}

/// The demo application on the event interface.
#[derive(Default)]
pub struct UsersHandler {
    users: Users,
    calls: AtomicUsize,
}

impl UsersHandler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self, method: &str, path: &str, body: &[u8]) -> (u16, &'static str, Bytes) {
        match (method, path) {
            ("GET", "/") => (200, "text/plain", Bytes::from("Hello, world!")),
            ("GET", "/users") => (200, JSON, to_json(&Value::from(self.users.list()))),
            (method, path) if path.starts_with("/users/") => {
                let username = &path["/users/".len()..];
                match method {
                    "GET" => match self.users.find(username) {
                        Some(user) => (200, JSON, to_json(&user)),
                        None => (404, "text/plain", Bytes::from("User not in database!")),
                    },
                    "POST" => match serde_json::from_slice::<Value>(body) {
                        Ok(user) => {
                            self.users.add(user.clone());
                            (201, JSON, to_json(&user))
                        }
                        Err(_) => (400, "text/plain", Bytes::from("Invalid JSON")),
                    },
                    _ => (405, "text/plain", Bytes::from("Method Not Allowed")),
                }
            }
            _ => (404, "text/plain", Bytes::from("Not Found")),
        }
    }
}

fn to_json(value: &Value) -> Bytes {
    Bytes::from(serde_json::to_vec(value).unwrap())
}

impl Handler for UsersHandler {
    async fn call<R, S>(
        &self,
        connection: Connection,
        source: &mut R,
        sink: &mut S,
    ) -> TranslateResult<()>
    where
        R: EventSource,
        S: EventSink,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut received = Vec::new();
        while let Some(chunk) = source.receive().await {
            received.extend_from_slice(&chunk.body);
            if !chunk.more_body {
                break;
            }
        }

        let (status, content_type, body) =
            self.respond(&connection.method, &connection.path, &received);

        let mut headers = HeaderList::new();
        headers.push("content-type", content_type);
        headers.push("content-length", body.len().to_string());
        sink.send(Event::start(status, headers)).await?;
        sink.send(Event::body(body, false)).await
    }
}

/// Serve `app` on an ephemeral local port.
pub async fn start_upstream(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub async fn read_body(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}
