//! End-to-end tests: Fn call → gateway → upstream application.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{routing::get, Router};
use serde_json::{json, Value};

use fdk_gateway::config::FdkConfig;
use fdk_gateway::net::ListenAddress;
use fdk_gateway::{GatewayServer, Shutdown};

mod common;

use common::{start_upstream, unused_addr, users_app, JSON};

/// Start a gateway on an ephemeral TCP port in front of `upstream`.
async fn start_gateway(
    upstream: SocketAddr,
    root_path: &str,
    timeout_secs: u64,
) -> (SocketAddr, Shutdown) {
    let mut config = FdkConfig::default();
    config.listener.address = "127.0.0.1:0".into();
    config.translator.root_path = root_path.into();
    config.upstream.url = format!("http://{upstream}");
    config.upstream.timeout_secs = timeout_secs;

    let address: ListenAddress = config.listener.address.parse().unwrap();
    let listener = address.bind(&config.listener).await.unwrap();
    let addr = listener.tcp_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config);
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, signal).await.unwrap();
    });

    (addr, shutdown)
}

fn fn_call(
    client: &reqwest::Client,
    gateway: SocketAddr,
    method: &str,
    url: &str,
) -> reqwest::RequestBuilder {
    client
        .post(format!("http://{gateway}/call"))
        .header("fn-http-request-url", url)
        .header("fn-http-method", method)
}

#[tokio::test]
async fn test_users_through_gateway() {
    let upstream = start_upstream(users_app()).await;
    let (gateway, shutdown) = start_gateway(upstream, "", 5).await;
    let client = reqwest::Client::new();

    let response = fn_call(&client, gateway, "POST", "https://foo.bar/users/foo")
        .header("content-type", JSON)
        .body(r#"{"username":"foo"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["fn-http-status"], "201");
    assert_eq!(response.headers()["content-type"], JSON);
    assert_eq!(response.headers()["fn-http-h-content-length"], "18");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "username": "foo" }));

    let response = fn_call(&client, gateway, "GET", "https://foo.bar/users")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!([{ "username": "foo" }]));

    let response = fn_call(&client, gateway, "GET", "/users/nobody")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["fn-http-status"], "404");
    assert_eq!(response.text().await.unwrap(), "User not in database!");

    shutdown.trigger();
}

#[tokio::test]
async fn test_illegal_calls_answered_by_gateway() {
    let (gateway, shutdown) = start_gateway(unused_addr().await, "", 5).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{gateway}/call"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 405);
    assert_eq!(response.text().await.unwrap(), "Method not allowed!");

    let response = client
        .post(format!("http://{gateway}/call/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .post(format!("http://{gateway}/call"))
        .header("fn-http-request-url", "/")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(response.text().await.unwrap(), "Could not determine request method!");

    shutdown.trigger();
}

#[tokio::test]
async fn test_root_path_forwarded_as_prefix() {
    let app = Router::new().route(
        "/where",
        get(|headers: axum::http::HeaderMap| async move {
            format!(
                "{}|{}",
                headers["x-forwarded-prefix"].to_str().unwrap(),
                headers["x-forwarded-host"].to_str().unwrap()
            )
        }),
    );
    let upstream = start_upstream(app).await;
    let (gateway, shutdown) = start_gateway(upstream, "/api", 5).await;

    let response = fn_call(&reqwest::Client::new(), gateway, "GET", "https://foo.bar/api/where")
        .header("fn-http-h-host", "foo.bar")
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()["fn-http-status"], "200");
    assert_eq!(response.text().await.unwrap(), "/api|foo.bar");

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_down_is_502() {
    let (gateway, shutdown) = start_gateway(unused_addr().await, "", 5).await;

    let response = fn_call(&reqwest::Client::new(), gateway, "GET", "/")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    assert_eq!(response.headers()["fn-http-status"], "502");
    assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_timeout_is_504() {
    let app = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }),
    );
    let upstream = start_upstream(app).await;
    let (gateway, shutdown) = start_gateway(upstream, "", 1).await;

    let response = fn_call(&reqwest::Client::new(), gateway, "GET", "/slow")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 504);
    assert_eq!(response.headers()["fn-http-status"], "504");

    shutdown.trigger();
}

#[cfg(unix)]
#[tokio::test]
async fn test_unix_socket_listener() {
    use axum::body::Body;
    use axum::http::Request;
    use hyper_util::rt::TokioIo;
    use tokio::net::UnixStream;

    let upstream = start_upstream(users_app()).await;
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("fdk.sock");

    let mut config = FdkConfig::default();
    config.listener.address = format!("unix:{}", socket.display());
    config.upstream.url = format!("http://{upstream}");

    let address: ListenAddress = config.listener.address.parse().unwrap();
    let listener = address.bind(&config.listener).await.unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let server = tokio::spawn(GatewayServer::new(config).run(listener, signal));

    let stream = UnixStream::connect(&socket).await.unwrap();
    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(connection);

    let request = Request::post("/call")
        .header("host", "localhost")
        .header("fn-http-request-url", "/")
        .header("fn-http-method", "GET")
        .body(Body::empty())
        .unwrap();
    let response = sender.send_request(request).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["fn-http-status"], "200");
    let body = axum::body::to_bytes(Body::new(response.into_body()), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body, "Hello, world!");

    drop(sender);
    shutdown.trigger();
    server.await.unwrap().unwrap();
    assert!(!socket.exists());
}
