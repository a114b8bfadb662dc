//! End-to-end tests against an in-process mock server.
//!
//! The server binds 127.0.0.1 on a random port; every test gets its own
//! server and its own transport so cookie state never leaks between tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use freeman_engine::{
    BodyDescriptor, EngineConfig, Executor, ExtractRule, MultipartPart, NetworkActor,
    NetworkCommand, NetworkResponse, RequestDefinition, RequestSpec, TransportClient,
    TransportConfig,
};

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let all = |name| {
        headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap_or_default().to_string())
            .collect::<Vec<_>>()
    };
    Json(json!({
        "method": method.as_str(),
        "content_type": all(CONTENT_TYPE),
        "cookie": all(COOKIE),
        "body": String::from_utf8_lossy(&body),
    }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "nothing here")
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "finally"
}

async fn login() -> impl IntoResponse {
    ([(SET_COOKIE, "session=abc; Path=/")], Json(json!({"data": {"token": "t-42"}})))
}

async fn multi() -> impl IntoResponse {
    (
        AppendHeaders([("x-multi", "one"), ("x-multi", "two")]),
        "multi",
    )
}

async fn binary() -> Vec<u8> {
    vec![b'h', b'i', 0xFF, 0xFE]
}

fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/missing", get(not_found))
        .route("/slow", get(slow))
        .route("/login", get(login))
        .route("/multi", get(multi))
        .route("/binary", get(binary))
        .route("/redirect", get(|| async { Redirect::to("/final") }))
        .route("/final", get(|| async { "done" }))
}

async fn spawn_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app()).await.unwrap();
    });
    addr
}

fn executor() -> Executor {
    let transport =
        TransportClient::new(&TransportConfig::from(&EngineConfig::default())).unwrap();
    Executor::new(Arc::new(transport), Handle::current())
}

fn body_json(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn remote_404_is_not_a_local_failure() {
    let addr = spawn_server().await;
    let result = executor()
        .execute_async(RequestSpec::new("GET", format!("http://{addr}/missing")))
        .await;

    assert_eq!(result.status_code, 404);
    assert_eq!(result.text_body, "nothing here");
    assert_eq!(result.raw_body, b"nothing here".to_vec());
}

#[tokio::test]
async fn url_without_scheme_gets_http() {
    let addr = spawn_server().await;
    let result = executor()
        .execute_async(RequestSpec::new("GET", format!("{addr}/missing")))
        .await;
    assert_eq!(result.status_code, 404);
}

#[tokio::test]
async fn post_raw_json_gets_default_content_type() {
    let addr = spawn_server().await;
    let spec = RequestSpec::new("POST", format!("http://{addr}/echo"))
        .body(BodyDescriptor::raw(r#"{"a":1}"#));
    let result = executor().execute_async(spec).await;

    assert_eq!(result.status_code, 200);
    let echoed = body_json(&result.text_body);
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["content_type"], json!(["application/json"]));
    assert_eq!(echoed["body"], r#"{"a":1}"#);
}

#[tokio::test]
async fn get_sends_no_body() {
    let addr = spawn_server().await;
    let spec = RequestSpec::new("GET", format!("http://{addr}/echo"))
        .body(BodyDescriptor::raw("ignored"));
    let echoed = body_json(&executor().execute_async(spec).await.text_body);
    assert_eq!(echoed["method"], "GET");
    assert_eq!(echoed["body"], "");
}

#[tokio::test]
async fn custom_verb_carries_body() {
    let addr = spawn_server().await;
    let spec = RequestSpec::new("purge", format!("http://{addr}/echo"))
        .header("Content-Type", "text/plain")
        .body(BodyDescriptor::raw("cache-key"));
    let echoed = body_json(&executor().execute_async(spec).await.text_body);
    assert_eq!(echoed["method"], "PURGE");
    assert_eq!(echoed["content_type"], json!(["text/plain"]));
    assert_eq!(echoed["body"], "cache-key");
}

#[tokio::test]
async fn multipart_replaces_caller_content_type() {
    let addr = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, "file body").unwrap();

    let spec = RequestSpec::new("POST", format!("http://{addr}/echo"))
        .header("Content-Type", "application/json")
        .body(BodyDescriptor::multipart(vec![
            MultipartPart::text("field", "v"),
            MultipartPart::file("upload", &file),
        ]));
    let result = executor().execute_async(spec).await;
    let echoed = body_json(&result.text_body);

    let content_types = echoed["content_type"].as_array().unwrap();
    assert_eq!(content_types.len(), 1);
    let content_type = content_types[0].as_str().unwrap();
    let boundary = content_type
        .strip_prefix("multipart/form-data; boundary=")
        .unwrap();

    let body = echoed["body"].as_str().unwrap();
    assert!(body.starts_with(&format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"field\"\r\n\r\nv\r\n"
    )));
    assert!(body.contains(
        "Content-Disposition: form-data; name=\"upload\"; filename=\"notes.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nfile body\r\n"
    ));
    assert!(body.ends_with(&format!("--{boundary}--\r\n")));
}

#[tokio::test]
async fn unreadable_multipart_file_is_build_error() {
    let addr = spawn_server().await;
    let spec = RequestSpec::new("POST", format!("http://{addr}/echo")).body(
        BodyDescriptor::multipart(vec![MultipartPart::file("f", "/no/such/file.bin")]),
    );
    let result = executor().execute_async(spec).await;
    assert_eq!(result.status_code, 0);
    assert!(result.text_body.starts_with("Build Error: "));
}

#[tokio::test]
async fn deadline_resolves_slow_request() {
    let addr = spawn_server().await;
    let spec = RequestSpec::new("GET", format!("http://{addr}/slow")).timeout(1);

    let started = Instant::now();
    let result = executor().execute_async(spec).await;
    let elapsed = started.elapsed();

    assert_eq!(result.status_code, 0);
    assert!(result.text_body.contains("timed out"), "{}", result.text_body);
    assert!(elapsed >= Duration::from_millis(900), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "{elapsed:?}");
    assert!(result.duration_ms >= 900);
}

#[tokio::test]
async fn cookies_replayed_until_cleared() {
    let addr = spawn_server().await;
    let executor = executor();

    let login = executor
        .execute_async(RequestSpec::new("GET", format!("http://{addr}/login")))
        .await;
    assert_eq!(login.header_values("set-cookie"), vec!["session=abc; Path=/"]);

    let echo = || RequestSpec::new("GET", format!("http://{addr}/echo"));
    let echoed = body_json(&executor.execute_async(echo()).await.text_body);
    assert_eq!(echoed["cookie"], json!(["session=abc"]));

    executor.transport().clear_cookies();
    let echoed = body_json(&executor.execute_async(echo()).await.text_body);
    assert_eq!(echoed["cookie"], json!([]));
}

#[tokio::test]
async fn redirects_are_followed() {
    let addr = spawn_server().await;
    let result = executor()
        .execute_async(RequestSpec::new("GET", format!("http://{addr}/redirect")))
        .await;
    assert_eq!(result.status_code, 200);
    assert_eq!(result.text_body, "done");
}

#[tokio::test]
async fn binary_body_decoded_lossily() {
    let addr = spawn_server().await;
    let result = executor()
        .execute_async(RequestSpec::new("GET", format!("http://{addr}/binary")))
        .await;
    assert_eq!(result.status_code, 200);
    assert_eq!(result.raw_body, vec![b'h', b'i', 0xFF, 0xFE]);
    assert_eq!(result.text_body, "hi\u{FFFD}\u{FFFD}");
}

#[tokio::test]
async fn multi_valued_headers_preserved() {
    let addr = spawn_server().await;
    let result = executor()
        .execute_async(RequestSpec::new("GET", format!("http://{addr}/multi")))
        .await;
    assert_eq!(result.headers["x-multi"], vec!["one", "two"]);
}

#[tokio::test]
async fn concurrent_requests_share_transport() {
    let addr = spawn_server().await;
    let executor = executor();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let spec = RequestSpec::new("POST", format!("http://{addr}/echo"))
                .body(BodyDescriptor::raw(format!("{{\"n\":{i}}}")));
            executor.execute_async(spec)
        })
        .collect();
    let results = futures_util::future::join_all(handles).await;

    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.status_code, 200);
        assert_eq!(body_json(&result.text_body)["body"], format!("{{\"n\":{i}}}"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_execute_off_runtime_thread() {
    let addr = spawn_server().await;
    let executor = executor();

    let result = tokio::task::spawn_blocking(move || {
        executor.execute(RequestSpec::new("GET", format!("http://{addr}/missing")))
    })
    .await
    .unwrap();
    assert_eq!(result.status_code, 404);
}

#[tokio::test]
async fn actor_runs_definitions_and_extracts() {
    let addr = spawn_server().await;
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
    tokio::spawn(NetworkActor::new(executor(), resp_tx).run(cmd_rx));

    let mut request = RequestDefinition::new("GET", format!("http://{addr}/login"));
    request.extract_rules = vec![ExtractRule::new("token", "data.token")];
    cmd_tx
        .send(NetworkCommand::ExecuteRequest { id: 3, request })
        .unwrap();

    match resp_rx.recv().await.unwrap() {
        NetworkResponse::Completed {
            id,
            response,
            extracted,
        } => {
            assert_eq!(id, 3);
            assert_eq!(response.status_code, 200);
            assert_eq!(extracted["token"], "t-42");
            // pretty-printed for display
            assert!(response.text_body.contains("\n  \"data\""));
        }
        other => panic!("unexpected {other:?}"),
    }

    cmd_tx.send(NetworkCommand::ClearCookies).unwrap();
    cmd_tx
        .send(NetworkCommand::ExecuteSpec {
            id: 4,
            spec: RequestSpec::new("GET", format!("http://{addr}/echo")),
        })
        .unwrap();
    match resp_rx.recv().await.unwrap() {
        NetworkResponse::Completed { response, .. } => {
            assert_eq!(body_json(&response.text_body)["cookie"], json!([]));
        }
        other => panic!("unexpected {other:?}"),
    }
}
