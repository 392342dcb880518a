use axum::Router;
use axum::body::Bytes;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use endpoint_dispatch::{
    Client, DispatchError, DispatcherConfig, Method, RequestDispatcher, RequestParams,
    RestErrorKind,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

#[derive(Debug, Deserialize)]
struct Model {
    id: u64,
    name: String,
}

#[derive(Serialize)]
struct EchoPayload<'a> {
    id: u64,
    content_type: &'a str,
    body: String,
}

#[derive(Debug, Deserialize)]
struct Echo {
    id: u64,
    content_type: String,
    body: String,
}

#[tokio::test]
async fn e2e_get_model_roundtrip() {
    let server = TestServer::start().await;
    let dispatcher = server.dispatcher();

    let model: Model = dispatcher
        .get("getModel", RequestParams::new().with_param("id", 42))
        .await
        .expect("model response should decode");

    assert_eq!(model.id, 42);
    assert_eq!(model.name, "model-42");
}

#[tokio::test]
async fn e2e_post_sends_json_payload_and_content_type() {
    let server = TestServer::start().await;
    let dispatcher = server.dispatcher();

    let echo: Echo = dispatcher
        .dispatch(
            "getModel",
            RequestParams::new()
                .with_param("id", 7)
                .with_json_body(&sonic_rs::json!({"x": 1}))
                .expect("payload serializes"),
            Method::POST,
        )
        .await
        .expect("echo response should decode");

    assert_eq!(echo.id, 7);
    assert_eq!(echo.content_type, "application/json");
    assert_eq!(echo.body, r#"{"x":1}"#);
}

#[tokio::test]
async fn e2e_missing_model_is_rejected() {
    let server = TestServer::start().await;
    let dispatcher = server.dispatcher();

    let err = dispatcher
        .get::<Model>("getModel", RequestParams::new().with_param("id", 404))
        .await
        .expect_err("404 should fail");

    let err = match err {
        DispatchError::Transport(err) => err,
        other => panic!("expected transport error, got {other}"),
    };
    assert_eq!(err.kind(), RestErrorKind::Rejected);
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn e2e_connection_refused_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind unused-port listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let dispatcher = RequestDispatcher::new(
        DispatcherConfig::new(format!("http://{addr}")).with_endpoint("getModel", "/user/{id}"),
        Client::new(),
    )
    .expect("config is valid");

    let err = dispatcher
        .get::<Model>("getModel", RequestParams::new().with_param("id", 1))
        .await
        .expect_err("nothing is listening");
    let transport = err.transport().expect("transport error");
    assert!(matches!(
        transport.kind(),
        RestErrorKind::Connect | RestErrorKind::Send
    ));
}

struct TestServer {
    base_url: String,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let app = Router::new().route("/user/{id}", get(model_handler).post(echo_handler));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { base_url, task }
    }

    fn dispatcher(&self) -> RequestDispatcher {
        RequestDispatcher::new(
            DispatcherConfig::new(self.base_url.clone()).with_endpoint("getModel", "/user/{id}"),
            Client::new(),
        )
        .expect("test server config is valid")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn model_handler(Path(id): Path<u64>) -> (StatusCode, String) {
    if id == 404 {
        return (StatusCode::NOT_FOUND, "no such model".to_string());
    }
    (StatusCode::OK, format!(r#"{{"id":{id},"name":"model-{id}"}}"#))
}

async fn echo_handler(
    Path(id): Path<u64>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let content_type = headers
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let payload = EchoPayload {
        id,
        content_type,
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    let payload = sonic_rs::to_string(&payload).unwrap_or_default();
    (StatusCode::OK, payload)
}
