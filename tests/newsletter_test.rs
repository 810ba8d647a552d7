use axum::{
    Json, Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use newsletter::handler::AppState;
use newsletter::pocket::PocketClient;
use newsletter::routes::routes;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn retrieve(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let expected = json!({
        "consumer_key": "ABC",
        "access_token": "XYZ",
        "tag": "newsletter",
        "state": "all",
        "detailType": "complete"
    });
    if headers.get("x-accept").map(|v| v.as_bytes()) != Some(b"application/json".as_slice())
        || body != expected
    {
        return (StatusCode::BAD_REQUEST, [("X-Error", "unexpected request")]).into_response();
    }

    Json(json!({
        "status": 1,
        "list": {
            "1700000001": {
                "item_id": "1",
                "given_title": "T1",
                "resolved_title": "Resolved T1",
                "given_url": "",
                "resolved_url": "http://x",
                "excerpt": "e1",
                "authors": {"1": {"name": "Alice"}, "2": {"name": ""}}
            }
        }
    }))
    .into_response()
}

async fn unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, [("X-Error", "maintenance")]).into_response()
}

async fn garbage() -> &'static str {
    "<html>not json</html>"
}

/// Starts a local stand-in for the Pocket API and returns its base URL.
async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/v3/get", post(retrieve))
        .route("/unavailable", post(unavailable))
        .route("/garbage", post(garbage));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn app(endpoint: String) -> Router {
    routes().with_state(AppState::new(PocketClient::new(endpoint)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let resp = app.oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn json_post(uri: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"pocket_consumer_key":"ABC","pocket_access_token":"XYZ"}"#,
        ))
        .unwrap()
}

fn expected_bookmarks() -> Value {
    json!([{
        "item_id": "1",
        "title": "T1",
        "url": "http://x",
        "excerpt": "e1",
        "authors": "Alice"
    }])
}

#[tokio::test]
async fn test_json_request_returns_flattened_bookmarks() {
    let base = spawn_upstream().await;
    let (status, body) = send(app(format!("{}/v3/get", base)), json_post("/newsletter")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), expected_bookmarks());
}

#[tokio::test]
async fn test_form_request_returns_flattened_bookmarks() {
    let base = spawn_upstream().await;
    let request = Request::post("/newsletter")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("pocket_consumer_key=ABC&pocket_access_token=XYZ"))
        .unwrap();
    let (status, body) = send(app(format!("{}/v3/get", base)), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), expected_bookmarks());
}

#[tokio::test]
async fn test_wrong_method_is_not_found() {
    let request = Request::get("/newsletter").body(Body::empty()).unwrap();
    let (status, body) = send(app("http://127.0.0.1:1".to_owned()), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not Found");
}

#[tokio::test]
async fn test_missing_body_is_bad_request() {
    let request = Request::post("/newsletter").body(Body::empty()).unwrap();
    let (status, body) = send(app("http://127.0.0.1:1".to_owned()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad Request");
}

#[tokio::test]
async fn test_invoke_takes_host_event() {
    let base = spawn_upstream().await;
    let event = json!({
        "httpMethod": "POST",
        "isBase64Encoded": true,
        "body": STANDARD.encode("pocket_consumer_key=ABC&pocket_access_token=XYZ")
    });
    let request = Request::post("/invoke")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(event.to_string()))
        .unwrap();
    let (status, body) = send(app(format!("{}/v3/get", base)), request).await;

    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["statusCode"], 200);
    let bookmarks: Value = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
    assert_eq!(bookmarks, expected_bookmarks());
}

#[tokio::test]
async fn test_upstream_status_is_propagated() {
    let base = spawn_upstream().await;
    let (status, body) = send(app(format!("{}/unavailable", base)), json_post("/newsletter")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "Error while connecting to Pocket API: Service Unavailable");
}

#[tokio::test]
async fn test_rejected_request_shape_surfaces_as_bad_request() {
    let base = spawn_upstream().await;
    let request = Request::post("/newsletter")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"pocket_consumer_key":"WRONG","pocket_access_token":"XYZ"}"#,
        ))
        .unwrap();
    let (status, body) = send(app(format!("{}/v3/get", base)), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Error while connecting to Pocket API: Bad Request");
}

#[tokio::test]
async fn test_malformed_upstream_body_is_500() {
    let base = spawn_upstream().await;
    let (status, body) = send(app(format!("{}/garbage", base)), json_post("/newsletter")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.is_empty());
}

#[tokio::test]
async fn test_transport_failure_is_500_with_message() {
    // bind then drop so the port is very likely closed
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (status, body) = send(app(format!("http://{}/v3/get", addr)), json_post("/newsletter")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("error sending request"), "body: {}", body);
}

#[tokio::test]
async fn test_healthcheck() {
    let request = Request::get("/").body(Body::empty()).unwrap();
    let (status, body) = send(app("http://127.0.0.1:1".to_owned()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"status": "ok"}));
}
