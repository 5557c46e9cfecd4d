mod support;

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use mailshot::api::ImageProxy;
use serde_json::{json, Value};
use support::{service, ScriptedMailer};
use tokio::net::TcpListener;
use tower::ServiceExt;

fn app() -> Router {
    mailshot::api::router(service(&ScriptedMailer::new()))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn bulk_body(job_id: &str) -> Value {
    json!({
        "jobId": job_id,
        "contacts": [
            { "email": "ada@example.com", "firstName": "Ada" },
            { "email": "bob@example.com" }
        ],
        "subject": "Spring sale",
        "html": "<p>Hi {{firstName}}</p>",
        "batchSize": 1,
        "delayBetweenBatches": 100
    })
}

#[tokio::test]
async fn send_email_returns_message_id() {
    let app = app();
    let (status, body) = call(
        &app,
        "POST",
        "/api/send-email",
        Some(json!({ "to": "ada@example.com", "subject": "Hi", "html": "<p>Hi</p>" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["messageId"].is_string());
    assert_eq!(body["fromAddress"], "\"Acme\" <news@acme.test>");
}

#[tokio::test]
async fn send_email_rejects_bad_recipient() {
    let app = app();
    let (status, body) = call(
        &app,
        "POST",
        "/api/send-email",
        Some(json!({ "to": "not-an-address", "subject": "Hi", "html": "<p>Hi</p>" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "message": "\"to\" must be a valid email" }));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app();
    let (status, body) = call(&app, "POST", "/api/send-campaign", Some(json!({ "subject": 1 }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn bulk_campaign_rejects_oversized_batches() {
    let app = app();
    let mut req = bulk_body("too-big");
    req["batchSize"] = json!(60);

    let (status, body) = call(&app, "POST", "/api/send-bulk-campaign", Some(req)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "\"batchSize\" must be between 1 and 50");
    let (_, jobs) = call(&app, "GET", "/api/jobs", None).await;
    assert_eq!(jobs["jobs"], json!([]));
}

#[tokio::test(start_paused = true)]
async fn bulk_campaign_runs_and_is_queryable() {
    let app = app();
    let (status, body) = call(&app, "POST", "/api/send-bulk-campaign", Some(bulk_body("spring"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobId"], "spring");
    assert_eq!(body["results"]["successful"], 2);
    assert_eq!(body["results"]["status"], "completed");

    let (status, body) = call(&app, "GET", "/api/job-status/spring", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["status"], "completed");
    assert_eq!(body["job"]["totalBatches"], 2);
    assert_eq!(body["job"]["successfulEmails"].as_array().map(Vec::len), Some(2));

    let (status, body) = call(&app, "POST", "/api/send-bulk-campaign", Some(bulk_body("spring"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (_, body) = call(&app, "GET", "/api/jobs", None).await;
    assert_eq!(body["jobs"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let app = app();

    let (status, body) = call(&app, "GET", "/api/job-status/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "message": "Job not found" }));

    let (status, _) = call(&app, "POST", "/api/stop-job/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn control_of_finished_job_conflicts() {
    let app = app();
    let mut req = bulk_body("short");
    req["contacts"] = json!([{ "email": "ada@example.com" }]);
    let (status, _) = call(&app, "POST", "/api/send-bulk-campaign", Some(req)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, "POST", "/api/pause-job/short", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "job short cannot go from completed to paused");
}

#[tokio::test]
async fn test_connection_reflects_transport() {
    let (status, body) = call(&app(), "GET", "/api/test-connection", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rateLimit"], "14 emails/second");

    let down = mailshot::api::router(service(&ScriptedMailer::unreachable()));
    let (status, body) = call(&down, "GET", "/api/test-connection", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn health_reports_configuration() {
    let (status, body) = call(&app(), "GET", "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["totalJobs"], 0);
    assert_eq!(body["config"]["emailDelay"], "0ms");
    assert_eq!(body["config"]["maxRetries"], 3);
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (status, body) = call(&app(), "DELETE", "/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Route not found");
    assert_eq!(body["path"], "/nope");
    assert_eq!(body["method"], "DELETE");
}

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

/// A local image host: `/logo.png`, `/page` (HTML), `/missing` (404) and
/// `/slow` (answers after five seconds).
async fn image_host() -> SocketAddr {
    let app = Router::new()
        .route("/logo.png", get(|| async { ([(header::CONTENT_TYPE, "image/png")], PNG) }))
        .route("/page", get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html></html>") }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                ([(header::CONTENT_TYPE, "image/png")], PNG)
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    addr
}

fn proxied_app() -> Router {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let proxy = ImageProxy::new(["127.0.0.1"])
        .with_client(client)
        .with_timeout(Duration::from_millis(200));
    mailshot::api::router_with_proxy(service(&ScriptedMailer::new()), proxy)
}

#[tokio::test]
async fn image_proxy_relays_images_with_cache_header() {
    let addr = image_host().await;
    let request = Request::builder()
        .uri(format!("/api/image-proxy?url=http://{addr}/logo.png"))
        .body(Body::empty())
        .unwrap();

    let response = proxied_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=86400");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], PNG);
}

#[tokio::test]
async fn image_proxy_rejects_non_images() {
    let addr = image_host().await;
    let (status, body) = call(&proxied_app(), "GET", &format!("/api/image-proxy?url=http://{addr}/page"), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "URL does not point to a valid image");
}

#[tokio::test]
async fn image_proxy_relays_upstream_status() {
    let addr = image_host().await;
    let (status, body) = call(&proxied_app(), "GET", &format!("/api/image-proxy?url=http://{addr}/missing"), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Failed to fetch image: Not Found");
}

#[tokio::test]
async fn image_proxy_times_out() {
    let addr = image_host().await;
    let (status, body) = call(&proxied_app(), "GET", &format!("/api/image-proxy?url=http://{addr}/slow"), None).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body, json!({ "success": false, "message": "Request timeout" }));
}

#[tokio::test]
async fn image_proxy_validates_the_url() {
    let app = app();

    let (status, body) = call(&app, "GET", "/api/image-proxy", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "URL parameter is required");

    let (status, body) = call(&app, "GET", "/api/image-proxy?url=not%20a%20url", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid URL provided");

    let (status, _) = call(&app, "GET", "/api/image-proxy?url=ftp://github.com/logo.png", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn image_proxy_refuses_unlisted_hosts() {
    let app = app();
    for url in ["https://example.com/a.png", "https://evilgoogle.com/a.png"] {
        let (status, body) = call(&app, "GET", &format!("/api/image-proxy?url={url}"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{url}");
        assert_eq!(body["message"], "Domain not allowed for proxying");
    }
}
