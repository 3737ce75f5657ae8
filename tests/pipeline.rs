//! End-to-end tests of the assembled request pipeline, driven in-process.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::Extension,
    http::{header, Method, Request, StatusCode, Uri},
    Json, Router,
};
use serde_json::{json, Value};

use edge_gateway::routing::HandlerGroups;
use edge_gateway::security::ParsedBody;

mod common;
use common::{body_json, body_string, from_client, get, send, MockPersistence};

/// Auth group that records hits and echoes what it saw.
fn echo_groups(hits: Arc<AtomicUsize>) -> HandlerGroups {
    let mut groups = HandlerGroups::unmounted();
    groups.auth = Router::new().fallback(
        move |uri: Uri, Extension(parsed): Extension<ParsedBody>| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                let body = match parsed {
                    ParsedBody::Json(value) => value,
                    ParsedBody::Form(pairs) => json!(pairs),
                    ParsedBody::Empty => Value::Null,
                };
                Json(json!({ "path": uri.to_string(), "body": body }))
            }
        },
    );
    groups
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    from_client(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        common::client_addr(),
    )
}

#[tokio::test]
async fn fourth_request_in_window_is_rate_limited() {
    let mut config = common::test_config();
    config.rate_limit.window_ms = 60_000;
    config.rate_limit.max_requests = 3;
    let app = common::pipeline(config, MockPersistence::new());

    for expected in ["2", "1", "0"] {
        let response = send(&app, get("/api/docs")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["ratelimit-remaining"], expected);
        assert_eq!(response.headers()["ratelimit-limit"], "3");
    }

    let response = send(&app, get("/api/docs")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["ratelimit-remaining"], "0");
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Too many requests from this IP, please try again later."
    );

    // Another client has its own window.
    let other = from_client(
        Request::builder().uri("/api/docs").body(Body::empty()).unwrap(),
        "198.51.100.1:5000".parse().unwrap(),
    );
    assert_eq!(send(&app, other).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn disabled_rate_limit_admits_everything() {
    let mut config = common::test_config();
    config.rate_limit.enabled = false;
    config.rate_limit.max_requests = 1;
    let app = common::pipeline(config, MockPersistence::new());

    for _ in 0..5 {
        assert_eq!(send(&app, get("/api/docs")).await.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn requests_without_origin_are_admitted() {
    let app = common::pipeline(common::test_config(), MockPersistence::new());
    let response = send(&app, get("/api/docs")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn allowed_origin_gets_cors_headers() {
    let app = common::pipeline(common::test_config(), MockPersistence::new());
    let mut request = get("/api/docs");
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://localhost:5173".parse().unwrap());

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}

#[tokio::test]
async fn preflight_from_allowed_origin_is_answered() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = common::pipeline_with(
        common::test_config(),
        MockPersistence::new(),
        echo_groups(hits.clone()),
    );
    let request = from_client(
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/auth/login")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap(),
        common::client_addr(),
    );

    let response = send(&app, request).await;
    assert!(response.status().is_success());
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_origin_is_rejected_before_routing() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = common::pipeline_with(
        common::test_config(),
        MockPersistence::new(),
        echo_groups(hits.clone()),
    );
    let mut request = post_json("/api/auth/login", r#"{"user":"a"}"#);
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://evil.example".parse().unwrap());

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "origin_not_allowed");
    assert!(!body.to_string().contains("localhost"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversized_body_is_rejected_on_any_path() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut config = common::test_config();
    config.payload.max_body_bytes = 16;
    let app = common::pipeline_with(config, MockPersistence::new(), echo_groups(hits.clone()));

    let large = format!(r#"{{"data":"{}"}}"#, "x".repeat(64));
    for path in ["/api/auth/login", "/nowhere", "/health"] {
        let response = send(&app, post_json(path, &large)).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE, "{path}");
        assert_eq!(body_json(response).await["code"], "payload_too_large");
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = common::pipeline_with(
        common::test_config(),
        MockPersistence::new(),
        echo_groups(hits.clone()),
    );

    for body in [r#"{"user": "#, "42"] {
        let response = send(&app, post_json("/api/auth/login", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "malformed_body");
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn groups_see_stripped_path_and_decoded_body() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = common::pipeline_with(
        common::test_config(),
        MockPersistence::new(),
        echo_groups(hits.clone()),
    );

    let response = send(&app, post_json("/api/auth/login?next=home", r#"{"user":"a"}"#)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["path"], "/login?next=home");
    assert_eq!(body["body"]["user"], "a");

    let form = from_client(
        Request::builder()
            .method(Method::POST)
            .uri("/api/auth/register")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=Ada&country=ZM"))
            .unwrap(),
        common::client_addr(),
    );
    let body = body_json(send(&app, form).await).await;
    assert_eq!(body["body"], json!([["name", "Ada"], ["country", "ZM"]]));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

fn gzip(data: &[u8]) -> Vec<u8> {
    use std::io::Write;

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn post_gzip_json(uri: &str, compressed: Vec<u8>) -> Request<Body> {
    from_client(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_ENCODING, "gzip")
            .body(Body::from(compressed))
            .unwrap(),
        common::client_addr(),
    )
}

#[tokio::test]
async fn gzip_request_bodies_are_inflated_before_decoding() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = common::pipeline_with(
        common::test_config(),
        MockPersistence::new(),
        echo_groups(hits.clone()),
    );

    let compressed = gzip(br#"{"user":"a"}"#);
    let response = send(&app, post_gzip_json("/api/auth/login", compressed)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["body"]["user"], "a");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn inflated_size_is_capped() {
    let mut config = common::test_config();
    config.payload.max_body_bytes = 128;
    let hits = Arc::new(AtomicUsize::new(0));
    let app = common::pipeline_with(config, MockPersistence::new(), echo_groups(hits.clone()));

    let large = format!(r#"{{"pad":"{}"}}"#, "a".repeat(4096));
    let compressed = gzip(large.as_bytes());
    assert!(compressed.len() < 128);

    let response = send(&app, post_gzip_json("/api/auth/login", compressed)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn prefix_match_is_segment_bounded() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = common::pipeline_with(
        common::test_config(),
        MockPersistence::new(),
        echo_groups(hits.clone()),
    );

    let response = send(&app, post_json("/api/authx", "{}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn health_reports_connected_database() {
    let app = common::pipeline(common::test_config(), MockPersistence::new());
    let response = send(&app, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["environment"], "development");
    assert!(body["uptime"].is_number());
    assert!(body["memory"]["total"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn health_failure_does_not_leak_detail() {
    let persistence = MockPersistence::new();
    persistence.set_healthy(false);
    let app = common::pipeline(common::test_config(), persistence.clone());

    let response = send(&app, get("/health")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let text = body_string(response).await;
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["error"], "Database connection failed");
    assert!(!text.to_lowercase().contains("pool"));
    assert_eq!(persistence.pings(), 1);
}

#[tokio::test]
async fn health_is_computed_per_probe() {
    let persistence = MockPersistence::new();
    let app = common::pipeline(common::test_config(), persistence.clone());

    assert_eq!(send(&app, get("/health")).await.status(), StatusCode::OK);
    persistence.set_healthy(false);
    assert_eq!(
        send(&app, get("/health")).await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
    persistence.set_healthy(true);
    assert_eq!(send(&app, get("/health")).await.status(), StatusCode::OK);
    assert_eq!(persistence.pings(), 3);
}

#[tokio::test]
async fn hardening_headers_are_on_rejections_too() {
    let mut config = common::test_config();
    config.rate_limit.max_requests = 1;
    let app = common::pipeline(config, MockPersistence::new());

    let ok = send(&app, get("/api/docs")).await;
    let limited = send(&app, get("/api/docs")).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

    for response in [ok, limited] {
        let headers = response.headers();
        assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
        assert!(headers.contains_key("x-request-id"));
    }
}

#[tokio::test]
async fn users_group_requires_authentication() {
    let app = common::pipeline(common::test_config(), MockPersistence::new());

    let response = send(&app, get("/api/users/profile")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "unauthorized");

    let mut request = get("/api/users/profile");
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", common::API_TOKEN).parse().unwrap(),
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn docs_list_the_api_surface() {
    let app = common::pipeline(common::test_config(), MockPersistence::new());
    let response = send(&app, get("/api/docs")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["name"], "KwachaNow API");
    assert!(body["endpoints"]["users"]["GET /api/users/profile"].is_string());
}

#[tokio::test]
async fn docs_and_health_only_answer_reads() {
    let app = common::pipeline(common::test_config(), MockPersistence::new());
    let response = send(&app, post_json("/api/docs", "{}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn built_in_routes_accept_a_trailing_slash() {
    let app = common::pipeline(common::test_config(), MockPersistence::new());

    let response = send(&app, get("/health/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = send(&app, get("/api/docs/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "KwachaNow API");

    let response = send(&app, get("/health//")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_files_and_spa_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("public")).unwrap();
    std::fs::create_dir_all(dir.path().join("dist")).unwrap();
    std::fs::write(dir.path().join("public/robots.txt"), "User-agent: *").unwrap();
    std::fs::write(dir.path().join("dist/index.html"), "<html>app</html>").unwrap();

    let mut config = common::test_config();
    config.static_assets.public_dir = dir.path().join("public").display().to_string();
    config.static_assets.spa_index = dir.path().join("dist/index.html").display().to_string();
    let app = common::pipeline(config, MockPersistence::new());

    let response = send(&app, get("/robots.txt")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "User-agent: *");

    let response = send(&app, get("/countries/zambia")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<html>app</html>");

    // Built-in routes win over the fallback.
    let response = send(&app, get("/health")).await;
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = send(&app, post_json("/countries/zambia", "{}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

fn chatty_groups() -> HandlerGroups {
    async fn explode() -> &'static str {
        panic!("connection string postgres://admin:hunter2@db")
    }

    let mut groups = HandlerGroups::unmounted();
    groups.chat = Router::new()
        .route(
            "/transcript",
            axum::routing::get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/plain")],
                    "lorem ipsum ".repeat(512),
                )
            }),
        )
        .route(
            "/broken",
            axum::routing::get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "stack trace at db.rs:42") }),
        )
        .route("/panic", axum::routing::get(explode));
    groups
}

#[tokio::test]
async fn large_responses_are_compressed_when_accepted() {
    let app = common::pipeline_with(common::test_config(), MockPersistence::new(), chatty_groups());

    let mut request = get("/api/chat/transcript");
    request
        .headers_mut()
        .insert(header::ACCEPT_ENCODING, "gzip".parse().unwrap());
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");

    let response = send(&app, get("/api/chat/transcript")).await;
    assert!(!response.headers().contains_key(header::CONTENT_ENCODING));
}

#[tokio::test]
async fn compression_can_be_disabled() {
    let mut config = common::test_config();
    config.compression.enabled = false;
    let app = common::pipeline_with(config, MockPersistence::new(), chatty_groups());

    let mut request = get("/api/chat/transcript");
    request
        .headers_mut()
        .insert(header::ACCEPT_ENCODING, "gzip, br".parse().unwrap());
    let response = send(&app, request).await;
    assert!(!response.headers().contains_key(header::CONTENT_ENCODING));
}

#[tokio::test]
async fn handler_failures_are_normalized() {
    let app = common::pipeline_with(common::test_config(), MockPersistence::new(), chatty_groups());

    for path in ["/api/chat/broken", "/api/chat/panic"] {
        let response = send(&app, get(path)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{path}");
        assert!(response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
        let text = body_string(response).await;
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("db.rs"));
        assert!(text.contains("internal_error"));
    }
}

#[tokio::test]
async fn unmounted_groups_answer_not_implemented() {
    let app = common::pipeline(common::test_config(), MockPersistence::new());
    let response = send(&app, get("/api/news")).await;
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body_json(response).await["code"], "not_implemented");
}

#[tokio::test]
async fn request_id_is_propagated() {
    let app = common::pipeline(common::test_config(), MockPersistence::new());
    let mut request = get("/api/docs");
    request
        .headers_mut()
        .insert("x-request-id", "req-123".parse().unwrap());

    let response = send(&app, request).await;
    assert_eq!(response.headers()["x-request-id"], "req-123");
}
