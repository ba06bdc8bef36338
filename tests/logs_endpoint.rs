//! Integration tests for drain ingestion over HTTP
//!
//! Drives the full router: query parsing, token check, batch processing and
//! the metrics that come out the other end.

mod common;

use axum::{body::Body, http::Method, http::StatusCode};
use common::{ROUTER_LINE, RUNTIME_LINE, body_string, create_test_app, send};
use drainwatch::metrics::{LineOutcome, RejectReason};

const TOKEN_CONFIG: &str = r#"
[drain]
token_param_name = "token"
token_param_value = "s3cret"
"#;

#[tokio::test]
async fn test_batch_is_processed_and_reported() {
    let (state, app) = create_test_app("");
    let body = format!("{ROUTER_LINE}\n{RUNTIME_LINE}\n");

    let response = send(app, Method::POST, "/logs?app_name=shop", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let report: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(
        report,
        serde_json::json!({"lines": 2, "processed": 2, "malformed": 0})
    );
    assert_eq!(state.metrics().lines_count(LineOutcome::Processed), 2);
}

#[tokio::test]
async fn test_malformed_line_does_not_abort_batch() {
    let (state, app) = create_test_app("");
    let body = format!("no delimiter here\n2 3 4 heroku router - service=1ms\n{ROUTER_LINE}\n");

    let response = send(app, Method::POST, "/logs?app_name=shop", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let report: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(report["malformed"], 2);
    assert_eq!(report["processed"], 1);
    assert_eq!(state.metrics().lines_count(LineOutcome::Malformed), 2);

    let exposition = state.metrics().gather().unwrap();
    assert!(exposition.contains("heroku_router_service_duration_seconds_count{"));
}

#[tokio::test]
async fn test_wrong_token_is_rejected_with_400() {
    let (state, app) = create_test_app(TOKEN_CONFIG);

    let response = send(
        app,
        Method::POST,
        "/logs?app_name=shop&token=wrong",
        ROUTER_LINE,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"], "Drain token mismatch");
    assert_eq!(state.metrics().lines_count(LineOutcome::Processed), 0);
    assert_eq!(
        state.metrics().rejected_requests_count(RejectReason::TokenMismatch),
        1
    );
}

#[tokio::test]
async fn test_correct_token_is_accepted() {
    let (_, app) = create_test_app(TOKEN_CONFIG);

    let response = send(
        app,
        Method::POST,
        "/logs?app_name=shop&token=s3cret",
        ROUTER_LINE,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_on_logs_path_is_bad_request() {
    let (state, app) = create_test_app("");

    let response = send(app, Method::GET, "/logs", Body::empty()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        state.metrics().rejected_requests_count(RejectReason::BadMethod),
        1
    );
}

#[tokio::test]
async fn test_post_on_metrics_path_is_bad_request() {
    let (_, app) = create_test_app("");

    let response = send(app, Method::POST, "/metrics", Body::empty()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_custom_paths_from_config() {
    let (_, app) = create_test_app("[server]\nlogs_path = \"/drain\"\nmetrics_path = \"/prom\"\n");

    let response = send(app.clone(), Method::POST, "/drain?app_name=shop", ROUTER_LINE).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(app.clone(), Method::GET, "/prom", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("app_name=\"shop\""));

    let response = send(app, Method::POST, "/logs", ROUTER_LINE).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_app_name_uses_unknown() {
    let (_, app) = create_test_app("");

    send(app.clone(), Method::POST, "/logs", ROUTER_LINE).await;
    let response = send(app, Method::GET, "/metrics", Body::empty()).await;

    assert!(body_string(response).await.contains("app_name=\"UNKNOWN\""));
}

#[tokio::test]
async fn test_down_state_change_evicts_runtime_series() {
    let (state, app) = create_test_app("");

    send(app.clone(), Method::POST, "/logs?app_name=shop", RUNTIME_LINE).await;
    let before = body_string(send(app.clone(), Method::GET, "/metrics", Body::empty()).await).await;
    assert!(before.contains("heroku_runtime_metrics_memory_rss_bytes{"));

    // The state change carries no source key, so it addresses the UNKNOWN
    // dyno id; feed a sample under the same tuple first.
    let batch = "1 2 3 4 heroku web.2 - sample#memory_rss=10MB\n\
                 1 2 3 4 heroku web.2 - State changed from up to down";
    send(app.clone(), Method::POST, "/logs?app_name=shop", batch).await;

    let after = body_string(send(app, Method::GET, "/metrics", Body::empty()).await).await;
    assert!(!after.contains("dyno=\"web.2\""));
    assert!(after.contains("dyno=\"web.1\""), "other dynos keep their series");
    assert_eq!(state.metrics().evictions_count("runtime"), 1);
}
