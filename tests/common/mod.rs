//! Shared helpers for integration tests

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response},
};
use drainwatch::config::Config;
use drainwatch::handlers::{self, AppState};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;

pub const ROUTER_LINE: &str = "158 <158>1 2024-05-01T10:00:00.000000+00:00 host heroku router - \
    at=info method=GET path=\"/\" host=shop.herokuapp.com request_id=abc fwd=\"1.2.3.4\" \
    dyno=web.1 connect=1ms service=42ms status=200 bytes=512 protocol=https";

pub const RUNTIME_LINE: &str = "300 <45>1 2024-05-01T10:00:00.000000+00:00 host heroku web.1 - \
    source=web.1 dyno=heroku.1234.abcd sample#load_avg_1m=0.25 sample#load_avg_5m=0.5 \
    sample#load_avg_15m=0.75 sample#memory_total=512.5MB sample#memory_rss=500MB \
    sample#memory_cache=12.5MB sample#memory_swap=0MB sample#memory_pgpgin=1000pages \
    sample#memory_pgpgout=900pages sample#memory_quota=1024MB";

/// Application state and router built from a TOML snippet
pub fn create_test_app(config: &str) -> (AppState, Router) {
    let config = Config::from_str(config).expect("should parse test config");
    let state = AppState::new(Arc::new(config)).expect("AppState::new should succeed");
    let app = handlers::router(state.clone());
    (state, app)
}

pub async fn send(app: Router, method: Method, uri: &str, body: impl Into<Body>) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .body(body.into())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
