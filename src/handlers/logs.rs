//! Log drain ingest endpoint
//!
//! Heroku posts batches of newline-delimited syslog lines here. The app name
//! and the optional shared secret travel in the query string.

use crate::dispatch::BatchReport;
use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::metrics::RejectReason;
use crate::middleware::RequestId;
use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Query, State},
};
use std::collections::HashMap;

/// Query parameter naming the app the batch belongs to
pub const APP_NAME_PARAM: &str = "app_name";

/// Ingest handler
///
/// # Response
///
/// - `200 OK` with a JSON [`BatchReport`]
/// - `400 Bad Request` when the drain token does not match; no line is processed
///
/// # Example
///
/// ```bash
/// curl -X POST 'http://localhost:9841/logs?app_name=shop&token=s3cret' \
///   --data-binary $'83 <158>1 2024-01-01T00:00:00+00:00 host heroku router - service=42ms\n'
/// # {"lines":1,"processed":1,"malformed":0}
/// ```
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> AppResult<Json<BatchReport>> {
    let app_name = params
        .get(APP_NAME_PARAM)
        .map(String::as_str)
        .unwrap_or_default();

    if let Some((name, expected)) = state.config().token_check()
        && params.get(name).map(String::as_str) != Some(expected)
    {
        state.metrics().rejected_request(RejectReason::TokenMismatch);
        tracing::warn!(
            request_id = %request_id,
            app_name = %app_name,
            "Rejected drain batch with missing or wrong token"
        );
        return Err(AppError::TokenMismatch);
    }

    let body = String::from_utf8_lossy(&body);
    let report = state.dispatcher().ingest(app_name, &body);

    tracing::debug!(
        request_id = %request_id,
        app_name = %app_name,
        lines = report.lines,
        malformed = report.malformed,
        "Drain batch accepted"
    );

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::str::FromStr;
    use std::sync::Arc;

    const LINE: &str = "1 2 3 4 heroku router - dyno=web.1 service=42ms";

    fn state(config: &str) -> AppState {
        AppState::new(Arc::new(Config::from_str(config).unwrap())).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> Query<HashMap<String, String>> {
        Query(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_batch_without_token_check_is_processed() {
        let state = state("");
        let Json(report) = handler(
            State(state),
            Extension(RequestId::new()),
            params(&[("app_name", "shop")]),
            Bytes::from(format!("{LINE}\n{LINE}\n")),
        )
        .await
        .unwrap();

        assert_eq!(report.lines, 2);
        assert_eq!(report.processed, 2);
    }

    #[tokio::test]
    async fn test_wrong_token_is_rejected_before_processing() {
        let state = state("[drain]\ntoken_param_value = \"s3cret\"\n");
        let result = handler(
            State(state.clone()),
            Extension(RequestId::new()),
            params(&[("app_name", "shop"), ("token", "nope")]),
            Bytes::from(LINE),
        )
        .await;

        assert!(matches!(result, Err(AppError::TokenMismatch)));
        assert_eq!(
            state
                .metrics()
                .lines_count(crate::metrics::LineOutcome::Processed),
            0
        );
        assert_eq!(
            state.metrics().rejected_requests_count(RejectReason::TokenMismatch),
            1
        );
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let state = state("[drain]\ntoken_param_value = \"s3cret\"\n");
        let result = handler(
            State(state),
            Extension(RequestId::new()),
            params(&[("app_name", "shop")]),
            Bytes::from(LINE),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_matching_custom_token_param_is_accepted() {
        let state = state("[drain]\ntoken_param_name = \"key\"\ntoken_param_value = \"s3cret\"\n");
        let result = handler(
            State(state),
            Extension(RequestId::new()),
            params(&[("key", "s3cret")]),
            Bytes::from(LINE),
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_decoded_lossily() {
        let state = state("");
        let mut body = LINE.as_bytes().to_vec();
        body.extend_from_slice(&[b' ', 0xff, 0xfe, b'\n']);

        let Json(report) = handler(
            State(state),
            Extension(RequestId::new()),
            params(&[]),
            Bytes::from(body),
        )
        .await
        .unwrap();

        assert_eq!(report.processed, 1);
    }
}
