//! Request body buffering.

use axum::http::{header, StatusCode};

use crate::context::Context;
use crate::dispatch::error::HttpError;

/// Drain the request body into a string (invalid UTF-8 is replaced).
///
/// Bodies larger than the configured `limits.max_body_size` fail with 413;
/// a second call fails because the stream has already been consumed.
pub async fn parse_body(ctx: &Context) -> Result<String, HttpError> {
    let request = ctx.request();
    let limit = request.body_limit();

    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared.is_some_and(|length| length > limit) {
        return Err(payload_too_large());
    }

    let body = request
        .take_body()
        .ok_or_else(|| HttpError::new("request body already consumed"))?;

    let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
        tracing::debug!(request_id = %ctx.request_id(), error = %e, "Failed to read request body");
        HttpError::from_source(e).with_status(StatusCode::BAD_REQUEST.as_u16())
    })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn payload_too_large() -> HttpError {
    HttpError::empty().with_status(StatusCode::PAYLOAD_TOO_LARGE.as_u16())
}
