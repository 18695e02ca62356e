//! Inbound request handling.
//!
//! # Responsibilities
//! - Resolve the correlation id of every request (reuse or generate)
//! - Keep it attached to the serving task for the whole request
//! - Echo it on the response, including error responses
//! - Expose the request line to handlers for the boundary log

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use crate::observability::correlation::{self, X_CORRELATION_ID};
use crate::observability::invocation::RequestMeta;

/// Outermost middleware: establishes the correlation id for the request.
///
/// A non-blank `X-Correlation-Id` header is reused verbatim, otherwise a new
/// UUID is generated. Header bytes outside visible ASCII cannot be echoed
/// as text, so such a value is replaced too. The id is detached when the request future ends, on
/// every exit path.
pub async fn correlation_middleware(request: Request<Body>, next: Next) -> Response {
    let supplied = match request.headers().get(X_CORRELATION_ID) {
        Some(value) => match value.to_str() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::debug!(
                    raw = ?value,
                    "Discarding supplied correlationId that is not visible ASCII"
                );
                None
            }
        },
        None => None,
    };
    let id = correlation::establish(supplied);

    let span = tracing::info_span!("request", correlation_id = %id);
    let mut response = correlation::scope(id.clone(), next.run(request))
        .instrument(span)
        .await;

    match HeaderValue::from_str(id.as_str()) {
        Ok(value) => {
            response.headers_mut().insert(X_CORRELATION_ID, value);
        }
        Err(_) => tracing::warn!(correlation_id = %id, "Correlation id is not a valid header value"),
    }
    response
}

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestMeta::new(
            parts.method.as_str(),
            parts.uri.path(),
            parts.uri.query().map(str::to_string),
        ))
    }
}
