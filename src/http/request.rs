//! Request identification and metadata extraction.
//!
//! # Responsibilities
//! - Generate a UUID request ID when the client did not send one
//! - Mark requests that carry the admin bearer key as admin sessions
//! - Turn request headers into [`RequestMetadata`] for the pipeline
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The session marker is a request extension set by middleware; handlers
//!   never look at the `Authorization` header themselves

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::admin::auth::bearer_matches;
use crate::gateway::{Gateway, RequestMetadata};

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_CLIENT_IDENTITY: &str = "x-client-identity";
pub const X_CAPABILITY_TOKEN: &str = "x-capability-token";

/// Generates `x-request-id` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

pub fn x_request_id() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// Request extension present when the caller proved the admin key.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

/// Tags requests bearing the admin key with [`AdminSession`].
pub async fn admin_session_layer(
    State(gateway): State<Arc<Gateway>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let config = gateway.config();
    if config.admin.enabled && bearer_matches(request.headers(), &config.admin.api_key) {
        request.extensions_mut().insert(AdminSession);
    }
    next.run(request).await
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Build pipeline metadata from request headers.
pub fn request_metadata(headers: &HeaderMap, admin_session: bool) -> RequestMetadata {
    RequestMetadata {
        declared_identity: header_str(headers, X_CLIENT_IDENTITY)
            .or_else(|| header_str(headers, axum::http::header::USER_AGENT.as_str())),
        capability_token: header_str(headers, X_CAPABILITY_TOKEN),
        admin_session,
        request_id: header_str(headers, X_REQUEST_ID),
    }
}
