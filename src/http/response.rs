//! Decision to HTTP response mapping.
//!
//! | Decision                    | Status |
//! |-----------------------------|--------|
//! | allowed                     | 200    |
//! | `NotFound`                  | 404    |
//! | any other denial            | 403    |
//!
//! Denials also carry `x-gateway-decision: <tier>` and
//! `x-gateway-denial: <tier>: <reason>`.

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::gateway::SecurityDecision;

pub const X_GATEWAY_DECISION: &str = "x-gateway-decision";
pub const X_GATEWAY_DENIAL: &str = "x-gateway-denial";

pub fn status_for(decision: &SecurityDecision) -> StatusCode {
    if decision.allowed {
        StatusCode::OK
    } else if decision.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::FORBIDDEN
    }
}

/// Reasons may echo client input; keep visible ASCII only.
fn header_safe(value: &str) -> HeaderValue {
    let cleaned: String = value
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '?' })
        .collect();
    HeaderValue::from_str(&cleaned).unwrap_or_else(|_| HeaderValue::from_static("denied"))
}

impl IntoResponse for SecurityDecision {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let mut headers = HeaderMap::new();
        headers.insert(X_GATEWAY_DECISION, HeaderValue::from_static(self.tier.as_str()));
        if self.is_security_denial() {
            headers.insert(
                X_GATEWAY_DENIAL,
                header_safe(&format!("{}: {}", self.tier, self.reason)),
            );
        }
        (status, headers, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{AlertSeverity, DecisionTier};

    #[test]
    fn test_denial_headers() {
        let decision = SecurityDecision::deny(
            DecisionTier::RestrictedDenied,
            "Client identity matches blocked tool signature 'admintool'",
        )
        .with_severity(AlertSeverity::Critical);

        let response = decision.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()[X_GATEWAY_DECISION], "restricted_denied");
        assert_eq!(
            response.headers()[X_GATEWAY_DENIAL],
            "restricted_denied: Client identity matches blocked tool signature 'admintool'"
        );
    }

    #[test]
    fn test_not_found_has_no_denial_header() {
        let response = SecurityDecision::deny(DecisionTier::NotFound, "").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(X_GATEWAY_DENIAL).is_none());
    }

    #[test]
    fn test_header_value_sanitized() {
        let value = header_safe("bad\r\nvalue ñ");
        assert_eq!(value, "bad??value ?");
    }
}
