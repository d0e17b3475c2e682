//! Request tracking middleware
//!
//! Every request gets an `x-request-id` (the caller's, or a fresh UUID),
//! echoed back on the response and recorded by the trace span. Credential
//! headers are marked sensitive on the way in and `set-cookie` on the way
//! out, so neither reaches the logs.

use http::HeaderName;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::{SetSensitiveRequestHeadersLayer, SetSensitiveResponseHeadersLayer},
};

/// Header carrying the request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request headers that should be masked in logs
pub const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "x-api-key", "x-auth-token"];

/// Response headers that should be masked in logs
pub const SENSITIVE_RESPONSE_HEADERS: &[&str] = &["set-cookie"];

fn header_names(names: &[&'static str]) -> Vec<HeaderName> {
    names.iter().copied().map(HeaderName::from_static).collect()
}

/// Create a request ID layer that assigns a UUID to requests without one
pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Create a request ID propagation layer
pub fn request_id_propagation_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Create a sensitive request headers layer
pub fn sensitive_headers_layer() -> SetSensitiveRequestHeadersLayer {
    SetSensitiveRequestHeadersLayer::new(header_names(SENSITIVE_HEADERS))
}

/// Create a sensitive response headers layer
pub fn sensitive_response_headers_layer() -> SetSensitiveResponseHeadersLayer {
    SetSensitiveResponseHeadersLayer::new(header_names(SENSITIVE_RESPONSE_HEADERS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_headers_constant() {
        assert!(SENSITIVE_HEADERS.contains(&"authorization"));
        assert!(SENSITIVE_HEADERS.contains(&"x-api-key"));
    }

    #[test]
    fn test_set_cookie_is_masked_on_responses_only() {
        assert!(!SENSITIVE_HEADERS.contains(&"set-cookie"));
        assert!(SENSITIVE_RESPONSE_HEADERS.contains(&"set-cookie"));
    }

    #[test]
    fn test_sensitive_headers_are_valid_names() {
        for name in SENSITIVE_HEADERS.iter().chain(SENSITIVE_RESPONSE_HEADERS) {
            assert!(HeaderName::from_bytes(name.as_bytes()).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_request_id_header_matches_layer() {
        assert_eq!(REQUEST_ID_HEADER, "x-request-id");
    }
}
