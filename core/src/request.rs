//! Request building
//!
//! Turns a decoded [`FetchRequest`] plus the resolved auth token into the
//! endpoint and the transport configuration. A fresh [`RequestConfig`] is built
//! on every call; the caller's `meta.config` is only read.

use crate::action::FetchRequest;
use crate::error::ApiError;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde_json::{Map, Value};

/// Media type used for `Accept` and for JSON request bodies
pub const APPLICATION_JSON: &str = "application/json";

/// Transport configuration for a single request
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// HTTP method
    pub method: Method,
    /// Final header set (defaults, auth, caller overrides, content type)
    pub headers: HeaderMap,
    /// JSON-serialized payload, if the action carried one
    pub body: Option<String>,
    /// Caller transport options other than `headers`
    pub options: Map<String, Value>,
}

/// A request ready for the transport
#[derive(Debug, Clone)]
pub struct BuiltRequest {
    /// Absolute or base-prefixed URL
    pub endpoint: String,
    /// Transport configuration
    pub config: RequestConfig,
}

/// Whether `url` already names a scheme and must not be prefixed
#[must_use]
pub fn is_absolute_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Methods matched case-insensitively and sent upper-cased
const NORMALIZED_METHODS: [&str; 7] = ["DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT"];

/// Parse a method token, upper-casing the standard methods
///
/// Extension methods are kept as written.
///
/// # Errors
///
/// Returns [`ApiError::InvalidRequest`] if `method` is not a valid method token.
pub fn parse_method(method: &str) -> Result<Method, ApiError> {
    let upper = method.to_ascii_uppercase();
    let token = if NORMALIZED_METHODS.contains(&upper.as_str()) {
        upper.as_str()
    } else {
        method
    };
    Method::from_bytes(token.as_bytes())
        .map_err(|e| ApiError::InvalidRequest(format!("method {method:?}: {e}")))
}

/// Resolve the endpoint against the configured base URL
#[must_use]
pub fn resolve_endpoint(base_url: &str, url: &str) -> String {
    if is_absolute_url(url) {
        url.to_string()
    } else {
        format!("{base_url}{url}")
    }
}

/// Build the endpoint and transport configuration for a fetch request
///
/// Headers start from `Accept: application/json`, gain `Authorization: Bearer
/// <token>` when a non-empty token is given, and are then overridden by the
/// caller's `config.headers`. A payload is serialized as the body and forces
/// `Content-Type: application/json`.
///
/// # Errors
///
/// Returns [`ApiError::InvalidRequest`] if the method is not a valid HTTP
/// method token or the token cannot be carried in a header.
pub fn build_request(
    request: &FetchRequest,
    payload: Option<&Value>,
    token: Option<&str>,
    base_url: &str,
) -> Result<BuiltRequest, ApiError> {
    let method = parse_method(&request.method)?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

    if let Some(token) = token.filter(|token| !token.is_empty()) {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ApiError::InvalidRequest(format!("authorization token: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }

    merge_headers(&mut headers, &request.config.headers);

    let body = match payload {
        Some(payload) => {
            let body = serde_json::to_string(payload)
                .map_err(|e| ApiError::InvalidRequest(format!("payload: {e}")))?;
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
            Some(body)
        },
        None => None,
    };

    Ok(BuiltRequest {
        endpoint: resolve_endpoint(base_url, &request.url),
        config: RequestConfig {
            method,
            headers,
            body,
            options: request.config.options.clone(),
        },
    })
}

/// Right-biased merge: caller headers replace defaults of the same name
fn merge_headers(headers: &mut HeaderMap, overrides: &Map<String, Value>) {
    for (name, value) in overrides {
        let value = match value {
            Value::String(value) => value.clone(),
            Value::Number(value) => value.to_string(),
            Value::Bool(value) => value.to_string(),
            _ => {
                tracing::warn!(header = %name, "Skipping header with non-scalar value");
                continue;
            },
        };

        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            },
            _ => tracing::warn!(header = %name, "Skipping invalid header"),
        }
    }
}
