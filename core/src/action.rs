//! Action model and lifecycle type helpers
//!
//! An [`Action`] is the unit flowing through the dispatch pipeline. Actions whose
//! `meta.type` equals [`API_FETCH_TYPE`] are fetch-request actions: the fetch
//! middleware turns them into HTTP requests and derives three lifecycle actions
//! from the base type.
//!
//! # Example
//!
//! ```
//! use fetch_middleware_core::action::{Action, action_type_started, is_fetch_action};
//! use serde_json::json;
//!
//! let action = Action::new("FOO_GET")
//!     .with_meta(json!({ "type": "@api", "url": "/foo" }));
//!
//! assert!(is_fetch_action(&action));
//! assert_eq!(action_type_started(&action.action_type), "@api/FOO_GET/STARTED");
//! ```

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Discriminator marking an action as a fetch request (`meta.type`)
pub const API_FETCH_TYPE: &str = "@api";

/// Method used when a request action does not name one
pub const DEFAULT_METHOD: &str = "GET";

/// Type of the action dispatched right before the request is issued
#[must_use]
pub fn action_type_started(action_type: &str) -> String {
    format!("{API_FETCH_TYPE}/{action_type}/STARTED")
}

/// Type of the action dispatched when the request succeeds
#[must_use]
pub fn action_type_success(action_type: &str) -> String {
    format!("{API_FETCH_TYPE}/{action_type}/SUCCESS")
}

/// Type of the action dispatched when the request fails
#[must_use]
pub fn action_type_failure(action_type: &str) -> String {
    format!("{API_FETCH_TYPE}/{action_type}/FAILURE")
}

/// A plain, serializable action
///
/// Serializes the way reducers elsewhere in the pipeline expect it:
///
/// ```json
/// { "type": "FOO_GET", "payload": { "id": 1 }, "meta": { "type": "@api", "url": "/foo" } }
/// ```
///
/// Absent `payload` and `meta` are omitted rather than serialized as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Identifier of the logical operation
    #[serde(rename = "type")]
    pub action_type: String,

    /// Optional payload; serialized as the request body on fetch actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    /// Optional metadata; carries the request description on fetch actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Action {
    /// Create an action with only a type
    #[must_use]
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: None,
            meta: None,
        }
    }

    /// Attach a payload
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attach metadata
    #[must_use]
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Attach metadata from an ordered map
    #[must_use]
    pub fn with_meta_map(self, meta: Map<String, Value>) -> Self {
        self.with_meta(Value::Object(meta))
    }

    /// The `meta` object, if `meta` is present and is an object
    #[must_use]
    pub fn meta_object(&self) -> Option<&Map<String, Value>> {
        self.meta.as_ref().and_then(Value::as_object)
    }

    /// Meta fields echoed on the terminal action of a fetch
    ///
    /// Everything in `meta` except the request description (`type`, `url`,
    /// `method`, `config`), in original order. Empty when `meta` is not an object.
    #[must_use]
    pub fn carried_meta(&self) -> Map<String, Value> {
        self.meta_object()
            .map(|meta| {
                meta.iter()
                    .filter(|(key, _)| !REQUEST_META_KEYS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The payload to serialize as a request body
    ///
    /// `null` counts as no payload.
    #[must_use]
    pub fn body_payload(&self) -> Option<&Value> {
        self.payload.as_ref().filter(|payload| !payload.is_null())
    }
}

/// Meta keys describing the request itself
const REQUEST_META_KEYS: [&str; 4] = ["type", "url", "method", "config"];

/// Whether the action must be turned into a network request
///
/// True iff `meta` is an object whose `type` equals [`API_FETCH_TYPE`].
#[must_use]
pub fn is_fetch_action(action: &Action) -> bool {
    action
        .meta_object()
        .and_then(|meta| meta.get("type"))
        .and_then(Value::as_str)
        .is_some_and(|tag| tag == API_FETCH_TYPE)
}

/// Caller-supplied transport options found under `meta.config`
///
/// `headers` is merged over the default headers; every other key is kept in
/// `options` and handed to the transport untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Headers overriding the defaults
    #[serde(default)]
    pub headers: Map<String, Value>,

    /// Remaining transport options
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

/// Typed view of a fetch action's `meta`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Absolute URL or path relative to the configured base URL
    pub url: String,
    /// HTTP method, [`DEFAULT_METHOD`] when absent
    pub method: String,
    /// Transport options
    pub config: RequestOptions,
    /// Every other meta field, echoed on the terminal action
    pub extra: Map<String, Value>,
}

impl FetchRequest {
    /// Decode the request description carried in an action's `meta`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if `meta` is not an object, `url` is
    /// missing or not a string, `method` is not a string, or `config` is not an
    /// object with string-keyed `headers`.
    pub fn from_action(action: &Action) -> Result<Self, ApiError> {
        let meta = action
            .meta_object()
            .ok_or_else(|| ApiError::InvalidRequest("meta is not an object".to_string()))?;

        let url = match meta.get("url").cloned() {
            Some(Value::String(url)) => url,
            Some(_) => return Err(ApiError::InvalidRequest("meta.url is not a string".to_string())),
            None => return Err(ApiError::InvalidRequest("meta.url is missing".to_string())),
        };

        let method = match meta.get("method").cloned() {
            Some(Value::String(method)) => method,
            None | Some(Value::Null) => DEFAULT_METHOD.to_string(),
            Some(_) => {
                return Err(ApiError::InvalidRequest(
                    "meta.method is not a string".to_string(),
                ));
            },
        };

        let config = match meta.get("config").cloned() {
            None | Some(Value::Null) => RequestOptions::default(),
            Some(config) => serde_json::from_value(config)
                .map_err(|e| ApiError::InvalidRequest(format!("meta.config: {e}")))?,
        };

        Ok(Self {
            url,
            method,
            config,
            extra: action.carried_meta(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_action_type_started() {
        assert_eq!(action_type_started("FOO"), "@api/FOO/STARTED");
        assert_eq!(action_type_started("BAR"), "@api/BAR/STARTED");
    }

    #[test]
    fn test_action_type_success() {
        assert_eq!(action_type_success("FOO"), "@api/FOO/SUCCESS");
        assert_eq!(action_type_success("BAR"), "@api/BAR/SUCCESS");
    }

    #[test]
    fn test_action_type_failure() {
        assert_eq!(action_type_failure("FOO"), "@api/FOO/FAILURE");
        assert_eq!(action_type_failure("BAR"), "@api/BAR/FAILURE");
    }

    #[test]
    fn test_classifier_matches_only_api_meta() {
        let fetch = Action::new("FOO_GET").with_meta(json!({ "type": "@api", "url": "/foo" }));
        assert!(is_fetch_action(&fetch));

        assert!(!is_fetch_action(&Action::new("FOO_GET")));
        assert!(!is_fetch_action(
            &Action::new("FOO_GET").with_meta(json!({ "type": "@other" }))
        ));
        assert!(!is_fetch_action(
            &Action::new("FOO_GET").with_meta(json!({ "url": "/foo" }))
        ));
        assert!(!is_fetch_action(&Action::new("FOO_GET").with_meta(json!("@api"))));
    }

    #[test]
    fn test_action_serializes_without_absent_fields() {
        let action = Action::new("@api/FOO_GET/STARTED");
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({ "type": "@api/FOO_GET/STARTED" })
        );

        let decoded: Action = serde_json::from_value(json!({
            "type": "FOO_GET",
            "meta": { "type": "@api", "url": "/foo" }
        }))
        .unwrap();
        assert_eq!(decoded.payload, None);
        assert!(is_fetch_action(&decoded));
    }

    #[test]
    fn test_null_payload_is_not_a_body() {
        let action = Action::new("FOO").with_payload(Value::Null);
        assert!(action.body_payload().is_none());

        let action = Action::new("FOO").with_payload(json!({ "a": 1 }));
        assert_eq!(action.body_payload(), Some(&json!({ "a": 1 })));

        for falsy in [json!(false), json!(0), json!("")] {
            let action = Action::new("FOO").with_payload(falsy.clone());
            assert_eq!(action.body_payload(), Some(&falsy));
        }
    }

    #[test]
    fn test_carried_meta_survives_undecodable_request() {
        let action = Action::new("T").with_meta(json!({ "type": "@api", "id": 9, "method": 3 }));

        assert!(FetchRequest::from_action(&action).is_err());
        assert_eq!(action.carried_meta(), json!({ "id": 9 }).as_object().unwrap().clone());
        assert!(Action::new("T").with_meta(json!("x")).carried_meta().is_empty());
    }

    #[test]
    fn test_fetch_request_defaults() {
        let action = Action::new("FOO_GET").with_meta(json!({ "type": "@api", "url": "/foo" }));
        let request = FetchRequest::from_action(&action).unwrap();

        assert_eq!(request.url, "/foo");
        assert_eq!(request.method, "GET");
        assert_eq!(request.config, RequestOptions::default());
        assert!(request.extra.is_empty());
    }

    #[test]
    fn test_fetch_request_keeps_extra_fields_in_order() {
        let action = Action::new("FOO_PUT").with_meta(json!({
            "type": "@api",
            "url": "/foo/7",
            "method": "PUT",
            "id": 7,
            "config": { "headers": { "X-Trace": "abc" }, "credentials": "include" },
            "section": "detail"
        }));
        let request = FetchRequest::from_action(&action).unwrap();

        assert_eq!(request.method, "PUT");
        assert_eq!(request.config.headers.get("X-Trace"), Some(&json!("abc")));
        assert_eq!(request.config.options.get("credentials"), Some(&json!("include")));
        let keys: Vec<&str> = request.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "section"]);
    }

    #[test]
    fn test_fetch_request_requires_url() {
        let action = Action::new("FOO_GET").with_meta(json!({ "type": "@api" }));
        assert!(matches!(
            FetchRequest::from_action(&action),
            Err(ApiError::InvalidRequest(_))
        ));

        let action = Action::new("FOO_GET").with_meta(json!({ "type": "@api", "url": 3 }));
        assert!(matches!(
            FetchRequest::from_action(&action),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_lifecycle_types_are_templated(base in "[A-Z_]{1,24}") {
            prop_assert_eq!(action_type_started(&base), format!("@api/{base}/STARTED"));
            prop_assert_eq!(action_type_success(&base), format!("@api/{base}/SUCCESS"));
            prop_assert_eq!(action_type_failure(&base), format!("@api/{base}/FAILURE"));
            prop_assert_eq!(action_type_started(&base), action_type_started(&base));
        }

        #[test]
        fn prop_untagged_meta_is_never_classified(
            base in "[A-Z_]{1,16}",
            tag in "[a-z@/]{0,8}",
        ) {
            prop_assume!(tag != API_FETCH_TYPE);
            let action = Action::new(base).with_meta(json!({ "type": tag, "url": "/x" }));
            prop_assert!(!is_fetch_action(&action));
        }
    }
}
