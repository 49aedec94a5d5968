//! # Fetch Middleware Core
//!
//! Core types and contracts for representing network calls as dispatched data.
//!
//! An action tagged with `meta.type == "@api"` describes an HTTP request. The
//! fetch middleware (runtime crate) intercepts it, issues the request and
//! dispatches its lifecycle:
//!
//! ```text
//! FOO_GET                    forwarded unchanged
//! @api/FOO_GET/STARTED       before the request is issued
//! @api/FOO_GET/SUCCESS       parsed body as payload
//!   or @api/FOO_GET/FAILURE  error as payload
//! ```
//!
//! ## Core Concepts
//!
//! - **Action**: plain serializable data (`type`, `payload`, `meta`)
//! - **Middleware**: a link in the dispatch pipeline (`store → next → action`)
//! - **Transport**: a `fetch`-shaped function returning a response
//! - **Token resolver**: `&State → Option<token>`, injected at construction
//! - **Reducer**: applies actions to state at the end of the pipeline
//!
//! ## Example
//!
//! ```
//! use fetch_middleware_core::action::{Action, FetchRequest};
//! use fetch_middleware_core::request::build_request;
//! use serde_json::json;
//!
//! let action = Action::new("TODO_CREATE")
//!     .with_payload(json!({ "title": "write docs" }))
//!     .with_meta(json!({ "type": "@api", "url": "/todos", "method": "POST" }));
//!
//! let request = FetchRequest::from_action(&action).unwrap();
//! let built = build_request(&request, action.body_payload(), Some("t0k3n"), "https://api.example.com").unwrap();
//!
//! assert_eq!(built.endpoint, "https://api.example.com/todos");
//! assert_eq!(built.config.body.as_deref(), Some(r#"{"title":"write docs"}"#));
//! ```

pub mod action;
pub mod error;
pub mod pipeline;
pub mod request;
pub mod sanitize;
pub mod transport;

/// Reducer module - applies actions to state at the end of the pipeline
pub mod reducer {
    use crate::action::Action;

    /// Pure state transition for actions that reach the end of the pipeline
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for TodoReducer {
    ///     type State = TodoState;
    ///
    ///     fn reduce(&self, state: &mut TodoState, action: &Action) {
    ///         if action.action_type == action_type_started("TODO_LIST") {
    ///             state.loading = true;
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// Apply `action` to `state`
        fn reduce(&self, state: &mut Self::State, action: &Action);
    }
}

/// Token module - pluggable auth token resolution
pub mod token {
    use std::sync::Arc;

    /// Maps the current state to a bearer token, if any
    pub type TokenResolver<S> = Arc<dyn Fn(&S) -> Option<String> + Send + Sync>;

    /// Resolver that never yields a token
    #[must_use]
    pub fn no_token<S>() -> TokenResolver<S> {
        Arc::new(|_| None)
    }

    /// Wrap a closure as a [`TokenResolver`]
    ///
    /// ```
    /// use fetch_middleware_core::token::token_resolver;
    ///
    /// struct Session { token: Option<String> }
    ///
    /// let resolver = token_resolver(|s: &Session| s.token.clone());
    /// assert_eq!(resolver(&Session { token: Some("abc".into()) }), Some("abc".to_string()));
    /// ```
    pub fn token_resolver<S, F>(f: F) -> TokenResolver<S>
    where
        F: Fn(&S) -> Option<String> + Send + Sync + 'static,
    {
        Arc::new(f)
    }
}

// Re-export commonly used types
pub use action::{
    API_FETCH_TYPE, Action, FetchRequest, action_type_failure, action_type_started,
    action_type_success, is_fetch_action,
};
pub use error::ApiError;
pub use pipeline::{Dispatched, Middleware, Next, PendingRequest, StoreApi, StoreHandle};
pub use reducer::Reducer;
pub use request::{BuiltRequest, RequestConfig, build_request};
pub use transport::{Response, Transport};
