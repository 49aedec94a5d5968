//! The fetch middleware
//!
//! Intercepts actions tagged `meta.type == "@api"`, forwards them unchanged,
//! dispatches `@api/<type>/STARTED`, issues the request on the tokio runtime and
//! reports exactly one of `@api/<type>/SUCCESS` or `@api/<type>/FAILURE`.
//!
//! # Example
//!
//! ```ignore
//! let middleware = FetchMiddleware::new(ReqwestTransport::new())
//!     .with_base_url("https://api.example.com")
//!     .with_token_resolver(|state: &AppState| state.session.token.clone());
//!
//! let store = Store::with_middleware(AppState::default(), AppReducer, vec![Arc::new(middleware)]);
//!
//! let todos = store
//!     .dispatch(Action::new("TODOS_GET").with_meta(json!({ "type": "@api", "url": "/todos" })))
//!     .into_pending()
//!     .expect("fetch action")
//!     .await?;
//! ```

use crate::config::FetchConfig;
use crate::metrics::FetchMetrics;
use fetch_middleware_core::action::{
    Action, FetchRequest, action_type_failure, action_type_started, action_type_success,
    is_fetch_action,
};
use fetch_middleware_core::pipeline::{Dispatched, Middleware, Next, PendingRequest, StoreHandle};
use fetch_middleware_core::request::{APPLICATION_JSON, build_request};
use fetch_middleware_core::sanitize::{DEFAULT_SANITIZERS, Sanitizer, sanitize_action};
use fetch_middleware_core::token::{TokenResolver, no_token};
use fetch_middleware_core::{ApiError, Response, Transport};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Middleware turning fetch-request actions into HTTP requests
pub struct FetchMiddleware<S> {
    transport: Arc<dyn Transport>,
    token_resolver: TokenResolver<S>,
    base_url: String,
    sanitizers: Arc<[Sanitizer]>,
}

impl<S> FetchMiddleware<S> {
    /// Create a middleware with no token and an empty base URL
    #[must_use]
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            token_resolver: no_token(),
            base_url: String::new(),
            sanitizers: Arc::from(DEFAULT_SANITIZERS),
        }
    }

    /// Resolve the bearer token from the current state
    #[must_use]
    pub fn with_token_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&S) -> Option<String> + Send + Sync + 'static,
    {
        self.token_resolver = Arc::new(resolver);
        self
    }

    /// Prefix for request URLs that are not absolute
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Apply the middleware-relevant parts of `config`
    #[must_use]
    pub fn with_config(self, config: &FetchConfig) -> Self {
        self.with_base_url(config.base_url.clone())
    }

    /// Replace the sanitizers applied to terminal actions
    #[must_use]
    pub fn with_sanitizers(mut self, sanitizers: &[Sanitizer]) -> Self {
        self.sanitizers = Arc::from(sanitizers);
        self
    }

    /// The configured base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl<S: 'static> Middleware<S> for FetchMiddleware<S> {
    #[tracing::instrument(skip_all, name = "fetch_middleware", fields(action_type = %action.action_type))]
    fn handle(&self, store: &StoreHandle<S>, next: Next<'_>, action: Action) -> Dispatched {
        if !is_fetch_action(&action) {
            tracing::trace!("Not a fetch action, passing through");
            return next(action);
        }

        // The request action stays visible to the rest of the pipeline
        next(action.clone());

        let token = (self.token_resolver)(&store.get_state());
        let meta = action.carried_meta();
        let built = FetchRequest::from_action(&action).and_then(|request| {
            build_request(
                &request,
                action.body_payload(),
                token.as_deref(),
                &self.base_url,
            )
        });

        store.dispatch(Action::new(action_type_started(&action.action_type)));
        FetchMetrics::record_started();
        tracing::debug!("Dispatched STARTED");

        let reporter = OutcomeReporter {
            store: Arc::clone(store),
            action_type: action.action_type,
            meta,
            sanitizers: Arc::clone(&self.sanitizers),
            started_at: Instant::now(),
        };
        let (settle, pending) = PendingRequest::channel();

        let built = match built {
            Ok(built) => built,
            Err(error) => {
                let _ = settle.send(reporter.settle_now(Err(error)));
                return Dispatched::Pending(pending);
            },
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            let error = ApiError::Transport("no tokio runtime to issue the request on".to_string());
            let _ = settle.send(reporter.settle_now(Err(error)));
            return Dispatched::Pending(pending);
        };

        let span = tracing::debug_span!("fetch_request", endpoint = %built.endpoint, method = %built.config.method);
        let call = self.transport.fetch(built.endpoint, built.config);

        runtime.spawn(
            async move {
                let outcome = reporter.settle(call.await).await;
                // The caller may have dropped the pending request
                let _ = settle.send(outcome);
            }
            .instrument(span),
        );

        Dispatched::Pending(pending)
    }
}

/// Dispatches the terminal action of one request
struct OutcomeReporter<S> {
    store: StoreHandle<S>,
    action_type: String,
    meta: Map<String, Value>,
    sanitizers: Arc<[Sanitizer]>,
    started_at: Instant,
}

impl<S> OutcomeReporter<S> {
    async fn settle(
        self,
        response: Result<Box<dyn Response>, ApiError>,
    ) -> Result<Value, ApiError> {
        let outcome = match response {
            Ok(response) => read_response(response).await,
            Err(error) => Err(error),
        };
        self.settle_now(outcome)
    }

    fn settle_now(self, outcome: Result<Value, ApiError>) -> Result<Value, ApiError> {
        let elapsed = self.started_at.elapsed();
        let terminal = match &outcome {
            Ok(body) => {
                FetchMetrics::record_success(elapsed);
                tracing::debug!("Request succeeded");
                Action::new(action_type_success(&self.action_type)).with_payload(body.clone())
            },
            Err(error) => {
                FetchMetrics::record_failure(error.kind(), elapsed);
                tracing::warn!(kind = error.kind(), error = %error, "Request failed");
                Action::new(action_type_failure(&self.action_type)).with_payload(error.to_payload())
            },
        };

        self.store.dispatch(sanitize_action(
            terminal.with_meta_map(self.meta),
            &self.sanitizers,
        ));
        outcome
    }
}

/// Interpret a response: non-2xx is an error, JSON by content type, text otherwise
async fn read_response(response: Box<dyn Response>) -> Result<Value, ApiError> {
    if !response.ok() {
        return Err(ApiError::Http {
            code: response.status().as_u16(),
            message: response.status_text(),
        });
    }

    let is_json = response
        .header("content-type")
        .is_some_and(|content_type| content_type.contains(APPLICATION_JSON));

    if is_json {
        response.json().await
    } else {
        response.text().await.map(Value::String)
    }
}
