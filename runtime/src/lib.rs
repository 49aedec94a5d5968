//! # Fetch Middleware Runtime
//!
//! Runtime pieces for representing network calls as dispatched actions.
//!
//! ## Core Components
//!
//! - **`FetchMiddleware`**: turns `@api` actions into requests and lifecycle actions
//! - **`Store`**: a dispatch pipeline (middleware chain + reducer)
//! - **`ReqwestTransport`**: the production transport
//! - **`FetchConfig`**: base URL and client settings, optionally from the environment
//!
//! ## Example
//!
//! ```ignore
//! use fetch_middleware_runtime::{FetchConfig, FetchMiddleware, ReqwestTransport, Store};
//!
//! let config = FetchConfig::from_env()?;
//! let fetch = FetchMiddleware::new(ReqwestTransport::from_config(&config)?)
//!     .with_config(&config)
//!     .with_token_resolver(|state: &AppState| state.token.clone());
//!
//! let store = Store::with_middleware(AppState::default(), AppReducer, vec![Arc::new(fetch)]);
//!
//! // Forwarded, then @api/USER_GET/STARTED, then SUCCESS or FAILURE
//! store.dispatch(Action::new("USER_GET").with_meta(json!({ "type": "@api", "url": "/me" })));
//! ```

use fetch_middleware_core::pipeline::{
    Dispatched, Middleware, StoreApi, StoreHandle, apply_middleware,
};
use fetch_middleware_core::{Action, Reducer};
use std::sync::{Arc, RwLock};

/// Middleware and transport configuration
pub mod config;

/// The fetch middleware
pub mod fetch;

/// Prometheus metrics for observability
pub mod metrics;

/// `reqwest`-backed transport
pub mod transport;

pub mod store {
    //! Dispatch pipeline with a middleware chain and a reducer

    use super::{
        Action, Arc, Dispatched, Middleware, Reducer, RwLock, StoreApi, StoreHandle,
        apply_middleware,
    };
    use crate::metrics::StoreMetrics;
    use std::time::Instant;
    use tokio::sync::broadcast;

    /// The Store - owns state and runs every action through its middleware
    ///
    /// Actions dispatched into the store pass through each middleware in order;
    /// whatever reaches the end of the chain is reduced into state and
    /// broadcast to subscribers. Clones share the same state.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `R`: Reducer implementation
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = Store::with_middleware(
    ///     TodoState::default(),
    ///     TodoReducer,
    ///     vec![Arc::new(FetchMiddleware::new(ReqwestTransport::new()))],
    /// );
    ///
    /// store.dispatch(Action::new("TODOS_GET").with_meta(json!({ "type": "@api", "url": "/todos" })));
    /// ```
    pub struct Store<S, R>
    where
        R: Reducer<State = S>,
    {
        inner: Arc<Inner<S, R>>,
    }

    struct Inner<S, R> {
        state: RwLock<S>,
        reducer: R,
        middleware: Vec<Arc<dyn Middleware<S>>>,
        action_broadcast: broadcast::Sender<Action>,
    }

    impl<S, R> Store<S, R>
    where
        R: Reducer<State = S> + Send + Sync + 'static,
        S: Clone + Send + Sync + 'static,
    {
        /// Create a store without middleware
        ///
        /// Action broadcast capacity: 16 (increase with `with_broadcast_capacity`)
        #[must_use]
        pub fn new(initial_state: S, reducer: R) -> Self {
            Self::with_middleware(initial_state, reducer, Vec::new())
        }

        /// Create a store running `middleware` in order before the reducer
        #[must_use]
        pub fn with_middleware(
            initial_state: S,
            reducer: R,
            middleware: Vec<Arc<dyn Middleware<S>>>,
        ) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, middleware, 16)
        }

        /// Create a store with a custom action broadcast capacity
        ///
        /// Increase the capacity when subscribers are slow relative to the
        /// dispatch rate.
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            middleware: Vec<Arc<dyn Middleware<S>>>,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity);

            Self {
                inner: Arc::new(Inner {
                    state: RwLock::new(initial_state),
                    reducer,
                    middleware,
                    action_broadcast,
                }),
            }
        }

        /// Dispatch an action through the middleware chain
        ///
        /// Returns [`Dispatched::Action`] when the action reached the reducer,
        /// or [`Dispatched::Pending`] when a fetch middleware took it over.
        #[tracing::instrument(skip_all, name = "store_dispatch", fields(action_type = %action.action_type))]
        pub fn dispatch(&self, action: Action) -> Dispatched {
            let handle: StoreHandle<S> = Arc::new(self.clone());
            apply_middleware(&self.inner.middleware, &handle, action, &|action| {
                self.reduce(action)
            })
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let loading = store.state(|s| s.loading);
        /// ```
        pub fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self
                .inner
                .state
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            f(&state)
        }

        /// Subscribe to every action that reaches the reducer
        ///
        /// If the receiver lags it skips old actions and receives `Lagged`.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<Action> {
            self.inner.action_broadcast.subscribe()
        }

        fn reduce(&self, action: Action) -> Dispatched {
            let start = Instant::now();
            {
                let mut state = self
                    .inner
                    .state
                    .write()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                self.inner.reducer.reduce(&mut state, &action);
            }
            StoreMetrics::record_reduced(start.elapsed());
            tracing::trace!(action_type = %action.action_type, "Reduced action");

            // No subscribers is fine
            let _ = self.inner.action_broadcast.send(action.clone());
            Dispatched::Action(action)
        }
    }

    impl<S, R> StoreApi<S> for Store<S, R>
    where
        R: Reducer<State = S> + Send + Sync + 'static,
        S: Clone + Send + Sync + 'static,
    {
        fn dispatch(&self, action: Action) -> Dispatched {
            Self::dispatch(self, action)
        }

        fn get_state(&self) -> S {
            self.state(S::clone)
        }
    }

    impl<S, R> Clone for Store<S, R>
    where
        R: Reducer<State = S>,
    {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }
}

// Re-export for convenience
pub use config::{ConfigError, FetchConfig};
pub use fetch::FetchMiddleware;
pub use metrics::{MetricsError, MetricsServer};
pub use store::Store;
pub use transport::ReqwestTransport;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use fetch_middleware_core::pipeline::Next;
    use serde_json::json;

    #[derive(Debug, Clone, Default)]
    struct CounterState {
        seen: Vec<String>,
    }

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = CounterState;

        fn reduce(&self, state: &mut CounterState, action: &Action) {
            state.seen.push(action.action_type.clone());
        }
    }

    /// Rewrites `PING` into `PONG` and dispatches an extra `ECHO`
    struct Echo;

    impl Middleware<CounterState> for Echo {
        fn handle(
            &self,
            store: &StoreHandle<CounterState>,
            next: Next<'_>,
            action: Action,
        ) -> Dispatched {
            if action.action_type == "PING" {
                let result = next(Action::new("PONG"));
                store.dispatch(Action::new("ECHO"));
                return result;
            }
            next(action)
        }
    }

    #[test]
    fn test_store_reduces_dispatched_actions() {
        let store = Store::new(CounterState::default(), CounterReducer);

        let result = store.dispatch(Action::new("A"));
        store.dispatch(Action::new("B"));

        assert_eq!(result.as_action(), Some(&Action::new("A")));
        assert_eq!(store.state(|s| s.seen.clone()), vec!["A", "B"]);
    }

    #[test]
    fn test_middleware_can_rewrite_and_dispatch() {
        let store = Store::with_middleware(
            CounterState::default(),
            CounterReducer,
            vec![Arc::new(Echo)],
        );

        store.dispatch(Action::new("PING"));
        store.dispatch(Action::new("OTHER").with_payload(json!(1)));

        assert_eq!(
            store.state(|s| s.seen.clone()),
            vec!["PONG", "ECHO", "OTHER"]
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_reduced_actions() {
        let store = Store::new(CounterState::default(), CounterReducer);
        let mut rx = store.subscribe_actions();

        store.dispatch(Action::new("A"));

        assert_eq!(rx.recv().await.unwrap(), Action::new("A"));
    }

    #[test]
    fn test_get_state_returns_snapshot() {
        let store = Store::new(CounterState::default(), CounterReducer);
        store.dispatch(Action::new("A"));

        let snapshot = StoreApi::get_state(&store);
        store.dispatch(Action::new("B"));

        assert_eq!(snapshot.seen, vec!["A"]);
    }
}
