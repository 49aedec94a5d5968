//! A store that records actions instead of reducing them

use fetch_middleware_core::pipeline::{
    Dispatched, Middleware, StoreApi, StoreHandle, apply_middleware,
};
use fetch_middleware_core::Action;
use std::sync::{Arc, Mutex, PoisonError};

/// Store recording every action that reaches the end of its middleware chain
///
/// State is fixed unless replaced with [`MockStore::set_state`].
///
/// # Example
///
/// ```ignore
/// let store = MockStore::with_middleware((), vec![Arc::new(fetch_middleware)]);
///
/// store.dispatch(request_action).into_pending().unwrap().await?;
///
/// assert_eq!(store.action_types(), vec!["FOO_GET", "@api/FOO_GET/STARTED", "@api/FOO_GET/SUCCESS"]);
/// ```
pub struct MockStore<S> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    state: Mutex<S>,
    middleware: Vec<Arc<dyn Middleware<S>>>,
    actions: Mutex<Vec<Action>>,
}

impl<S> MockStore<S>
where
    S: Clone + Send + 'static,
{
    /// Create a store without middleware
    #[must_use]
    pub fn new(state: S) -> Self {
        Self::with_middleware(state, Vec::new())
    }

    /// Create a store running `middleware` in order
    #[must_use]
    pub fn with_middleware(state: S, middleware: Vec<Arc<dyn Middleware<S>>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                middleware,
                actions: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Dispatch an action through the middleware chain
    pub fn dispatch(&self, action: Action) -> Dispatched {
        let handle: StoreHandle<S> = Arc::new(self.clone());
        apply_middleware(&self.inner.middleware, &handle, action, &|action| {
            self.record(action)
        })
    }

    /// Actions recorded so far, in dispatch order
    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        self.inner
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Types of the recorded actions, in dispatch order
    #[must_use]
    pub fn action_types(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .map(|action| action.action_type)
            .collect()
    }

    /// Forget the recorded actions
    pub fn clear_actions(&self) {
        self.inner
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Replace the state returned to middleware
    pub fn set_state(&self, state: S) {
        *self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn record(&self, action: Action) -> Dispatched {
        self.inner
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action.clone());
        Dispatched::Action(action)
    }
}

impl<S> StoreApi<S> for MockStore<S>
where
    S: Clone + Send + 'static,
{
    fn dispatch(&self, action: Action) -> Dispatched {
        Self::dispatch(self, action)
    }

    fn get_state(&self) -> S {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<S> Clone for MockStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
