//! Dispatch pipeline contracts
//!
//! A middleware sees every dispatched action together with a handle on the
//! store (`dispatch` + `get_state`) and the rest of the chain (`next`). What it
//! returns travels back to whoever called `dispatch`.
//!
//! ```ignore
//! impl<S> Middleware<S> for Logger {
//!     fn handle(&self, store: &StoreHandle<S>, next: Next<'_>, action: Action) -> Dispatched {
//!         tracing::info!(action_type = %action.action_type, "dispatch");
//!         next(action)
//!     }
//! }
//! ```

use crate::action::Action;
use crate::error::ApiError;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// The rest of the middleware chain
pub type Next<'a> = &'a dyn Fn(Action) -> Dispatched;

/// Shared handle on a store, clonable into spawned tasks
pub type StoreHandle<S> = Arc<dyn StoreApi<S>>;

/// What a middleware may do with the store it is installed in
pub trait StoreApi<S>: Send + Sync {
    /// Inject a new action at the head of the pipeline
    fn dispatch(&self, action: Action) -> Dispatched;

    /// Snapshot of the current state
    fn get_state(&self) -> S;
}

/// A link in the dispatch pipeline
pub trait Middleware<S>: Send + Sync {
    /// Process `action`, usually by forwarding it with `next`
    fn handle(&self, store: &StoreHandle<S>, next: Next<'_>, action: Action) -> Dispatched;
}

/// Run `action` through `chain`, ending with `reduce`
pub fn apply_middleware<S>(
    chain: &[Arc<dyn Middleware<S>>],
    store: &StoreHandle<S>,
    action: Action,
    reduce: Next<'_>,
) -> Dispatched {
    match chain.split_first() {
        None => reduce(action),
        Some((head, rest)) => head.handle(
            store,
            &|action| apply_middleware(rest, store, action, reduce),
            action,
        ),
    }
}

/// Result of dispatching an action
#[derive(Debug)]
pub enum Dispatched {
    /// The action reached the end of the chain
    Action(Action),
    /// A middleware turned the action into a request
    Pending(PendingRequest),
}

impl Dispatched {
    /// The pending request, if the action was picked up by a fetch middleware
    #[must_use]
    pub fn into_pending(self) -> Option<PendingRequest> {
        match self {
            Self::Pending(pending) => Some(pending),
            Self::Action(_) => None,
        }
    }

    /// The forwarded action, if no middleware intercepted it
    #[must_use]
    pub const fn as_action(&self) -> Option<&Action> {
        match self {
            Self::Action(action) => Some(action),
            Self::Pending(_) => None,
        }
    }
}

/// Outcome of an in-flight request
///
/// Resolves to the parsed response body, or to the error that was also
/// reported in the FAILURE action. Dropping it does not cancel the request.
#[derive(Debug)]
pub struct PendingRequest {
    outcome: oneshot::Receiver<Result<Value, ApiError>>,
}

/// Sending half of a [`PendingRequest`]
pub type Settle = oneshot::Sender<Result<Value, ApiError>>;

impl PendingRequest {
    /// Create a pending request and the sender that settles it
    #[must_use]
    pub fn channel() -> (Settle, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { outcome: rx })
    }
}

impl Future for PendingRequest {
    type Output = Result<Value, ApiError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.outcome).poll(cx).map(|outcome| match outcome {
            Ok(outcome) => outcome,
            // Sender dropped without settling
            Err(_) => Err(ApiError::Abandoned),
        })
    }
}
