//! # Fetch Middleware Testing
//!
//! Testing utilities and helpers for the fetch middleware.
//!
//! This crate provides:
//! - `MockStore`: records every dispatched action instead of reducing it
//! - `MockTransport`: scripted replies and recorded requests
//! - `ReducerTest`: Given / When / Then for reducers
//! - Assertions over recorded lifecycles
//!
//! ## Example
//!
//! ```ignore
//! use fetch_middleware_testing::{MockReply, MockStore, MockTransport};
//!
//! #[tokio::test]
//! async fn test_foo_get() {
//!     let transport = Arc::new(MockTransport::new());
//!     transport.reply(Method::GET, "http://example.com/foo", MockReply::text(200, "OK!"));
//!
//!     let store = MockStore::with_middleware((), vec![Arc::new(FetchMiddleware::new(Arc::clone(&transport)))]);
//!     let body = store.dispatch(foo_get()).into_pending().unwrap().await.unwrap();
//!
//!     assert_eq!(body, json!("OK!"));
//! }
//! ```

/// Store recording actions
pub mod mock_store;

/// Scripted transport
pub mod mock_transport;

/// Fluent reducer testing API
pub mod reducer_test;

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a `tracing` subscriber writing to the test output
    ///
    /// Honors `RUST_LOG`; safe to call from every test.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use mock_store::MockStore;
pub use mock_transport::{MockReply, MockResponse, MockTransport, RecordedRequest};
pub use reducer_test::{ReducerTest, assertions};
