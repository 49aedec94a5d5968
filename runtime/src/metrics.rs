//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for:
//! - Fetch requests (started, succeeded, failed by kind, duration)
//! - Store dispatch (actions dispatched, reducer duration)
//!
//! # Example
//!
//! ```rust,no_run
//! use fetch_middleware_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new();
//! server.start()?;
//!
//! // Serve this from the application's own scrape endpoint
//! let body = server.render();
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics recorder.
///
/// Installs the global recorder and renders metrics in Prometheus text format.
/// It does not listen on a socket; expose [`MetricsServer::render`] from the
/// application's HTTP server.
#[derive(Default)]
pub struct MetricsServer {
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a metrics server with no recorder installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), installation is
    /// skipped with a warning and `render` returns `None`.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the recorder hasn't been installed by this server.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "fetch_requests_total",
        "Total number of fetch requests started"
    );
    describe_counter!(
        "fetch_requests_succeeded_total",
        "Total number of fetch requests that dispatched SUCCESS"
    );
    describe_counter!(
        "fetch_requests_failed_total",
        "Total number of fetch requests that dispatched FAILURE, by kind"
    );
    describe_histogram!(
        "fetch_request_duration_seconds",
        "Time from STARTED to the terminal action"
    );

    describe_counter!(
        "store_actions_dispatched_total",
        "Total number of actions dispatched into a store"
    );
    describe_histogram!(
        "store_reducer_duration_seconds",
        "Time taken to reduce an action"
    );
}

/// Fetch request metrics recorder.
pub struct FetchMetrics;

impl FetchMetrics {
    /// Record a request whose STARTED action was dispatched.
    pub fn record_started() {
        counter!("fetch_requests_total").increment(1);
    }

    /// Record a request that ended in SUCCESS.
    pub fn record_success(duration: Duration) {
        counter!("fetch_requests_succeeded_total").increment(1);
        histogram!("fetch_request_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a request that ended in FAILURE.
    pub fn record_failure(kind: &'static str, duration: Duration) {
        counter!("fetch_requests_failed_total", "kind" => kind).increment(1);
        histogram!("fetch_request_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Store metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record an action that reached the reducer.
    pub fn record_reduced(duration: Duration) {
        counter!("store_actions_dispatched_total").increment(1);
        histogram!("store_reducer_duration_seconds").record(duration.as_secs_f64());
    }
}
