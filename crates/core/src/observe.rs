//! Event sink handed to components instead of a process-wide logger.

use std::path::Path;

pub trait RunObserver: Send + Sync {
    /// The remote store had no object at `bucket/key`.
    fn remote_miss(&self, _bucket: &str, _key: &str) {}

    /// A local seed copy was uploaded to repair a remote miss.
    fn healed(&self, _local_path: &Path, _bucket: &str, _key: &str) {}

    fn ticker_evaluated(&self, _ticker: &str, _price: f64, _qualifies: bool) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn remote_miss(&self, bucket: &str, key: &str) {
        tracing::debug!(bucket, key, "object not found in remote store; looking for local seed");
    }

    fn healed(&self, local_path: &Path, bucket: &str, key: &str) {
        tracing::info!(
            local_path = %local_path.display(),
            bucket,
            key,
            "restored remote object from local seed"
        );
    }

    fn ticker_evaluated(&self, ticker: &str, price: f64, qualifies: bool) {
        tracing::debug!(ticker, price, qualifies, "ticker evaluated");
    }
}
