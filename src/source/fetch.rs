//! Network fetch capability.

use std::time::Duration;

use crate::common::Result;

/// Retrieves the raw bytes behind a URL.
///
/// Implementations must give up once `timeout` elapses and report an
/// unreachable or timed-out address as `Error::SourceUnavailable`. No retry
/// happens inside the cache; callers own retry policy.
pub trait NetworkFetch: Send + Sync {
    fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>>;
}
