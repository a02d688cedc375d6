// Poller constants (no magic values)
use std::time::Duration;

/// Default interval between status queries (5s)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Smallest interval accepted by `start` (guards against hammering the service)
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);
