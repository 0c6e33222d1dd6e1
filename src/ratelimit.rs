//! Quota tracking and the rate-limit wait.
//!
//! The remote service reports the state of the caller's quota window in
//! response headers. [`QuotaStatus`] is that report, read once per call;
//! [`RateLimitGuard`] turns an exhausted quota into a bounded, cooperative
//! wait instead of an error.

use std::time::Duration;

use tracing::{debug, warn};

/// Margin added to every rate-limit wait to absorb clock skew between the
/// client and the service.
pub const RESET_MARGIN: Duration = Duration::from_secs(10);

/// Quota state reported by the service alongside one API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    /// Calls remaining in the current window.
    pub remaining: u32,

    /// Time until the window resets.
    pub reset_in: Duration,
}

impl QuotaStatus {
    /// Create a quota status directly.
    #[must_use]
    pub const fn new(remaining: u32, reset_in: Duration) -> Self {
        Self { remaining, reset_in }
    }

    /// Parse quota status from response headers.
    ///
    /// Returns `None` when the service sent no quota information, which is a
    /// valid state, not an error. The reset header carries a Unix timestamp;
    /// a timestamp already in the past yields a zero wait.
    #[must_use]
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Option<Self> {
        let remaining: u32 = headers
            .get("x-rate-limit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())?;

        let reset_at: u64 = headers
            .get("x-rate-limit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Some(Self {
            remaining,
            reset_in: Duration::from_secs(reset_at.saturating_sub(now)),
        })
    }

    /// Whether the window is exhausted.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Blocks the calling task until the quota window resets, when exhausted.
///
/// One guard is shared by all calls in a process; quota state is not keyed
/// by endpoint. That is a documented simplification: the batch flows
/// serialize their calls, so a single per-call check is sufficient. Keying
/// by endpoint is the extension point if per-endpoint accuracy is ever
/// required.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitGuard;

impl RateLimitGuard {
    /// Create a new guard.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Inspect a quota report and wait out the window if it is exhausted.
    ///
    /// No quota information and a non-zero remaining count both return
    /// immediately. An exhausted window sleeps for the reported reset time
    /// plus [`RESET_MARGIN`]. This never errors; it only delays.
    pub async fn check_and_wait(&self, quota: Option<&QuotaStatus>) {
        let Some(quota) = quota else {
            return;
        };

        if !quota.is_exhausted() {
            debug!(remaining = quota.remaining, "quota ok");
            return;
        }

        let wait = quota.reset_in + RESET_MARGIN;
        warn!(
            wait_secs = wait.as_secs(),
            reason = "quota exhausted",
            "waiting for rate limit window to reset"
        );
        tokio::time::sleep(wait).await;
    }
}
