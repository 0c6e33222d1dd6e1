//! Single-call request execution.

use std::future::Future;

use tracing::debug;

use crate::{
    error::{Error, Result},
    ratelimit::RateLimitGuard,
    types::ApiResponse,
};

/// Wraps a single API call with the rate-limit check.
///
/// The executor invokes the call exactly once. On success it runs the
/// response's quota through [`RateLimitGuard`] before handing the payload
/// back, so at most one wait happens per call and always after the call's
/// result is known, never speculatively before. On failure the error is
/// wrapped as [`Error::RequestFailed`] with the operation name and
/// propagated immediately; retrying belongs to the caller's batch-loop
/// policy, not to this primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestExecutor {
    guard: RateLimitGuard,
}

impl RequestExecutor {
    /// Create a new executor with its own guard.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            guard: RateLimitGuard::new(),
        }
    }

    /// Run one API call, absorbing rate-limit exhaustion as a wait.
    pub async fn execute<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ApiResponse<T>>>,
    {
        debug!(operation, "executing API call");

        match call().await {
            Ok(response) => {
                self.guard.check_and_wait(response.quota.as_ref()).await;
                Ok(response.data)
            }
            Err(source) => Err(Error::RequestFailed {
                operation,
                source: Box::new(source),
            }),
        }
    }
}
