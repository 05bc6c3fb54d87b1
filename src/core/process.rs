use tokio_util::sync::CancellationToken;
use tracing::info;

/// Process-wide running flag.
///
/// Set once when shutdown is requested and observed by every loop within
/// one poll interval. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct ProcessState {
    token: CancellationToken,
}

impl ProcessState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Request shutdown. Calling it again has no further effect.
    pub fn stop(&self) {
        if self.is_running() {
            info!("Shutdown requested");
        }
        self.token.cancel();
    }

    /// Resolves once shutdown has been requested
    pub async fn stopped(&self) {
        self.token.cancelled().await
    }

    /// Token that is cancelled together with this state, but can also be
    /// cancelled on its own (e.g. when a single feature is switched off).
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }
}
