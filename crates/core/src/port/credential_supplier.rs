// Credential Supplier Port
// The host authentication flow owns token exchange; the core only asks for
// the current caller credential.

use crate::domain::AccessToken;
use crate::error::{AppError, Result};
use async_trait::async_trait;

/// Supplies the caller's current access token on demand
#[async_trait]
pub trait CredentialSupplier: Send + Sync {
    /// Resolve the current credential.
    ///
    /// May suspend until the host has a token. Callers must not contact the
    /// platform APIs before this resolves.
    async fn access_token(&self) -> Result<AccessToken>;
}

/// Credential fixed at construction (CLI flag, env var, config file)
pub struct StaticCredential {
    token: Option<AccessToken>,
}

impl StaticCredential {
    pub fn new(token: AccessToken) -> Self {
        Self { token: Some(token) }
    }

    /// Build from an optional raw value; blank values count as missing
    pub fn from_optional(token: Option<String>) -> Self {
        Self {
            token: token
                .map(AccessToken::new)
                .filter(|t| !t.is_empty()),
        }
    }
}

#[async_trait]
impl CredentialSupplier for StaticCredential {
    async fn access_token(&self) -> Result<AccessToken> {
        self.token
            .clone()
            .ok_or_else(|| AppError::Unauthorized("no access token configured".to_string()))
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

#[cfg(any(test, feature = "mocks"))]
pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::watch;

    /// Credential supplier that can be held back until the test releases it
    pub struct MockCredentialSupplier {
        token: AccessToken,
        ready: watch::Sender<bool>,
        failing: AtomicBool,
        call_count: AtomicUsize,
    }

    impl MockCredentialSupplier {
        /// Resolves immediately
        pub fn ready(token: impl Into<String>) -> Self {
            let supplier = Self::pending(token);
            supplier.release();
            supplier
        }

        /// Suspends every call until [`release`](Self::release)
        pub fn pending(token: impl Into<String>) -> Self {
            let (ready, _) = watch::channel(false);
            Self {
                token: AccessToken::new(token),
                ready,
                failing: AtomicBool::new(false),
                call_count: AtomicUsize::new(0),
            }
        }

        /// Resolves with an error once released
        pub fn failing() -> Self {
            let supplier = Self::ready("");
            supplier.set_failing(true);
            supplier
        }

        pub fn release(&self) {
            self.ready.send_replace(true);
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialSupplier for MockCredentialSupplier {
        async fn access_token(&self) -> Result<AccessToken> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            let mut rx = self.ready.subscribe();
            rx.wait_for(|ready| *ready)
                .await
                .map(|_| ())
                .map_err(|e| AppError::Internal(e.to_string()))?;

            if self.failing.load(Ordering::SeqCst) {
                return Err(AppError::Unauthorized("mock credential failure".to_string()));
            }
            Ok(self.token.clone())
        }
    }
}
