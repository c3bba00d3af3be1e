//! Challenge interface exposed to the webhook host.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::secrets::SecretStore;
use crate::types::ChallengeRequest;

/// Handles the host passes to [`ChallengeSolver::initialize`]
#[derive(Clone)]
pub struct HostContext {
    /// Secret store scoped lookups resolve against
    pub secrets: Arc<dyn SecretStore>,
}

impl HostContext {
    /// Create a context around a secret store
    #[must_use]
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext").finish_non_exhaustive()
    }
}

/// A DNS-01 challenge solver as driven by the webhook host
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    /// Solver name the issuer config refers to
    fn name(&self) -> &str;

    /// Wire up host-provided clients before the first challenge
    async fn initialize(&mut self, context: HostContext) -> Result<()>;

    /// Publish the challenge record
    async fn present(&self, challenge: &ChallengeRequest) -> Result<()>;

    /// Remove every challenge record for the name
    async fn clean_up(&self, challenge: &ChallengeRequest) -> Result<()>;
}
