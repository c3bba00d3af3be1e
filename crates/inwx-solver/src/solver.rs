//! INWX implementation of the host's challenge interface.

use async_trait::async_trait;
use inwx_core::{
    ChallengeRequest, ChallengeSolver, Credentials, HostContext, RegistrarConnector, Result,
    SolverError,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{load_config, SessionPolicy, SolverConfig};
use crate::credentials::CredentialResolver;
use crate::provisioner::RecordProvisioner;
use crate::session::SessionManager;
use crate::totp::Clock;

/// Name issuers reference the solver by.
pub const SOLVER_NAME: &str = "inwx";

/// DNS-01 solver publishing challenge records through INWX.
///
/// Holds no per-challenge state; credentials and sessions live only for the
/// duration of one Present or CleanUp call.
#[derive(Clone)]
pub struct InwxSolver {
    sessions: SessionManager,
    provisioner: RecordProvisioner,
    resolver: Option<CredentialResolver>,
}

impl InwxSolver {
    /// Create a solver with default session policy
    #[must_use]
    pub fn new(connector: Arc<dyn RegistrarConnector>) -> Self {
        InwxSolverBuilder::new(connector).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(connector: Arc<dyn RegistrarConnector>) -> InwxSolverBuilder {
        InwxSolverBuilder::new(connector)
    }

    /// Whether [`ChallengeSolver::initialize`] has run
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.resolver.is_some()
    }

    /// Decode config and resolve credentials; no registrar traffic yet.
    async fn prepare(&self, challenge: &ChallengeRequest) -> Result<(SolverConfig, Credentials)> {
        let resolver = self.resolver.as_ref().ok_or(SolverError::NotInitialized)?;
        let config = load_config(challenge.config.as_ref())?;
        let credentials = resolver.resolve(&config, &challenge.namespace).await?;
        Ok((config, credentials))
    }
}

#[async_trait]
impl ChallengeSolver for InwxSolver {
    fn name(&self) -> &str {
        SOLVER_NAME
    }

    async fn initialize(&mut self, context: HostContext) -> Result<()> {
        self.resolver = Some(CredentialResolver::new(context.secrets));
        info!(solver = SOLVER_NAME, "initialized");
        Ok(())
    }

    async fn present(&self, challenge: &ChallengeRequest) -> Result<()> {
        let (config, credentials) = self.prepare(challenge).await?;
        debug!(fqdn = %challenge.fqdn, sandbox = config.sandbox, "presenting challenge");

        let provisioner = self.provisioner;
        self.sessions
            .scoped(&credentials, config.sandbox, |session| async move {
                provisioner.present(&session, challenge, config.ttl).await
            })
            .await
    }

    async fn clean_up(&self, challenge: &ChallengeRequest) -> Result<()> {
        let (config, credentials) = self.prepare(challenge).await?;
        debug!(fqdn = %challenge.fqdn, sandbox = config.sandbox, "cleaning up challenge");

        let provisioner = self.provisioner;
        self.sessions
            .scoped(&credentials, config.sandbox, |session| async move {
                provisioner.clean_up(&session, challenge).await
            })
            .await
    }
}

/// Builder for configuring an [`InwxSolver`]
pub struct InwxSolverBuilder {
    connector: Arc<dyn RegistrarConnector>,
    policy: SessionPolicy,
    clock: Option<Clock>,
    context: Option<HostContext>,
}

impl InwxSolverBuilder {
    /// Create a new builder around a registrar connector
    #[must_use]
    pub fn new(connector: Arc<dyn RegistrarConnector>) -> Self {
        Self {
            connector,
            policy: SessionPolicy::default(),
            clock: None,
            context: None,
        }
    }

    /// Set the session policy
    #[must_use]
    pub fn session_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the clock used for TOTP codes
    #[must_use]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Pre-initialize with a host context
    #[must_use]
    pub fn context(mut self, context: HostContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Build the solver
    #[must_use]
    pub fn build(self) -> InwxSolver {
        let mut sessions = SessionManager::new(self.connector, self.policy);
        if let Some(clock) = self.clock {
            sessions = sessions.with_clock(clock);
        }

        InwxSolver {
            sessions,
            provisioner: RecordProvisioner::new(),
            resolver: self.context.map(|ctx| CredentialResolver::new(ctx.secrets)),
        }
    }
}
