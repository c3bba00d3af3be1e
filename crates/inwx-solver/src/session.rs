//! Registrar sessions: login, optional TOTP unlock, guaranteed logout.
//!
//! A session moves `Unauthenticated -> LoggedIn -> Unlocked` when the account
//! has a second factor, and stops at `LoggedIn` otherwise. The unlock is tried
//! twice at most: the registrar accepts each TOTP code once per window, so a
//! rejected code is retried with a fresh one after [`SessionPolicy`]'s cooldown.
//!
//! A [`Session`] that logged in is logged out exactly once. Normal paths await
//! the logout; a session dropped mid-operation (for example by an external
//! timeout) hands its logout to a background task.

use inwx_core::{Credentials, Registrar, RegistrarConnector, Result, SolverError};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::SessionPolicy;
use crate::totp::{self, Clock};

/// Authentication state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Client created, no login yet.
    Unauthenticated,
    /// Username/password accepted.
    LoggedIn,
    /// Second factor accepted.
    Unlocked,
}

/// An authenticated registrar client for one challenge operation.
pub struct Session {
    registrar: Arc<dyn Registrar>,
    state: SessionState,
    sandbox: bool,
    released: AtomicBool,
}

impl Session {
    /// Current authentication state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether this session talks to the sandbox endpoint
    #[must_use]
    pub const fn is_sandbox(&self) -> bool {
        self.sandbox
    }

    /// Registrar client to issue record calls on
    #[must_use]
    pub fn registrar(&self) -> &dyn Registrar {
        self.registrar.as_ref()
    }

    /// Claim the one logout this session owes; false if nothing is owed.
    fn claim_logout(&self) -> bool {
        self.state != SessionState::Unauthenticated && !self.released.swap(true, Ordering::AcqRel)
    }

    /// Log out. Failures are logged and swallowed.
    async fn logout(&self) {
        if self.claim_logout() {
            logout(self.registrar.as_ref(), self.sandbox).await;
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.claim_logout() {
            return;
        }

        let registrar = Arc::clone(&self.registrar);
        let sandbox = self.sandbox;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(sandbox = sandbox, "session abandoned, logging out in background");
                handle.spawn(async move {
                    logout(registrar.as_ref(), sandbox).await;
                });
            }
            Err(_) => {
                error!(sandbox = sandbox, "session dropped outside a runtime, not logged out");
            }
        }
    }
}

async fn logout(registrar: &dyn Registrar, sandbox: bool) {
    if let Err(e) = registrar.logout().await {
        error!(sandbox = sandbox, error = %e, "failed to log out");
        return;
    }
    debug!(sandbox = sandbox, "logged out");
}

/// Opens and releases registrar sessions.
#[derive(Clone)]
pub struct SessionManager {
    connector: Arc<dyn RegistrarConnector>,
    policy: SessionPolicy,
    clock: Clock,
}

impl SessionManager {
    /// Create a manager using the system clock
    #[must_use]
    pub fn new(connector: Arc<dyn RegistrarConnector>, policy: SessionPolicy) -> Self {
        Self {
            connector,
            policy,
            clock: totp::system_clock(),
        }
    }

    /// Replace the clock TOTP codes are computed from
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Session policy in effect
    #[must_use]
    pub const fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Open a session, run `op` with it, and log out whatever `op` returns.
    ///
    /// Logout failures never replace `op`'s outcome. Dropping the returned
    /// future still logs the session out.
    pub async fn scoped<T, F, Fut>(
        &self,
        credentials: &Credentials,
        sandbox: bool,
        op: F,
    ) -> Result<T>
    where
        F: FnOnce(Arc<Session>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let session = Arc::new(self.open(credentials, sandbox).await?);
        let outcome = op(Arc::clone(&session)).await;
        session.logout().await;
        outcome
    }

    /// Log in and, if the credentials carry a seed, unlock.
    ///
    /// A session that logged in but failed to unlock is logged out before the
    /// error is returned. Pass a successful session to
    /// [`SessionManager::close`], or prefer [`SessionManager::scoped`]; a
    /// session that is simply dropped logs out in the background.
    pub async fn open(&self, credentials: &Credentials, sandbox: bool) -> Result<Session> {
        let mut session = Session {
            registrar: self.connector.connect(sandbox),
            state: SessionState::Unauthenticated,
            sandbox,
            released: AtomicBool::new(false),
        };

        session
            .registrar
            .login(&credentials.username, &credentials.password)
            .await
            .map_err(|e| {
                error!(sandbox = sandbox, error = %e, "login failed");
                SolverError::Authentication(e.to_string())
            })?;
        session.state = SessionState::LoggedIn;

        if let Some(seed) = credentials.otp_seed.as_deref() {
            if let Err(e) = self.unlock(&session, seed).await {
                session.logout().await;
                return Err(e);
            }
            session.state = SessionState::Unlocked;
        }

        debug!(sandbox = sandbox, state = ?session.state, "logged in");

        Ok(session)
    }

    /// Log out a session obtained from [`SessionManager::open`].
    pub async fn close(&self, session: Session) {
        session.logout().await;
    }

    async fn unlock(&self, session: &Session, seed: &str) -> Result<()> {
        let code = totp::generate_code(seed, (self.clock)())?;
        match session.registrar.unlock(&code).await {
            Ok(()) => return Ok(()),
            Err(e) => warn!(
                error = %e,
                cooldown_secs = self.policy.unlock_cooldown.as_secs_f64(),
                "otp unlock rejected, retrying once after cooldown"
            ),
        }

        tokio::time::sleep(self.policy.unlock_cooldown).await;

        let code = totp::generate_code(seed, (self.clock)())?;
        session.registrar.unlock(&code).await.map_err(|e| {
            error!(error = %e, "otp unlock rejected after retry");
            SolverError::Unlock(e.to_string())
        })
    }
}
