//! DNS-01 challenge solver for the INWX registrar.
//!
//! A challenge runs through the same pipeline for both Present and CleanUp:
//!
//! 1. [`config::load_config`] decodes the issuer config and applies the TTL floor
//! 2. [`CredentialResolver`] turns inline values and secret references into
//!    [`Credentials`](inwx_core::Credentials)
//! 3. [`SessionManager`] logs in, unlocks with a TOTP code when a seed is set,
//!    and always logs out afterwards
//! 4. [`RecordProvisioner`] creates or sweeps the TXT record
//!
//! [`InwxSolver`] ties these together behind the
//! [`ChallengeSolver`](inwx_core::ChallengeSolver) interface.

#![doc(html_root_url = "https://docs.rs/inwx-solver/0.3.0")]

pub mod config;
mod credentials;
pub mod provisioner;
pub mod secrets;
pub mod session;
mod solver;
pub mod totp;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{load_config, SessionPolicy, SolverConfig};
pub use credentials::CredentialResolver;
pub use inwx_core::{Result, SolverError};
pub use provisioner::RecordProvisioner;
pub use secrets::InMemorySecretStore;
pub use session::{Session, SessionManager, SessionState};
pub use solver::{InwxSolver, InwxSolverBuilder, SOLVER_NAME};
