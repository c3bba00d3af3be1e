//! Core types and traits for the INWX DNS-01 solver.
//!
//! This crate provides the foundational pieces shared across the workspace:
//!
//! - **Types**: challenge requests, credentials, secret references and
//!   nameserver records
//! - **Traits**: the [`Registrar`] and [`SecretStore`] collaborators and the
//!   [`ChallengeSolver`] interface the host drives
//! - **Errors**: the [`SolverError`] taxonomy returned to the host
//!
//! # Example
//!
//! ```rust,ignore
//! use inwx_core::{ChallengeRequest, SolverError, Result};
//!
//! fn record_name(ch: &ChallengeRequest) -> Result<&str> {
//!     let name = ch.normalized_fqdn();
//!     if name.is_empty() {
//!         return Err(SolverError::Provisioning("empty fqdn".into()));
//!     }
//!     Ok(name)
//! }
//! ```

mod error;
pub mod registrar;
pub mod secrets;
pub mod solver;
pub mod types;

pub use error::{Result, SolverError};
pub use registrar::{Registrar, RegistrarConnector, RegistrarResult};
pub use secrets::{SecretData, SecretStore, SecretStoreError};
pub use solver::{ChallengeSolver, HostContext};
pub use types::*;
