//! Registrar collaborator traits.
//!
//! The registrar's wire protocol is not implemented here; the solver talks to
//! whatever client the host plugs in through these traits.

use async_trait::async_trait;
use std::sync::Arc;

use crate::types::{NameserverRecord, RecordQuery, RecordRequest, RegistrarError};

/// Result of a registrar call
pub type RegistrarResult<T> = std::result::Result<T, RegistrarError>;

/// One registrar API client, carrying its own session state.
///
/// Calls take `&self`; implementations keep the session cookie behind
/// interior mutability.
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Authenticate with username and password
    async fn login(&self, username: &str, password: &str) -> RegistrarResult<()>;

    /// Submit a TOTP code for an account with a second factor
    async fn unlock(&self, code: &str) -> RegistrarResult<()>;

    /// End the session
    async fn logout(&self) -> RegistrarResult<()>;

    /// Create a nameserver record
    async fn create_record(&self, request: &RecordRequest) -> RegistrarResult<()>;

    /// List records matching the query
    async fn query_records(&self, query: &RecordQuery) -> RegistrarResult<Vec<NameserverRecord>>;

    /// Delete a record by id
    async fn delete_record(&self, id: u64) -> RegistrarResult<()>;
}

/// Opens fresh registrar clients, one per challenge
pub trait RegistrarConnector: Send + Sync {
    /// Create an unauthenticated client against the live or sandbox endpoint
    fn connect(&self, sandbox: bool) -> Arc<dyn Registrar>;
}
