//! Challenge record provisioning on an open session.

use inwx_core::{ChallengeRequest, RecordQuery, RecordRequest, RegistrarError, Result, SolverError};
use tracing::{debug, error, info, warn};

use crate::session::Session;

/// Creates and sweeps DNS-01 TXT records.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordProvisioner;

impl RecordProvisioner {
    /// Create a provisioner
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Create the challenge TXT record.
    ///
    /// A record that already exists counts as success, so retried or
    /// concurrent Present calls converge on the same state.
    pub async fn present(
        &self,
        session: &Session,
        challenge: &ChallengeRequest,
        ttl: u32,
    ) -> Result<()> {
        let request = RecordRequest::txt(
            challenge.normalized_zone(),
            challenge.normalized_fqdn(),
            &challenge.key,
            ttl,
        );

        match session.registrar().create_record(&request).await {
            Ok(()) => {
                info!(
                    zone = %request.domain,
                    name = %request.name,
                    ttl = request.ttl,
                    "created DNS record"
                );
                Ok(())
            }
            Err(RegistrarError::ObjectExists) => {
                warn!(name = %challenge.fqdn, "key already exists for host");
                Ok(())
            }
            Err(e) => {
                error!(name = %request.name, error = %e, "failed to create DNS record");
                Err(SolverError::Provisioning(e.to_string()))
            }
        }
    }

    /// Delete every TXT record at the challenge name.
    ///
    /// Every matching record gets a delete attempt even after a failure; the
    /// last failure is returned.
    pub async fn clean_up(&self, session: &Session, challenge: &ChallengeRequest) -> Result<()> {
        let query = RecordQuery::txt(challenge.normalized_zone(), challenge.normalized_fqdn());

        let records = session
            .registrar()
            .query_records(&query)
            .await
            .map_err(|e| {
                error!(name = %query.name, error = %e, "failed to query DNS records");
                SolverError::Provisioning(e.to_string())
            })?;

        debug!(name = %query.name, count = records.len(), "found DNS records to delete");

        let mut last_err = None;
        for record in &records {
            match session.registrar().delete_record(record.id).await {
                Ok(()) => info!(record = %record, "deleted DNS record"),
                Err(e) => {
                    error!(record = %record, error = %e, "failed to delete DNS record");
                    last_err = Some(SolverError::Provisioning(e.to_string()));
                }
            }
        }

        last_err.map_or(Ok(()), Err)
    }
}
