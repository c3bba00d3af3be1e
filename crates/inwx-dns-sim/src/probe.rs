//! Caller side: TXT lookups and propagation polling against a nameserver.

use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{Resolver, TokioResolver};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::SimError;

/// Polling schedule for [`wait_for_txt`].
#[derive(Debug, Clone)]
pub struct PropagationPolicy {
    /// Total queries before giving up
    pub max_attempts: u32,

    /// Delay after the first miss
    pub initial_backoff: Duration,

    /// Cap on the delay between queries
    pub max_backoff: Duration,

    /// How long to wait for each response
    pub query_timeout: Duration,
}

impl Default for PropagationPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl PropagationPolicy {
    /// Create a policy with default values
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            query_timeout: Duration::from_secs(2),
        }
    }

    /// Set maximum attempts
    #[must_use]
    pub const fn max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set initial backoff duration
    #[must_use]
    pub const fn initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff = duration;
        self
    }

    /// Set maximum backoff duration
    #[must_use]
    pub const fn max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    /// Set per-query response timeout
    #[must_use]
    pub const fn query_timeout(mut self, duration: Duration) -> Self {
        self.query_timeout = duration;
        self
    }

    /// Calculate backoff after a given (zero-based) attempt
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |backoff| backoff.min(self.max_backoff))
    }
}

/// TXT lookups against a single nameserver.
///
/// Caching and retries are off, so every lookup is exactly one query on the
/// wire and advances a scripted cursor by one step.
pub struct TxtProbe {
    resolver: TokioResolver,
}

impl TxtProbe {
    /// Create a probe that sends UDP queries to `server`.
    #[must_use]
    pub fn new(server: SocketAddr, query_timeout: Duration) -> Self {
        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig::new(server, Protocol::Udp));

        let mut opts = ResolverOpts::default();
        opts.timeout = query_timeout;
        opts.attempts = 0;
        opts.cache_size = 0;
        opts.recursion_desired = false;

        let resolver = Resolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build();
        Self { resolver }
    }

    /// Look up the TXT values at `name`.
    ///
    /// Multi-string TXT records are joined into one value. An empty answer
    /// is an empty list, not an error.
    pub async fn lookup(&self, name: &str) -> crate::Result<Vec<String>> {
        match self.resolver.txt_lookup(name).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|txt| {
                    txt.txt_data()
                        .iter()
                        .map(|part| String::from_utf8_lossy(part))
                        .collect::<String>()
                })
                .collect()),
            Err(e) if e.is_no_records_found() => {
                debug!(name = name, "no TXT records");
                Ok(Vec::new())
            }
            Err(e) => Err(SimError::Resolve(format!("{name}: {e}"))),
        }
    }

    /// Poll until `expected` is among the TXT values at `name`.
    ///
    /// Returns the number of queries it took. Failed queries count as misses.
    pub async fn wait_for(
        &self,
        name: &str,
        expected: &str,
        policy: &PropagationPolicy,
    ) -> crate::Result<u32> {
        for attempt in 0..policy.max_attempts {
            let attempt_no = attempt + 1;
            match self.lookup(name).await {
                Ok(values) if values.iter().any(|v| v == expected) => {
                    info!(name = name, attempts = attempt_no, "record propagated");
                    return Ok(attempt_no);
                }
                Ok(values) => {
                    debug!(
                        name = name,
                        attempt = attempt_no,
                        found = values.len(),
                        "record not visible yet"
                    );
                }
                Err(e) => {
                    warn!(
                        name = name,
                        attempt = attempt_no,
                        error = %e,
                        "propagation check failed"
                    );
                }
            }

            if attempt_no < policy.max_attempts {
                tokio::time::sleep(policy.backoff_for(attempt)).await;
            }
        }

        Err(SimError::PropagationTimeout {
            name: name.to_string(),
            attempts: policy.max_attempts,
        })
    }
}

/// Look up the TXT values at `name` with a one-off [`TxtProbe`].
pub async fn query_txt(
    server: SocketAddr,
    name: &str,
    timeout: Duration,
) -> crate::Result<Vec<String>> {
    TxtProbe::new(server, timeout).lookup(name).await
}

/// Poll `server` until `expected` is among the TXT values at `name`.
pub async fn wait_for_txt(
    server: SocketAddr,
    name: &str,
    expected: &str,
    policy: &PropagationPolicy,
) -> crate::Result<u32> {
    TxtProbe::new(server, policy.query_timeout)
        .wait_for(name, expected, policy)
        .await
}
