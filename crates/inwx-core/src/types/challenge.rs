use serde::{Deserialize, Serialize};

/// A DNS-01 challenge handed to the solver by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    /// Resolved zone apex, possibly with a trailing dot
    #[serde(rename = "resolvedZone")]
    pub zone: String,

    /// Fully qualified record name, possibly with a trailing dot
    #[serde(rename = "resolvedFQDN")]
    pub fqdn: String,

    /// Challenge key to publish as TXT content
    pub key: String,

    /// Raw solver config attached to the issuer
    #[serde(default)]
    pub config: Option<serde_json::Value>,

    /// Namespace secret references are resolved in
    #[serde(rename = "resourceNamespace", default)]
    pub namespace: String,
}

impl ChallengeRequest {
    /// Zone with every trailing dot removed
    #[must_use]
    pub fn normalized_zone(&self) -> &str {
        self.zone.trim_end_matches('.')
    }

    /// FQDN with every trailing dot removed
    #[must_use]
    pub fn normalized_fqdn(&self) -> &str {
        self.fqdn.trim_end_matches('.')
    }
}
