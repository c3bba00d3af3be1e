use serde::{Deserialize, Serialize};
use std::fmt;

/// Record type used for DNS-01 challenges
pub const TXT: &str = "TXT";

/// INWX result code for "Object exists"
pub const OBJECT_EXISTS_CODE: u32 = 2302;

/// Message text INWX sends alongside [`OBJECT_EXISTS_CODE`]
pub const OBJECT_EXISTS_MESSAGE: &str = "Object exists";

/// Create request for a nameserver record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRequest {
    /// Zone the record lives in
    pub domain: String,
    /// Record name
    pub name: String,
    /// Record type (`TXT`)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record content
    pub content: String,
    /// Time to live in seconds
    pub ttl: u32,
}

impl RecordRequest {
    /// Build a TXT record request
    #[must_use]
    pub fn txt(
        domain: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
            record_type: TXT.to_string(),
            content: content.into(),
            ttl,
        }
    }
}

/// Record lookup filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Zone to search
    pub domain: String,
    /// Record name
    pub name: String,
    /// Record type (`TXT`)
    #[serde(rename = "type")]
    pub record_type: String,
}

impl RecordQuery {
    /// Build a TXT record query
    #[must_use]
    pub fn txt(domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
            record_type: TXT.to_string(),
        }
    }
}

/// A record as reported by the registrar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameserverRecord {
    /// Registrar-assigned record id
    pub id: u64,
    /// Record name
    pub name: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record content
    pub content: String,
    /// Time to live in seconds
    #[serde(default)]
    pub ttl: u32,
}

impl fmt::Display for NameserverRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} {} \"{}\"",
            self.id, self.name, self.ttl, self.record_type, self.content
        )
    }
}

/// Outcome of a failed registrar call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrarError {
    /// The record being created already exists
    #[error("Object exists")]
    ObjectExists,

    /// Registrar answered with an error result
    #[error("registrar error ({code}): {message}")]
    Rejected {
        /// Registrar result code
        code: u32,
        /// Registrar message
        message: String,
    },

    /// The call never produced a registrar answer
    #[error("registrar transport error: {0}")]
    Transport(String),
}

impl RegistrarError {
    /// Classify a registrar error response.
    ///
    /// The result code decides first; the message text is only consulted for
    /// registrar builds that report "Object exists" under another code.
    #[must_use]
    pub fn from_response(code: u32, message: impl Into<String>) -> Self {
        let message = message.into();
        if code == OBJECT_EXISTS_CODE || message == OBJECT_EXISTS_MESSAGE {
            Self::ObjectExists
        } else {
            Self::Rejected { code, message }
        }
    }

    /// Returns true if the error means the desired record is already present
    #[must_use]
    pub const fn is_object_exists(&self) -> bool {
        matches!(self, Self::ObjectExists)
    }
}
