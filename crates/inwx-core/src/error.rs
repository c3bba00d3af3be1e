use thiserror::Error;

/// Result type alias for solver operations
pub type Result<T> = std::result::Result<T, SolverError>;

/// Errors returned to the host for a Present or CleanUp call
#[derive(Error, Debug)]
pub enum SolverError {
    /// Declarative solver config could not be decoded
    #[error("error decoding solver config: {0}")]
    ConfigDecode(String),

    /// Referenced secret could not be fetched
    #[error("failed to load secret \"{namespace}/{name}\": {reason}")]
    SecretLookup {
        /// Namespace the lookup was scoped to
        namespace: String,
        /// Secret name
        name: String,
        /// Store-reported reason
        reason: String,
    },

    /// Secret exists but does not carry the requested key
    #[error("no key \"{key}\" in secret \"{namespace}/{name}\"")]
    SecretKeyMissing {
        /// Namespace the lookup was scoped to
        namespace: String,
        /// Secret name
        name: String,
        /// Missing key
        key: String,
    },

    /// Neither an inline value nor a secret reference was configured
    #[error("no value or secret reference configured for {field}")]
    MissingCredential {
        /// Credential field name (`username` or `password`)
        field: &'static str,
    },

    /// Registrar rejected the username/password login
    #[error("login failed: {0}")]
    Authentication(String),

    /// OTP seed is not valid base32
    #[error("error generating otp code: {0}")]
    InvalidOtpSeed(String),

    /// Registrar rejected the OTP code after the cooldown retry
    #[error("error unlocking account with otp code: {0}")]
    Unlock(String),

    /// Record create, query or delete failed
    #[error("provisioning failed: {0}")]
    Provisioning(String),

    /// Present or CleanUp was called before Initialize
    #[error("solver used before initialize")]
    NotInitialized,
}

impl SolverError {
    /// Returns true if the host may retry the whole operation right away.
    ///
    /// Always false: the only retry in the solver is the internal unlock retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }

    /// Returns true if the error is due to authentication
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::Unlock(_))
    }

    /// Returns true if the error was raised before any registrar call
    #[must_use]
    pub const fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigDecode(_)
                | Self::SecretLookup { .. }
                | Self::SecretKeyMissing { .. }
                | Self::MissingCredential { .. }
                | Self::NotInitialized
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SolverError::SecretKeyMissing {
            namespace: "cert-manager".into(),
            name: "inwx-credentials".into(),
            key: "password".into(),
        };
        assert_eq!(
            err.to_string(),
            "no key \"password\" in secret \"cert-manager/inwx-credentials\""
        );

        let err = SolverError::MissingCredential { field: "username" };
        assert_eq!(
            err.to_string(),
            "no value or secret reference configured for username"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(SolverError::Unlock("rejected".into()).is_auth_error());
        assert!(SolverError::Authentication("bad".into()).is_auth_error());
        assert!(!SolverError::Provisioning("x".into()).is_auth_error());
        assert!(SolverError::ConfigDecode("x".into()).is_setup_error());
        assert!(!SolverError::Unlock("x".into()).is_setup_error());
        assert!(!SolverError::Provisioning("x".into()).is_retryable());
    }
}
