use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a key inside a namespaced secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    /// Secret name within the request namespace
    #[serde(default)]
    pub name: String,

    /// Key inside the secret
    #[serde(default)]
    pub key: String,
}

impl SecretRef {
    /// Create a new reference
    #[must_use]
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }

    /// A reference counts as configured once it names a key
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.key.is_empty()
    }
}

/// Resolved registrar credentials, scoped to one Present/CleanUp call
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Account username
    pub username: String,

    /// Account password
    pub password: String,

    /// Base32 TOTP seed; `None` means no second factor
    pub otp_seed: Option<String>,
}

impl Credentials {
    /// Create credentials without a second factor
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            otp_seed: None,
        }
    }

    /// Attach a TOTP seed; an empty seed disables the second factor
    #[must_use]
    pub fn with_otp_seed(mut self, seed: impl Into<String>) -> Self {
        let seed = seed.into();
        self.otp_seed = if seed.is_empty() { None } else { Some(seed) };
        self
    }

    /// Whether login must be followed by an OTP unlock
    #[must_use]
    pub const fn requires_unlock(&self) -> bool {
        self.otp_seed.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("otp_seed", &self.otp_seed.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("user", "hunter2").with_otp_seed("JBSWY3DPEHPK3PXP");
        let out = format!("{creds:?}");
        assert!(out.contains("user"));
        assert!(!out.contains("hunter2"));
        assert!(!out.contains("JBSWY3DPEHPK3PXP"));
    }

    #[test]
    fn test_empty_seed_disables_unlock() {
        let creds = Credentials::new("u", "p").with_otp_seed("");
        assert!(!creds.requires_unlock());
        assert!(Credentials::new("u", "p").with_otp_seed("ABC").requires_unlock());
    }

    #[test]
    fn test_secret_ref_configured_by_key() {
        assert!(!SecretRef::default().is_configured());
        assert!(!SecretRef::new("inwx", "").is_configured());
        assert!(SecretRef::new("inwx", "otpKey").is_configured());
    }
}
