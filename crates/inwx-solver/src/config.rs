//! Solver configuration: issuer config decoding and session policy.

use inwx_core::{Result, SecretRef, SolverError};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{trace, warn};

/// TTL applied when the issuer config sets none.
pub const DEFAULT_TTL: u32 = 300;

/// Lowest TTL the registrar accepts for nameserver records.
pub const MIN_TTL: u32 = 300;

/// Wait between the first rejected OTP unlock and the single retry.
///
/// The registrar accepts each TOTP code once per time window, so retrying
/// sooner would submit the same rejected code.
pub const DEFAULT_UNLOCK_COOLDOWN: Duration = Duration::from_secs(30);

/// Validated solver configuration for one challenge.
#[derive(Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Record TTL in seconds, never below [`MIN_TTL`].
    pub ttl: u32,

    /// Use the registrar's sandbox (OTE) endpoint.
    pub sandbox: bool,

    /// Inline username.
    pub username: String,

    /// Inline password.
    pub password: String,

    /// Inline base32 TOTP seed.
    pub otp_key: String,

    /// Username secret reference.
    pub username_ref: SecretRef,

    /// Password secret reference.
    pub password_ref: SecretRef,

    /// TOTP seed secret reference.
    pub otp_key_ref: SecretRef,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            sandbox: false,
            username: String::new(),
            password: String::new(),
            otp_key: String::new(),
            username_ref: SecretRef::default(),
            password_ref: SecretRef::default(),
            otp_key_ref: SecretRef::default(),
        }
    }
}

impl fmt::Debug for SolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverConfig")
            .field("ttl", &self.ttl)
            .field("sandbox", &self.sandbox)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("otp_key", &redact(&self.otp_key))
            .field("username_ref", &self.username_ref)
            .field("password_ref", &self.password_ref)
            .field("otp_key_ref", &self.otp_key_ref)
            .finish()
    }
}

const fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

/// Issuer config as written in `issuer.spec.acme.dns01.webhook.config`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSolverConfig {
    #[serde(default)]
    ttl: i64,
    #[serde(default)]
    sandbox: bool,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    otp_key: String,
    #[serde(default, rename = "usernameSecretKeyRef")]
    username_ref: SecretRef,
    #[serde(default, rename = "passwordSecretKeyRef")]
    password_ref: SecretRef,
    #[serde(default, rename = "otpKeySecretKeyRef")]
    otp_key_ref: SecretRef,
}

/// Decode the issuer config attached to a challenge and apply defaults.
///
/// A missing or `null` config yields [`SolverConfig::default`]. A TTL of zero
/// takes the default; any TTL under [`MIN_TTL`] is raised to the default with
/// a warning.
pub fn load_config(raw: Option<&serde_json::Value>) -> Result<SolverConfig> {
    let raw = match raw {
        None | Some(serde_json::Value::Null) => return Ok(SolverConfig::default()),
        Some(value) => RawSolverConfig::deserialize(value)
            .map_err(|e| SolverError::ConfigDecode(e.to_string()))?,
    };

    let config = SolverConfig {
        ttl: effective_ttl(raw.ttl)?,
        sandbox: raw.sandbox,
        username: raw.username,
        password: raw.password,
        otp_key: raw.otp_key,
        username_ref: raw.username_ref,
        password_ref: raw.password_ref,
        otp_key_ref: raw.otp_key_ref,
    };

    trace!(config = ?config, "decoded config");

    Ok(config)
}

fn effective_ttl(ttl: i64) -> Result<u32> {
    if ttl == 0 {
        return Ok(DEFAULT_TTL);
    }
    if ttl < i64::from(MIN_TTL) {
        warn!(
            ttl = ttl,
            default = DEFAULT_TTL,
            "TTL must be greater or equal than {MIN_TTL}, using default"
        );
        return Ok(DEFAULT_TTL);
    }
    u32::try_from(ttl).map_err(|_| SolverError::ConfigDecode(format!("ttl {ttl} out of range")))
}

/// Timing policy for registrar sessions.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// Wait before the single OTP unlock retry.
    pub unlock_cooldown: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionPolicy {
    /// Create a policy with the registrar's real timings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            unlock_cooldown: DEFAULT_UNLOCK_COOLDOWN,
        }
    }

    /// Set the unlock retry cooldown.
    #[must_use]
    pub const fn unlock_cooldown(mut self, cooldown: Duration) -> Self {
        self.unlock_cooldown = cooldown;
        self
    }
}
