//! RFC 6238 TOTP codes via `ring::hmac`.
//!
//! Parameters match what authenticator apps use for the registrar's second
//! factor: HMAC-SHA1, 30 second steps, 6 digits, base32 seed.

use data_encoding::BASE32_NOPAD;
use inwx_core::{Result, SolverError};
use ring::hmac;
use std::sync::Arc;

/// Seconds per TOTP time step.
pub const STEP_SECS: u64 = 30;

/// Digits in a generated code.
pub const DIGITS: u32 = 6;

/// Source of the current Unix time in seconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Wall clock backed by `chrono`.
#[must_use]
pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp())
}

/// Decode a base32 seed, ignoring case, whitespace and `=` padding.
pub fn decode_seed(seed: &str) -> Result<Vec<u8>> {
    let cleaned: String = seed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if cleaned.is_empty() {
        return Err(SolverError::InvalidOtpSeed("empty seed".into()));
    }

    let mut spec = BASE32_NOPAD.specification();
    spec.check_trailing_bits = false;
    let encoding = spec
        .encoding()
        .map_err(|e| SolverError::InvalidOtpSeed(e.to_string()))?;

    encoding
        .decode(cleaned.as_bytes())
        .map_err(|e| SolverError::InvalidOtpSeed(e.to_string()))
}

/// Generate the code for `seed` at Unix time `unix_secs`.
pub fn generate_code(seed: &str, unix_secs: i64) -> Result<String> {
    let secret = decode_seed(seed)?;
    let counter = u64::try_from(unix_secs).unwrap_or(0) / STEP_SECS;
    Ok(hotp(&secret, counter))
}

/// RFC 4226 HOTP with dynamic truncation.
fn hotp(secret: &[u8], counter: u64) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret);
    let tag = hmac::sign(&key, &counter.to_be_bytes());
    let digest = tag.as_ref();

    let offset = usize::from(digest[digest.len() - 1] & 0x0f);
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    let code = binary % 10_u32.pow(DIGITS);
    format!("{code:0width$}", width = DIGITS as usize)
}
