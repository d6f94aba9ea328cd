//! Password reset tokens.
//!
//! A reset token exists in two forms: the raw value, handed to the user
//! exactly once through an out-of-band channel, and its SHA-256 digest, which
//! is the only form ever persisted. Redemption recomputes the digest from the
//! presented raw value and looks it up together with the expiry.

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;

/// Number of random bytes in a raw reset token.
pub const RESET_TOKEN_BYTES: usize = 32;

/// Lifetime of a reset token, in minutes.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// Freshly generated reset token.
///
/// Not `Debug`: the raw value must never reach logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ResetToken {
    raw: String,
    digest: String,
}

impl ResetToken {
    /// Generate a new random token from the operating system RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; RESET_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let raw = hex::encode(bytes);
        let digest = digest(&raw);

        Self { raw, digest }
    }

    /// Raw value to deliver to the user.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Digest to persist.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Lifetime of every reset token.
pub fn ttl() -> Duration {
    Duration::minutes(RESET_TOKEN_TTL_MINUTES)
}

/// Expiry for a token generated at `now`.
pub fn expires_at(now: DateTime<Utc>) -> DateTime<Utc> {
    now + ttl()
}

/// Hex-encoded SHA-256 of a raw token.
pub fn digest(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Compare two digests without short-circuiting on the first mismatch.
pub fn digests_match(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
