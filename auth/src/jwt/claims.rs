use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried by a session token.
///
/// All three fields are required; a token missing any of them is malformed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (user identifier)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    /// Build claims for a subject issued at `now` and living for `ttl`.
    pub fn new(subject: impl ToString, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// A token is valid on `[iat, exp)`; the instant `exp` itself is expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_new_claims() {
        let claims = SessionClaims::new("user123", at(1_000), Duration::hours(24));

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_is_expired() {
        let claims = SessionClaims::new("user123", at(1_000), Duration::seconds(60));

        assert!(!claims.is_expired(at(1_000)));
        assert!(!claims.is_expired(at(1_059)));
        assert!(claims.is_expired(at(1_060))); // Exactly at expiration
        assert!(claims.is_expired(at(1_061)));
    }
}
