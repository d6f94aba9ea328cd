use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::SessionClaims;
use super::errors::TokenError;

/// Signed session token together with the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
}

/// Issues and verifies HS256 session tokens.
///
/// Expiry is judged against the `now` supplied by the caller rather than the
/// library's own clock, so the service can be driven by an injected clock.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenService {
    /// Create a new token service.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    /// * `ttl` - Lifetime of every issued token
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject` at `now`.
    ///
    /// # Errors
    /// * `Signing` - Token encoding failed
    pub fn issue(&self, subject: impl ToString, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let claims = SessionClaims::new(subject, now, self.ttl);
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify a token's signature, structure and expiry.
    ///
    /// # Errors
    /// * `BadSignature` - Signature does not match the server secret
    /// * `Malformed` - Token is not a well-formed JWT with session claims
    /// * `Expired` - `now` is at or past the token's expiry
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })?;

        if claims.is_expired(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::new(SECRET, Duration::minutes(90));
        let now = at(1_700_000_000);

        let issued = service.issue("user123", now).expect("Failed to issue token");
        assert!(!issued.token.is_empty());

        let claims = service.verify(&issued.token, now).expect("Failed to verify token");
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.iat, now.timestamp());
    }

    #[test]
    fn test_valid_until_expiry_instant() {
        let ttl = Duration::seconds(3600);
        let service = TokenService::new(SECRET, ttl);
        let issued_at = at(1_700_000_000);
        let token = service.issue("user123", issued_at).unwrap().token;

        assert!(service.verify(&token, issued_at).is_ok());
        assert!(service.verify(&token, issued_at + ttl - Duration::seconds(1)).is_ok());
        assert_eq!(
            service.verify(&token, issued_at + ttl),
            Err(TokenError::Expired)
        );
        assert_eq!(
            service.verify(&token, issued_at + ttl + Duration::days(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_verify_malformed_token() {
        let service = TokenService::new(SECRET, Duration::hours(1));

        let result = service.verify("invalid.token.here", at(0));
        assert!(matches!(result, Err(TokenError::Malformed(_))));

        let result = service.verify("not-a-jwt", at(0));
        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let issuer = TokenService::new(b"secret1_at_least_32_bytes_long_key!", Duration::hours(1));
        let verifier = TokenService::new(b"secret2_at_least_32_bytes_long_key!", Duration::hours(1));
        let now = at(1_700_000_000);

        let token = issuer.issue("user123", now).unwrap().token;

        assert_eq!(verifier.verify(&token, now), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_bad_signature_reported_before_expiry() {
        let issuer = TokenService::new(b"secret1_at_least_32_bytes_long_key!", Duration::hours(1));
        let verifier = TokenService::new(b"secret2_at_least_32_bytes_long_key!", Duration::hours(1));
        let now = at(1_700_000_000);

        let token = issuer.issue("user123", now).unwrap().token;

        assert_eq!(
            verifier.verify(&token, now + Duration::days(2)),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let service = TokenService::new(SECRET, Duration::hours(1));
        let now = at(1_700_000_000);
        let victim = service.issue("victim", now).unwrap().token;
        let attacker = service.issue("attacker", now).unwrap().token;

        // Splice the attacker's payload onto the victim's signature
        let victim_parts: Vec<&str> = victim.split('.').collect();
        let attacker_parts: Vec<&str> = attacker.split('.').collect();
        let forged = format!(
            "{}.{}.{}",
            victim_parts[0], attacker_parts[1], victim_parts[2]
        );

        assert_eq!(service.verify(&forged, now), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_token_without_issue_time_is_malformed() {
        #[derive(serde::Serialize)]
        struct PartialClaims {
            sub: String,
            exp: i64,
        }

        let service = TokenService::new(SECRET, Duration::hours(1));
        let now = at(1_700_000_000);
        let token = encode(
            &Header::new(Algorithm::HS256),
            &PartialClaims {
                sub: "user123".to_string(),
                exp: now.timestamp() + 3600,
            },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(
            service.verify(&token, now),
            Err(TokenError::Malformed(_))
        ));
    }
}
