//! Session staleness.
//!
//! A session token stays cryptographically valid until it expires, but it is
//! logically revoked once its subject changes password. Nothing is stored per
//! token: staleness is recomputed from the token's `iat` and the user's
//! `password_changed_at`.

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

/// How far `password_changed_at` is backdated when a password changes.
///
/// The token issued alongside the change carries `iat == now`, which must not
/// compare as older than the change itself.
pub const PASSWORD_CHANGE_SKEW_SECONDS: i64 = 1;

/// True when the password was changed after the token was issued.
///
/// Compared at one-second granularity because `iat` only carries seconds.
pub fn changed_password_after(password_changed_at: Option<DateTime<Utc>>, issued_at: i64) -> bool {
    password_changed_at.map_or(false, |changed| changed.timestamp() > issued_at)
}

/// Timestamp to record for a password change happening at `now`.
pub fn password_changed_timestamp(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::seconds(PASSWORD_CHANGE_SKEW_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_never_changed_is_not_stale() {
        assert!(!changed_password_after(None, 0));
    }

    #[test]
    fn test_changed_after_issue_is_stale() {
        assert!(changed_password_after(Some(at(1_001)), 1_000));
    }

    #[test]
    fn test_changed_before_or_at_issue_is_fresh() {
        assert!(!changed_password_after(Some(at(999)), 1_000));
        assert!(!changed_password_after(Some(at(1_000)), 1_000));
    }

    #[test]
    fn test_sub_second_difference_is_ignored() {
        let changed = at(1_000) + Duration::milliseconds(900);
        assert!(!changed_password_after(Some(changed), 1_000));
    }

    #[test]
    fn test_token_issued_with_change_survives() {
        let now = at(1_700_000_000) + Duration::milliseconds(300);
        let changed_at = password_changed_timestamp(now);

        assert!(!changed_password_after(Some(changed_at), now.timestamp()));
        // ...while a token from before the change does not
        assert!(changed_password_after(Some(changed_at), now.timestamp() - 5));
    }
}
