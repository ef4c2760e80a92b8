//! Entry expiry timestamps.
//!
//! Expiry is stored as milliseconds since the Unix epoch; `0` never expires.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub(crate) const NEVER: u64 = 0;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Expiry for an entry written now.
pub(crate) fn expires_at(ttl: Option<Duration>) -> u64 {
    match ttl {
        None => NEVER,
        Some(ttl) => {
            let ttl = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
            now_millis().saturating_add(ttl)
        }
    }
}

pub(crate) fn is_expired(expires_at: u64) -> bool {
    expires_at != NEVER && now_millis() >= expires_at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_expires() {
        assert_eq!(expires_at(None), NEVER);
        assert!(!is_expired(NEVER));
    }

    #[test]
    fn test_future_and_past() {
        assert!(!is_expired(expires_at(Some(Duration::from_secs(60)))));
        assert!(is_expired(1));
    }
}
