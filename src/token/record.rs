use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::errors::Error;
use crate::storage::{AUTH_TOKEN_KEY, SessionStore, StoreOptions, TOKEN_EXPIRES_AT_KEY};

/// The persisted session credential: a bearer token plus its absolute expiry.
///
/// The record is stored under two keys written and read together; a missing
/// or unparsable half makes the whole record absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRecord {
    pub access_token: String,
    pub expires_at: SystemTime,
}

impl TokenRecord {
    pub fn new(access_token: String, expires_at: SystemTime) -> Self {
        Self {
            access_token,
            expires_at,
        }
    }

    /// Time left until expiry relative to `now`, floored at zero.
    pub fn remaining(&self, now: SystemTime) -> Duration {
        self.expires_at
            .duration_since(now)
            .unwrap_or(Duration::ZERO)
    }

    /// True when the record expires within `window` of `now`.
    pub fn expires_within(&self, now: SystemTime, window: Duration) -> bool {
        self.remaining(now) <= window
    }

    pub(crate) fn expires_at_millis(&self) -> u128 {
        self.expires_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis()
    }
}

/// Reads the persisted record. Corrupt or partial state degrades to `None`
/// with a warning rather than an error; the caller treats it as "no session".
pub(crate) fn load_record(store: &dyn SessionStore) -> Option<TokenRecord> {
    let token = match store.get(AUTH_TOKEN_KEY) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "session.store.read_failed");
            return None;
        }
    };
    let expires_raw = match store.get(TOKEN_EXPIRES_AT_KEY) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "session.store.read_failed");
            return None;
        }
    };

    let (token, expires_raw) = match (token, expires_raw) {
        (Some(token), Some(expires_raw)) if !token.is_empty() => (token, expires_raw),
        _ => return None,
    };

    let millis: u64 = match expires_raw.parse() {
        Ok(millis) => millis,
        Err(_) => {
            warn!(value = %expires_raw, "session.store.expiry_unparsable");
            return None;
        }
    };

    Some(TokenRecord::new(
        token,
        UNIX_EPOCH + Duration::from_millis(millis),
    ))
}

pub(crate) fn save_record(store: &dyn SessionStore, record: &TokenRecord) -> Result<(), Error> {
    let options = StoreOptions::default();
    store.set(AUTH_TOKEN_KEY, &record.access_token, &options)?;
    store.set(
        TOKEN_EXPIRES_AT_KEY,
        &record.expires_at_millis().to_string(),
        &options,
    )?;
    Ok(())
}

pub(crate) fn clear_record(store: &dyn SessionStore) -> Result<(), Error> {
    let options = StoreOptions::default();
    store.remove(AUTH_TOKEN_KEY, &options)?;
    store.remove(TOKEN_EXPIRES_AT_KEY, &options)?;
    Ok(())
}
