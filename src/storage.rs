use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::Error;

/// Key holding the raw bearer token.
pub const AUTH_TOKEN_KEY: &str = "trygg_admin";
/// Key holding the absolute expiry instant, decimal milliseconds since epoch.
pub const TOKEN_EXPIRES_AT_KEY: &str = "tokenExpiresAt";

/// Write options forwarded to the persistence layer. Cookie-backed stores
/// honor them; in-memory stores ignore them.
#[derive(Clone, Debug)]
pub struct StoreOptions {
    pub secure: bool,
    pub path: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            secure: true,
            path: "/".to_string(),
        }
    }
}

/// Persistence collaborator for the session record.
///
/// Implementations map onto whatever the host platform offers (cookies,
/// keychain, local storage). The manager only ever touches the two keys
/// above, always as a pair.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&self, key: &str, value: &str, options: &StoreOptions) -> Result<(), Error>;
    fn remove(&self, key: &str, options: &StoreOptions) -> Result<(), Error>;
}

/// In-memory store, the default when the host injects nothing else.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str, _options: &StoreOptions) -> Result<(), Error> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str, _options: &StoreOptions) -> Result<(), Error> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove_round_trip() {
        let store = MemoryStore::new();
        let options = StoreOptions::default();
        store.set(AUTH_TOKEN_KEY, "tok", &options).unwrap();
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("tok"));
        store.remove(AUTH_TOKEN_KEY, &options).unwrap();
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn missing_key_reads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get(TOKEN_EXPIRES_AT_KEY).unwrap(), None);
    }
}
