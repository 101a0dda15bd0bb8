use std::collections::HashMap;
use std::sync::Mutex;

/// Shared request-cache collaborator, dropped wholesale on logout so no
/// fetched data survives the session that fetched it.
pub trait RequestCache: Send + Sync {
    fn clear(&self);
}

/// Plain keyed response cache for hosts without their own query layer.
#[derive(Default)]
pub struct SharedRequestCache {
    entries: Mutex<HashMap<String, String>>,
}

impl SharedRequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RequestCache for SharedRequestCache {
    fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}
