use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Callback invoked once per completed logout.
pub type LogoutCallback = Arc<dyn Fn() -> BoxedFuture + Send + Sync>;

/// Callback invoked with minutes-remaining when a warning threshold fires.
pub type WarningCallback = Arc<dyn Fn(u64) -> BoxedFuture + Send + Sync>;

struct RegistryInner<C> {
    next_id: u64,
    callbacks: HashMap<u64, C>,
}

/// One topic of the session's publish/subscribe surface.
pub(crate) struct Registry<C> {
    inner: Arc<Mutex<RegistryInner<C>>>,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                next_id: 0,
                callbacks: HashMap::new(),
            })),
        }
    }
}

impl<C: Clone + Send + 'static> Registry<C> {
    pub(crate) fn subscribe(&self, callback: C) -> Subscription {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        inner.callbacks.insert(id, callback);

        let registry = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Box::new(move || {
                if let Some(registry) = registry.upgrade()
                    && let Ok(mut inner) = registry.lock()
                {
                    inner.callbacks.remove(&id);
                }
            }),
        }
    }

    /// Callbacks registered at this instant, in registration order.
    pub(crate) fn snapshot(&self) -> Vec<C> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        let mut entries: Vec<(u64, C)> = inner
            .callbacks
            .iter()
            .map(|(id, cb)| (*id, cb.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, cb)| cb).collect()
    }
}

/// Handle returned at registration time. `cancel` removes the callback and
/// is safe to call any number of times; dropping the handle without
/// cancelling leaves the subscription alive.
pub struct Subscription {
    cancel: Box<dyn Fn() + Send + Sync>,
}

impl Subscription {
    pub fn cancel(&self) {
        (self.cancel)()
    }
}
