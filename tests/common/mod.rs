#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use trygg_session::{
    Clock, Config, MemoryStore, Navigator, Notifier, SessionManager, SharedRequestCache,
    ToastKind,
};

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Manually advanced clock so expiry arithmetic can be walked through time.
pub struct TestClock {
    now: Mutex<SystemTime>,
}

impl TestClock {
    /// Starts at the current wall clock truncated to a whole second, so
    /// forged `exp` claims (whole seconds) line up exactly.
    pub fn starting_now() -> Arc<Self> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("pre-epoch wall clock")
            .as_secs();
        Arc::new(Self {
            now: Mutex::new(UNIX_EPOCH + Duration::from_secs(secs)),
        })
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().expect("clock poisoned");
        *now = now
            .checked_add(duration)
            .expect("clock advance overflowed");
    }
}

impl Clock for TestClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().expect("clock poisoned")
    }
}

/// Advances the manual clock and the paused tokio clock in lockstep.
///
/// Yields first so freshly spawned timer tasks get polled and register
/// their sleeps against the pre-jump instant, then lets woken tasks run.
pub async fn advance_both(clock: &TestClock, duration: Duration) {
    settle().await;
    clock.advance(duration);
    tokio::time::advance(duration).await;
    settle().await;
}

/// Lets spawned timer and subscriber tasks run to quiescence.
pub async fn settle() {
    for _ in 0..25 {
        tokio::task::yield_now().await;
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<(ToastKind, String, String)>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<(ToastKind, String, String)> {
        self.toasts.lock().expect("notifier poisoned").clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.toasts()
            .into_iter()
            .map(|(_, title, _)| title)
            .collect()
    }

    pub fn has_title(&self, title: &str) -> bool {
        self.titles().iter().any(|t| t == title)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: ToastKind, title: &str, message: &str) {
        self.toasts
            .lock()
            .expect("notifier poisoned")
            .push((kind, title.to_string(), message.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pushes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn pushes(&self) -> Vec<String> {
        self.pushes.lock().expect("navigator poisoned").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, path: &str) {
        self.pushes
            .lock()
            .expect("navigator poisoned")
            .push(path.to_string());
    }
}

/// Everything a test needs to poke the manager and observe its effects.
pub struct Harness {
    pub manager: SessionManager,
    pub clock: Arc<TestClock>,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub cache: Arc<SharedRequestCache>,
}

pub fn harness(base_url: &str) -> Harness {
    init_logging();
    let clock = TestClock::starting_now();
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let cache = Arc::new(SharedRequestCache::new());
    let manager = SessionManager::builder(Config::from_values(base_url))
        .clock(clock.clone())
        .store(store.clone())
        .notifier(notifier.clone())
        .router(navigator.clone())
        .cache(cache.clone())
        .build()
        .expect("manager build failed");
    Harness {
        manager,
        clock,
        store,
        notifier,
        navigator,
        cache,
    }
}

/// Base URL for tests that never want the remote call to succeed; port 9 is
/// discard, connections are refused immediately.
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:9";

pub fn secs_since_epoch(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .expect("pre-epoch time")
        .as_secs()
}

/// Forges a three-segment bearer token with the given payload JSON.
pub fn forge_token(payload_json: &str) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload_json),
        URL_SAFE_NO_PAD.encode("signature")
    )
}

/// A token whose `exp` claim lies `ttl` past the test clock's current time.
pub fn token_expiring_in(clock: &TestClock, ttl: Duration) -> String {
    let exp = secs_since_epoch(clock.now() + ttl);
    forge_token(&format!(r#"{{"sub":"admin","role":"super-admin","exp":{}}}"#, exp))
}
