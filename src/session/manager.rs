use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api;
use crate::cache::{RequestCache, SharedRequestCache};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::errors::Error;
use crate::notify::{Notifier, ToastKind, TracingNotifier};
use crate::router::Navigator;
use crate::schedule::{EXPIRY_SLACK, TimerSet, VALID_TOKEN_MARGIN, WarnedMask, plan_timers};
use crate::session::events::{LogoutCallback, Registry, Subscription, WarningCallback};
use crate::session::state::SessionState;
use crate::storage::{MemoryStore, SessionStore};
use crate::telemetry::session::SessionTelemetry;
use crate::token::{self, TokenRecord, expiration_time};

/// Delay before the first expiry check after construction, giving the host
/// shell time to finish mounting.
const STARTUP_CHECK_DELAY: Duration = Duration::from_secs(1);

/// Host page visibility, fed in by the shell's visibility listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Body of the backend's login/verification response.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct TokenResponse {
    #[serde(rename = "accessToken")]
    pub access_token: Option<String>,
}

struct SessionInner {
    config: Config,
    http: Client,
    clock: Arc<dyn Clock>,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    cache: Arc<dyn RequestCache>,
    router: Mutex<Option<Arc<dyn Navigator>>>,
    state: SessionState,
    timers: Mutex<TimerSet>,
    warned: Mutex<WarnedMask>,
    logout_subscribers: Registry<LogoutCallback>,
    warning_subscribers: Registry<WarningCallback>,
}

/// Owns the single authoritative belief about the current credential: what
/// it is, when it stops being valid, and the timers that act on that.
///
/// Cheap to clone; all clones share one lifecycle.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    pub fn builder(config: Config) -> SessionManagerBuilder {
        SessionManagerBuilder::new(config)
    }

    /// Arms the delayed startup expiry check. Call once the host shell is up
    /// and a tokio runtime is available.
    pub fn init(&self) {
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(STARTUP_CHECK_DELAY).await;
            if let Some(inner) = weak.upgrade() {
                SessionManager { inner }.check_token_expiry().await;
            }
        });
    }

    /// Injects the host router used for the post-logout redirect.
    pub fn set_router(&self, router: Arc<dyn Navigator>) {
        *self.inner.router.lock().expect("router lock poisoned") = Some(router);
    }

    /// Registers a logout subscriber. The returned handle removes it again.
    pub fn on_logout<F, Fut>(&self, callback: F) -> Subscription
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback: LogoutCallback = Arc::new(move || Box::pin(callback()));
        self.inner.logout_subscribers.subscribe(callback)
    }

    /// Registers a session-warning subscriber invoked with minutes-remaining.
    pub fn on_session_warning<F, Fut>(&self, callback: F) -> Subscription
    where
        F: Fn(u64) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback: WarningCallback = Arc::new(move |minutes| Box::pin(callback(minutes)));
        self.inner.warning_subscribers.subscribe(callback)
    }

    /// Persists a freshly issued token and re-arms the timers.
    ///
    /// The expiry instant comes from the token's own `exp` claim when
    /// decodable and in the future, else `now + fallback TTL`. Always
    /// resurrects the session: any prior logout state is cleared.
    pub async fn set_token(&self, access_token: &str) -> Result<(), Error> {
        self.cancel_timers();
        let now = self.inner.clock.now();
        let expires_at = expiration_time(access_token, now, self.inner.config.fallback_ttl());
        let record = TokenRecord::new(access_token.to_string(), expires_at);
        token::save_record(self.inner.store.as_ref(), &record)?;

        self.inner.state.activate();
        self.inner
            .warned
            .lock()
            .expect("warned lock poisoned")
            .clear();
        Self::schedule_expiry_check(&self.inner, expires_at);

        let remaining_mins = record.remaining(now).as_secs() / 60;
        info!(remaining_mins, "token saved");
        Ok(())
    }

    /// Accepts the raw login/verification response body.
    pub async fn save_tokens(&self, response: &TokenResponse) -> Result<(), Error> {
        let access_token = response
            .access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Config("Missing access token in response".to_string()))?;
        self.set_token(access_token).await
    }

    /// The read path outbound calls use before attaching a bearer header.
    ///
    /// Returns `None` once logged out or without a record; a record inside
    /// the 30-second expiry slack triggers the full logout as a side effect.
    pub async fn current_token(&self) -> Option<String> {
        if self.inner.state.is_shut_down() {
            return None;
        }

        let record = token::load_record(self.inner.store.as_ref())?;
        if record.expires_within(self.inner.clock.now(), EXPIRY_SLACK) {
            debug!("token expired on read path");
            self.logout().await;
            return None;
        }

        Some(record.access_token)
    }

    /// Re-derives timer state from the persisted record, logging out
    /// immediately when the record is already inside the expiry slack.
    pub async fn check_token_expiry(&self) {
        if self.inner.state.is_shut_down() {
            return;
        }

        let Some(record) = token::load_record(self.inner.store.as_ref()) else {
            debug!("no token to manage");
            return;
        };

        if record.expires_within(self.inner.clock.now(), EXPIRY_SLACK) {
            info!("token expired, logging out");
            self.logout().await;
        } else {
            Self::schedule_expiry_check(&self.inner, record.expires_at);
        }
    }

    /// True when logged out, recordless, or within `threshold_minutes` of
    /// expiry.
    pub fn is_token_expiring_soon(&self, threshold_minutes: u64) -> bool {
        if self.inner.state.is_shut_down() {
            return true;
        }
        match token::load_record(self.inner.store.as_ref()) {
            Some(record) => record.expires_within(
                self.inner.clock.now(),
                Duration::from_secs(threshold_minutes * 60),
            ),
            None => true,
        }
    }

    /// True only while more than two minutes of credential life remain.
    pub fn has_valid_token(&self) -> bool {
        match token::load_record(self.inner.store.as_ref()) {
            Some(record) => record.remaining(self.inner.clock.now()) > VALID_TOKEN_MARGIN,
            None => false,
        }
    }

    /// Whole minutes until expiry (rounded, floored at zero), or `None`
    /// without a record.
    pub fn time_until_expiry(&self) -> Option<u64> {
        let record = token::load_record(self.inner.store.as_ref())?;
        let remaining_ms = record.remaining(self.inner.clock.now()).as_millis() as u64;
        Some((remaining_ms + 30_000) / 60_000)
    }

    /// Nudges the user when under thirty minutes remain.
    pub fn extend_session_alert(&self) {
        if let Some(remaining) = self.time_until_expiry()
            && remaining > 0
            && remaining <= 30
        {
            self.inner.notifier.notify(
                ToastKind::Warning,
                "Session Expiring Soon",
                &format!(
                    "Your session will expire in {} minutes. Please sign in again to continue.",
                    remaining
                ),
            );
        }
    }

    /// Coordinated logout: remote invalidation (best effort), local record
    /// and cache teardown, subscriber notification, redirect, toast.
    ///
    /// First caller wins; concurrent or repeated calls no-op. The session
    /// stays logged out until `set_token` or `reset_logout_state`.
    pub async fn logout(&self) {
        if !self.inner.state.begin_logout() {
            debug!("logout already in progress or complete");
            return;
        }

        let telemetry = SessionTelemetry::new("session.logout");
        telemetry.emit_logout_start();
        self.cancel_timers();

        match self.run_logout_sequence(&telemetry).await {
            Ok(()) => telemetry.emit_logout_success(),
            Err(err) => {
                telemetry.emit_logout_failure(&err);
                self.inner
                    .notifier
                    .notify(ToastKind::Error, "Error", "Failed to logout properly");
            }
        }

        self.inner.state.finish_logout();
    }

    async fn run_logout_sequence(&self, telemetry: &SessionTelemetry) -> Result<(), Error> {
        if let Some(record) = token::load_record(self.inner.store.as_ref())
            && let Err(err) =
                api::invalidate_session(&self.inner.http, &self.inner.config, &record.access_token)
                    .await
        {
            telemetry.emit_remote_failed(&err);
        }

        token::clear_record(self.inner.store.as_ref())?;
        self.inner.cache.clear();
        self.notify_logout_subscribers().await;
        self.redirect_to_login();
        self.inner.notifier.notify(
            ToastKind::Success,
            "Logged Out",
            "You have been logged out successfully",
        );
        Ok(())
    }

    /// Lightweight teardown for host shutdown: cancels timers and clears the
    /// record without the remote call or subscriber notification.
    pub async fn destroy(&self) {
        if !self.inner.state.begin_logout() {
            return;
        }

        self.cancel_timers();
        if let Err(err) = token::clear_record(self.inner.store.as_ref()) {
            warn!(error = %err, "session.store.clear_failed");
        }
        SessionTelemetry::new("session.destroy").emit_destroyed();
        self.inner.state.finish_logout();
    }

    /// True once a logout has started or completed.
    pub fn is_user_logged_out(&self) -> bool {
        self.inner.state.is_shut_down()
    }

    /// Allows a fresh login attempt after a prior logout without touching
    /// the persisted record.
    pub fn reset_logout_state(&self) {
        self.cancel_timers();
        self.inner.state.activate();
        self.inner
            .warned
            .lock()
            .expect("warned lock poisoned")
            .clear();
    }

    /// Hidden pages run no timers; becoming visible re-derives them from the
    /// persisted expiry so clock suspension while backgrounded cannot drift
    /// the schedule.
    pub async fn handle_visibility_change(&self, visibility: Visibility) {
        match visibility {
            Visibility::Visible => self.check_token_expiry().await,
            Visibility::Hidden => self.cancel_timers(),
        }
    }

    pub async fn handle_focus(&self) {
        self.check_token_expiry().await;
    }

    pub fn handle_blur(&self) {
        self.cancel_timers();
    }

    fn cancel_timers(&self) {
        self.inner
            .timers
            .lock()
            .expect("timer lock poisoned")
            .cancel_all();
    }

    /// Replaces the live timer generation with one derived from `expires_at`.
    fn schedule_expiry_check(inner: &Arc<SessionInner>, expires_at: SystemTime) {
        let mut timers = inner.timers.lock().expect("timer lock poisoned");
        timers.cancel_all();

        let now = inner.clock.now();
        let warned = *inner.warned.lock().expect("warned lock poisoned");
        let plan = plan_timers(now, expires_at, warned);

        let remaining_mins = expires_at
            .duration_since(now)
            .unwrap_or(Duration::ZERO)
            .as_secs()
            / 60;
        SessionTelemetry::new("session.schedule").emit_scheduled(
            remaining_mins,
            plan.warnings.len(),
            plan.expiry_in.is_some(),
        );

        for slot in plan.warnings {
            let weak = Arc::downgrade(inner);
            let minutes_remaining = slot.minutes_remaining;
            let fire_in = slot.fire_in;
            timers.push(tokio::spawn(async move {
                tokio::time::sleep(fire_in).await;
                if let Some(inner) = weak.upgrade() {
                    let manager = SessionManager { inner };
                    // Detached: once fired, delivery cannot be cancelled by
                    // a reschedule happening mid-notification.
                    tokio::spawn(async move { manager.fire_warning(minutes_remaining).await });
                }
            }));
        }

        if let Some(fire_in) = plan.expiry_in {
            let weak = Arc::downgrade(inner);
            timers.push(tokio::spawn(async move {
                tokio::time::sleep(fire_in).await;
                if let Some(inner) = weak.upgrade() {
                    let manager = SessionManager { inner };
                    manager.inner.notifier.notify(
                        ToastKind::Warning,
                        "Session Expired",
                        "Your session has expired. Please sign in again.",
                    );
                    SessionTelemetry::new("session.expiry").emit_expired();
                    // Detached so the logout's own timer cancellation cannot
                    // abort the sequence mid-flight.
                    tokio::spawn(async move { manager.logout().await });
                }
            }));
        }
    }

    async fn fire_warning(&self, minutes_remaining: u64) {
        self.inner
            .warned
            .lock()
            .expect("warned lock poisoned")
            .record(minutes_remaining);

        let (kind, message) = warning_message(minutes_remaining);
        self.inner
            .notifier
            .notify(kind, "Session Expiring Soon", &message);
        SessionTelemetry::new("session.warning").emit_warning(minutes_remaining);
        self.notify_warning_subscribers(minutes_remaining).await;
    }

    /// Settle-all delivery: every subscriber runs in its own task, a
    /// panicking one is logged and cannot starve its siblings.
    async fn notify_logout_subscribers(&self) {
        let handles: Vec<_> = self
            .inner
            .logout_subscribers
            .snapshot()
            .into_iter()
            .map(|callback| tokio::spawn(async move { callback().await }))
            .collect();
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "logout callback failed");
            }
        }
    }

    async fn notify_warning_subscribers(&self, minutes_remaining: u64) {
        let handles: Vec<_> = self
            .inner
            .warning_subscribers
            .snapshot()
            .into_iter()
            .map(|callback| tokio::spawn(async move { callback(minutes_remaining).await }))
            .collect();
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "session warning callback failed");
            }
        }
    }

    fn redirect_to_login(&self) {
        let router = self.inner.router.lock().expect("router lock poisoned");
        match router.as_ref() {
            Some(router) => router.push(&self.inner.config.login_path),
            None => warn!(
                path = %self.inner.config.login_path,
                "logout.redirect_skipped"
            ),
        }
    }
}

fn warning_message(minutes_remaining: u64) -> (ToastKind, String) {
    if minutes_remaining >= 15 {
        (
            ToastKind::Warning,
            format!(
                "Your session will expire in {} minutes. Please save your work.",
                minutes_remaining
            ),
        )
    } else if minutes_remaining >= 5 {
        (
            ToastKind::Warning,
            format!(
                "Your session will expire in {} minutes. Please save your work and prepare to sign in again.",
                minutes_remaining
            ),
        )
    } else {
        (
            ToastKind::Error,
            format!(
                "Your session will expire in {} minute{}. Please save your work immediately!",
                minutes_remaining,
                if minutes_remaining > 1 { "s" } else { "" }
            ),
        )
    }
}

/// Assembles a `SessionManager` with explicit collaborators; anything not
/// injected falls back to an in-process default.
pub struct SessionManagerBuilder {
    config: Config,
    http: Option<Client>,
    clock: Option<Arc<dyn Clock>>,
    store: Option<Arc<dyn SessionStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    cache: Option<Arc<dyn RequestCache>>,
    router: Option<Arc<dyn Navigator>>,
}

impl SessionManagerBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            clock: None,
            store: None,
            notifier: None,
            cache: None,
            router: None,
        }
    }

    pub fn http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn RequestCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn router(mut self, router: Arc<dyn Navigator>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn build(self) -> Result<SessionManager, Error> {
        let config = self.config.validate()?;
        Ok(SessionManager {
            inner: Arc::new(SessionInner {
                config,
                http: self.http.unwrap_or_default(),
                clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
                store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
                notifier: self
                    .notifier
                    .unwrap_or_else(|| Arc::new(TracingNotifier)),
                cache: self
                    .cache
                    .unwrap_or_else(|| Arc::new(SharedRequestCache::new())),
                router: Mutex::new(self.router),
                state: SessionState::default(),
                timers: Mutex::new(TimerSet::default()),
                warned: Mutex::new(WarnedMask::default()),
                logout_subscribers: Registry::default(),
                warning_subscribers: Registry::default(),
            }),
        })
    }
}
