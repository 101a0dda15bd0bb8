use std::sync::atomic::{AtomicU8, Ordering};

const ACTIVE: u8 = 0;
const LOGGING_OUT: u8 = 1;
const LOGGED_OUT: u8 = 2;

/// Lifecycle guard: first logout caller wins, everyone else no-ops.
///
/// Compare-and-swap replaces the single-threaded boolean guards the contract
/// describes; the observable behavior is identical.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    state: AtomicU8,
}

impl SessionState {
    /// Attempts `Active -> LoggingOut`. Returns false when a logout is
    /// already in flight or has already completed.
    pub(crate) fn begin_logout(&self) -> bool {
        self.state
            .compare_exchange(ACTIVE, LOGGING_OUT, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// `LoggingOut -> LoggedOut`, the terminal state until the session is
    /// resurrected.
    pub(crate) fn finish_logout(&self) {
        self.state.store(LOGGED_OUT, Ordering::Release);
    }

    /// Resurrects the session (`set_token` / `reset_logout_state`).
    pub(crate) fn activate(&self) {
        self.state.store(ACTIVE, Ordering::Release);
    }

    /// True once a logout has started or completed. Read paths treat both
    /// as "logged out".
    pub(crate) fn is_shut_down(&self) -> bool {
        self.state.load(Ordering::Acquire) != ACTIVE
    }

    /// True only after a logout has fully completed.
    pub(crate) fn is_logged_out(&self) -> bool {
        self.state.load(Ordering::Acquire) == LOGGED_OUT
    }
}
