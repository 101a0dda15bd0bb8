use tracing::{Level, event};
use uuid::Uuid;

use crate::errors::Error;

/// Structured emission for one lifecycle operation (a logout attempt, a
/// scheduling pass). Every event carries the same attempt id so a single
/// operation's records can be correlated.
#[derive(Clone, Debug)]
pub struct SessionTelemetry {
    attempt_id: Uuid,
    context: String,
}

impl SessionTelemetry {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            context: context.into(),
        }
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn emit_scheduled(&self, remaining_mins: u64, warnings: usize, expiry_armed: bool) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            remaining_mins,
            warnings,
            expiry_armed,
            "session.schedule"
        );
    }

    pub fn emit_warning(&self, minutes_remaining: u64) {
        event!(
            Level::WARN,
            attempt_id = %self.attempt_id,
            context = %self.context,
            minutes_remaining,
            "session.warning"
        );
    }

    pub fn emit_expired(&self) {
        event!(
            Level::WARN,
            attempt_id = %self.attempt_id,
            context = %self.context,
            "session.expired"
        );
    }

    pub fn emit_logout_start(&self) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            "logout.start"
        );
    }

    pub fn emit_logout_success(&self) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            "logout.success"
        );
    }

    pub fn emit_logout_failure(&self, error: &Error) {
        event!(
            Level::ERROR,
            attempt_id = %self.attempt_id,
            context = %self.context,
            error = %error,
            "logout.failure"
        );
    }

    pub fn emit_remote_failed(&self, error: &Error) {
        event!(
            Level::WARN,
            attempt_id = %self.attempt_id,
            context = %self.context,
            error = %error,
            "logout.remote_failed"
        );
    }

    pub fn emit_destroyed(&self) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            "session.destroyed"
        );
    }
}
