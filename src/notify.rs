use tracing::{Level, event};

/// Severity of a user-facing notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

/// Notification collaborator: whatever toast surface the host renders.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: ToastKind, title: &str, message: &str);
}

/// Default notifier emitting structured log events instead of UI toasts.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: ToastKind, title: &str, message: &str) {
        match kind {
            ToastKind::Error => event!(Level::ERROR, title, message, "toast"),
            ToastKind::Warning => event!(Level::WARN, title, message, "toast"),
            _ => event!(Level::INFO, title, message, "toast"),
        }
    }
}
