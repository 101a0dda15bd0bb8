mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod errors;
pub mod notify;
pub mod router;
pub mod schedule;
mod session;
pub mod storage;
pub mod telemetry;
pub mod token;

pub use cache::{RequestCache, SharedRequestCache};
pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use errors::Error;
pub use notify::{Notifier, ToastKind, TracingNotifier};
pub use router::Navigator;
pub use schedule::{DEFAULT_EXPIRING_SOON_MINUTES, WARNING_THRESHOLDS_MIN};
pub use session::{
    LogoutCallback, SessionManager, SessionManagerBuilder, Subscription, TokenResponse,
    Visibility, WarningCallback,
};
pub use storage::{MemoryStore, SessionStore, StoreOptions};
pub use token::TokenRecord;
