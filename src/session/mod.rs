mod events;
mod manager;
mod state;

pub use events::{LogoutCallback, Subscription, WarningCallback};
pub use manager::{SessionManager, SessionManagerBuilder, TokenResponse, Visibility};
