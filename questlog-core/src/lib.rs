pub mod auth;
pub mod config;
pub mod notify;
pub mod session;
pub mod state;

pub use auth::Identity;
pub use config::AppConfig;
pub use notify::{Notification, Notifier, Severity};
pub use session::Session;
pub use state::ProgressState;
