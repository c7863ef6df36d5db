use std::env;
use std::path::PathBuf;

pub const DEFAULT_APP_ID: &str = "default-app-id";
pub const DEFAULT_KEY_PREFIX: &str = "questlog";
pub const DEFAULT_IDENTITY_FILE: &str = ".questlog_identity";

/// Runtime settings read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Namespace segment of every document path.
    pub app_id: String,
    /// Store connection. `None` selects local-only mode.
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    /// Externally supplied sign-in credential.
    pub auth_token: Option<String>,
    /// Where the anonymous identity is kept between runs.
    pub identity_file: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_owned())
                .filter(|raw| !raw.is_empty())
        };

        Self {
            app_id: value("QUESTLOG_APP_ID").unwrap_or_else(|| DEFAULT_APP_ID.to_owned()),
            redis_url: value("REDIS_URL"),
            redis_key_prefix: value("REDIS_KEY_PREFIX")
                .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_owned()),
            auth_token: value("QUESTLOG_AUTH_TOKEN"),
            identity_file: value("QUESTLOG_IDENTITY_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IDENTITY_FILE)),
        }
    }

    pub fn is_local_only(&self) -> bool {
        self.redis_url.is_none()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
