use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{error, info, warn};

use questlog_database::{DocumentPath, DocumentStore};

use crate::auth::{self, Identity};
use crate::config::AppConfig;
use crate::notify::Notifier;
use crate::state::ProgressState;

pub const LOCAL_ONLY_WARNING: &str =
    "Store configuration not found. Data will NOT be persisted.";

/// Counts outstanding operations; the session is busy while any is running.
#[derive(Clone, Debug, Default)]
pub struct BusyIndicator {
    outstanding: Arc<AtomicUsize>,
}

impl BusyIndicator {
    /// Mark an operation as running until the guard is dropped.
    pub fn enter(&self) -> BusyGuard {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        BusyGuard {
            outstanding: Arc::clone(&self.outstanding),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.outstanding.load(Ordering::SeqCst) > 0
    }
}

#[derive(Debug)]
pub struct BusyGuard {
    outstanding: Arc<AtomicUsize>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Per-run context shared by every operation. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct Session {
    app_id: String,
    store: Option<DocumentStore>,
    identity: Option<Identity>,
    warning: Option<String>,
    notifier: Notifier,
    busy: BusyIndicator,
    progress: Arc<Mutex<ProgressState>>,
}

impl Session {
    /// A session with no store and no signed-in user.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            store: None,
            identity: None,
            warning: None,
            notifier: Notifier::new(),
            busy: BusyIndicator::default(),
            progress: Arc::new(Mutex::new(ProgressState::default())),
        }
    }

    pub fn with_store(mut self, store: DocumentStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    /// Build the session from configuration.
    ///
    /// Never fails: a missing or broken store connection falls back to local-only
    /// mode, and a failed sign-in leaves the session without an identity.
    pub async fn connect(config: &AppConfig) -> Self {
        let mut session = Self::new(config.app_id.clone());

        let store = match config.redis_url.as_deref() {
            Some(redis_url) => match DocumentStore::redis(redis_url, config.redis_key_prefix.clone()) {
                Ok(store) => {
                    info!(key_prefix = %config.redis_key_prefix, "Redis document store enabled.");
                    if let Err(err) = store.ping().await {
                        warn!(?err, "Redis ping failed; operations will report errors until it recovers.");
                    }
                    store
                }
                Err(err) => {
                    warn!(?err, "Failed to initialize Redis store; continuing in local-only mode.");
                    session = session.with_warning(LOCAL_ONLY_WARNING);
                    DocumentStore::memory(config.redis_key_prefix.clone())
                }
            },
            None => {
                warn!("REDIS_URL is missing; continuing in local-only mode.");
                session = session.with_warning(LOCAL_ONLY_WARNING);
                DocumentStore::memory(config.redis_key_prefix.clone())
            }
        };
        session = session.with_store(store);

        if let Some(warning) = session.warning.clone() {
            session.notifier.error(warning);
        }

        match auth::sign_in(config).await {
            Ok(identity) => session.with_identity(identity),
            Err(err) => {
                error!(?err, "sign-in failed");
                session.notifier.error(format!(
                    "Critical initialization error: {err}. Restart the app."
                ));
                session
            }
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn store(&self) -> Option<&DocumentStore> {
        self.store.as_ref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Persistent banner, set in local-only mode.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn busy(&self) -> &BusyIndicator {
        &self.busy
    }

    /// Path of the signed-in user's progress document.
    pub fn progress_path(&self) -> Option<DocumentPath> {
        self.identity
            .as_ref()
            .map(|identity| DocumentPath::user_progress(&self.app_id, &identity.user_id))
    }

    /// Lock the local progress state. Never hold the guard across an `.await`.
    pub fn progress(&self) -> MutexGuard<'_, ProgressState> {
        self.progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{BusyIndicator, LOCAL_ONLY_WARNING, Session};
    use crate::auth::SignInMethod;
    use crate::config::AppConfig;
    use crate::notify::Severity;

    #[test]
    fn busy_guard_clears_on_drop() {
        let busy = BusyIndicator::default();
        assert!(!busy.is_busy());
        let outer = busy.enter();
        let inner = busy.enter();
        drop(outer);
        assert!(busy.is_busy());
        drop(inner);
        assert!(!busy.is_busy());
    }

    #[test]
    fn progress_path_needs_identity() {
        let session = Session::new("app");
        assert!(session.progress_path().is_none());
        assert!(session.store().is_none());
    }

    #[tokio::test]
    async fn missing_store_config_degrades_to_local_only() {
        let config = AppConfig {
            auth_token: Some("local-player".to_owned()),
            ..AppConfig::default()
        };
        let session = Session::connect(&config).await;

        assert_eq!(session.warning(), Some(LOCAL_ONLY_WARNING));
        assert!(!session.store().unwrap().is_redis_enabled());
        let notification = session.notifier().current().unwrap();
        assert_eq!(notification.severity, Severity::Error);

        let identity = session.identity().unwrap();
        assert_eq!(identity.user_id, "local-player");
        assert_eq!(identity.method, SignInMethod::CustomToken);
        assert_eq!(
            session.progress_path().unwrap().to_string(),
            "artifacts/default-app-id/users/local-player/skills/user_data"
        );
    }

    #[tokio::test]
    async fn malformed_store_url_degrades_to_local_only() {
        let config = AppConfig {
            redis_url: Some("definitely not a url".to_owned()),
            auth_token: Some("p1".to_owned()),
            ..AppConfig::default()
        };
        let session = Session::connect(&config).await;
        assert_eq!(session.warning(), Some(LOCAL_ONLY_WARNING));
        assert!(session.identity().is_some());
    }

    #[tokio::test]
    async fn failed_sign_in_leaves_session_without_identity() {
        let config = AppConfig {
            auth_token: Some("not valid!".to_owned()),
            identity_file: PathBuf::from("unused"),
            ..AppConfig::default()
        };
        let session = Session::connect(&config).await;

        assert!(session.identity().is_none());
        let notification = session.notifier().current().unwrap();
        assert!(notification.text.starts_with("Critical initialization error"));
    }
}
