use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use questlog_core::Session;
use questlog_core::session::BusyGuard;
use questlog_database::impls::progress::{
    ProgressEvent, ProgressSubscription, create_progress, load_progress, subscribe_progress,
};
use questlog_database::{DocumentPath, DocumentStore, UserProgressDocument};

use crate::sync::{INITIALIZED_MESSAGE, LIVE_DATA_ERROR_MESSAGE, LOADED_MESSAGE, NOT_READY_MESSAGE};

/// Owns the live subscription started by [`load_or_initialize`]. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SyncHandle {
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Whether the subscription has ended, e.g. after an error.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Subscribe to the user's progress document, seeding it on first use.
///
/// The session is busy until the first snapshot has been handled. Returns `None`
/// when the subscription could not be opened; the failure has already been
/// reported through the notification slot.
pub async fn load_or_initialize(session: &Session) -> Option<SyncHandle> {
    let (Some(store), Some(path)) = (session.store(), session.progress_path()) else {
        warn!("cannot load progress: session not ready");
        session.notifier().error(NOT_READY_MESSAGE);
        return None;
    };

    let loading = session.busy().enter();
    let subscription = match subscribe_progress(store, &path).await {
        Ok(subscription) => subscription,
        Err(err) => {
            error!(?err, path = %path, "failed to subscribe to progress");
            session.notifier().error(LIVE_DATA_ERROR_MESSAGE);
            return None;
        }
    };

    info!(path = %path, "listening for progress changes");
    let task = tokio::spawn(follow_progress(
        session.clone(),
        store.clone(),
        path,
        subscription,
        loading,
    ));
    Some(SyncHandle { task })
}

async fn follow_progress(
    session: Session,
    store: DocumentStore,
    path: DocumentPath,
    mut subscription: ProgressSubscription,
    loading: BusyGuard,
) {
    let mut loading = Some(loading);

    while let Some(event) = subscription.next().await {
        let first = loading.is_some();

        match event {
            ProgressEvent::Missing => {
                session.progress().document_removed();
                seed_progress(&session, &store, &path).await;
            }
            ProgressEvent::Loaded(document) => {
                if session.progress().apply_snapshot(&document) {
                    debug!(version = document.version, "adopted remote progress");
                } else {
                    debug!(version = document.version, "ignored stale progress snapshot");
                }
                if first {
                    session.notifier().success(LOADED_MESSAGE);
                }
            }
            ProgressEvent::Failed(err) => {
                error!(?err, path = %path, "progress subscription failed");
                session.notifier().error(LIVE_DATA_ERROR_MESSAGE);
                return;
            }
        }

        loading.take();
    }

    warn!(path = %path, "progress subscription ended");
}

/// Create the seeded document unless a write got there first, e.g. an award
/// merged while the "missing" event was still queued.
async fn seed_progress(session: &Session, store: &DocumentStore, path: &DocumentPath) {
    let mut seeded = UserProgressDocument::seeded();
    match create_progress(store, path, &seeded).await {
        Ok(Some(version)) => {
            seeded.version = version;
            session.progress().apply_snapshot(&seeded);
            info!(path = %path, version, "seeded progress document");
            session.notifier().info(INITIALIZED_MESSAGE);
        }
        Ok(None) => {
            debug!(path = %path, "progress document appeared before seeding; adopting it");
            match load_progress(store, path).await {
                Ok(Some(current)) => {
                    session.progress().apply_snapshot(&current);
                }
                Ok(None) => debug!(path = %path, "progress document vanished again"),
                Err(err) => warn!(?err, path = %path, "failed to read progress after seeding race"),
            }
        }
        Err(err) => {
            error!(?err, path = %path, "failed to seed progress document");
            session
                .notifier()
                .error(format!("Failed to initialize skill data: {err:#}"));
        }
    }
}
