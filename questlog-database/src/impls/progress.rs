use anyhow::Context as _;
use tracing::warn;

use questlog_progression::{Skill, SkillRecord};

use crate::model::progress::{UserProgressDocument, skill_field};
use crate::store::{DocumentPath, DocumentStore, StoreEvent, Subscription};

/// Read the progress document, or `None` if the user has none yet.
pub async fn load_progress(
    store: &DocumentStore,
    path: &DocumentPath,
) -> anyhow::Result<Option<UserProgressDocument>> {
    let Some(document) = store.get(path).await? else {
        return Ok(None);
    };

    let progress = UserProgressDocument::from_document(&document)
        .with_context(|| format!("failed to decode progress document `{path}`"))?;
    Ok(Some(progress))
}

/// Overwrite the whole progress document. Returns the stored version.
pub async fn save_progress(
    store: &DocumentStore,
    path: &DocumentPath,
    progress: &UserProgressDocument,
) -> anyhow::Result<u64> {
    store.put(path, progress.to_fields()?).await
}

/// Write `progress` only if the user has no document yet. `None` means one already existed.
pub async fn create_progress(
    store: &DocumentStore,
    path: &DocumentPath,
    progress: &UserProgressDocument,
) -> anyhow::Result<Option<u64>> {
    store.create(path, progress.to_fields()?).await
}

pub async fn delete_progress(store: &DocumentStore, path: &DocumentPath) -> anyhow::Result<()> {
    store.delete(path).await
}

/// Merge a single skill record, leaving the other skills as the store has them.
pub async fn merge_skill(
    store: &DocumentStore,
    path: &DocumentPath,
    skill: Skill,
    record: SkillRecord,
) -> anyhow::Result<u64> {
    let fields = [skill_field(skill, record)?].into_iter().collect();
    store.merge(path, fields).await
}

#[derive(Debug)]
pub enum ProgressEvent {
    /// The user has no progress document.
    Missing,
    Loaded(UserProgressDocument),
    /// Terminal: no further events follow.
    Failed(anyhow::Error),
}

/// Live feed of a user's progress document.
#[derive(Debug)]
pub struct ProgressSubscription {
    path: DocumentPath,
    inner: Subscription,
    finished: bool,
}

impl ProgressSubscription {
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        if self.finished {
            return None;
        }

        let event = match self.inner.next().await? {
            StoreEvent::Snapshot(None) => ProgressEvent::Missing,
            StoreEvent::Snapshot(Some(document)) => {
                match UserProgressDocument::from_document(&document) {
                    Ok(progress) => ProgressEvent::Loaded(progress),
                    Err(e) => {
                        warn!(?e, path = %self.path, "undecodable progress snapshot");
                        ProgressEvent::Failed(e)
                    }
                }
            }
            StoreEvent::Error(e) => ProgressEvent::Failed(e),
        };

        if matches!(event, ProgressEvent::Failed(_)) {
            self.finished = true;
        }
        Some(event)
    }
}

pub async fn subscribe_progress(
    store: &DocumentStore,
    path: &DocumentPath,
) -> anyhow::Result<ProgressSubscription> {
    let inner = store.subscribe(path).await?;
    Ok(ProgressSubscription {
        path: path.clone(),
        inner,
        finished: false,
    })
}

#[cfg(test)]
mod tests {
    use questlog_progression::{Skill, SkillRecord, apply_points};

    use super::{
        ProgressEvent, create_progress, delete_progress, load_progress, merge_skill,
        save_progress, subscribe_progress,
    };
    use crate::model::progress::UserProgressDocument;
    use crate::store::{DocumentPath, DocumentStore};

    fn leveled(level: u32) -> SkillRecord {
        SkillRecord {
            level,
            current_points: 0,
            points_to_next_level: questlog_progression::points_to_next_level(level),
        }
    }

    #[tokio::test]
    async fn load_returns_none_until_saved() {
        let store = DocumentStore::memory("test");
        let path = DocumentPath::user_progress("app", "u1");
        assert!(load_progress(&store, &path).await.unwrap().is_none());

        let version = save_progress(&store, &path, &UserProgressDocument::seeded())
            .await
            .unwrap();
        let loaded = load_progress(&store, &path).await.unwrap().unwrap();
        assert_eq!(loaded.version, version);
        assert_eq!(loaded.skills, UserProgressDocument::seeded().skills);
    }

    #[tokio::test]
    async fn create_does_not_clobber_an_earlier_merge() {
        let store = DocumentStore::memory("test");
        let path = DocumentPath::user_progress("app", "u1");

        let awarded = apply_points(&SkillRecord::new(), 50).record;
        merge_skill(&store, &path, Skill::Strength, awarded)
            .await
            .unwrap();

        let created = create_progress(&store, &path, &UserProgressDocument::seeded())
            .await
            .unwrap();
        assert_eq!(created, None);
        let stored = load_progress(&store, &path).await.unwrap().unwrap();
        assert_eq!(stored.record(Skill::Strength), awarded);

        delete_progress(&store, &path).await.unwrap();
        assert!(load_progress(&store, &path).await.unwrap().is_none());
        let created = create_progress(&store, &path, &UserProgressDocument::seeded())
            .await
            .unwrap();
        assert_eq!(created, Some(1));
    }

    #[tokio::test]
    async fn merging_one_skill_keeps_remote_values_of_others() {
        let store = DocumentStore::memory("test");
        let path = DocumentPath::user_progress("app", "u1");

        let mut remote = UserProgressDocument::seeded();
        remote.set_record(Skill::Cardio, leveled(4));
        remote.set_record(Skill::Intelligence, leveled(6));
        save_progress(&store, &path, &remote).await.unwrap();

        let stale_local = UserProgressDocument::seeded();
        let awarded = apply_points(&stale_local.record(Skill::Strength), 150).record;
        merge_skill(&store, &path, Skill::Strength, awarded)
            .await
            .unwrap();

        let stored = load_progress(&store, &path).await.unwrap().unwrap();
        assert_eq!(stored.record(Skill::Strength), awarded);
        assert_eq!(stored.record(Skill::Cardio), leveled(4));
        assert_eq!(stored.record(Skill::Intelligence), leveled(6));
        assert_eq!(stored.record(Skill::Camaraderie), SkillRecord::new());
    }

    #[tokio::test]
    async fn subscription_reports_missing_then_loaded() {
        let store = DocumentStore::memory("test");
        let path = DocumentPath::user_progress("app", "u1");
        let mut subscription = subscribe_progress(&store, &path).await.unwrap();

        assert!(matches!(
            subscription.next().await,
            Some(ProgressEvent::Missing)
        ));

        save_progress(&store, &path, &UserProgressDocument::seeded())
            .await
            .unwrap();
        match subscription.next().await {
            Some(ProgressEvent::Loaded(progress)) => assert_eq!(progress.version, 1),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_snapshot_ends_subscription() {
        let store = DocumentStore::memory("test");
        let path = DocumentPath::user_progress("app", "u1");
        store
            .put(
                &path,
                [("Cardio".to_owned(), serde_json::json!(12))]
                    .into_iter()
                    .collect(),
            )
            .await
            .unwrap();

        let mut subscription = subscribe_progress(&store, &path).await.unwrap();
        assert!(matches!(
            subscription.next().await,
            Some(ProgressEvent::Failed(_))
        ));
        assert!(subscription.next().await.is_none());
    }
}
