mod memory_store;
mod redis_store;

use std::collections::BTreeMap;
use std::fmt;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use memory_store::MemoryDocumentStore;
use redis_store::RedisDocumentStore;

/// Reserved field name carrying the document version counter.
pub const VERSION_FIELD: &str = "version";

/// Capacity of the per-subscription event buffer.
const SUBSCRIPTION_BUFFER: usize = 16;

/// Top-level document fields keyed by name.
pub type Fields = BTreeMap<String, serde_json::Value>;

/// A stored document with its monotonic version.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub version: u64,
    pub fields: Fields,
}

/// Hierarchical document address, e.g. `artifacts/{app}/users/{uid}/skills/user_data`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The single progress document owned by `user_id` inside the `app_id` namespace.
    pub fn user_progress(app_id: &str, user_id: &str) -> Self {
        Self::new([
            "artifacts",
            app_id,
            "users",
            user_id,
            "skills",
            "user_data",
        ])
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Item delivered by a [`Subscription`].
#[derive(Debug)]
pub enum StoreEvent {
    /// Current document, or `None` when it does not exist.
    Snapshot(Option<Document>),
    /// The subscription failed and will deliver nothing further.
    Error(anyhow::Error),
}

/// Live feed of a document. The first event is the current state; the feed
/// stops when this handle is dropped.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::Receiver<StoreEvent>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn channel() -> (mpsc::Sender<StoreEvent>, mpsc::Receiver<StoreEvent>) {
        mpsc::channel(SUBSCRIPTION_BUFFER)
    }

    pub(crate) fn new(events: mpsc::Receiver<StoreEvent>, task: JoinHandle<()>) -> Self {
        Self { events, task }
    }

    pub async fn next(&mut self) -> Option<StoreEvent> {
        self.events.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Clone, Debug)]
enum StoreBackend {
    Memory(MemoryDocumentStore),
    Redis(RedisDocumentStore),
}

/// Per-user document store with get/put/merge/subscribe semantics.
#[derive(Clone, Debug)]
pub struct DocumentStore {
    key_prefix: String,
    backend: StoreBackend,
}

impl DocumentStore {
    /// Process-local store. Nothing survives a restart.
    pub fn memory(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: StoreBackend::Memory(MemoryDocumentStore::new()),
        }
    }

    pub fn redis(redis_url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            key_prefix: prefix.into(),
            backend: StoreBackend::Redis(RedisDocumentStore::from_url(redis_url)?),
        })
    }

    pub fn is_redis_enabled(&self) -> bool {
        matches!(self.backend, StoreBackend::Redis(_))
    }

    pub fn key(&self, path: &DocumentPath) -> String {
        format!("{}:{}", self.key_prefix, path.segments().join(":"))
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.backend {
            StoreBackend::Memory(_) => Ok(()),
            StoreBackend::Redis(store) => store.ping().await,
        }
    }

    pub async fn get(&self, path: &DocumentPath) -> anyhow::Result<Option<Document>> {
        let key = self.key(path);
        match &self.backend {
            StoreBackend::Memory(store) => store.get(&key).await,
            StoreBackend::Redis(store) => store.get(&key).await,
        }
    }

    /// Replace the whole document. Returns the new version.
    pub async fn put(&self, path: &DocumentPath, fields: Fields) -> anyhow::Result<u64> {
        ensure_unreserved(&fields, path)?;
        let key = self.key(path);
        match &self.backend {
            StoreBackend::Memory(store) => store.put(&key, fields).await,
            StoreBackend::Redis(store) => store.put(&key, fields).await,
        }
    }

    /// Upsert the given top-level fields, leaving the others untouched. Returns the new version.
    pub async fn merge(&self, path: &DocumentPath, fields: Fields) -> anyhow::Result<u64> {
        ensure_unreserved(&fields, path)?;
        let key = self.key(path);
        match &self.backend {
            StoreBackend::Memory(store) => store.merge(&key, fields).await,
            StoreBackend::Redis(store) => store.merge(&key, fields).await,
        }
    }

    /// Write the document only if it does not exist. Returns the new version,
    /// or `None` when a document was already there and nothing was written.
    pub async fn create(&self, path: &DocumentPath, fields: Fields) -> anyhow::Result<Option<u64>> {
        ensure_unreserved(&fields, path)?;
        let key = self.key(path);
        match &self.backend {
            StoreBackend::Memory(store) => store.create(&key, fields).await,
            StoreBackend::Redis(store) => store.create(&key, fields).await,
        }
    }

    /// Remove the document. Subscribers see it as missing.
    pub async fn delete(&self, path: &DocumentPath) -> anyhow::Result<()> {
        let key = self.key(path);
        match &self.backend {
            StoreBackend::Memory(store) => store.delete(&key).await,
            StoreBackend::Redis(store) => store.delete(&key).await,
        }
    }

    pub async fn subscribe(&self, path: &DocumentPath) -> anyhow::Result<Subscription> {
        let key = self.key(path);
        match &self.backend {
            StoreBackend::Memory(store) => store.subscribe(key).await,
            StoreBackend::Redis(store) => store.subscribe(key).await,
        }
    }
}

fn ensure_unreserved(fields: &Fields, path: &DocumentPath) -> anyhow::Result<()> {
    if fields.contains_key(VERSION_FIELD) {
        anyhow::bail!("field `{VERSION_FIELD}` is reserved in document `{path}`");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DocumentPath, DocumentStore, Fields, StoreEvent};

    fn fields(entries: &[(&str, serde_json::Value)]) -> Fields {
        entries
            .iter()
            .map(|(name, value)| ((*name).to_owned(), value.clone()))
            .collect()
    }

    #[test]
    fn user_progress_path_shape() {
        let path = DocumentPath::user_progress("app", "u1");
        assert_eq!(path.to_string(), "artifacts/app/users/u1/skills/user_data");

        let store = DocumentStore::memory("questlog");
        assert_eq!(
            store.key(&path),
            "questlog:artifacts:app:users:u1:skills:user_data"
        );
        assert!(!store.is_redis_enabled());
    }

    #[tokio::test]
    async fn missing_document_reads_as_none() {
        let store = DocumentStore::memory("test");
        let path = DocumentPath::user_progress("app", "nobody");
        assert_eq!(store.get(&path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_overwrites_and_bumps_version() {
        let store = DocumentStore::memory("test");
        let path = DocumentPath::user_progress("app", "u1");

        let first = store
            .put(&path, fields(&[("a", json!(1)), ("b", json!(2))]))
            .await
            .unwrap();
        let second = store.put(&path, fields(&[("c", json!(3))])).await.unwrap();
        assert_eq!((first, second), (1, 2));

        let document = store.get(&path).await.unwrap().unwrap();
        assert_eq!(document.version, 2);
        assert_eq!(document.fields, fields(&[("c", json!(3))]));
    }

    #[tokio::test]
    async fn merge_only_touches_given_fields() {
        let store = DocumentStore::memory("test");
        let path = DocumentPath::user_progress("app", "u1");
        store
            .put(&path, fields(&[("a", json!(1)), ("b", json!(2))]))
            .await
            .unwrap();

        let version = store.merge(&path, fields(&[("b", json!(20))])).await.unwrap();
        assert_eq!(version, 2);

        let document = store.get(&path).await.unwrap().unwrap();
        assert_eq!(document.fields, fields(&[("a", json!(1)), ("b", json!(20))]));
    }

    #[tokio::test]
    async fn merge_creates_missing_document() {
        let store = DocumentStore::memory("test");
        let path = DocumentPath::user_progress("app", "u1");
        assert_eq!(store.merge(&path, fields(&[("a", json!(1))])).await.unwrap(), 1);
        assert!(store.get(&path).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_leaves_existing_document_alone() {
        let store = DocumentStore::memory("test");
        let path = DocumentPath::user_progress("app", "u1");
        store.merge(&path, fields(&[("a", json!(1))])).await.unwrap();

        assert_eq!(store.create(&path, fields(&[("b", json!(2))])).await.unwrap(), None);
        let document = store.get(&path).await.unwrap().unwrap();
        assert_eq!(document.version, 1);
        assert_eq!(document.fields, fields(&[("a", json!(1))]));
    }

    #[tokio::test]
    async fn delete_then_create_starts_over() {
        let store = DocumentStore::memory("test");
        let path = DocumentPath::user_progress("app", "u1");
        assert_eq!(store.create(&path, fields(&[("a", json!(1))])).await.unwrap(), Some(1));
        store.merge(&path, fields(&[("a", json!(2))])).await.unwrap();

        let mut subscription = store.subscribe(&path).await.unwrap();
        assert!(matches!(
            subscription.next().await,
            Some(StoreEvent::Snapshot(Some(_)))
        ));

        store.delete(&path).await.unwrap();
        assert!(matches!(
            subscription.next().await,
            Some(StoreEvent::Snapshot(None))
        ));
        assert_eq!(store.get(&path).await.unwrap(), None);
        assert_eq!(store.create(&path, fields(&[("b", json!(3))])).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn reserved_version_field_is_rejected() {
        let store = DocumentStore::memory("test");
        let path = DocumentPath::user_progress("app", "u1");
        assert!(store.put(&path, fields(&[("version", json!(9))])).await.is_err());
        assert!(store.merge(&path, fields(&[("version", json!(9))])).await.is_err());
        assert!(store.create(&path, fields(&[("version", json!(9))])).await.is_err());
        assert_eq!(store.get(&path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn subscription_streams_current_state_then_changes() {
        let store = DocumentStore::memory("test");
        let path = DocumentPath::user_progress("app", "u1");
        let other = DocumentPath::user_progress("app", "u2");
        let mut subscription = store.subscribe(&path).await.unwrap();

        assert!(matches!(
            subscription.next().await,
            Some(StoreEvent::Snapshot(None))
        ));

        store.put(&other, fields(&[("x", json!(0))])).await.unwrap();
        store.put(&path, fields(&[("a", json!(1))])).await.unwrap();
        match subscription.next().await {
            Some(StoreEvent::Snapshot(Some(document))) => {
                assert_eq!(document.version, 1);
                assert_eq!(document.fields, fields(&[("a", json!(1))]));
            }
            other => panic!("unexpected event: {other:?}"),
        }

        store.merge(&path, fields(&[("b", json!(2))])).await.unwrap();
        match subscription.next().await {
            Some(StoreEvent::Snapshot(Some(document))) => assert_eq!(document.version, 2),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_redis_reports_errors() {
        let store = DocumentStore::redis("redis://127.0.0.1:1/", "test").unwrap();
        let path = DocumentPath::user_progress("app", "u1");
        assert!(store.is_redis_enabled());
        assert!(store.ping().await.is_err());
        assert!(store.get(&path).await.is_err());
        assert!(store.merge(&path, fields(&[("a", json!(1))])).await.is_err());
        assert!(store.create(&path, fields(&[("a", json!(1))])).await.is_err());
        assert!(store.delete(&path).await.is_err());
        assert!(store.subscribe(&path).await.is_err());
    }
}
