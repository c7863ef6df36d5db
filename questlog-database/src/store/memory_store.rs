use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::debug;

use super::{Document, Fields, StoreEvent, Subscription};

const CHANGE_BUFFER: usize = 64;

#[derive(Clone, Debug)]
pub struct MemoryDocumentStore {
    documents: Arc<Mutex<HashMap<String, Document>>>,
    changes: broadcast::Sender<String>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            documents: Arc::new(Mutex::new(HashMap::new())),
            changes,
        }
    }

    fn documents(&self) -> MutexGuard<'_, HashMap<String, Document>> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self, key: &str) -> Option<Document> {
        self.documents().get(key).cloned()
    }

    fn publish(&self, key: &str) {
        // No receivers just means nobody is subscribed.
        let _ = self.changes.send(key.to_owned());
    }

    pub async fn get(&self, key: &str) -> anyhow::Result<Option<Document>> {
        Ok(self.read(key))
    }

    pub async fn put(&self, key: &str, fields: Fields) -> anyhow::Result<u64> {
        let version = {
            let mut documents = self.documents();
            let version = documents.get(key).map_or(0, |doc| doc.version) + 1;
            documents.insert(key.to_owned(), Document { version, fields });
            version
        };

        self.publish(key);
        Ok(version)
    }

    pub async fn merge(&self, key: &str, fields: Fields) -> anyhow::Result<u64> {
        let version = {
            let mut documents = self.documents();
            let document = documents.entry(key.to_owned()).or_default();
            document.fields.extend(fields);
            document.version += 1;
            document.version
        };

        self.publish(key);
        Ok(version)
    }

    pub async fn create(&self, key: &str, fields: Fields) -> anyhow::Result<Option<u64>> {
        {
            let mut documents = self.documents();
            let Entry::Vacant(slot) = documents.entry(key.to_owned()) else {
                return Ok(None);
            };
            slot.insert(Document { version: 1, fields });
        }

        self.publish(key);
        Ok(Some(1))
    }

    pub async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let removed = self.documents().remove(key).is_some();
        if removed {
            self.publish(key);
        }
        Ok(())
    }

    pub async fn subscribe(&self, key: String) -> anyhow::Result<Subscription> {
        let mut changes = self.changes.subscribe();
        let (tx, rx) = Subscription::channel();
        tx.try_send(StoreEvent::Snapshot(self.read(&key)))
            .map_err(|e| anyhow::anyhow!("failed to queue initial snapshot for `{key}`: {e}"))?;

        let store = self.clone();
        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(changed) if changed == key => {}
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, key = %key, "memory subscription lagged; resending snapshot");
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }

                if tx.send(StoreEvent::Snapshot(store.read(&key))).await.is_err() {
                    return;
                }
            }
        });

        Ok(Subscription::new(rx, task))
    }
}
