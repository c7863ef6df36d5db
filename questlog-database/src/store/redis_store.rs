use std::collections::HashMap;
use std::pin::pin;
use std::sync::LazyLock;

use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::{AsyncCommands, FromRedisValue, Script};
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use super::{Document, Fields, StoreEvent, Subscription, VERSION_FIELD};

/// Replace the hash, bump `version` past its previous value and announce it.
static PUT_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
local version = tonumber(redis.call('HGET', KEYS[1], 'version') or '0') + 1
redis.call('DEL', KEYS[1])
for i = 1, #ARGV, 2 do
    redis.call('HSET', KEYS[1], ARGV[i], ARGV[i + 1])
end
redis.call('HSET', KEYS[1], 'version', version)
redis.call('PUBLISH', KEYS[2], version)
return version
",
    )
});

/// Upsert fields into the hash, bump `version` and announce it.
static MERGE_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
for i = 1, #ARGV, 2 do
    redis.call('HSET', KEYS[1], ARGV[i], ARGV[i + 1])
end
local version = redis.call('HINCRBY', KEYS[1], 'version', 1)
redis.call('PUBLISH', KEYS[2], version)
return version
",
    )
});

/// Write the hash at version 1 unless the key already exists. Returns nil when it does.
static CREATE_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return false
end
for i = 1, #ARGV, 2 do
    redis.call('HSET', KEYS[1], ARGV[i], ARGV[i + 1])
end
redis.call('HSET', KEYS[1], 'version', 1)
redis.call('PUBLISH', KEYS[2], 1)
return 1
",
    )
});

/// Drop the hash and announce the removal.
static DELETE_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
local removed = redis.call('DEL', KEYS[1])
if removed == 1 then
    redis.call('PUBLISH', KEYS[2], 0)
end
return removed
",
    )
});

fn changes_channel(key: &str) -> String {
    format!("{key}:changes")
}

/// Documents live in one hash per key: a JSON value per top-level field plus a
/// `version` counter. Writes publish the new version on `{key}:changes`.
#[derive(Clone, Debug)]
pub struct RedisDocumentStore {
    client: redis::Client,
    pool: Pool,
}

impl RedisDocumentStore {
    pub fn from_url(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| anyhow::anyhow!("invalid redis url: {e}"))?;
        let config = Config::from_url(redis_url);
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| anyhow::anyhow!("failed to create redis pool: {e}"))?;

        Ok(Self { client, pool })
    }

    async fn connection(&self) -> anyhow::Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| anyhow::anyhow!("failed to get redis connection: {e}"))
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("redis PING failed: {e}"))?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> anyhow::Result<Option<Document>> {
        let mut conn = self.connection().await?;
        let raw = conn
            .hgetall::<_, HashMap<String, String>>(key)
            .await
            .map_err(|e| anyhow::anyhow!("redis HGETALL failed for key `{key}`: {e}"))?;

        if raw.is_empty() {
            return Ok(None);
        }

        let mut document = Document::default();
        for (field, value) in raw {
            if field == VERSION_FIELD {
                document.version = value.parse().map_err(|e| {
                    anyhow::anyhow!("invalid version `{value}` stored at `{key}`: {e}")
                })?;
                continue;
            }

            let parsed = serde_json::from_str(&value).map_err(|e| {
                anyhow::anyhow!("failed to deserialize field `{field}` of `{key}`: {e}")
            })?;
            document.fields.insert(field, parsed);
        }

        Ok(Some(document))
    }

    pub async fn put(&self, key: &str, fields: Fields) -> anyhow::Result<u64> {
        self.run_write(&PUT_SCRIPT, "put", key, fields).await
    }

    pub async fn merge(&self, key: &str, fields: Fields) -> anyhow::Result<u64> {
        self.run_write(&MERGE_SCRIPT, "merge", key, fields).await
    }

    pub async fn create(&self, key: &str, fields: Fields) -> anyhow::Result<Option<u64>> {
        self.run_write(&CREATE_SCRIPT, "create", key, fields).await
    }

    pub async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let removed: u64 = self.run_write(&DELETE_SCRIPT, "delete", key, Fields::new()).await?;
        debug!(key = %key, removed, "deleted document");
        Ok(())
    }

    async fn run_write<T: FromRedisValue>(
        &self,
        script: &Script,
        operation: &str,
        key: &str,
        fields: Fields,
    ) -> anyhow::Result<T> {
        let mut invocation = script.prepare_invoke();
        invocation.key(key).key(changes_channel(key));
        for (field, value) in &fields {
            let payload = serde_json::to_string(value).map_err(|e| {
                anyhow::anyhow!("failed to serialize field `{field}` of `{key}`: {e}")
            })?;
            invocation.arg(field).arg(payload);
        }

        let mut conn = self.connection().await?;
        invocation
            .invoke_async::<T>(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("redis {operation} failed for key `{key}`: {e}"))
    }

    pub async fn subscribe(&self, key: String) -> anyhow::Result<Subscription> {
        let channel = changes_channel(&key);
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| anyhow::anyhow!("failed to open redis pub/sub connection: {e}"))?;
        pubsub
            .subscribe(&channel)
            .await
            .map_err(|e| anyhow::anyhow!("redis SUBSCRIBE failed for `{channel}`: {e}"))?;

        let initial = self.get(&key).await?;
        let (tx, rx) = Subscription::channel();
        tx.try_send(StoreEvent::Snapshot(initial))
            .map_err(|e| anyhow::anyhow!("failed to queue initial snapshot for `{key}`: {e}"))?;

        let store = self.clone();
        let task = tokio::spawn(async move {
            let mut messages = pin!(pubsub.on_message());
            while let Some(message) = messages.next().await {
                debug!(channel = message.get_channel_name(), "document change announced");

                let event = match store.get(&key).await {
                    Ok(document) => StoreEvent::Snapshot(document),
                    Err(e) => StoreEvent::Error(e),
                };
                let failed = matches!(event, StoreEvent::Error(_));
                if tx.send(event).await.is_err() || failed {
                    return;
                }
            }

            warn!(key = %key, "redis pub/sub stream ended");
            let _ = tx
                .send(StoreEvent::Error(anyhow::anyhow!(
                    "redis subscription closed for `{key}`"
                )))
                .await;
        });

        Ok(Subscription::new(rx, task))
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use serde_json::json;

    use super::{RedisDocumentStore, changes_channel};
    use crate::store::{Fields, StoreEvent};

    fn field(name: &str, value: serde_json::Value) -> Fields {
        [(name.to_owned(), value)].into_iter().collect()
    }

    fn scratch_key() -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos());
        format!("questlog-test:{}:{nanos}", std::process::id())
    }

    #[tokio::test]
    #[ignore = "needs a Redis server at REDIS_URL"]
    async fn scripts_bump_version_and_announce_changes() {
        let Ok(url) = std::env::var("REDIS_URL") else {
            return;
        };
        let store = RedisDocumentStore::from_url(&url).unwrap();
        let key = scratch_key();

        let mut subscription = store.subscribe(key.clone()).await.unwrap();
        assert!(matches!(
            subscription.next().await,
            Some(StoreEvent::Snapshot(None))
        ));

        assert_eq!(store.create(&key, field("a", json!(1))).await.unwrap(), Some(1));
        assert_eq!(store.create(&key, field("a", json!(9))).await.unwrap(), None);
        match subscription.next().await {
            Some(StoreEvent::Snapshot(Some(document))) => assert!(document.version >= 1),
            other => panic!("unexpected event: {other:?}"),
        }

        assert_eq!(store.merge(&key, field("b", json!(2))).await.unwrap(), 2);
        assert_eq!(store.put(&key, field("c", json!(3))).await.unwrap(), 3);
        let document = store.get(&key).await.unwrap().unwrap();
        assert_eq!(document.version, 3);
        assert_eq!(document.fields, field("c", json!(3)));

        store.delete(&key).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);

        let removal_seen = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(event) = subscription.next().await {
                if matches!(event, StoreEvent::Snapshot(None)) {
                    return true;
                }
            }
            false
        })
        .await;
        assert_eq!(removal_seen.ok(), Some(true));
    }

    #[test]
    fn change_channel_is_derived_from_key() {
        assert_eq!(changes_channel("q:a:b"), "q:a:b:changes");
    }

    #[test]
    fn rejects_malformed_url() {
        assert!(RedisDocumentStore::from_url("not a url").is_err());
    }
}
