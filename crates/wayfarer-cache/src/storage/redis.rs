use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures::StreamExt;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig, PubSubSink, PubSubStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use wayfarer_config::ReconnectConfig;

use crate::error::CacheError;
use crate::subscriptions::{RawHandler, Subscriptions};

/// Keys requested per `SCAN` round trip
const SCAN_BATCH: usize = 100;

/// Redis-backed store over three dedicated connections
///
/// Ordinary commands and `PUBLISH` each get a reconnecting
/// [`ConnectionManager`]. The subscriber connection is split into a sink,
/// used to issue `SUBSCRIBE`, and a stream owned by a supervisor task that
/// dispatches messages and reconnects when the stream ends.
#[derive(Clone)]
pub struct RedisStore {
    inner: Arc<Inner>,
}

struct Inner {
    connections: RwLock<Option<Connections>>,
    subscriber: Arc<Subscriber>,
}

struct Connections {
    commands: ConnectionManager,
    publisher: ConnectionManager,
    supervisor: JoinHandle<()>,
}

/// Subscriber side shared with the supervisor task
///
/// The sink lock is held across registration and `SUBSCRIBE`, and across
/// resubscription after a reconnect, so no channel is missed in between.
struct Subscriber {
    sink: Mutex<Option<PubSubSink>>,
    subscriptions: Subscriptions,
}

impl RedisStore {
    /// Open all three connections
    ///
    /// Each initial connection is retried with a linear backoff.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or a connection cannot be
    /// established within the configured attempts
    pub async fn connect(url: &str, reconnect: &ReconnectConfig) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::Backend(format!("invalid URL: {e}")))?;

        let (commands, publisher, pubsub) = tokio::try_join!(
            with_backoff("commands", reconnect, || {
                client.get_connection_manager_with_config(manager_config(reconnect))
            }),
            with_backoff("publisher", reconnect, || {
                client.get_connection_manager_with_config(manager_config(reconnect))
            }),
            with_backoff("subscriber", reconnect, || client.get_async_pubsub()),
        )?;

        let (sink, stream) = pubsub.split();
        let subscriber = Arc::new(Subscriber {
            sink: Mutex::new(Some(sink)),
            subscriptions: Subscriptions::default(),
        });
        let supervisor = tokio::spawn(supervise_subscriber(
            client,
            reconnect.clone(),
            stream,
            Arc::clone(&subscriber),
        ));

        tracing::info!("redis connections established");

        Ok(Self {
            inner: Arc::new(Inner {
                connections: RwLock::new(Some(Connections {
                    commands,
                    publisher,
                    supervisor,
                })),
                subscriber,
            }),
        })
    }

    fn with_connections<T>(&self, pick: impl FnOnce(&Connections) -> T) -> Result<T, CacheError> {
        let guard = self.inner.connections.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(pick).ok_or(CacheError::Closed)
    }

    fn commands(&self) -> Result<ConnectionManager, CacheError> {
        self.with_connections(|c| c.commands.clone())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.commands()?;
        Ok(conn.get(key).await?)
    }

    pub async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.commands()?;
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    pub async fn del(&self, keys: &[String]) -> Result<usize, CacheError> {
        let mut conn = self.commands()?;
        Ok(conn.del(keys.to_vec()).await?)
    }

    /// Collect keys matching a glob pattern with a `SCAN` cursor loop
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.commands()?;
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    /// Returns the number of subscribers that received the message
    pub async fn publish(&self, channel: &str, payload: String) -> Result<usize, CacheError> {
        let mut conn = self.with_connections(|c| c.publisher.clone())?;
        Ok(conn.publish(channel, payload).await?)
    }

    /// Register a handler, issuing `SUBSCRIBE` for a channel's first one
    ///
    /// A failed `SUBSCRIBE` leaves the handler registered. The channel is
    /// subscribed again once the subscriber connection is re-established.
    pub async fn subscribe(&self, channel: &str, handler: RawHandler) -> Result<(), CacheError> {
        self.with_connections(|_| ())?;

        let mut slot = self.inner.subscriber.sink.lock().await;
        let sink = slot.as_mut().ok_or(CacheError::Closed)?;

        if self.inner.subscriber.subscriptions.register(channel, handler) {
            sink.subscribe(channel).await?;
        }

        Ok(())
    }

    /// Drop all connections and stop the supervisor task
    pub fn close(&self) {
        let taken = self
            .inner
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(connections) = taken {
            connections.supervisor.abort();
            if let Ok(mut sink) = self.inner.subscriber.sink.try_lock() {
                sink.take();
            }
            self.inner.subscriber.subscriptions.clear();
            tracing::info!("redis connections closed");
        }
    }
}

/// Connection managers back off exponentially, capped at `max_delay_ms`
fn manager_config(reconnect: &ReconnectConfig) -> ConnectionManagerConfig {
    ConnectionManagerConfig::new()
        .set_number_of_retries(usize::try_from(reconnect.max_attempts).unwrap_or(usize::MAX))
        .set_max_delay(reconnect.max_delay_ms)
}

async fn with_backoff<T, F, Fut>(role: &'static str, reconnect: &ReconnectConfig, mut connect: F) -> Result<T, CacheError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = redis::RedisResult<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match connect().await {
            Ok(connection) => return Ok(connection),
            Err(e) if attempt < reconnect.max_attempts => {
                let delay = reconnect.delay_for(attempt);
                tracing::warn!(role, attempt, ?delay, error = %e, "redis connection failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(CacheError::Backend(format!(
                    "{role} connection failed after {attempt} attempts: {e}"
                )));
            }
        }
    }
}

/// Dispatch messages until the stream ends, then reconnect and resubscribe
async fn supervise_subscriber(
    client: redis::Client,
    reconnect: ReconnectConfig,
    mut stream: PubSubStream,
    subscriber: Arc<Subscriber>,
) {
    loop {
        dispatch_messages(&mut stream, &subscriber.subscriptions).await;
        tracing::warn!("redis subscriber stream ended, reconnecting");
        stream = resubscribe(&client, &reconnect, &subscriber).await;
    }
}

async fn dispatch_messages(stream: &mut PubSubStream, subscriptions: &Subscriptions) {
    while let Some(message) = stream.next().await {
        let channel = message.get_channel_name();

        match message.get_payload::<String>() {
            Ok(payload) => {
                let delivered = subscriptions.dispatch(channel, &payload);
                tracing::trace!(channel, delivered, "pub/sub message dispatched");
            }
            Err(e) => tracing::warn!(channel, error = %e, "dropping non-text pub/sub payload"),
        }
    }
}

/// Open a new subscriber connection and subscribe every registered channel
///
/// Retries forever; each round uses the configured backoff and a failed
/// round waits `max_delay_ms` before the next.
async fn resubscribe(client: &redis::Client, reconnect: &ReconnectConfig, subscriber: &Subscriber) -> PubSubStream {
    loop {
        match with_backoff("subscriber", reconnect, || client.get_async_pubsub()).await {
            Ok(mut pubsub) => {
                let mut sink = subscriber.sink.lock().await;
                let channels = subscriber.subscriptions.channels();

                let mut failure = None;
                for channel in &channels {
                    if let Err(e) = pubsub.subscribe(channel).await {
                        failure = Some(e);
                        break;
                    }
                }

                match failure {
                    None => {
                        let (new_sink, stream) = pubsub.split();
                        *sink = Some(new_sink);
                        tracing::info!(channels = channels.len(), "redis subscriber reconnected");
                        return stream;
                    }
                    Some(e) => tracing::warn!(error = %e, "redis resubscribe failed"),
                }
            }
            Err(e) => tracing::error!(error = %e, "redis subscriber still unavailable"),
        }

        tokio::time::sleep(Duration::from_millis(reconnect.max_delay_ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_owned())
    }

    async fn live_store() -> RedisStore {
        match RedisStore::connect(&redis_url(), &ReconnectConfig::default()).await {
            Ok(store) => store,
            Err(e) => panic!("redis at {} is unavailable: {e}", redis_url()),
        }
    }

    fn namespaced(name: &str) -> String {
        format!("wayfarer-test:{}:{name}", std::process::id())
    }

    #[tokio::test]
    async fn connect_gives_up_after_configured_attempts() {
        let reconnect = ReconnectConfig {
            step_ms: 1,
            max_delay_ms: 2,
            max_attempts: 2,
        };

        let Err(e) = RedisStore::connect("redis://127.0.0.1:1", &reconnect).await else {
            panic!("nothing should listen on port 1");
        };

        assert!(e.to_string().contains("after 2 attempts"), "{e}");
    }

    #[tokio::test]
    async fn connect_rejects_invalid_url() {
        let Err(e) = RedisStore::connect("not a url", &ReconnectConfig::default()).await else {
            panic!("url should be rejected");
        };

        assert!(e.to_string().contains("invalid URL"), "{e}");
    }

    #[tokio::test]
    #[ignore = "needs a running redis-server (REDIS_URL)"]
    async fn live_round_trip_and_pattern_scan() {
        let store = live_store().await;
        let first = namespaced("trip:1");
        let second = namespaced("trip:2");

        store.set_ex(&first, "{\"destination\":\"Paris\"}".to_owned(), Duration::from_secs(60)).await.unwrap();
        store.set_ex(&second, "{}".to_owned(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get(&first).await.unwrap().as_deref(), Some("{\"destination\":\"Paris\"}"));

        let keys = store.keys(&namespaced("trip:*")).await.unwrap();
        assert_eq!(keys, [first.clone(), second.clone()]);

        assert_eq!(store.del(&keys).await.unwrap(), 2);
        assert_eq!(store.get(&first).await.unwrap(), None);

        store.close();
        assert!(matches!(store.get(&first).await, Err(CacheError::Closed)));
    }

    #[tokio::test]
    #[ignore = "needs a running redis-server (REDIS_URL)"]
    async fn live_subscriber_resubscribes_after_disconnect() {
        let store = live_store().await;
        let channel = namespaced("chat:1");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        store
            .subscribe(
                &channel,
                Arc::new(move |payload: &str| {
                    let _ = tx.send(payload.to_owned());
                }),
            )
            .await
            .unwrap();

        store.publish(&channel, "\"before\"".to_owned()).await.unwrap();
        let received = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(received.as_deref(), Some("\"before\""));

        let mut conn = store.commands().unwrap();
        let killed: i64 = redis::cmd("CLIENT")
            .arg("KILL")
            .arg("TYPE")
            .arg("pubsub")
            .query_async(&mut conn)
            .await
            .unwrap();
        assert!(killed >= 1);

        let delivered = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                store.publish(&channel, "\"after\"".to_owned()).await.unwrap();
                if let Ok(Some(payload)) = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await
                    && payload == "\"after\""
                {
                    return payload;
                }
            }
        })
        .await;

        assert!(delivered.is_ok(), "handler never received a message after reconnect");
        store.close();
    }
}
