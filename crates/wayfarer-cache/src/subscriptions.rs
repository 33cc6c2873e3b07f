use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use dashmap::DashMap;

/// Handler over the raw JSON text of one message
pub(crate) type RawHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Channel name to registered handlers
#[derive(Default)]
pub(crate) struct Subscriptions {
    channels: DashMap<String, Vec<RawHandler>>,
}

impl Subscriptions {
    /// Register a handler, returning `true` when it is the channel's first
    pub fn register(&self, channel: &str, handler: RawHandler) -> bool {
        let mut handlers = self.channels.entry(channel.to_owned()).or_default();
        handlers.push(handler);
        handlers.len() == 1
    }

    /// Channels with at least one handler, used to resubscribe after a reconnect
    pub fn channels(&self) -> Vec<String> {
        self.channels.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn clear(&self) {
        self.channels.clear();
    }

    /// Deliver a payload to the handlers registered right now
    ///
    /// Handlers run outside the map lock so they may subscribe in turn. A
    /// panicking handler is logged and does not stop delivery to the rest.
    pub fn dispatch(&self, channel: &str, payload: &str) -> usize {
        let handlers = match self.channels.get(channel) {
            Some(entry) => entry.value().clone(),
            None => return 0,
        };

        for handler in &handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
                tracing::error!(channel, "pub/sub handler panicked");
            }
        }

        handlers.len()
    }
}
