//! In-process topic pub/sub, bridging client and farm sockets.
//!
//! Stands in for the reference transport's native pub/sub (this
//! implementation's WebSocket layer, `axum`, has no topic concept of
//! its own). See SPEC_FULL.md §4.5.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;

pub fn client_topic(session_id: i64) -> String {
    format!("client_{session_id}")
}

pub fn arduino_topic(session_id: i64) -> String {
    format!("arduino_{session_id}")
}

/// Opaque handle returned by [`Broker::subscribe`]; pass it to
/// [`Broker::unsubscribe`] so a stale connection can't clobber a newer
/// registration on the same topic.
pub type SubscriptionHandle = u64;

struct Registration {
    handle: SubscriptionHandle,
    sender: UnboundedSender<String>,
}

#[derive(Default)]
pub struct Broker {
    topics: Mutex<HashMap<String, Registration>>,
    next_handle: AtomicU64,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sender` as the receiver for `topic`, replacing any
    /// existing registration.
    pub fn subscribe(&self, topic: impl Into<String>, sender: UnboundedSender<String>) -> SubscriptionHandle {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.topics
            .lock()
            .expect("broker mutex poisoned")
            .insert(topic.into(), Registration { handle, sender });
        handle
    }

    /// Remove the registration for `topic` only if it is still the one
    /// identified by `handle`.
    pub fn unsubscribe(&self, topic: &str, handle: SubscriptionHandle) {
        let mut topics = self.topics.lock().expect("broker mutex poisoned");
        if topics.get(topic).map(|r| r.handle) == Some(handle) {
            topics.remove(topic);
        }
    }

    /// Best-effort delivery: a missing or closed subscriber is silently
    /// dropped, matching the no-durable-queue non-goal.
    pub fn publish(&self, topic: &str, message: impl Into<String>) {
        let topics = self.topics.lock().expect("broker mutex poisoned");
        if let Some(reg) = topics.get(topic) {
            let _ = reg.sender.send(message.into());
        }
    }
}
