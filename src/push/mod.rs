//! In-memory live-push registry.
//!
//! One subscription list per user id; publishing delivers to every currently
//! subscribed session and silently drops the payload when none are
//! connected. The websocket surface that would call `subscribe` on
//! connection establishment lives outside this crate; the durable record of
//! a notification is always the inbox row, never the push.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::domain::ports::LivePush;

#[derive(Default)]
pub struct InMemoryPush {
    sessions: Mutex<HashMap<Uuid, Vec<UnboundedSender<Value>>>>,
}

impl InMemoryPush {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for `user_id`. Dropping the receiver ends the
    /// subscription; the dead sender is pruned on the next publish.
    pub fn subscribe(&self, user_id: Uuid) -> UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sessions = match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions.entry(user_id).or_default().push(tx);
        rx
    }
}

impl LivePush for InMemoryPush {
    fn publish(&self, user_id: Uuid, payload: Value) {
        let mut sessions = match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(senders) = sessions.get_mut(&user_id) {
            senders.retain(|tx| tx.send(payload.clone()).is_ok());
            if senders.is_empty() {
                sessions.remove(&user_id);
            }
        }
    }
}
