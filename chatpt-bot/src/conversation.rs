//! Reply-chain memory: the turn history behind each message the bot sent, so a reply to it continues
//! the same conversation.

use llm_client::ChatMessage;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_CONTEXT_TTL_SECS: u64 = 1800;
pub const DEFAULT_CONTEXT_MAX_ENTRIES: usize = 1000;

/// `(chat_id, bot_message_id)`.
type Key = (i64, String);

struct Entry {
    history: Vec<ChatMessage>,
    stored_at: Instant,
    /// Insertion order; breaks ties between equal instants when evicting the oldest.
    seq: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<Key, Entry>,
    next_seq: u64,
}

/// Turn histories keyed by the bot message that ended them.
///
/// Entries older than the TTL are dropped on every access; above `max_entries` the oldest go first.
pub struct ConversationStore {
    inner: Mutex<Inner>,
    ttl: Duration,
    max_entries: usize,
}

impl ConversationStore {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// History that ended with bot message `bot_message_id` in `chat_id`, if still retained.
    pub async fn history(&self, chat_id: i64, bot_message_id: &str) -> Option<Vec<ChatMessage>> {
        let mut inner = self.inner.lock().await;
        self.evict_expired(&mut inner);
        inner
            .entries
            .get(&(chat_id, bot_message_id.to_string()))
            .map(|e| e.history.clone())
    }

    /// Stores `history` under every message id of one bot reply (a long reply spans several messages).
    pub async fn record(&self, chat_id: i64, bot_message_ids: &[String], history: Vec<ChatMessage>) {
        let mut inner = self.inner.lock().await;
        self.evict_expired(&mut inner);
        let now = Instant::now();
        for id in bot_message_ids {
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.entries.insert(
                (chat_id, id.clone()),
                Entry {
                    history: history.clone(),
                    stored_at: now,
                    seq,
                },
            );
        }
        while inner.entries.len() > self.max_entries {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.seq)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    inner.entries.remove(&key);
                }
                None => break,
            }
        }
        debug!(
            chat_id = chat_id,
            turns = history.len(),
            entries = inner.entries.len(),
            "conversation recorded"
        );
    }

    pub async fn len(&self) -> usize {
        let mut inner = self.inner.lock().await;
        self.evict_expired(&mut inner);
        inner.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn evict_expired(&self, inner: &mut Inner) {
        let ttl = self.ttl;
        inner.entries.retain(|_, e| e.stored_at.elapsed() < ttl);
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_CONTEXT_TTL_SECS),
            DEFAULT_CONTEXT_MAX_ENTRIES,
        )
    }
}
