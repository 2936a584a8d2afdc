//! Durable storage of the conversation.
//!
//! The whole message list lives under a single key as a JSON array and is
//! rewritten on every mutation. [`MessageStore`] layers the load/save/clear
//! policy on top of a plain string [`KvBackend`].

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::StorageError;
use crate::message::Message;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryKv;
pub use sqlite::SqliteKv;

/// Key holding the serialized conversation.
pub const CHAT_MESSAGES_KEY: &str = "chat_messages";

/// Minimal string key-value storage.
pub trait KvBackend: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    /// Wipe every key the backend holds.
    fn clear_all(&self) -> Result<(), StorageError>;
}

/// How write failures are reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Durability {
    /// Save failures are returned as errors.
    #[default]
    Strict,
    /// Save failures are logged and reported as success; clearing falls back
    /// to wiping the whole backend.
    BestEffort,
}

impl Durability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Durability::Strict => "strict",
            Durability::BestEffort => "best-effort",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Some(Durability::Strict),
            "best-effort" | "besteffort" | "best_effort" => Some(Durability::BestEffort),
            _ => None,
        }
    }
}

/// Result of [`MessageStore::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The conversation key was removed.
    Removed,
    /// Removing the key failed, but wiping the whole backend succeeded.
    WipedAll,
    /// Nothing could be cleared; old messages may come back on next start.
    Failed,
}

impl ClearOutcome {
    pub fn is_cleared(&self) -> bool {
        !matches!(self, ClearOutcome::Failed)
    }
}

/// Persisted copy of the conversation.
pub struct MessageStore {
    backend: Box<dyn KvBackend>,
    durability: Durability,
}

impl MessageStore {
    pub fn new(backend: impl KvBackend + 'static, durability: Durability) -> Self {
        Self {
            backend: Box::new(backend),
            durability,
        }
    }

    /// Read the stored conversation, surfacing decode and backend errors.
    pub fn try_load(&self) -> Result<Vec<Message>, StorageError> {
        match self.backend.get(CHAT_MESSAGES_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Read the stored conversation. Missing or unreadable data yields an
    /// empty list.
    pub fn load(&self) -> Vec<Message> {
        match self.try_load() {
            Ok(messages) => {
                debug!(count = messages.len(), "Loaded stored messages");
                messages
            }
            Err(e) => {
                warn!(error = %e, "Error loading messages, starting empty");
                Vec::new()
            }
        }
    }

    /// Replace the stored conversation with `messages`.
    pub fn save(&self, messages: &[Message]) -> Result<(), StorageError> {
        let result = serde_json::to_string(messages)
            .map_err(StorageError::from)
            .and_then(|raw| self.backend.set(CHAT_MESSAGES_KEY, &raw));

        match result {
            Ok(()) => {
                debug!(count = messages.len(), "Saved messages");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, durability = self.durability.as_str(), "Error saving messages");
                self.absorb(e)
            }
        }
    }

    /// Append one message by rewriting the whole stored list.
    pub fn add(&self, message: Message) -> Result<(), StorageError> {
        let mut messages = self.load();
        messages.push(message);
        self.save(&messages)
    }

    /// Remove the stored conversation. Never fails; the outcome tells the
    /// caller whether anything was actually cleared.
    pub fn clear(&self) -> ClearOutcome {
        let err = match self.backend.remove(CHAT_MESSAGES_KEY) {
            Ok(()) => {
                info!("Stored messages cleared");
                return ClearOutcome::Removed;
            }
            Err(e) => e,
        };
        error!(error = %err, "Error clearing messages");

        if self.durability != Durability::BestEffort {
            return ClearOutcome::Failed;
        }

        match self.backend.clear_all() {
            Ok(()) => {
                info!("Backend wiped as clear fallback");
                ClearOutcome::WipedAll
            }
            Err(e) => {
                error!(error = %e, "Backend wipe also failed");
                ClearOutcome::Failed
            }
        }
    }

    fn absorb(&self, err: StorageError) -> Result<(), StorageError> {
        match self.durability {
            Durability::Strict => Err(err),
            Durability::BestEffort => Ok(()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::FlakyKv;
    use super::*;
    use std::sync::atomic::Ordering;

    fn sample() -> Vec<Message> {
        vec![
            Message::bot("Hello! How can I help you today?"),
            Message::user("what's the weather?").unwrap(),
            Message::bot("Sunny."),
        ]
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MessageStore::new(MemoryKv::new(), Durability::Strict);
        let messages = sample();
        store.save(&messages).unwrap();
        assert_eq!(store.load(), messages);
    }

    #[test]
    fn empty_list_round_trips_as_empty_not_absent() {
        let kv = MemoryKv::new();
        let store = MessageStore::new(kv.clone(), Durability::Strict);
        store.save(&[]).unwrap();
        assert_eq!(kv.get(CHAT_MESSAGES_KEY).unwrap().as_deref(), Some("[]"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn missing_key_loads_empty() {
        let store = MessageStore::new(MemoryKv::new(), Durability::Strict);
        assert!(store.load().is_empty());
        assert!(store.try_load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_data_loads_empty() {
        let kv = MemoryKv::new();
        kv.set(CHAT_MESSAGES_KEY, "[{\"id\": \"1\", \"text\": ").unwrap();
        let store = MessageStore::new(kv, Durability::Strict);
        assert!(store.try_load().is_err());
        assert!(store.load().is_empty());
    }

    #[test]
    fn bad_timestamp_loads_empty() {
        let kv = MemoryKv::new();
        kv.set(
            CHAT_MESSAGES_KEY,
            r#"[{"id":"1","text":"hi","isUser":true,"timestamp":"yesterday"}]"#,
        )
        .unwrap();
        let store = MessageStore::new(kv, Durability::Strict);
        assert!(store.load().is_empty());
    }

    #[test]
    fn save_overwrites_previous_value() {
        let store = MessageStore::new(MemoryKv::new(), Durability::Strict);
        store.save(&sample()).unwrap();
        let only = vec![Message::bot("fresh")];
        store.save(&only).unwrap();
        assert_eq!(store.load(), only);
    }

    #[test]
    fn add_appends_to_stored_list() {
        let store = MessageStore::new(MemoryKv::new(), Durability::Strict);
        let mut messages = sample();
        store.save(&messages).unwrap();

        let extra = Message::user("one more").unwrap();
        store.add(extra.clone()).unwrap();
        messages.push(extra);
        assert_eq!(store.load(), messages);
    }

    #[test]
    fn strict_save_failure_propagates() {
        let kv = FlakyKv::default();
        kv.fail_set.store(true, Ordering::SeqCst);
        let store = MessageStore::new(kv, Durability::Strict);
        assert!(store.save(&sample()).is_err());
        assert!(store.add(Message::bot("x")).is_err());
    }

    #[test]
    fn best_effort_save_failure_is_absorbed() {
        let kv = FlakyKv::default();
        kv.fail_set.store(true, Ordering::SeqCst);
        let store = MessageStore::new(kv, Durability::BestEffort);
        assert!(store.save(&sample()).is_ok());
        assert!(store.add(Message::bot("x")).is_ok());
        assert!(store.load().is_empty());
    }

    #[test]
    fn clear_removes_conversation() {
        let store = MessageStore::new(MemoryKv::new(), Durability::Strict);
        store.save(&sample()).unwrap();
        assert_eq!(store.clear(), ClearOutcome::Removed);
        assert!(store.load().is_empty());
    }

    #[test]
    fn clear_twice_is_same_as_once() {
        let kv = MemoryKv::new();
        let store = MessageStore::new(kv.clone(), Durability::Strict);
        store.save(&sample()).unwrap();
        assert_eq!(store.clear(), ClearOutcome::Removed);
        assert_eq!(store.clear(), ClearOutcome::Removed);
        assert_eq!(kv.get(CHAT_MESSAGES_KEY).unwrap(), None);
    }

    #[test]
    fn best_effort_clear_falls_back_to_wipe() {
        let kv = FlakyKv::default();
        kv.inner.set("other", "value").unwrap();
        kv.fail_remove.store(true, Ordering::SeqCst);
        let store = MessageStore::new(kv.clone(), Durability::BestEffort);
        store.save(&sample()).unwrap();

        assert_eq!(store.clear(), ClearOutcome::WipedAll);
        assert_eq!(kv.clear_all_calls.load(Ordering::SeqCst), 1);
        assert!(store.load().is_empty());
        assert_eq!(kv.inner.get("other").unwrap(), None);
    }

    #[test]
    fn best_effort_clear_reports_failure_when_wipe_fails() {
        let kv = FlakyKv::default();
        kv.fail_remove.store(true, Ordering::SeqCst);
        kv.fail_clear_all.store(true, Ordering::SeqCst);
        let store = MessageStore::new(kv.clone(), Durability::BestEffort);

        assert_eq!(store.clear(), ClearOutcome::Failed);
        assert_eq!(kv.clear_all_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn strict_clear_does_not_wipe_backend() {
        let kv = FlakyKv::default();
        kv.fail_remove.store(true, Ordering::SeqCst);
        let store = MessageStore::new(kv.clone(), Durability::Strict);

        assert_eq!(store.clear(), ClearOutcome::Failed);
        assert_eq!(kv.clear_all_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn durability_parses_config_spellings() {
        assert_eq!(Durability::from_str("strict"), Some(Durability::Strict));
        assert_eq!(Durability::from_str("Best-Effort"), Some(Durability::BestEffort));
        assert_eq!(Durability::from_str("web"), None);
        assert_eq!(Durability::BestEffort.as_str(), "best-effort");
    }
}
