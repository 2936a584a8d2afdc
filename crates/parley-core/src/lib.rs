pub mod client;
pub mod config;
pub mod conversation;
pub mod endpoint;
pub mod error;
pub mod format;
pub mod message;
pub mod state;
pub mod storage;

// Re-export main types for convenience
pub use client::{extract_reply_text, ChatClient, ChatReply, ChatTransport};
pub use config::{Config, DEFAULT_GREETING};
pub use conversation::{Conversation, EMPTY_REPLY_FALLBACK, NETWORK_ERROR_REPLY};
pub use endpoint::Endpoint;
pub use error::{NetworkError, StorageError};
pub use format::format_reply_text;
pub use message::Message;
pub use state::{Alert, AlertLevel, ConversationEvent, ScrollTarget};
pub use storage::{ClearOutcome, Durability, KvBackend, MemoryKv, MessageStore, SqliteKv};
