//! UI-agnostic signal types
//!
//! The conversation controller reports every state change through these
//! events so that any front-end (terminal, desktop, tests) can render without
//! reaching into the controller.

use crate::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    /// Needs acknowledgment before the user carries on
    Error,
    /// Informational; the operation already completed
    Warning,
}

/// Notification the user has to acknowledge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    pub level: AlertLevel,
}

impl Alert {
    pub fn connection_error() -> Self {
        Self {
            title: "Connection Error".to_string(),
            body: "Unable to connect to the chat server. Please check your connection and try again."
                .to_string(),
            level: AlertLevel::Error,
        }
    }

    pub fn clear_storage_warning() -> Self {
        Self {
            title: "Warning".to_string(),
            body: "Chat cleared but there was an issue with storage. Your messages may reappear after refresh."
                .to_string(),
            level: AlertLevel::Warning,
        }
    }
}

/// Where the message list should scroll to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    ConversationChanged(Vec<Message>),
    SendingChanged(bool),
    InitializingChanged(bool),
    Alert(Alert),
    Scroll(ScrollTarget),
    /// A clear was requested and is waiting for confirmation
    ClearRequested,
}
