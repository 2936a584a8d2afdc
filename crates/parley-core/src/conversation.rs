//! Conversation controller.
//!
//! Owns the in-memory thread and the draft input, keeps the persisted copy in
//! step with it, and turns transport failures into visible bot messages.
//! At most one send is outstanding at a time: [`Conversation::begin_send`]
//! refuses while a previous send has not been completed.

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::client::{ChatReply, ChatTransport};
use crate::config::DEFAULT_GREETING;
use crate::error::NetworkError;
use crate::message::Message;
use crate::state::{Alert, ConversationEvent, ScrollTarget};
use crate::storage::MessageStore;

/// Shown in place of a reply when the server could not be reached.
pub const NETWORK_ERROR_REPLY: &str =
    "Sorry, there was an error connecting to the server. Please try again.";

/// Shown when the server answered with nothing usable.
pub const EMPTY_REPLY_FALLBACK: &str = "Sorry, I couldn't process your request.";

pub struct Conversation {
    store: MessageStore,
    greeting: String,
    messages: Vec<Message>,
    input: String,
    initializing: bool,
    sending: bool,
    clear_pending: bool,
    events: Option<mpsc::UnboundedSender<ConversationEvent>>,
}

impl Conversation {
    /// Create a controller. Nothing is loaded until [`initialize`](Self::initialize).
    ///
    /// A blank greeting is replaced with [`DEFAULT_GREETING`].
    pub fn new(store: MessageStore, greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        let greeting = match greeting.trim() {
            "" => DEFAULT_GREETING.to_string(),
            trimmed => trimmed.to_string(),
        };

        Self {
            store,
            greeting,
            messages: Vec::new(),
            input: String::new(),
            initializing: true,
            sending: false,
            clear_pending: false,
            events: None,
        }
    }

    /// Route UI signals to a new channel, replacing any previous subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ConversationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_initializing(&self) -> bool {
        self.initializing
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn is_clear_pending(&self) -> bool {
        self.clear_pending
    }

    pub fn is_idle(&self) -> bool {
        !self.initializing && !self.sending
    }

    /// True when the draft holds something sendable and no send is running.
    pub fn can_send(&self) -> bool {
        self.is_idle() && !self.input.trim().is_empty()
    }

    /// Load the persisted thread, seeding a greeting when there is none.
    pub fn initialize(&mut self) {
        self.set_initializing(true);

        let saved = self.store.load();
        if saved.is_empty() {
            let welcome = Message::bot(&self.greeting);
            match self.store.save(std::slice::from_ref(&welcome)) {
                Ok(()) => self.messages = vec![welcome],
                Err(e) => {
                    warn!(error = %e, "Could not persist greeting, keeping it in memory only");
                    self.messages = vec![Message::bot(&self.greeting)];
                }
            }
        } else {
            info!(count = saved.len(), "Restored saved conversation");
            self.messages = saved;
        }

        self.emit_messages();
        self.emit(ConversationEvent::Scroll(ScrollTarget::End));
        self.set_initializing(false);
    }

    /// Start sending the current draft.
    ///
    /// Appends and persists the user message, clears the draft and returns
    /// the text to transmit. Returns `None` (changing nothing) when the draft
    /// is blank, the controller is not idle, or a clear is awaiting
    /// confirmation.
    pub fn begin_send(&mut self) -> Option<String> {
        if self.clear_pending {
            debug!("Ignoring submit while a clear is awaiting confirmation");
            return None;
        }
        if !self.is_idle() {
            debug!(
                sending = self.sending,
                initializing = self.initializing,
                "Ignoring submit while busy"
            );
            return None;
        }

        let user_message = Message::user(&self.input)?;
        let text = user_message.text.clone();

        self.messages.push(user_message);
        self.persist();
        self.emit_messages();
        self.emit(ConversationEvent::Scroll(ScrollTarget::End));

        self.input.clear();
        self.set_sending(true);

        Some(text)
    }

    /// Finish the outstanding send with the transport's result.
    pub fn complete_send(&mut self, result: Result<ChatReply, NetworkError>) {
        if !self.sending {
            warn!("complete_send called with no send outstanding");
            return;
        }

        let mut alert = None;
        let bot_message = match result {
            Ok(reply) if reply.text.trim().is_empty() => Message::bot(EMPTY_REPLY_FALLBACK),
            Ok(reply) => Message::bot(&reply.text),
            Err(e) => {
                error!(error = %e, status = ?e.status(), "Error sending message");
                alert = Some(Alert::connection_error());
                Message::bot(NETWORK_ERROR_REPLY)
            }
        };

        self.messages.push(bot_message);
        self.persist();
        self.emit_messages();
        self.emit(ConversationEvent::Scroll(ScrollTarget::End));

        if let Some(alert) = alert {
            self.emit(ConversationEvent::Alert(alert));
        }

        self.set_sending(false);
    }

    /// Send the draft through `transport` and record the outcome.
    ///
    /// Returns `false` when the submit was rejected.
    pub async fn send<T>(&mut self, transport: &T) -> bool
    where
        T: ChatTransport + ?Sized,
    {
        let Some(text) = self.begin_send() else {
            return false;
        };
        let result = transport.send_message(&text).await;
        self.complete_send(result);
        true
    }

    /// Ask for confirmation before clearing. Only allowed while idle.
    pub fn request_clear(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.clear_pending = true;
        self.emit(ConversationEvent::ClearRequested);
        true
    }

    pub fn cancel_clear(&mut self) {
        self.clear_pending = false;
    }

    /// Wipe storage and reset the thread to a fresh greeting.
    ///
    /// The in-memory reset always happens once confirmed; storage trouble only
    /// produces a warning alert.
    pub fn confirm_clear(&mut self) -> bool {
        if !self.clear_pending || !self.is_idle() {
            return false;
        }
        self.clear_pending = false;

        let outcome = self.store.clear();

        self.messages = vec![Message::bot(&self.greeting)];
        self.emit_messages();

        let saved = self.store.save(&self.messages);
        if let Err(e) = &saved {
            error!(error = %e, "Error saving greeting after clear");
        }

        if !outcome.is_cleared() || saved.is_err() {
            self.emit(ConversationEvent::Alert(Alert::clear_storage_warning()));
        }

        info!(outcome = ?outcome, "Chat cleared");
        self.emit(ConversationEvent::Scroll(ScrollTarget::Start));
        true
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.messages) {
            error!(error = %e, "Error saving messages");
        }
    }

    fn set_sending(&mut self, sending: bool) {
        self.sending = sending;
        self.emit(ConversationEvent::SendingChanged(sending));
    }

    fn set_initializing(&mut self, initializing: bool) {
        self.initializing = initializing;
        self.emit(ConversationEvent::InitializingChanged(initializing));
    }

    fn emit_messages(&self) {
        self.emit(ConversationEvent::ConversationChanged(self.messages.clone()));
    }

    fn emit(&self, event: ConversationEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is rendering.
            let _ = tx.send(event);
        }
    }
}
