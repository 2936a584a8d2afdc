use std::collections::VecDeque;

use parley_core::{
    Alert, ChatClient, ChatReply, Conversation, ConversationEvent, Endpoint, Message,
    NetworkError, ScrollTarget,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Longest draft the input box accepts, in characters.
pub const MAX_INPUT_CHARS: usize = 500;

pub type SendTask = JoinHandle<Result<ChatReply, NetworkError>>;

pub struct App {
    pub should_quit: bool,

    // Controller and its transport
    pub conversation: Conversation,
    pub client: ChatClient,
    pub endpoint: Endpoint,
    signals: mpsc::UnboundedReceiver<ConversationEvent>,
    pub send_task: Option<SendTask>,

    // Render state, fed by controller signals
    pub messages: Vec<Message>,
    pub sending: bool,
    pub initializing: bool,
    pub alerts: VecDeque<Alert>,
    pub show_clear_confirm: bool,

    // Input state
    pub input_cursor: usize, // cursor position in chars

    // Chat viewport
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub pending_scroll: Option<ScrollTarget>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(mut conversation: Conversation, client: ChatClient, endpoint: Endpoint) -> Self {
        let signals = conversation.subscribe();

        Self {
            should_quit: false,
            conversation,
            client,
            endpoint,
            signals,
            send_task: None,

            messages: Vec::new(),
            sending: false,
            initializing: true,
            alerts: VecDeque::new(),
            show_clear_confirm: false,

            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            pending_scroll: None,

            animation_frame: 0,
        }
    }

    /// Load the saved conversation and pick up the resulting signals.
    pub fn start(&mut self) {
        self.conversation.initialize();
        self.drain_signals();
    }

    /// Apply every queued controller signal to the render state.
    pub fn drain_signals(&mut self) {
        while let Ok(signal) = self.signals.try_recv() {
            self.apply_signal(signal);
        }
    }

    fn apply_signal(&mut self, signal: ConversationEvent) {
        match signal {
            ConversationEvent::ConversationChanged(messages) => self.messages = messages,
            ConversationEvent::SendingChanged(sending) => self.sending = sending,
            ConversationEvent::InitializingChanged(initializing) => {
                self.initializing = initializing
            }
            ConversationEvent::Alert(alert) => self.alerts.push_back(alert),
            ConversationEvent::Scroll(target) => self.pending_scroll = Some(target),
            ConversationEvent::ClearRequested => self.show_clear_confirm = true,
        }
    }

    /// Submit the draft; the request runs on a background task.
    pub fn submit(&mut self) {
        let Some(text) = self.conversation.begin_send() else {
            return;
        };
        self.input_cursor = 0;

        let client = self.client.clone();
        self.send_task = Some(tokio::spawn(async move { client.send(&text).await }));
        self.drain_signals();
    }

    /// Hand a finished request back to the controller.
    pub async fn poll_send_task(&mut self) {
        let finished = self
            .send_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.send_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "Send task failed");
                    Err(NetworkError::Interrupted(e.to_string()))
                }
            };
            self.conversation.complete_send(result);
            self.drain_signals();
        }
    }

    pub fn request_clear(&mut self) {
        if !self.conversation.request_clear() {
            debug!("Clear ignored while busy");
        }
        self.drain_signals();
    }

    pub fn confirm_clear(&mut self) {
        self.show_clear_confirm = false;
        self.conversation.confirm_clear();
        self.drain_signals();
    }

    pub fn cancel_clear(&mut self) {
        self.show_clear_confirm = false;
        self.conversation.cancel_clear();
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
    }

    pub fn current_alert(&self) -> Option<&Alert> {
        self.alerts.front()
    }

    /// Input is locked while a reply is pending.
    pub fn input_enabled(&self) -> bool {
        !self.sending && !self.initializing
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.sending {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.max_scroll();
        self.chat_scroll = (self.chat_scroll.saturating_add(lines)).min(max_scroll);
    }

    /// Run a scroll hint once the viewport size is known.
    pub fn apply_pending_scroll(&mut self) {
        match self.pending_scroll.take() {
            Some(ScrollTarget::Start) => self.chat_scroll = 0,
            Some(ScrollTarget::End) => self.chat_scroll = self.max_scroll(),
            None => {}
        }
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.total_chat_lines().saturating_sub(visible_height)
    }

    /// Wrapped line count of the chat transcript, typing indicator included.
    pub fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in &self.messages {
            total_lines = total_lines.saturating_add(1); // Label line
            for line in msg.text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                let wrapped = if char_count == 0 { 1 } else { char_count.div_ceil(wrap_width) };
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.sending {
            total_lines = total_lines.saturating_add(2); // "Bot:" + "Typing..."
        }

        total_lines
    }
}
