//! Session state for one chat
//!
//! Owns the transcript, the discovered model list and current selection, and
//! the lifecycle of the active exchange. All transcript mutation rules live
//! here; the UI loop and the stream task never touch messages directly.
//!
//! While a stream is active the incoming fragments accumulate in a private
//! buffer and the trailing assistant entry is rewritten to a snapshot of it
//! after every chunk, so observers always see the full content so far.

use tokio_util::sync::CancellationToken;

use crate::core::chat_stream::StreamMessage;
use crate::core::constants::{NO_RESPONSE_PLACEHOLDER, REQUEST_STOPPED_PLACEHOLDER};
use crate::core::message::Message;

/// Everything the stream task needs to run one exchange. Minted by
/// [`ChatSession::begin_exchange`]; existence of a ticket implies the session
/// guards passed and the transcript has been prepared.
pub struct ExchangeTicket {
    pub model: String,
    pub prompt: String,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

pub struct ChatSession {
    pub messages: Vec<Message>,
    pub models: Vec<String>,
    pub selected_model: Option<String>,
    pub input: String,
    pub is_streaming: bool,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    stream_cancel_token: Option<CancellationToken>,
    current_stream_id: u64,
    current_response: String,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            models: Vec::new(),
            selected_model: None,
            input: String::new(),
            is_streaming: false,
            scroll_offset: 0,
            auto_scroll: true,
            stream_cancel_token: None,
            current_stream_id: 0,
            current_response: String::new(),
        }
    }

    /// Install the discovered model list and select its first entry.
    pub fn set_models(&mut self, models: Vec<String>) {
        self.selected_model = models.first().cloned();
        self.models = models;
    }

    /// Select a model by identifier. An identifier the server did not report
    /// is inserted at the front of the list so the selection invariant
    /// (selected model is always a list member) holds.
    pub fn select_model(&mut self, model: &str) {
        if !self.models.iter().any(|m| m == model) {
            self.models.insert(0, model.to_string());
        }
        self.selected_model = Some(model.to_string());
    }

    /// Advance the selection to the next model in the list. Ignored while an
    /// exchange is in flight.
    pub fn cycle_model(&mut self) {
        if self.is_streaming || self.models.is_empty() {
            return;
        }
        let next = match &self.selected_model {
            Some(current) => {
                let pos = self.models.iter().position(|m| m == current).unwrap_or(0);
                (pos + 1) % self.models.len()
            }
            None => 0,
        };
        self.selected_model = Some(self.models[next].clone());
    }

    /// Begin a new exchange from the current input buffer.
    ///
    /// No-op (returns `None`, mutates nothing) when the trimmed input is
    /// empty, no model is selected, or an exchange is already in flight.
    /// Otherwise appends the user turn plus an empty assistant placeholder,
    /// clears the input, and mints the cancellation token and stream id.
    pub fn begin_exchange(&mut self) -> Option<ExchangeTicket> {
        let prompt = self.input.trim().to_string();
        if prompt.is_empty() || self.is_streaming {
            return None;
        }
        let model = self.selected_model.clone()?;

        self.input.clear();
        self.messages.push(Message::user(prompt.clone()));
        self.messages.push(Message::assistant(""));
        self.current_response.clear();
        self.current_stream_id += 1;
        self.is_streaming = true;
        self.auto_scroll = true;

        let cancel_token = CancellationToken::new();
        self.stream_cancel_token = Some(cancel_token.clone());

        Some(ExchangeTicket {
            model,
            prompt,
            cancel_token,
            stream_id: self.current_stream_id,
        })
    }

    /// Apply one event from the stream task. Events carrying a stale stream
    /// id (from a cancelled or superseded exchange) are dropped.
    pub fn apply_stream_message(&mut self, message: StreamMessage, stream_id: u64) {
        if stream_id != self.current_stream_id || !self.is_streaming {
            return;
        }

        match message {
            StreamMessage::Chunk(text) => {
                self.current_response.push_str(&text);
                let snapshot = self.current_response.clone();
                self.set_last_assistant_content(snapshot);
            }
            StreamMessage::End => {
                if self.current_response.is_empty() {
                    self.set_last_assistant_content(NO_RESPONSE_PLACEHOLDER.to_string());
                }
                self.finish_stream();
            }
            StreamMessage::Error(err) => {
                self.place_final_notice(format!("Error: {err}"));
                self.finish_stream();
            }
        }
    }

    /// Cancel the active exchange, if any. Partial content already shown is
    /// kept; the stop notice replaces the assistant entry only when it is
    /// still empty, and is appended as a new entry otherwise.
    pub fn cancel_active_exchange(&mut self) {
        if !self.is_streaming {
            return;
        }
        if let Some(token) = &self.stream_cancel_token {
            token.cancel();
        }
        self.place_final_notice(REQUEST_STOPPED_PLACEHOLDER.to_string());
        self.finish_stream();
    }

    pub fn last_assistant_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .map(|m| m.content.as_str())
    }

    /// Replace the trailing assistant entry when it is still empty; append a
    /// fresh assistant entry otherwise.
    fn place_final_notice(&mut self, notice: String) {
        match self.messages.last_mut() {
            Some(last) if last.is_assistant() && last.content.is_empty() => {
                last.content = notice;
            }
            _ => {
                self.messages.push(Message::assistant(notice));
            }
        }
    }

    fn set_last_assistant_content(&mut self, content: String) {
        if let Some(last) = self.messages.last_mut() {
            if last.is_assistant() {
                last.content = content;
            }
        }
    }

    fn finish_stream(&mut self) {
        self.is_streaming = false;
        self.stream_cancel_token = None;
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
