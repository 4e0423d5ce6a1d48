use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::common::{ChatEvent, ChatMessage, MessageId, Participant, ScreenError, UserId};

const MAX_DEBUG_EVENTS: usize = 100;

/// Debug entry shown in the side panel
#[derive(Debug, Clone)]
pub struct DebugEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: &'static str,
    pub message: String,
}

/// Local UI state. `messages` and `typing` mirror the chat manager and are
/// only changed by applying its events.
pub struct AppState {
    pub local_user: Participant,
    pub remote_user: Participant,
    pub messages: Vec<ChatMessage>,
    pub typing: BTreeMap<UserId, bool>,
    pub input_text: String,
    /// Message the next send will answer
    pub reply_target: Option<MessageId>,
    pub notice: Option<String>,
    pub debug_events: Vec<DebugEvent>,
}

impl AppState {
    pub fn new(local_user: Participant, remote_user: Participant) -> Self {
        Self {
            local_user,
            remote_user,
            messages: Vec::new(),
            typing: BTreeMap::new(),
            input_text: String::new(),
            reply_target: None,
            notice: None,
            debug_events: Vec::new(),
        }
    }

    pub fn apply_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::MessageAppended(message) => {
                self.add_debug_event(
                    "APPENDED",
                    format!("{}: {}", message.sender_name, message.content),
                );
                self.upsert_message(message);
            }
            ChatEvent::MessageUpdated(message) => {
                self.add_debug_event(
                    "UPDATED",
                    format!("{} is {}", message.id.short(), message.state),
                );
                self.upsert_message(message);
            }
            ChatEvent::TypingChanged { user_id, is_typing } => {
                let verb = if is_typing { "started" } else { "stopped" };
                let entry = format!("{} {verb} typing", self.display_name(&user_id));
                self.add_debug_event("TYPING", entry);
                self.typing.insert(user_id, is_typing);
            }
        }
    }

    pub fn show_failure(&mut self, err: &ScreenError) {
        let notice = if err.is_retryable() {
            format!("{err} (try again)")
        } else {
            err.to_string()
        };
        self.add_debug_event("FAILURE", notice.clone());
        self.notice = Some(notice);
    }

    pub fn message(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn is_typing(&self, user_id: &str) -> bool {
        self.typing.get(user_id).copied().unwrap_or(false)
    }

    /// Display names of everyone currently typing, in id order.
    pub fn typing_names(&self) -> Vec<String> {
        self.typing
            .iter()
            .filter(|(_, typing)| **typing)
            .map(|(user_id, _)| self.display_name(user_id))
            .collect()
    }

    pub fn display_name(&self, user_id: &str) -> String {
        [&self.local_user, &self.remote_user]
            .into_iter()
            .find(|participant| participant.id == user_id)
            .map(|participant| participant.display_name.clone())
            .unwrap_or_else(|| user_id.to_string())
    }

    pub fn is_outbound(&self, message: &ChatMessage) -> bool {
        message.sender_id == self.local_user.id
    }

    fn upsert_message(&mut self, message: ChatMessage) {
        match self.messages.iter_mut().find(|existing| existing.id == message.id) {
            Some(existing) => *existing = message,
            None => self.messages.push(message),
        }
    }

    pub fn add_debug_event(&mut self, event_type: &'static str, message: String) {
        self.debug_events.push(DebugEvent {
            timestamp: Utc::now(),
            event_type,
            message,
        });

        if self.debug_events.len() > MAX_DEBUG_EVENTS {
            self.debug_events.remove(0);
        }
    }
}
