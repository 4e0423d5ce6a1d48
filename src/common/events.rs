use super::error::ScreenError;
use super::types::{ChatMessage, UserId};

/// Change notification published by the chat manager.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    MessageAppended(ChatMessage),
    /// Delivery state or reactions changed; carries the new snapshot.
    MessageUpdated(ChatMessage),
    TypingChanged { user_id: UserId, is_typing: bool },
}

/// Events the runtime sends up to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Chat(ChatEvent),
    Failure(ScreenError),
}
