use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity of a message within a conversation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, enough to tell messages apart in logs.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

pub type UserId = String;

/// A conversation member as shown on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: UserId,
    pub display_name: String,
}

impl Participant {
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Lifecycle stage of a message. Ordering follows the lifecycle, so a
/// transition is valid only when it moves to a greater variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Sending,
    Sent,
    Delivered,
    Read,
}

impl DeliveryState {
    pub fn glyph(self) -> &'static str {
        match self {
            DeliveryState::Sending => "…",
            DeliveryState::Sent => "✓",
            DeliveryState::Delivered => "✓✓",
            DeliveryState::Read => "👁",
        }
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeliveryState::Sending => "sending",
            DeliveryState::Sent => "sent",
            DeliveryState::Delivered => "delivered",
            DeliveryState::Read => "read",
        };
        f.write_str(label)
    }
}

/// Domain model for one chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub content: String,
    pub sender_id: UserId,
    pub sender_name: String,
    pub timestamp: DateTime<Utc>,
    pub state: DeliveryState,
    pub reply_to: Option<MessageId>,
    pub reactions: BTreeMap<String, u32>,
}

impl ChatMessage {
    pub fn new(
        content: impl Into<String>,
        sender: &Participant,
        timestamp: DateTime<Utc>,
        state: DeliveryState,
        reply_to: Option<MessageId>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            content: content.into(),
            sender_id: sender.id.clone(),
            sender_name: sender.display_name.clone(),
            timestamp,
            state,
            reply_to,
            reactions: BTreeMap::new(),
        }
    }

    /// Moves the delivery state forward. Returns `false` when `next` is not
    /// ahead of the current state, leaving the message untouched.
    pub fn advance_state(&mut self, next: DeliveryState) -> bool {
        if next <= self.state {
            return false;
        }
        self.state = next;
        true
    }

    pub fn add_reaction(&mut self, symbol: &str) -> u32 {
        let count = self.reactions.entry(symbol.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}
