use super::types::MessageId;

/// Commands the UI sends down to the chat runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    SendMessage {
        text: String,
        /// Message being answered, if any
        reply_to: Option<MessageId>,
    },
    /// Raise or drop the remote participant's typing indicator.
    SetTyping(bool),
    AddReaction {
        message_id: MessageId,
        symbol: String,
    },
}
