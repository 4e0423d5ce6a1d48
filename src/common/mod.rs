pub mod commands;
pub mod error;
pub mod events;
pub mod types;

pub use commands::ChatCommand;
pub use error::ScreenError;
pub use events::{ChatEvent, ClientEvent};
pub use types::{ChatMessage, DeliveryState, MessageId, Participant, UserId};
