//! Chat screen backed by a simulated conversation.
//!
//! [`chat::ChatManager`] owns one conversation on a virtual clock,
//! [`network::ChatClient`] drives it from tokio time, and [`ui::ChatApp`]
//! renders a mirror of it with egui.

pub mod chat;
pub mod common;
pub mod config;
pub mod network;
pub mod ui;
