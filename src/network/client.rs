use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use crate::chat::ChatManager;
use crate::common::{ChatCommand, ClientEvent, ScreenError};
use crate::config::AppConfig;

/// Simulated chat backend. Owns the [`ChatManager`] on its own task, maps
/// `tokio::time` onto the manager's virtual clock and forwards every change
/// to the UI.
pub struct ChatClient {
    event_sender: mpsc::UnboundedSender<ClientEvent>,
    command_receiver: mpsc::Receiver<ChatCommand>,
    manager: ChatManager,
    /// Instant of virtual time zero, captured with the manager's epoch.
    started: Instant,
}

impl ChatClient {
    pub fn new(
        event_sender: mpsc::UnboundedSender<ClientEvent>,
        command_receiver: mpsc::Receiver<ChatCommand>,
        config: AppConfig,
    ) -> Self {
        let started = Instant::now();
        let mut manager = ChatManager::new(config, Utc::now());
        let forward = event_sender.clone();
        manager.subscribe(move |event| {
            if forward.send(ClientEvent::Chat(event.clone())).is_err() {
                log::debug!("Chat screen is gone; dropping {event:?}");
            }
        });

        Self {
            event_sender,
            command_receiver,
            manager,
            started,
        }
    }

    /// Runs until the command channel is closed and every scheduled effect
    /// has fired.
    pub async fn run(mut self) -> Result<(), ScreenError> {
        let started = self.started;
        let mut commands_open = true;
        log::info!(
            "Chat client started: {} talking to {}",
            self.manager.local_user().display_name,
            self.manager.remote_user().display_name
        );

        loop {
            let deadline = self.manager.next_deadline().map(|offset| started + offset);
            if !commands_open && !self.manager.has_pending_work() {
                log::info!(
                    "Chat client finished with {} messages after {:?}",
                    self.manager.messages().len(),
                    self.manager.now()
                );
                return Ok(());
            }

            tokio::select! {
                command = self.command_receiver.recv(), if commands_open => match command {
                    Some(command) => {
                        // Effects that came due while idle fire before the command applies.
                        self.manager.advance_to(started.elapsed());
                        self.handle_command(command);
                    }
                    None => {
                        log::info!("Command channel closed; draining scheduled effects");
                        commands_open = false;
                    }
                },
                () = sleep_until(deadline.unwrap_or(started)), if deadline.is_some() => {
                    self.manager.advance_to(started.elapsed());
                }
            }

            if commands_open && self.event_sender.is_closed() {
                return Err(ScreenError::DeviceUnavailable {
                    device: "chat screen".to_string(),
                });
            }
        }
    }

    fn handle_command(&mut self, command: ChatCommand) {
        log::debug!("Applying {command:?}");
        if let Err(err) = self.manager.apply(command) {
            log::warn!("Chat command failed: {err}");
            if self.event_sender.send(ClientEvent::Failure(err)).is_err() {
                log::debug!("Chat screen is gone; failure not shown");
            }
        }
    }
}
