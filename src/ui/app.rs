use eframe::egui;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::common::{ChatCommand, ClientEvent, Participant, ScreenError};

use super::components::{
    chat_area::{self, ChatAreaActions},
    debug_panel, input_bar, sidebar,
};
use super::state::AppState;

pub struct ChatApp {
    state: AppState,
    command_sender: mpsc::Sender<ChatCommand>,
    event_receiver: mpsc::UnboundedReceiver<ClientEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        local_user: Participant,
        remote_user: Participant,
        command_sender: mpsc::Sender<ChatCommand>,
        event_receiver: mpsc::UnboundedReceiver<ClientEvent>,
    ) -> Self {
        Self {
            state: AppState::new(local_user, remote_user),
            command_sender,
            event_receiver,
        }
    }

    fn handle_client_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            match event {
                ClientEvent::Chat(event) => self.state.apply_event(event),
                ClientEvent::Failure(err) => self.state.show_failure(&err),
            }
        }
    }

    fn send_command(&mut self, command: ChatCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to chat client: {err}");
            self.state.show_failure(&command_failure(&err));
        }
    }

    fn send_message(&mut self, text: String) {
        let reply_to = self.state.reply_target.take();
        self.send_command(ChatCommand::SendMessage { text, reply_to });
    }

    fn apply_chat_actions(&mut self, actions: ChatAreaActions) {
        if let Some(message_id) = actions.reply_to {
            self.state.reply_target = Some(message_id);
        }
        if let Some((message_id, symbol)) = actions.reaction {
            self.send_command(ChatCommand::AddReaction { message_id, symbol });
        }
    }

    fn render_reply_preview(&mut self, ui: &mut egui::Ui) {
        let Some(target) = self.state.reply_target else {
            return;
        };
        let preview = self
            .state
            .message(target)
            .map(|message| format!("↪ {}: {}", message.sender_name, message.content));

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(preview.unwrap_or_default()).italics().weak());
            if ui.small_button("✕").clicked() {
                self.state.reply_target = None;
            }
        });
    }
}

fn command_failure(err: &TrySendError<ChatCommand>) -> ScreenError {
    match err {
        TrySendError::Full(_) => ScreenError::RequestFailed("chat client is busy".to_string()),
        TrySendError::Closed(_) => ScreenError::DeviceUnavailable {
            device: "chat client".to_string(),
        },
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_client_events();

        egui::SidePanel::left("participants")
            .resizable(true)
            .default_width(180.0)
            .show(ctx, |ui| {
                let actions = sidebar::render(ui, &self.state);
                if let Some(is_typing) = actions.set_typing {
                    self.send_command(ChatCommand::SetTyping(is_typing));
                }
            });

        egui::SidePanel::right("debug_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                debug_panel::render(ui, &self.state);
            });

        egui::TopBottomPanel::bottom("composer").show(ctx, |ui| {
            if let Some(notice) = self.state.notice.clone() {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::LIGHT_RED, notice);
                    if ui.small_button("Dismiss").clicked() {
                        self.state.notice = None;
                    }
                });
            }
            self.render_reply_preview(ui);
            if let Some(content) = input_bar::render(ui, &mut self.state.input_text) {
                self.send_message(content);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(&self.state.remote_user.display_name);
            ui.separator();
            let actions = chat_area::render(ui, &self.state);
            self.apply_chat_actions(actions);
        });

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}
