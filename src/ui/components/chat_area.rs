use eframe::egui;

use crate::common::{ChatMessage, MessageId};
use crate::ui::state::AppState;

/// Quick reactions offered under every message.
pub const REACTION_CHOICES: &[&str] = &["👍", "❤️", "😂", "🎉"];

#[derive(Default)]
pub struct ChatAreaActions {
    pub reply_to: Option<MessageId>,
    pub reaction: Option<(MessageId, String)>,
}

pub fn render(ui: &mut egui::Ui, state: &AppState) -> ChatAreaActions {
    let mut actions = ChatAreaActions::default();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            if state.messages.is_empty() {
                ui.label(egui::RichText::new("No messages yet").weak());
            }
            for message in &state.messages {
                render_message(ui, state, message, &mut actions);
                ui.add_space(4.0);
            }
        });

    let typing = state.typing_names();
    if !typing.is_empty() {
        ui.label(egui::RichText::new(format!("{} typing…", typing.join(", "))).italics().weak());
    }

    actions
}

fn render_message(
    ui: &mut egui::Ui,
    state: &AppState,
    message: &ChatMessage,
    actions: &mut ChatAreaActions,
) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        if let Some(quoted) = message.reply_to.and_then(|id| state.message(id)) {
            ui.label(
                egui::RichText::new(format!("↪ {}: {}", quoted.sender_name, quoted.content))
                    .small()
                    .weak(),
            );
        }

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(&message.sender_name).strong());
            ui.label(&message.content);
        });

        ui.horizontal(|ui| {
            let time = message.timestamp.with_timezone(&chrono::Local).format("%H:%M");
            ui.label(egui::RichText::new(time.to_string()).small().weak());
            if state.is_outbound(message) {
                ui.label(egui::RichText::new(message.state.glyph()).small())
                    .on_hover_text(message.state.to_string());
            }
            for (symbol, count) in &message.reactions {
                ui.label(egui::RichText::new(format!("{symbol} {count}")).small());
            }
        });

        ui.horizontal(|ui| {
            for symbol in REACTION_CHOICES {
                if ui.small_button(*symbol).clicked() {
                    actions.reaction = Some((message.id, symbol.to_string()));
                }
            }
            if ui.small_button("Reply").clicked() {
                actions.reply_to = Some(message.id);
            }
        });
    });
}
