use eframe::egui;

use crate::common::DeliveryState;
use crate::ui::state::AppState;

pub fn render(ui: &mut egui::Ui, state: &AppState) {
    ui.heading("Debug Info");
    ui.separator();

    let outbound: Vec<_> = state
        .messages
        .iter()
        .filter(|message| state.is_outbound(message))
        .collect();
    let in_flight = outbound
        .iter()
        .filter(|message| message.state == DeliveryState::Sending)
        .count();

    ui.horizontal(|ui| {
        ui.label("Messages:");
        ui.label(format!("{}", state.messages.len()));
    });
    ui.horizontal(|ui| {
        ui.label("Sent by you:");
        ui.label(format!("{} ({in_flight} in flight)", outbound.len()));
    });

    ui.separator();

    ui.label("Recent Events:");
    egui::ScrollArea::vertical()
        .max_height(300.0)
        .show(ui, |ui| {
            for event in state.debug_events.iter().rev().take(30) {
                let time_str = event.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S");
                let color = match event.event_type {
                    "APPENDED" => egui::Color32::GREEN,
                    "UPDATED" => egui::Color32::LIGHT_BLUE,
                    "TYPING" => egui::Color32::YELLOW,
                    "FAILURE" => egui::Color32::RED,
                    _ => egui::Color32::WHITE,
                };

                ui.horizontal(|ui| {
                    ui.colored_label(color, format!("[{}]", time_str));
                    ui.label(&event.message);
                });
            }
        });
}
