use crate::ui::state::AppState;
use eframe::egui;

#[derive(Default)]
pub struct SidebarActions {
    /// Requested remote typing indicator state
    pub set_typing: Option<bool>,
}

pub fn render(ui: &mut egui::Ui, state: &AppState) -> SidebarActions {
    let mut actions = SidebarActions::default();

    ui.heading("Participants");
    ui.separator();

    for participant in [&state.local_user, &state.remote_user] {
        ui.horizontal(|ui| {
            let typing = state.is_typing(&participant.id);
            let color = if typing {
                egui::Color32::YELLOW
            } else {
                egui::Color32::GREEN
            };
            ui.colored_label(color, "●");
            ui.label(&participant.display_name);
            if typing {
                ui.label(egui::RichText::new("(typing)").weak());
            }
        });
    }

    ui.separator();
    ui.label("Simulation:");
    if state.is_typing(&state.remote_user.id) {
        if ui.button("Stop typing").clicked() {
            actions.set_typing = Some(false);
        }
    } else if ui
        .button(format!("{} starts typing", state.remote_user.display_name))
        .clicked()
    {
        actions.set_typing = Some(true);
    }

    actions
}
