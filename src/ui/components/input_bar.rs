use eframe::egui;

/// Returns the trimmed message once the user submits non-blank text.
pub fn render(ui: &mut egui::Ui, input_text: &mut String) -> Option<String> {
    let mut send = false;
    ui.horizontal(|ui| {
        let width = (ui.available_width() - 60.0).max(80.0);
        let response = ui.add(
            egui::TextEdit::singleline(input_text)
                .hint_text("Message")
                .desired_width(width),
        );
        if ui.button("Send").clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
            response.request_focus();
        }
    });

    let message = input_text.trim().to_string();
    if !send || message.is_empty() {
        return None;
    }
    input_text.clear();
    Some(message)
}
