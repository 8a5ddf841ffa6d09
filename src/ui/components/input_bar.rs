use eframe::egui;

/// Returns the trimmed draft when the user submits it.
pub fn render(ui: &mut egui::Ui, input_text: &mut String, enabled: bool) -> Option<String> {
    let mut send = false;
    ui.add_enabled_ui(enabled, |ui| {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(input_text).hint_text("Type a message for support"),
            );
            if ui.button("Send").clicked() {
                send = true;
            }

            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                send = true;
            }
        });
    });

    let draft = input_text.trim();
    if send && !draft.is_empty() {
        let message = draft.to_string();
        input_text.clear();
        return Some(message);
    }

    None
}
