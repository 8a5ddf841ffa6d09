use eframe::egui;
use support_chat::{ConnectionState, Identity};

use crate::ui::state::AppState;

pub enum IdentityAction {
    SignIn { user_id: String, token: String },
    SignOut,
    Reconnect,
}

pub fn render(
    ui: &mut egui::Ui,
    state: &mut AppState,
    identity: Option<&Identity>,
    connection: ConnectionState,
) -> Option<IdentityAction> {
    ui.heading("Account");
    ui.separator();

    let Some(identity) = identity else {
        ui.label("User id");
        ui.text_edit_singleline(&mut state.user_id_input);
        ui.label("Access token");
        ui.add(egui::TextEdit::singleline(&mut state.token_input).password(true));

        let ready = !state.user_id_input.trim().is_empty();
        if ui.add_enabled(ready, egui::Button::new("Sign in")).clicked() {
            return Some(IdentityAction::SignIn {
                user_id: state.user_id_input.trim().to_string(),
                token: std::mem::take(&mut state.token_input),
            });
        }
        return None;
    };

    ui.label(format!("Signed in as {}", identity.user_id));
    ui.horizontal(|ui| {
        let (color, label) = match connection {
            ConnectionState::Connected => (egui::Color32::GREEN, "online"),
            ConnectionState::Connecting => (egui::Color32::YELLOW, "connecting..."),
            ConnectionState::Disconnected => (egui::Color32::RED, "offline"),
        };
        ui.colored_label(color, "●");
        ui.label(label);
    });

    let mut action = None;
    if connection == ConnectionState::Disconnected && ui.button("Reconnect").clicked() {
        action = Some(IdentityAction::Reconnect);
    }
    if ui.button("Sign out").clicked() {
        action = Some(IdentityAction::SignOut);
    }
    action
}
