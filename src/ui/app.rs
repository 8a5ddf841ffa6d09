use std::time::Duration;

use eframe::egui;
use support_chat::{ChatSession, ConnectionState, Credential, Identity, Visibility};

use super::components::identity_panel::{self, IdentityAction};
use super::components::{activity_panel, chat_pane, input_bar};
use super::state::AppState;

pub struct ChatApp {
    state: AppState,
    session: ChatSession,
}

impl ChatApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, mut session: ChatSession) -> Self {
        let state = AppState::new();
        session.on_update(state.recorder());
        Self { state, session }
    }

    fn handle_identity_action(&mut self, action: IdentityAction) {
        match action {
            IdentityAction::SignIn { user_id, token } => {
                let identity = Identity::new(user_id, Credential::bearer(token));
                if let Err(err) = self.session.start(identity) {
                    log::warn!("Sign-in rejected: {err}");
                }
            }
            IdentityAction::SignOut => self.session.stop(),
            IdentityAction::Reconnect => {
                if let Err(err) = self.session.reconnect() {
                    log::warn!("Reconnect rejected: {err}");
                }
            }
        }
    }

    fn toggle_label(&self) -> String {
        let unread = self.session.unread();
        match (self.session.visibility(), unread) {
            (Visibility::Visible, _) => "Hide support chat".to_string(),
            (Visibility::Hidden, 0) => "Chat with support".to_string(),
            (Visibility::Hidden, unread) => format!("Chat with support ({unread})"),
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.session.pump();

        egui::SidePanel::left("identity_sidebar").show(ctx, |ui| {
            let action = identity_panel::render(
                ui,
                &mut self.state,
                self.session.identity(),
                self.session.connection_state(),
            );
            if let Some(action) = action {
                self.handle_identity_action(action);
            }

            ui.add_space(16.0);
            activity_panel::render(ui, &self.state, &self.session);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Support");
                if ui.button(self.toggle_label()).clicked()
                    && let Err(err) = self.session.toggle_pane()
                {
                    log::debug!("Pane stayed closed: {err}");
                }
            });

            if let Some(notice) = self.session.notice() {
                ui.colored_label(egui::Color32::RED, notice);
            }
            ui.separator();

            if self.session.visibility() != Visibility::Visible {
                return;
            }
            if let Some(identity) = self.session.identity() {
                let self_id = identity.user_id.clone();
                chat_pane::render(ui, self.session.messages(), &self_id);
            }

            ui.separator();
            let enabled = self.session.connection_state() == ConnectionState::Connected;
            if let Some(content) = input_bar::render(ui, &mut self.state.input_text, enabled)
                && let Err(err) = self.session.send(&content)
            {
                log::warn!("Message not sent: {err}");
            }
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
