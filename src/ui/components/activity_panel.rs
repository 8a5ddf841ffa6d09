use eframe::egui;
use support_chat::ChatSession;

use crate::ui::state::{ActivityKind, AppState};

pub fn render(ui: &mut egui::Ui, state: &AppState, session: &ChatSession) {
    ui.heading("Session");
    ui.separator();

    ui.horizontal(|ui| {
        ui.label("Connection:");
        ui.label(format!("{:?}", session.connection_state()));
    });
    ui.horizontal(|ui| {
        ui.label("Messages:");
        ui.label(format!("{}", session.messages().len()));
    });
    ui.horizontal(|ui| {
        ui.label("Unread:");
        ui.label(format!("{}", session.unread()));
    });

    ui.separator();

    ui.label("Recent Events:");
    egui::ScrollArea::vertical()
        .max_height(200.0)
        .show(ui, |ui| {
            for event in state.activity.borrow().iter().rev().take(20) {
                let time_str = event.timestamp.format("%H:%M:%S");
                let color = match event.kind {
                    ActivityKind::Connection => egui::Color32::GREEN,
                    ActivityKind::Notice => egui::Color32::RED,
                    ActivityKind::Pane => egui::Color32::YELLOW,
                    ActivityKind::Messages => egui::Color32::WHITE,
                };

                ui.horizontal(|ui| {
                    ui.colored_label(color, format!("[{time_str}]"));
                    ui.label(&event.message);
                });
            }
        });
}
