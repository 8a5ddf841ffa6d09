use eframe::egui;
use support_chat::Message;
use support_chat::common::{Direction, UserId};

pub fn render(ui: &mut egui::Ui, messages: &[Message], self_id: &UserId) {
    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .stick_to_bottom(true)
        .max_height(ui.available_height() - 40.0)
        .show(ui, |ui| {
            if messages.is_empty() {
                ui.label(egui::RichText::new("No messages yet. Say hello!").weak());
                return;
            }

            for message in messages {
                let time = message.created_at.format("%H:%M");
                ui.horizontal_wrapped(|ui| match message.direction(self_id) {
                    Direction::Outbound => {
                        ui.label(egui::RichText::new(format!("[{time}] You")).strong());
                        ui.label(&message.content);
                        if message.is_pending() {
                            ui.label(egui::RichText::new("(sending)").weak().italics());
                        }
                    }
                    Direction::Inbound => {
                        ui.colored_label(
                            egui::Color32::LIGHT_BLUE,
                            format!("[{time}] {}", message.sender_id),
                        );
                        ui.label(&message.content);
                    }
                });
            }
        });
}
