pub mod activity_panel;
pub mod chat_pane;
pub mod identity_panel;
pub mod input_bar;
