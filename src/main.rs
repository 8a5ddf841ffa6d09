mod ui;

use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use support_chat::ChatSession;
use support_chat::config;
use support_chat::network::{HttpChatApi, WebSocketDialer};
use ui::ChatApp;

#[derive(Parser)]
#[command(
    name = "support-chat",
    version,
    about = "Real-time customer support chat client"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut chat_config = config::load_config(&cli.config);
    config::apply_env_overrides(&mut chat_config);
    log::info!(
        "Support endpoints: ws={} api={}",
        chat_config.ws_url,
        chat_config.api_base_url
    );

    let dialer = Arc::new(WebSocketDialer::new(
        chat_config.ws_url.clone(),
        chat_config.channel_capacity,
    ));
    let api = Arc::new(HttpChatApi::new(&chat_config));

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Support Chat",
        options,
        Box::new(move |cc| {
            let session = ChatSession::new(dialer, api);
            Ok(Box::new(ChatApp::new(cc, session)))
        }),
    )
}
