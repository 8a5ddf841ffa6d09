//! Frames exchanged on the support channel: a `{ type, payload }` envelope
//! carried in WebSocket text frames.

use serde::{Deserialize, Serialize};

use crate::common::{ChannelEvent, Message};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum WireEvent {
    /// Server -> client: a message was added to the conversation.
    #[serde(rename = "receive_message")]
    ReceiveMessage(Message),
    /// Client -> server: post a message as the signed-in identity.
    #[serde(rename = "sendMessage")]
    SendMessage(SendMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    pub content: String,
}

pub fn encode_send(content: &str) -> serde_json::Result<String> {
    serde_json::to_string(&WireEvent::SendMessage(SendMessage {
        content: content.to_string(),
    }))
}

/// Maps a text frame to a channel event. Frames of other types, and echoes of
/// our own outbound envelope, yield `None`.
pub fn decode(text: &str) -> Option<ChannelEvent> {
    match serde_json::from_str::<WireEvent>(text) {
        Ok(WireEvent::ReceiveMessage(message)) => Some(ChannelEvent::MessageReceived(message)),
        Ok(WireEvent::SendMessage(_)) => None,
        Err(err) => {
            log::warn!("Ignoring unrecognised channel frame: {err}");
            None
        }
    }
}
