use crate::chat::Visibility;

use super::types::Message;

/// Events the channel pump delivers upward, in transport order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    MessageReceived(Message),
    /// The channel dropped. `reason` carries the close frame text or the
    /// transport error, when there was one.
    Closed { reason: Option<String> },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// What session listeners are told after each dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Connection(ConnectionState),
    Messages { total: usize, unread: usize },
    Visibility(Visibility),
    Notice(String),
}
