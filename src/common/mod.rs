pub mod commands;
pub mod events;
pub mod types;

pub use commands::ChannelCommand;
pub use events::{ChannelEvent, ConnectionState, SessionUpdate};
pub use types::{
    ConversationId, Credential, Delivery, Direction, Identity, Message, MessageId, UserId,
};
