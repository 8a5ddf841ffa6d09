pub mod chat;
pub mod common;
pub mod config;
pub mod error;
pub mod network;
pub mod storage;

pub use chat::{ChatSession, Visibility};
pub use common::{ConnectionState, Credential, Identity, Message, SessionUpdate};
pub use config::ChatConfig;
pub use error::{ChatError, ChatResult};
