pub mod connector;
pub mod protocol;
pub mod rest;
pub mod transport;

pub use connector::{Dialer, EventHandler, SessionConnector, WebSocketDialer};
pub use rest::{ChatApi, HttpChatApi};
