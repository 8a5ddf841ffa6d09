pub mod presence;
pub mod receipts;
pub mod session;
pub mod unread;
pub mod visibility;

#[cfg(test)]
mod testing;

pub use presence::{GatedAction, NOTICE_WINDOW, PresenceGate};
pub use receipts::ReadReceiptSynchronizer;
pub use session::{ChatSession, SessionEpoch};
pub use unread::UnreadTracker;
pub use visibility::{Transition, Visibility, VisibilityController};
