use crate::common::{Message, UserId};

use super::visibility::Visibility;

/// Derives the badge count. There is no stored counter to drift.
pub struct UnreadTracker;

impl UnreadTracker {
    pub fn recompute(messages: &[Message], self_id: &UserId, visibility: Visibility) -> usize {
        if visibility == Visibility::Visible {
            return 0;
        }
        messages
            .iter()
            .filter(|message| !message.is_read && message.is_inbound(self_id))
            .count()
    }
}
