use std::collections::HashSet;

use crate::common::{Delivery, Message, MessageId, UserId};

/// Result of [`MessageStore::append`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// The id was already in the log; nothing changed.
    Duplicate,
    /// The message was the server echo of an optimistic send. The pending
    /// entry kept its position and adopted the server id.
    Confirmed { local_id: MessageId },
}

/// Counts reported by [`MessageStore::bulk_replace`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub fetched: usize,
    /// Local entries the fetch did not know about, re-appended after it.
    pub carried_over: usize,
}

/// In-memory log of the single support conversation.
///
/// Order is arrival order. Ids are unique, and `is_read` only moves from
/// `false` to `true`.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    ids: HashSet<MessageId>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `message` at the tail unless its id is already present.
    pub fn append(&mut self, mut message: Message) -> AppendOutcome {
        if self.ids.contains(&message.id) {
            return AppendOutcome::Duplicate;
        }

        message.delivery = Delivery::Confirmed;
        if let Some(position) = self.pending_match(&message) {
            let pending = &mut self.messages[position];
            let local_id = std::mem::replace(&mut pending.id, message.id.clone());
            pending.conversation_id = message.conversation_id;
            pending.created_at = message.created_at;
            pending.is_read |= message.is_read;
            pending.delivery = Delivery::Confirmed;

            self.ids.remove(&local_id);
            self.ids.insert(message.id);
            return AppendOutcome::Confirmed { local_id };
        }

        self.ids.insert(message.id.clone());
        self.messages.push(message);
        AppendOutcome::Appended
    }

    /// Adds an optimistic send. It stays `Pending` until its echo arrives.
    pub fn append_pending(&mut self, mut message: Message) -> AppendOutcome {
        if !self.ids.insert(message.id.clone()) {
            return AppendOutcome::Duplicate;
        }
        message.delivery = Delivery::Pending;
        self.messages.push(message);
        AppendOutcome::Appended
    }

    /// Rebuilds the log from a resync fetch.
    ///
    /// The fetched order wins for everything the server knows. Local entries
    /// it does not know (pending sends, arrivals after the fetch was issued)
    /// follow in their previous order. A fetched message authored by the
    /// same sender with the same content as a pending entry consumes it, as
    /// long as it is not older than the pending send.
    pub fn bulk_replace(&mut self, fetched: Vec<Message>) -> ReplaceSummary {
        let mut previous = std::mem::take(&mut self.messages);
        self.ids.clear();

        let read_ids: HashSet<MessageId> = previous
            .iter()
            .filter(|message| message.is_read)
            .map(|message| message.id.clone())
            .collect();
        let known_ids: HashSet<MessageId> =
            previous.iter().map(|message| message.id.clone()).collect();

        let mut summary = ReplaceSummary::default();
        for mut message in fetched {
            if !self.ids.insert(message.id.clone()) {
                continue;
            }
            message.is_read |= read_ids.contains(&message.id);
            message.delivery = Delivery::Confirmed;

            if !known_ids.contains(&message.id)
                && let Some(position) = previous.iter().position(|local| {
                    local.is_pending()
                        && local.sender_id == message.sender_id
                        && local.content == message.content
                        && message.created_at >= local.created_at
                })
            {
                previous.remove(position);
            }

            self.messages.push(message);
            summary.fetched += 1;
        }

        for local in previous {
            if self.ids.insert(local.id.clone()) {
                self.messages.push(local);
                summary.carried_over += 1;
            }
        }

        summary
    }

    pub fn query(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.ids.contains(id)
    }

    /// Flips `is_read` on every inbound message. Returns how many changed.
    pub fn mark_inbound_read(&mut self, self_id: &UserId) -> usize {
        let mut flipped = 0;
        for message in &mut self.messages {
            if !message.is_read && message.is_inbound(self_id) {
                message.is_read = true;
                flipped += 1;
            }
        }
        flipped
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.ids.clear();
    }

    fn pending_match(&self, echo: &Message) -> Option<usize> {
        self.messages.iter().position(|local| {
            local.is_pending() && local.sender_id == echo.sender_id && local.content == echo.content
        })
    }
}
