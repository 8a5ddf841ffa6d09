use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Ids arrive either as JSON strings or as bare numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

// All opaque ids share one shape, so they stay interchangeable on the wire.
macro_rules! define_opaque_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                Ok(match RawId::deserialize(deserializer)? {
                    RawId::Text(text) => Self(text),
                    RawId::Number(number) => Self(number.to_string()),
                })
            }
        }
    };
}

define_opaque_id!(MessageId);
define_opaque_id!(ConversationId);
define_opaque_id!(UserId);

/// Whether a message was written by the local identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Local-only delivery state. Never sent or read on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delivery {
    /// Optimistic send not yet echoed by the server.
    Pending,
    #[default]
    Confirmed,
}

/// One entry of the support conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    #[serde(default)]
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    /// Display only; the log is never sorted by it.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(skip)]
    pub delivery: Delivery,
}

impl Message {
    /// Builds the optimistic copy of a message the local identity just sent.
    pub fn pending(sender_id: UserId, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(format!("local-{}", Uuid::new_v4())),
            conversation_id: ConversationId::default(),
            sender_id,
            content: content.into(),
            created_at: Utc::now(),
            is_read: false,
            delivery: Delivery::Pending,
        }
    }

    pub fn direction(&self, self_id: &UserId) -> Direction {
        if &self.sender_id == self_id {
            Direction::Outbound
        } else {
            Direction::Inbound
        }
    }

    pub fn is_inbound(&self, self_id: &UserId) -> bool {
        self.direction(self_id) == Direction::Inbound
    }

    pub fn is_pending(&self) -> bool {
        self.delivery == Delivery::Pending
    }
}

/// Bearer token supplied by the host application's sign-in flow.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    pub fn is_present(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_present() {
            formatter.write_str("Credential(<redacted>)")
        } else {
            formatter.write_str("Credential(<empty>)")
        }
    }
}

/// The signed-in visitor the session acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub credential: Credential,
}

impl Identity {
    pub fn new(user_id: impl Into<UserId>, credential: Credential) -> Self {
        Self {
            user_id: user_id.into(),
            credential,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_text_ids_deserialize_to_the_same_shape() {
        let numeric: MessageId = serde_json::from_str("1").unwrap();
        let text: MessageId = serde_json::from_str("\"1\"").unwrap();
        assert_eq!(numeric, text);
        assert_eq!(numeric.as_str(), "1");
    }

    #[test]
    fn message_reads_camel_case_payload_with_defaults() {
        let message: Message = serde_json::from_str(
            r#"{"id": 7, "senderId": "assistant", "content": "hello"}"#,
        )
        .unwrap();

        assert_eq!(message.id, MessageId::new("7"));
        assert_eq!(message.conversation_id, ConversationId::default());
        assert!(!message.is_read);
        assert_eq!(message.delivery, Delivery::Confirmed);
    }

    #[test]
    fn direction_follows_the_local_identity() {
        let me = UserId::new("visitor-1");
        let mine = Message::pending(me.clone(), "hi");
        let mut theirs = mine.clone();
        theirs.sender_id = UserId::new("assistant");

        assert_eq!(mine.direction(&me), Direction::Outbound);
        assert_eq!(theirs.direction(&me), Direction::Inbound);
        assert!(mine.is_pending());
    }

    #[test]
    fn credential_debug_never_prints_the_token() {
        let credential = Credential::bearer("  secret-token ");
        assert_eq!(credential.expose(), "secret-token");
        assert!(!format!("{credential:?}").contains("secret"));
        assert!(!Credential::bearer("   ").is_present());
    }
}
