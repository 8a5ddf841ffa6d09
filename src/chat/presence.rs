use std::fmt;
use std::time::{Duration, Instant};

use crate::common::Identity;
use crate::error::{ChatError, ChatResult};

/// How long a rejected-action notice stays on screen.
pub const NOTICE_WINDOW: Duration = Duration::from_millis(2000);

const SIGN_IN_NOTICE: &str = "Please sign in to chat with support.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    Connect,
    Send,
    OpenPane,
}

impl fmt::Display for GatedAction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Connect => "connect",
            Self::Send => "send",
            Self::OpenPane => "open pane",
        })
    }
}

#[derive(Debug, Clone)]
struct Notice {
    text: String,
    raised_at: Instant,
}

/// Holds the established identity and rejects protocol actions without one.
#[derive(Debug)]
pub struct PresenceGate {
    identity: Option<Identity>,
    notice: Option<Notice>,
    window: Duration,
}

impl Default for PresenceGate {
    fn default() -> Self {
        Self::with_window(NOTICE_WINDOW)
    }
}

impl PresenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            identity: None,
            notice: None,
            window,
        }
    }

    pub fn establish(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    pub fn revoke(&mut self) -> Option<Identity> {
        self.identity.take()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// An identity only counts once it carries a non-empty credential.
    pub fn is_established(&self) -> bool {
        self.identity
            .as_ref()
            .is_some_and(|identity| identity.credential.is_present())
    }

    /// Lets `action` through, or raises the notice and fails with `Auth`.
    pub fn check(&mut self, action: GatedAction, now: Instant) -> ChatResult<&Identity> {
        if !self.is_established() {
            log::info!("Blocked {action}: no signed-in identity");
            self.raise_notice(SIGN_IN_NOTICE, now);
            return Err(ChatError::Auth(format!("{action} requires a signed-in identity")));
        }
        self.identity
            .as_ref()
            .ok_or_else(|| ChatError::Auth(format!("{action} requires a signed-in identity")))
    }

    pub fn raise_notice(&mut self, text: impl Into<String>, now: Instant) {
        self.notice = Some(Notice {
            text: text.into(),
            raised_at: now,
        });
    }

    /// The notice text while its window is open.
    pub fn notice(&self, now: Instant) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|notice| now.saturating_duration_since(notice.raised_at) < self.window)
            .map(|notice| notice.text.as_str())
    }

    pub fn clear_expired(&mut self, now: Instant) {
        if self.notice(now).is_none() {
            self.notice = None;
        }
    }
}
