use thiserror::Error;
use tokio_tungstenite::tungstenite;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures of the chat session core.
///
/// Every variant is caught by the component that issued the request; only
/// [`ChatError::Auth`] reaches the user, as a transient notice.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No identity, an empty credential, or a credential the server rejected.
    #[error("not signed in: {0}")]
    Auth(String),

    /// The support channel could not be opened.
    #[error("support channel unavailable: {0}")]
    Connection(#[from] tungstenite::Error),

    /// `GET /my-messages` failed; the local log stays as it was.
    #[error("message resync failed: {source}")]
    Sync { source: BoxError },

    /// `POST /mark-read` failed; local read state is kept.
    #[error("read receipt confirmation failed: {source}")]
    MarkRead { source: BoxError },
}

impl ChatError {
    pub fn sync(source: impl Into<BoxError>) -> Self {
        Self::Sync {
            source: source.into(),
        }
    }

    pub fn mark_read(source: impl Into<BoxError>) -> Self {
        Self::MarkRead {
            source: source.into(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
