use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::common::{Credential, Message};
use crate::config::ChatConfig;
use crate::error::{ChatError, ChatResult};

/// The two REST endpoints the chat session consumes.
pub trait ChatApi: Send + Sync {
    /// `GET /my-messages`: the full ordered log for the signed-in identity.
    fn fetch_messages(&self, credential: &Credential) -> BoxFuture<'static, ChatResult<Vec<Message>>>;

    /// `POST /mark-read`: marks every inbound message read server-side.
    fn mark_read(&self, credential: &Credential) -> BoxFuture<'static, ChatResult<()>>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessagesResponse {
    Bare(Vec<Message>),
    Wrapped { messages: Vec<Message> },
}

impl MessagesResponse {
    fn into_messages(self) -> Vec<Message> {
        match self {
            Self::Bare(messages) | Self::Wrapped { messages } => messages,
        }
    }
}

#[derive(Deserialize)]
struct MarkReadResponse {
    #[serde(default = "success_by_default")]
    success: bool,
}

fn success_by_default() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatApi {
    pub fn new(config: &ChatConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                log::warn!("Falling back to default HTTP client: {err}");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

impl ChatApi for HttpChatApi {
    fn fetch_messages(&self, credential: &Credential) -> BoxFuture<'static, ChatResult<Vec<Message>>> {
        let request = self
            .client
            .get(self.endpoint("my-messages"))
            .bearer_auth(credential.expose());

        Box::pin(async move {
            let response = request.send().await.map_err(ChatError::sync)?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(ChatError::Auth("message resync rejected credential".to_string()));
            }
            let body: MessagesResponse = response
                .error_for_status()
                .map_err(ChatError::sync)?
                .json()
                .await
                .map_err(ChatError::sync)?;
            Ok(body.into_messages())
        })
    }

    fn mark_read(&self, credential: &Credential) -> BoxFuture<'static, ChatResult<()>> {
        let request = self
            .client
            .post(self.endpoint("mark-read"))
            .bearer_auth(credential.expose());

        Box::pin(async move {
            let response = request
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(ChatError::mark_read)?;
            let body = response.text().await.map_err(ChatError::mark_read)?;
            if body.trim().is_empty() {
                return Ok(());
            }

            let parsed: MarkReadResponse =
                serde_json::from_str(&body).map_err(ChatError::mark_read)?;
            if parsed.success {
                Ok(())
            } else {
                Err(ChatError::mark_read("server reported success = false"))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_response_accepts_bare_and_wrapped_lists() {
        let bare: MessagesResponse =
            serde_json::from_str(r#"[{"id": 1, "senderId": "assistant", "content": "hi", "createdAt": "2026-10-17T08:30:00Z"}]"#)
                .unwrap();
        let wrapped: MessagesResponse = serde_json::from_str(
            r#"{"messages": [{"id": 1, "senderId": "assistant", "content": "hi", "createdAt": "2026-10-17T08:30:00Z"}]}"#,
        )
        .unwrap();

        assert_eq!(bare.into_messages(), wrapped.into_messages());
    }

    #[test]
    fn mark_read_response_defaults_to_success() {
        let parsed: MarkReadResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.success);
        let parsed: MarkReadResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!parsed.success);
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = ChatConfig {
            api_base_url: "https://example.com/api/".to_string(),
            ..ChatConfig::default()
        };
        let api = HttpChatApi::new(&config);
        assert_eq!(api.endpoint("mark-read"), "https://example.com/api/mark-read");
    }
}
