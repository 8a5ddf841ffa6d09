use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::{self, Error as WsError};

use crate::common::Credential;
use crate::error::{ChatError, ChatResult};

/// Builds the upgrade request for `url`, carrying the bearer credential.
pub fn build_request(url: &str, credential: &Credential) -> ChatResult<Request> {
    if !credential.is_present() {
        return Err(ChatError::Auth("no credential for the support channel".to_string()));
    }

    let mut request = url.into_client_request()?;
    let header = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
        .map_err(|_| ChatError::Auth("credential is not a valid header value".to_string()))?;
    request.headers_mut().insert(AUTHORIZATION, header);
    Ok(request)
}

/// A 401/403 during the handshake is a rejected credential, anything else a
/// connection failure.
pub fn classify_handshake_error(err: tungstenite::Error) -> ChatError {
    match &err {
        WsError::Http(response)
            if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) =>
        {
            ChatError::Auth(format!("support channel rejected credential ({})", response.status()))
        }
        _ => ChatError::Connection(err),
    }
}
