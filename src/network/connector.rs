use std::fmt;

use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as Frame;

use crate::common::{ChannelCommand, ChannelEvent, Credential};
use crate::error::ChatResult;

use super::protocol;
use super::transport;

pub type EventHandler = Box<dyn FnMut(&ChannelEvent) + Send>;

/// Opens support channels. The session only ever holds one connector at a
/// time; a dialer is how it gets one.
pub trait Dialer: Send + Sync {
    fn dial(&self, credential: Credential) -> BoxFuture<'static, ChatResult<SessionConnector>>;
}

/// Dials the support WebSocket endpoint.
#[derive(Debug, Clone)]
pub struct WebSocketDialer {
    url: String,
    capacity: usize,
}

impl WebSocketDialer {
    pub fn new(url: impl Into<String>, capacity: usize) -> Self {
        Self {
            url: url.into(),
            capacity: capacity.max(1),
        }
    }
}

impl Dialer for WebSocketDialer {
    fn dial(&self, credential: Credential) -> BoxFuture<'static, ChatResult<SessionConnector>> {
        let url = self.url.clone();
        let capacity = self.capacity;
        Box::pin(async move { SessionConnector::connect(&url, &credential, capacity).await })
    }
}

/// One live duplex channel.
///
/// Inbound events come out in the order the pump task read them; there is no
/// dedup here. Sends while disconnected are dropped.
pub struct SessionConnector {
    commands: mpsc::Sender<ChannelCommand>,
    events: mpsc::Receiver<ChannelEvent>,
    pump: Option<JoinHandle<()>>,
    handlers: Vec<EventHandler>,
    connected: bool,
}

impl SessionConnector {
    /// Performs the WebSocket handshake with the bearer credential and starts
    /// the pump task. A rejected credential fails with `ChatError::Auth`.
    pub async fn connect(url: &str, credential: &Credential, capacity: usize) -> ChatResult<Self> {
        let request = transport::build_request(url, credential)?;
        let (stream, response) = connect_async(request)
            .await
            .map_err(transport::classify_handshake_error)?;
        log::info!("Support channel connected to {url} ({})", response.status());

        let capacity = capacity.max(1);
        let (command_tx, command_rx) = mpsc::channel(capacity);
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let pump = tokio::spawn(run_channel(stream, command_rx, event_tx));

        Ok(Self::from_parts(command_tx, event_rx, Some(pump)))
    }

    /// Wraps already-running channel halves.
    pub fn from_parts(
        commands: mpsc::Sender<ChannelCommand>,
        events: mpsc::Receiver<ChannelEvent>,
        pump: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            commands,
            events,
            pump,
            handlers: Vec::new(),
            connected: true,
        }
    }

    /// Registers a callback run once per inbound event, before the event is
    /// handed to the caller.
    pub fn on_event(&mut self, handler: impl FnMut(&ChannelEvent) + Send + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn try_next_event(&mut self) -> Option<ChannelEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(self.dispatch(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.connected = false;
                None
            }
        }
    }

    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        match self.events.recv().await {
            Some(event) => Some(self.dispatch(event)),
            None => {
                self.connected = false;
                None
            }
        }
    }

    /// Queues a `sendMessage` frame. Returns `false` when the channel is not
    /// connected; nothing is queued for later.
    pub fn send(&self, content: &str) -> bool {
        if !self.connected {
            log::debug!("Support channel not connected; dropping outbound message");
            return false;
        }
        match self.commands.try_send(ChannelCommand::Send(content.to_string())) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Failed to queue outbound message: {err}");
                false
            }
        }
    }

    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;

        if let Err(err) = self.commands.try_send(ChannelCommand::Close) {
            log::debug!("Close request not queued ({err}); stopping pump");
            if let Some(pump) = self.pump.take() {
                pump.abort();
            }
        }
        log::info!("Support channel disconnected");
    }

    fn dispatch(&mut self, event: ChannelEvent) -> ChannelEvent {
        if matches!(event, ChannelEvent::Closed { .. }) {
            self.connected = false;
        }
        for handler in &mut self.handlers {
            handler(&event);
        }
        event
    }
}

impl Drop for SessionConnector {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for SessionConnector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionConnector")
            .field("connected", &self.connected)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

async fn run_channel<S>(
    stream: WebSocketStream<S>,
    mut commands: mpsc::Receiver<ChannelCommand>,
    events: mpsc::Sender<ChannelEvent>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(ChannelCommand::Send(content)) => {
                    let text = match protocol::encode_send(&content) {
                        Ok(text) => text,
                        Err(err) => {
                            log::warn!("Failed to serialize outbound message: {err}");
                            continue;
                        }
                    };
                    if let Err(err) = sink.send(Frame::Text(text)).await {
                        log::warn!("Support channel write failed: {err}");
                        let _ = events.send(ChannelEvent::Closed { reason: Some(err.to_string()) }).await;
                        break;
                    }
                }
                Some(ChannelCommand::Close) | None => {
                    if let Err(err) = sink.close().await {
                        log::debug!("Close handshake failed: {err}");
                    }
                    break;
                }
            },
            frame = source.next() => match frame {
                Some(Ok(Frame::Text(text))) => {
                    if let Some(event) = protocol::decode(&text) {
                        log::debug!("Support channel event: {event:?}");
                        if events.send(event).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Frame::Close(frame))) => {
                    let reason = frame.map(|frame| frame.reason.to_string());
                    log::info!("Support channel closed by server ({reason:?})");
                    let _ = events.send(ChannelEvent::Closed { reason }).await;
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    log::warn!("Support channel read failed: {err}");
                    let _ = events.send(ChannelEvent::Closed { reason: Some(err.to_string()) }).await;
                    break;
                }
                None => {
                    let _ = events.send(ChannelEvent::Closed { reason: None }).await;
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use serde_json::{Value, json};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;
    use tokio_tungstenite::accept_hdr_async;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
    use tokio_tungstenite::tungstenite::http::StatusCode;
    use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;

    use super::*;

    const TOKEN: &str = "visitor-token";

    async fn serve_once() -> (String, JoinHandle<Option<WebSocketStream<TcpStream>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/chat", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.ok()?;
            let check_token = |request: &Request, response: Response| {
                let expected = format!("Bearer {TOKEN}");
                match request.headers().get(AUTHORIZATION) {
                    Some(value) if value.as_bytes() == expected.as_bytes() => Ok(response),
                    _ => {
                        let mut rejection = ErrorResponse::new(None);
                        *rejection.status_mut() = StatusCode::UNAUTHORIZED;
                        Err(rejection)
                    }
                }
            };
            accept_hdr_async(stream, check_token).await.ok()
        });

        (url, server)
    }

    fn receive_frame(id: u64) -> Frame {
        Frame::Text(
            json!({
                "type": "receive_message",
                "payload": {
                    "id": id,
                    "conversationId": "support",
                    "senderId": "assistant",
                    "content": format!("reply {id}"),
                    "createdAt": "2026-10-17T08:30:00Z",
                    "isRead": false
                }
            })
            .to_string(),
        )
    }

    async fn next(connector: &mut SessionConnector) -> ChannelEvent {
        timeout(Duration::from_secs(2), connector.next_event())
            .await
            .expect("channel event")
            .expect("channel still open")
    }

    #[tokio::test]
    async fn rejected_credential_is_an_auth_error() {
        let (url, server) = serve_once().await;

        let err = SessionConnector::connect(&url, &Credential::bearer("wrong"), 8)
            .await
            .unwrap_err();

        assert!(err.is_auth(), "unexpected error: {err}");
        assert!(server.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn inbound_events_keep_transport_order_without_dedup() {
        let (url, server) = serve_once().await;
        let mut connector = SessionConnector::connect(&url, &Credential::bearer(TOKEN), 8)
            .await
            .unwrap();
        let mut remote = server.await.unwrap().expect("handshake accepted");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        connector.on_event(move |event| {
            if let ChannelEvent::MessageReceived(message) = event {
                recorder.lock().unwrap().push(message.id.to_string());
            }
        });

        for id in [2, 1, 2] {
            remote.send(receive_frame(id)).await.unwrap();
        }
        for _ in 0..3 {
            next(&mut connector).await;
        }

        assert_eq!(*seen.lock().unwrap(), vec!["2", "1", "2"]);
    }

    #[tokio::test]
    async fn send_emits_send_message_envelope() {
        let (url, server) = serve_once().await;
        let connector = SessionConnector::connect(&url, &Credential::bearer(TOKEN), 8)
            .await
            .unwrap();
        let mut remote = server.await.unwrap().expect("handshake accepted");

        assert!(connector.send("hello support"));

        let frame = timeout(Duration::from_secs(2), remote.next()).await.unwrap();
        let Some(Ok(Frame::Text(text))) = frame else {
            panic!("expected a text frame, got {frame:?}");
        };
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({ "type": "sendMessage", "payload": { "content": "hello support" } })
        );
    }

    #[tokio::test]
    async fn disconnect_is_idempotent_and_silences_sends() {
        let (url, server) = serve_once().await;
        let mut connector = SessionConnector::connect(&url, &Credential::bearer(TOKEN), 8)
            .await
            .unwrap();
        let mut remote = server.await.unwrap().expect("handshake accepted");

        connector.disconnect();
        connector.disconnect();

        assert!(!connector.is_connected());
        assert!(!connector.send("lost"));

        let frame = timeout(Duration::from_secs(2), remote.next()).await.unwrap();
        assert!(matches!(frame, Some(Ok(Frame::Close(_))) | None), "got {frame:?}");
    }

    #[tokio::test]
    async fn server_close_surfaces_as_closed_event() {
        let (url, server) = serve_once().await;
        let mut connector = SessionConnector::connect(&url, &Credential::bearer(TOKEN), 8)
            .await
            .unwrap();
        let mut remote = server.await.unwrap().expect("handshake accepted");

        remote.close(None).await.unwrap();

        assert!(matches!(next(&mut connector).await, ChannelEvent::Closed { .. }));
        assert!(!connector.is_connected());
    }
}
