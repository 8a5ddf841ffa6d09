//! In-memory dialer and scripted REST collaborator for session tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{TimeZone, Utc};
use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};

use crate::common::{
    ChannelCommand, ChannelEvent, Credential, Delivery, Identity, Message, MessageId, UserId,
};
use crate::error::{ChatError, ChatResult};
use crate::network::{ChatApi, Dialer, SessionConnector};

pub const SELF_ID: &str = "visitor";

pub fn identity() -> Identity {
    Identity::new(SELF_ID, Credential::bearer("visitor-token"))
}

pub fn message(id: &str, sender: &str, content: &str) -> Message {
    Message {
        id: MessageId::new(id),
        conversation_id: "support".into(),
        sender_id: UserId::new(sender),
        content: content.to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 10, 17, 8, 30, 0).unwrap(),
        is_read: false,
        delivery: Delivery::Confirmed,
    }
}

/// The far side of a dialed channel.
pub struct RemoteEnd {
    pub inbound: mpsc::Sender<ChannelEvent>,
    pub outbound: mpsc::Receiver<ChannelCommand>,
}

#[derive(Default)]
pub struct FakeDialer {
    remotes: Mutex<VecDeque<RemoteEnd>>,
    dials: AtomicUsize,
    reject: AtomicBool,
}

impl FakeDialer {
    pub fn reject_credentials(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    pub fn take_remote(&self) -> RemoteEnd {
        self.remotes
            .lock()
            .unwrap()
            .pop_front()
            .expect("no channel was dialed")
    }
}

impl Dialer for FakeDialer {
    fn dial(&self, _credential: Credential) -> BoxFuture<'static, ChatResult<SessionConnector>> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        if self.reject.load(Ordering::SeqCst) {
            return Box::pin(async { Err(ChatError::Auth("credential rejected".to_string())) });
        }

        let (command_tx, command_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(16);
        self.remotes.lock().unwrap().push_back(RemoteEnd {
            inbound: event_tx,
            outbound: command_rx,
        });
        Box::pin(async move { Ok(SessionConnector::from_parts(command_tx, event_rx, None)) })
    }
}

/// Resync fetches stay pending until the test resolves them.
#[derive(Default)]
pub struct ScriptedApi {
    fetches: Mutex<VecDeque<oneshot::Sender<ChatResult<Vec<Message>>>>>,
    mark_read_calls: AtomicUsize,
    fail_mark_read: AtomicBool,
}

impl ScriptedApi {
    pub fn resolve_fetch(&self, result: ChatResult<Vec<Message>>) {
        let responder = self
            .fetches
            .lock()
            .unwrap()
            .pop_front()
            .expect("no resync fetch in flight");
        let _ = responder.send(result);
    }

    pub fn pending_fetches(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn mark_read_calls(&self) -> usize {
        self.mark_read_calls.load(Ordering::SeqCst)
    }

    pub fn fail_mark_read(&self) {
        self.fail_mark_read.store(true, Ordering::SeqCst);
    }
}

impl ChatApi for ScriptedApi {
    fn fetch_messages(&self, _credential: &Credential) -> BoxFuture<'static, ChatResult<Vec<Message>>> {
        let (responder, response) = oneshot::channel();
        self.fetches.lock().unwrap().push_back(responder);
        Box::pin(async move {
            response
                .await
                .unwrap_or_else(|_| Err(ChatError::sync("fetch abandoned")))
        })
    }

    fn mark_read(&self, _credential: &Credential) -> BoxFuture<'static, ChatResult<()>> {
        self.mark_read_calls.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail_mark_read.load(Ordering::SeqCst);
        Box::pin(async move {
            if fail {
                Err(ChatError::mark_read("server unavailable"))
            } else {
                Ok(())
            }
        })
    }
}
