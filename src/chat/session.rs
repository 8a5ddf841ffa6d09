use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::common::{ChannelEvent, ConnectionState, Identity, Message, SessionUpdate};
use crate::error::{ChatError, ChatResult};
use crate::network::{ChatApi, Dialer, SessionConnector};
use crate::storage::{AppendOutcome, MessageStore};

use super::presence::{GatedAction, PresenceGate};
use super::receipts::ReadReceiptSynchronizer;
use super::unread::UnreadTracker;
use super::visibility::{Transition, Visibility, VisibilityController};

const SESSION_EXPIRED_NOTICE: &str = "Your sign-in has expired. Please sign in again.";

/// Generation of the active identity session. Async results carry the epoch
/// they were issued under and are ignored once it has moved on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionEpoch(u64);

impl SessionEpoch {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Results of the suspension points, delivered back to the owner.
pub(crate) enum SessionOutcome {
    Connected {
        epoch: SessionEpoch,
        result: ChatResult<SessionConnector>,
    },
    Resynced {
        epoch: SessionEpoch,
        result: ChatResult<Vec<Message>>,
    },
    MarkRead {
        epoch: SessionEpoch,
        result: ChatResult<()>,
    },
}

impl SessionOutcome {
    fn epoch(&self) -> SessionEpoch {
        match self {
            Self::Connected { epoch, .. } | Self::Resynced { epoch, .. } | Self::MarkRead { epoch, .. } => {
                *epoch
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connect",
            Self::Resynced { .. } => "resync",
            Self::MarkRead { .. } => "mark-read",
        }
    }
}

pub(crate) type OutcomeSender = mpsc::UnboundedSender<SessionOutcome>;

type Listener = Box<dyn FnMut(&SessionUpdate)>;

enum Step {
    Channel(Option<ChannelEvent>),
    Outcome(Option<SessionOutcome>),
}

/// The support chat for one signed-in identity at a time.
///
/// `start` acquires the channel and `stop` releases it; nothing else dials or
/// tears down. All state changes happen inside [`ChatSession::pump`] or
/// [`ChatSession::tick`] (for channel events and async results) or inside the
/// user-action methods, so the session needs no locking.
pub struct ChatSession {
    dialer: Arc<dyn Dialer>,
    api: Arc<dyn ChatApi>,
    gate: PresenceGate,
    visibility: VisibilityController,
    receipts: ReadReceiptSynchronizer,
    store: MessageStore,
    connector: Option<SessionConnector>,
    connection: ConnectionState,
    epoch: SessionEpoch,
    outcomes_tx: OutcomeSender,
    outcomes_rx: mpsc::UnboundedReceiver<SessionOutcome>,
    listeners: Vec<Listener>,
}

impl ChatSession {
    pub fn new(dialer: Arc<dyn Dialer>, api: Arc<dyn ChatApi>) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Self {
            dialer,
            receipts: ReadReceiptSynchronizer::new(Arc::clone(&api)),
            api,
            gate: PresenceGate::new(),
            visibility: VisibilityController::new(),
            store: MessageStore::new(),
            connector: None,
            connection: ConnectionState::Disconnected,
            epoch: SessionEpoch::default(),
            outcomes_tx,
            outcomes_rx,
            listeners: Vec::new(),
        }
    }

    pub fn on_update(&mut self, listener: impl FnMut(&SessionUpdate) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Establishes `identity` and dials its channel. A previous identity is
    /// stopped first.
    pub fn start(&mut self, identity: Identity) -> ChatResult<()> {
        if self.gate.identity().is_some() {
            self.stop();
        }

        self.gate.establish(identity);
        let identity = match self.guard(GatedAction::Connect) {
            Ok(identity) => identity,
            Err(err) => {
                self.gate.revoke();
                return Err(err);
            }
        };

        self.epoch = self.epoch.next();
        log::info!("Starting support session for {}", identity.user_id);
        self.dial(&identity);
        Ok(())
    }

    /// Tears the identity session down: disconnects the channel once, clears
    /// the log and invalidates every in-flight request.
    pub fn stop(&mut self) {
        let Some(identity) = self.gate.revoke() else {
            return;
        };

        if let Some(mut connector) = self.connector.take() {
            connector.disconnect();
        }
        self.store.clear();
        self.epoch = self.epoch.next();
        log::info!("Stopped support session for {}", identity.user_id);

        self.set_connection(ConnectionState::Disconnected);
        if self.visibility.close() == Transition::Closed {
            self.notify(SessionUpdate::Visibility(Visibility::Hidden));
        }
        self.notify_messages();
    }

    /// Re-dials after the channel dropped. A live or pending channel is left
    /// alone.
    pub fn reconnect(&mut self) -> ChatResult<()> {
        let identity = self.guard(GatedAction::Connect)?;
        if self.connection != ConnectionState::Disconnected {
            log::debug!("Support channel already {:?}; not redialing", self.connection);
            return Ok(());
        }
        self.dial(&identity);
        Ok(())
    }

    /// Sends `content` as given and appends its optimistic copy. Blank
    /// content is ignored; without a connected channel the message is dropped.
    pub fn send(&mut self, content: &str) -> ChatResult<()> {
        if content.trim().is_empty() {
            return Ok(());
        }
        let identity = self.guard(GatedAction::Send)?;

        let handed_off = self
            .connector
            .as_ref()
            .is_some_and(|connector| connector.send(content));
        if !handed_off {
            log::warn!("Support channel not connected; message not sent");
            return Ok(());
        }

        self.store
            .append_pending(Message::pending(identity.user_id, content));
        self.notify_messages();
        Ok(())
    }

    pub fn open_pane(&mut self) -> ChatResult<()> {
        let identity = self.guard(GatedAction::OpenPane)?;
        if self.visibility.open() == Transition::Opened {
            self.notify(SessionUpdate::Visibility(Visibility::Visible));
            self.receipts
                .mark_all_read(&mut self.store, &identity, self.epoch, &self.outcomes_tx);
            self.notify_messages();
        }
        Ok(())
    }

    pub fn close_pane(&mut self) {
        if self.visibility.close() == Transition::Closed {
            self.notify(SessionUpdate::Visibility(Visibility::Hidden));
            self.notify_messages();
        }
    }

    pub fn toggle_pane(&mut self) -> ChatResult<()> {
        if self.visibility.is_visible() {
            self.close_pane();
            Ok(())
        } else {
            self.open_pane()
        }
    }

    /// Runs the read-receipt handshake outside of a pane transition. Returns
    /// how many messages were flipped locally.
    pub fn mark_all_read(&mut self) -> usize {
        let Some(identity) = self.gate.identity().cloned() else {
            return 0;
        };
        let flipped =
            self.receipts
                .mark_all_read(&mut self.store, &identity, self.epoch, &self.outcomes_tx);
        self.notify_messages();
        flipped
    }

    /// Dispatches everything that is ready without waiting.
    pub fn pump(&mut self) {
        while let Some(event) = self
            .connector
            .as_mut()
            .and_then(SessionConnector::try_next_event)
        {
            self.apply_channel_event(event);
        }
        if self
            .connector
            .as_ref()
            .is_some_and(|connector| !connector.is_connected())
        {
            self.drop_connection(None);
        }

        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.apply_outcome(outcome);
        }
        self.gate.clear_expired(Instant::now());
    }

    /// Waits for the next channel event or async result and dispatches it.
    pub async fn tick(&mut self) {
        let step = match self.connector.as_mut() {
            Some(connector) => tokio::select! {
                biased;
                event = connector.next_event() => Step::Channel(event),
                outcome = self.outcomes_rx.recv() => Step::Outcome(outcome),
            },
            None => Step::Outcome(self.outcomes_rx.recv().await),
        };

        match step {
            Step::Channel(Some(event)) => self.apply_channel_event(event),
            Step::Channel(None) => self.drop_connection(None),
            Step::Outcome(Some(outcome)) => self.apply_outcome(outcome),
            Step::Outcome(None) => {}
        }
        self.gate.clear_expired(Instant::now());
    }

    pub fn messages(&self) -> &[Message] {
        self.store.query()
    }

    pub fn unread(&self) -> usize {
        match self.gate.identity() {
            Some(identity) => UnreadTracker::recompute(
                self.store.query(),
                &identity.user_id,
                self.visibility.state(),
            ),
            None => 0,
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility.state()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.gate.identity()
    }

    pub fn notice(&self) -> Option<&str> {
        self.gate.notice(Instant::now())
    }

    fn guard(&mut self, action: GatedAction) -> ChatResult<Identity> {
        let now = Instant::now();
        match self.gate.check(action, now) {
            Ok(identity) => Ok(identity.clone()),
            Err(err) => {
                self.emit_notice(now);
                Err(err)
            }
        }
    }

    fn dial(&mut self, identity: &Identity) {
        self.set_connection(ConnectionState::Connecting);
        let connecting = self.dialer.dial(identity.credential.clone());
        let outcomes = self.outcomes_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = connecting.await;
            let _ = outcomes.send(SessionOutcome::Connected { epoch, result });
        });
    }

    fn resync(&mut self) {
        let Some(identity) = self.gate.identity() else {
            return;
        };
        let fetch = self.api.fetch_messages(&identity.credential);
        let outcomes = self.outcomes_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = fetch.await;
            let _ = outcomes.send(SessionOutcome::Resynced { epoch, result });
        });
    }

    fn apply_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::MessageReceived(message) => self.receive(message),
            ChannelEvent::Closed { reason } => self.drop_connection(reason),
        }
    }

    fn receive(&mut self, message: Message) {
        let Some(identity) = self.gate.identity().cloned() else {
            return;
        };
        let inbound = message.is_inbound(&identity.user_id);

        match self.store.append(message) {
            AppendOutcome::Duplicate => return,
            AppendOutcome::Confirmed { local_id } => {
                log::debug!("Server confirmed pending message {local_id}");
            }
            AppendOutcome::Appended => {
                if inbound && self.visibility.is_visible() {
                    self.receipts.mark_all_read(
                        &mut self.store,
                        &identity,
                        self.epoch,
                        &self.outcomes_tx,
                    );
                }
            }
        }
        self.notify_messages();
    }

    fn apply_outcome(&mut self, outcome: SessionOutcome) {
        if outcome.epoch() != self.epoch || self.gate.identity().is_none() {
            log::debug!("Dropping {} result from a torn-down session", outcome.kind());
            if let SessionOutcome::Connected {
                result: Ok(mut connector),
                ..
            } = outcome
            {
                connector.disconnect();
            }
            return;
        }

        match outcome {
            SessionOutcome::Connected { result: Ok(connector), .. } => self.install(connector),
            SessionOutcome::Connected { result: Err(err), .. } => self.connect_failed(err),
            SessionOutcome::Resynced { result, .. } => self.resynced(result),
            SessionOutcome::MarkRead { result, .. } => {
                ReadReceiptSynchronizer::confirmation_settled(result);
            }
        }
    }

    fn install(&mut self, mut connector: SessionConnector) {
        if self
            .connector
            .as_ref()
            .is_some_and(SessionConnector::is_connected)
        {
            log::warn!("Discarding extra support channel; one is already open");
            connector.disconnect();
            return;
        }

        self.connector = Some(connector);
        self.set_connection(ConnectionState::Connected);
        self.resync();
    }

    fn connect_failed(&mut self, err: ChatError) {
        self.set_connection(ConnectionState::Disconnected);
        if err.is_auth() {
            log::warn!("{err}; ending session");
            self.stop();
            let now = Instant::now();
            self.gate.raise_notice(SESSION_EXPIRED_NOTICE, now);
            self.emit_notice(now);
        } else {
            log::warn!("{err}");
        }
    }

    fn resynced(&mut self, result: ChatResult<Vec<Message>>) {
        let Some(identity) = self.gate.identity().cloned() else {
            return;
        };

        match result {
            Ok(messages) => {
                let summary = self.store.bulk_replace(messages);
                log::info!(
                    "Resynced {} message(s), kept {} local",
                    summary.fetched,
                    summary.carried_over
                );
                let unread_inbound = UnreadTracker::recompute(
                    self.store.query(),
                    &identity.user_id,
                    Visibility::Hidden,
                );
                if unread_inbound > 0 && self.visibility.is_visible() {
                    self.receipts.mark_all_read(
                        &mut self.store,
                        &identity,
                        self.epoch,
                        &self.outcomes_tx,
                    );
                }
                self.notify_messages();
            }
            Err(err) => {
                log::warn!("{err}; keeping {} cached message(s)", self.store.len());
            }
        }
    }

    fn drop_connection(&mut self, reason: Option<String>) {
        if let Some(mut connector) = self.connector.take() {
            connector.disconnect();
            log::warn!(
                "Support channel dropped: {}",
                reason.as_deref().unwrap_or("no reason given")
            );
        }
        self.set_connection(ConnectionState::Disconnected);
    }

    fn set_connection(&mut self, state: ConnectionState) {
        if self.connection != state {
            self.connection = state;
            self.notify(SessionUpdate::Connection(state));
        }
    }

    fn emit_notice(&mut self, now: Instant) {
        if let Some(text) = self.gate.notice(now).map(str::to_string) {
            self.notify(SessionUpdate::Notice(text));
        }
    }

    fn notify_messages(&mut self) {
        let update = SessionUpdate::Messages {
            total: self.store.len(),
            unread: self.unread(),
        };
        self.notify(update);
    }

    fn notify(&mut self, update: SessionUpdate) {
        for listener in &mut self.listeners {
            listener(&update);
        }
    }
}
