use std::sync::Arc;

use crate::common::Identity;
use crate::error::ChatResult;
use crate::network::ChatApi;
use crate::storage::MessageStore;

use super::session::{OutcomeSender, SessionEpoch, SessionOutcome};

/// Mark-all-read handshake: flip locally first, then confirm with the server.
///
/// A failed confirmation is logged and nothing is rolled back or retried.
/// Reads made on another device only show up through the next resync.
pub struct ReadReceiptSynchronizer {
    api: Arc<dyn ChatApi>,
}

impl ReadReceiptSynchronizer {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self { api }
    }

    /// Returns how many messages were flipped locally. The confirmation
    /// result comes back as a [`SessionOutcome::MarkRead`] tagged with `epoch`.
    pub(crate) fn mark_all_read(
        &self,
        store: &mut MessageStore,
        identity: &Identity,
        epoch: SessionEpoch,
        outcomes: &OutcomeSender,
    ) -> usize {
        let flipped = store.mark_inbound_read(&identity.user_id);
        let confirmation = self.api.mark_read(&identity.credential);
        let outcomes = outcomes.clone();
        tokio::spawn(async move {
            let result = confirmation.await;
            let _ = outcomes.send(SessionOutcome::MarkRead { epoch, result });
        });

        log::debug!("Marked {flipped} message(s) read locally; confirmation requested");
        flipped
    }

    pub(crate) fn confirmation_settled(result: ChatResult<()>) {
        match result {
            Ok(()) => log::debug!("Server confirmed read receipts"),
            Err(err) => log::warn!("{err}; keeping local read state"),
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::chat::testing::{ScriptedApi, identity, message};

    #[tokio::test]
    async fn flips_inbound_locally_and_requests_confirmation_once() {
        let api = Arc::new(ScriptedApi::default());
        let receipts = ReadReceiptSynchronizer::new(api.clone());
        let (outcomes, mut results) = mpsc::unbounded_channel();

        let mut store = MessageStore::new();
        store.append(message("1", "assistant", "hello"));
        store.append(message("2", "visitor", "hi"));

        let epoch = SessionEpoch::default().next();
        let flipped = receipts.mark_all_read(&mut store, &identity(), epoch, &outcomes);

        assert_eq!(flipped, 1);
        assert!(store.query()[0].is_read);
        assert!(!store.query()[1].is_read);
        assert_eq!(api.mark_read_calls(), 1);

        let Some(SessionOutcome::MarkRead { epoch: reported, result }) = results.recv().await else {
            panic!("expected a mark-read outcome");
        };
        assert_eq!(reported, epoch);
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn failed_confirmation_leaves_local_state_alone() {
        let api = Arc::new(ScriptedApi::default());
        api.fail_mark_read();
        let receipts = ReadReceiptSynchronizer::new(api.clone());
        let (outcomes, mut results) = mpsc::unbounded_channel();

        let mut store = MessageStore::new();
        store.append(message("1", "assistant", "hello"));
        receipts.mark_all_read(&mut store, &identity(), SessionEpoch::default(), &outcomes);

        let Some(SessionOutcome::MarkRead { result, .. }) = results.recv().await else {
            panic!("expected a mark-read outcome");
        };
        ReadReceiptSynchronizer::confirmation_settled(result);
        assert!(store.query()[0].is_read);
    }
}
