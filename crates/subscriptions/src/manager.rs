//! The engine: serialized event loop, API read surface and the
//! notification sink seam.

use crate::config::EngineConfig;
use crate::errors::SubscriptionError;
use crate::ledger::{LedgerRecord, TxLedger};
use crate::notify::{BlockNotification, Notifier, TransferNotification};
use crate::subscription::{Subscription, SubscriptionStore};
use address_book::AddressBook;
use shared_bus::{BlockEvent, EventListener, TransactionEvent};
use shared_types::{ChainClient, TransferRecord};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

/// Where routed notifications go. The production sink posts webhooks on
/// spawned tasks; tests install a recording sink.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, subscription: Subscription, method: &'static str, body: NotificationBody);
}

#[derive(Debug, Clone)]
pub enum NotificationBody {
    Block(BlockNotification),
    Transfer(TransferNotification),
}

/// Fire-and-forget webhook delivery, one task per send.
pub struct WebhookSink {
    notifier: Notifier,
    debug_mode: bool,
}

impl WebhookSink {
    pub fn new(debug_mode: bool) -> Self {
        Self {
            notifier: Notifier::new(),
            debug_mode,
        }
    }
}

impl NotificationSink for WebhookSink {
    fn deliver(&self, subscription: Subscription, method: &'static str, body: NotificationBody) {
        let notifier = self.notifier.clone();
        let debug_mode = self.debug_mode;
        tokio::spawn(async move {
            match &body {
                NotificationBody::Block(payload) => {
                    notifier.send(&subscription, method, payload, debug_mode).await;
                }
                NotificationBody::Transfer(payload) => {
                    notifier.send(&subscription, method, payload, debug_mode).await;
                }
            }
        });
    }
}

pub(crate) enum EngineEvent {
    Block(BlockEvent),
    Transaction(TransferRecord),
    /// Queue barrier: acknowledged once everything before it has been
    /// processed.
    Flush(tokio::sync::oneshot::Sender<()>),
}

pub(crate) struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) subscriptions: SubscriptionStore,
    /// Write side is the event loop; API queries take the read lock.
    pub(crate) ledger: RwLock<TxLedger>,
    pub(crate) addresses: Arc<AddressBook>,
    pub(crate) client: Arc<dyn ChainClient>,
    pub(crate) sink: Arc<dyn NotificationSink>,
}

impl Engine {
    async fn event_loop(self: Arc<Self>, mut receiver: mpsc::UnboundedReceiver<EngineEvent>) {
        while let Some(event) = receiver.recv().await {
            match event {
                EngineEvent::Block(block) => self.block_event(block).await,
                EngineEvent::Transaction(transfer) => self.transaction_event(transfer).await,
                EngineEvent::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
        debug!("subscription engine loop exiting");
    }
}

/// Public handle: enqueue side of the event loop plus the query surface.
pub struct SubscriptionManager {
    engine: Arc<Engine>,
    sender: mpsc::UnboundedSender<EngineEvent>,
}

impl SubscriptionManager {
    /// Build the engine with webhook delivery and spawn its event loop.
    pub fn new(
        config: EngineConfig,
        subscriptions: SubscriptionStore,
        ledger: TxLedger,
        addresses: Arc<AddressBook>,
        client: Arc<dyn ChainClient>,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let debug_mode = config.debug;
        Self::with_sink(
            config,
            subscriptions,
            ledger,
            addresses,
            client,
            Arc::new(WebhookSink::new(debug_mode)),
        )
    }

    pub fn with_sink(
        config: EngineConfig,
        subscriptions: SubscriptionStore,
        ledger: TxLedger,
        addresses: Arc<AddressBook>,
        client: Arc<dyn ChainClient>,
        sink: Arc<dyn NotificationSink>,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let engine = Arc::new(Engine {
            config,
            subscriptions,
            ledger: RwLock::new(ledger),
            addresses,
            client,
            sink,
        });
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(Engine::event_loop(engine.clone(), receiver));
        (Arc::new(Self { engine, sender }), handle)
    }

    pub fn subscriptions(&self) -> &SubscriptionStore {
        &self.engine.subscriptions
    }

    /// Point lookup by transaction id.
    pub async fn transfer_by_id(&self, tx_id: &str) -> Result<LedgerRecord, SubscriptionError> {
        self.engine
            .ledger
            .read()
            .await
            .get(tx_id)?
            .ok_or(SubscriptionError::UnknownTransaction)
    }

    /// Every ledger row touching an address, ascending by block number.
    pub async fn transfers_for_address(
        &self,
        address: &str,
    ) -> Result<Vec<LedgerRecord>, SubscriptionError> {
        self.engine.ledger.read().await.for_address(address)
    }

    /// Wait until every event enqueued so far has been processed.
    pub async fn drain(&self) {
        let (ack, done) = tokio::sync::oneshot::channel();
        if self.sender.send(EngineEvent::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

impl EventListener for SubscriptionManager {
    fn on_block(&self, event: &BlockEvent) {
        let _ = self.sender.send(EngineEvent::Block(event.clone()));
    }

    fn on_transaction(&self, event: &TransactionEvent) {
        let _ = self
            .sender
            .send(EngineEvent::Transaction(event.transfer.clone()));
    }
}
