//! The bounded bus and its dispatcher task.

use crate::events::{BlockEvent, ChainEvent, TransactionEvent};
use crate::EVENT_QUEUE_DEPTH;
use shared_types::TransferRecord;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// The dispatcher has shut down; no consumer will see further events.
    #[error("event bus closed")]
    Closed,
}

/// A consumer of chain events.
///
/// Implementations must treat these callbacks as enqueue-only: they are
/// invoked on the dispatcher task, in event order, and must not block.
pub trait EventListener: Send + Sync {
    fn on_block(&self, _event: &BlockEvent) {}
    fn on_transaction(&self, _event: &TransactionEvent) {}
}

/// Producer handle. Cloneable, but the watch loop is the only writer by
/// construction.
#[derive(Clone)]
pub struct EventBus {
    sender: mpsc::Sender<ChainEvent>,
}

impl EventBus {
    /// Create the bus and its (not yet spawned) dispatcher.
    pub fn new() -> (Self, EventDispatcher) {
        Self::with_depth(EVENT_QUEUE_DEPTH)
    }

    pub fn with_depth(depth: usize) -> (Self, EventDispatcher) {
        let (sender, receiver) = mpsc::channel(depth);
        (
            Self { sender },
            EventDispatcher {
                receiver,
                listeners: Vec::new(),
            },
        )
    }

    /// Enqueue an event. Blocks when the queue is full — this is the
    /// producer-side backpressure point.
    pub async fn publish(&self, event: ChainEvent) -> Result<(), BusError> {
        self.sender.send(event).await.map_err(|_| BusError::Closed)
    }

    pub async fn publish_block(
        &self,
        number: u64,
        id: String,
        timestamp: i64,
    ) -> Result<(), BusError> {
        self.publish(ChainEvent::Block(BlockEvent {
            number,
            id,
            timestamp,
        }))
        .await
    }

    pub async fn publish_transaction(&self, transfer: TransferRecord) -> Result<(), BusError> {
        self.publish(ChainEvent::Transaction(TransactionEvent { transfer }))
            .await
    }
}

/// Drains the queue one event at a time and fans out to listeners.
pub struct EventDispatcher {
    receiver: mpsc::Receiver<ChainEvent>,
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventDispatcher {
    /// Register a listener. Registration happens before `spawn`; the set
    /// is fixed while the dispatcher runs.
    pub fn register(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        while let Some(event) = self.receiver.recv().await {
            match &event {
                ChainEvent::Block(block) => {
                    for listener in &self.listeners {
                        listener.on_block(block);
                    }
                }
                ChainEvent::Transaction(tx) => {
                    for listener in &self.listeners {
                        listener.on_transaction(tx);
                    }
                }
            }
        }
        debug!("event queue drained, dispatcher exiting");
    }
}
