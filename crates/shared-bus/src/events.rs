//! Event variants carried on the bus.

use shared_types::TransferRecord;

/// A block was fetched and fully processed by the watcher.
///
/// Emitted after all of the block's transaction events, once per block,
/// strictly monotonic in height. The subscription engine uses this as its
/// confirmation-advance tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEvent {
    pub number: u64,
    /// Block hash in string form.
    pub id: String,
    pub timestamp: i64,
}

/// A transfer touching a known address was observed, either in the mempool
/// (`transfer.in_pool`) or in a block.
#[derive(Debug, Clone)]
pub struct TransactionEvent {
    pub transfer: TransferRecord,
}

/// The union drained by the dispatcher.
#[derive(Debug, Clone)]
pub enum ChainEvent {
    Block(BlockEvent),
    Transaction(TransactionEvent),
}
