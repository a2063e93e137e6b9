//! # Subscriptions
//!
//! The subscription and confirmation engine. It owns the transaction
//! ledger, advances confirmation counts on every block event, classifies
//! each transfer per subscriber (incoming/outgoing, coin/token), drives
//! webhook delivery with at-least-once semantics, and sweeps confirmed
//! incoming balances to a service's master address when asked to.
//!
//! All ledger mutations happen on one serialized event loop; webhook sends
//! are spawned off the loop so a slow endpoint never stalls the pipeline.
//! Delivery results are logged and never retried here — the confirmation
//! ticks are the retry mechanism for subscribers that acknowledge
//! idempotently on transaction id.

pub mod config;
pub mod errors;
pub mod events;
pub mod gather;
pub mod ledger;
pub mod manager;
pub mod notify;
pub mod subscription;

pub use config::EngineConfig;
pub use errors::SubscriptionError;
pub use ledger::{LedgerRecord, TxLedger};
pub use manager::{NotificationBody, NotificationSink, SubscriptionManager, WebhookSink};
pub use notify::{BlockNotification, TransferNotification};
pub use subscription::{ServiceId, Subscription, SubscriptionStore};

/// Column families of the ledger database.
pub const LEDGER_COLUMN_FAMILIES: &[&str] = &[
    ledger::CF_RECORDS,
    ledger::CF_BLOCK_INDEX,
    ledger::CF_ADDR_INDEX,
];
