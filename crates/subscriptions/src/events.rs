//! Inbound event handling: the confirmation state machine and the
//! per-subscriber routing matrix.

use crate::ledger::LedgerRecord;
use crate::manager::{Engine, NotificationBody};
use crate::notify::{BlockNotification, TransferNotification};
use crate::subscription::Subscription;
use shared_bus::BlockEvent;
use shared_types::{ChainInfo, TransferRecord};
use tracing::{debug, error, info};

impl Engine {
    /// Handle one transaction event.
    ///
    /// New ids are inserted (`confirmations = 1` when already in a block,
    /// `0` while pending). A repeat of a known observation is a no-op.
    /// A pending record seen in a block is promoted. Anything else — a
    /// contradictory update for a settled record — is dropped.
    pub(crate) async fn transaction_event(&self, incoming: TransferRecord) {
        if self.config.debug {
            let stage = if incoming.in_pool { "mempool" } else { "block" };
            debug!(tx = %incoming.tx_id, stage, "processing transaction event");
        }

        let record = {
            let ledger = self.ledger.write().await;
            let existing = match ledger.get(&incoming.tx_id) {
                Ok(existing) => existing,
                Err(e) => {
                    error!(tx = %incoming.tx_id, error = %e, "can not read ledger");
                    return;
                }
            };
            let record = match existing {
                None => {
                    let mut record = LedgerRecord::new(incoming);
                    record.transfer.confirmations =
                        if record.transfer.in_pool { 0 } else { 1 };
                    record
                }
                Some(existing) if existing.transfer.same_observation(&incoming) => {
                    debug!(tx = %incoming.tx_id, "transaction already known, skipping");
                    return;
                }
                Some(mut existing)
                    if existing.transfer.in_pool && !incoming.in_pool =>
                {
                    // Mempool-to-block promotion.
                    existing.transfer.block_number = incoming.block_number;
                    existing.transfer.timestamp = incoming.timestamp;
                    existing.transfer.in_pool = false;
                    existing.transfer.confirmations = 1;
                    existing
                }
                Some(_) => {
                    debug!(tx = %incoming.tx_id, "transaction update ignored");
                    return;
                }
            };
            if let Err(e) = ledger.upsert(&record) {
                error!(tx = %record.transfer.tx_id, error = %e, "can not save transaction");
                return;
            }
            record
        };

        if record.ignore {
            return;
        }
        let notification = TransferNotification::from_record(&record);
        self.route_notification(notification).await;
    }

    /// Handle one block event: unconditional new-block fan-out, then the
    /// confirmation advance at `threshold = H - (min_confirmations - 1)`.
    pub(crate) async fn block_event(&self, event: BlockEvent) {
        self.notify_new_block(&event);

        let min_confirmations = self.client.min_confirmations().max(1);
        let threshold = event
            .number
            .saturating_sub(min_confirmations - 1)
            .max(1);

        let mut notifications = Vec::new();
        {
            let ledger = self.ledger.write().await;

            // Transactions crossing the threshold become settled.
            match ledger.unconfirmed_upto(threshold) {
                Ok(to_confirm) => {
                    if !to_confirm.is_empty() {
                        info!(count = to_confirm.len(), block = event.number, "confirming transactions");
                    }
                    for mut record in to_confirm {
                        record.transfer.confirmed = true;
                        record.transfer.confirmations =
                            event.number - record.transfer.block_number + 1;
                        if let Err(e) = ledger.upsert(&record) {
                            error!(tx = %record.transfer.tx_id, error = %e, "can not save transaction");
                            continue;
                        }
                        if !record.ignore {
                            notifications.push(TransferNotification::from_record(&record));
                        }
                    }
                }
                Err(e) => error!(error = %e, "can not load confirmable transactions"),
            }

            // The still-waiting set gets a progress tick. The including
            // block itself was already reported on insert.
            match ledger.unconfirmed_after(threshold) {
                Ok(waiting) => {
                    for record in waiting {
                        if record.transfer.block_number >= event.number || record.ignore {
                            continue;
                        }
                        let mut notification = TransferNotification::from_record(&record);
                        notification.confirmations =
                            event.number - record.transfer.block_number + 1;
                        notifications.push(notification);
                    }
                }
                Err(e) => error!(error = %e, "can not load unconfirmed transactions"),
            }
        }

        for notification in notifications {
            self.route_notification(notification).await;
        }
    }

    fn notify_new_block(&self, event: &BlockEvent) {
        let payload = BlockNotification {
            chain_id: self.client.chain_id().to_string(),
            block_number: event.number,
            block_id: event.id.clone(),
        };
        let mut targets = Vec::new();
        self.subscriptions.view_all(|subscription| {
            if subscription.report_new_block {
                targets.push(subscription.clone());
            }
        });
        for subscription in targets {
            self.sink.deliver(
                subscription,
                "blockEvent",
                NotificationBody::Block(payload.clone()),
            );
        }
    }

    /// Resolve the endpoints against the address store and apply the
    /// filter matrix. An owned recipient additionally gets the user and
    /// invoice ids and may trigger a sweep.
    pub(crate) async fn route_notification(&self, notification: TransferNotification) {
        let chain_id = self.client.chain_id().to_string();

        if self.addresses.is_known(&notification.from) {
            if let Ok(owner) = self.addresses.get(&notification.from) {
                if let Ok(subscription) = self.subscriptions.get(owner.service_id) {
                    if subscription.report_outgoing_tx
                        && self.asset_allowed(&subscription, &notification)
                    {
                        let mut outgoing = notification.clone();
                        outgoing.chain_id = chain_id.clone();
                        if !subscription.api_key.is_empty() {
                            outgoing.sign(&subscription.api_key);
                        }
                        self.sink.deliver(
                            subscription,
                            "transactionEvent",
                            NotificationBody::Transfer(outgoing),
                        );
                    }
                }
            }
        }

        if self.addresses.is_known(&notification.to) {
            if let Ok(owner) = self.addresses.get(&notification.to) {
                if let Ok(subscription) = self.subscriptions.get(owner.service_id) {
                    if subscription.report_incoming_tx
                        && self.asset_allowed(&subscription, &notification)
                    {
                        let mut incoming = notification.clone();
                        incoming.chain_id = chain_id;
                        incoming.user_id = owner.user_id;
                        incoming.invoice_id = owner.invoice_id;
                        if !subscription.api_key.is_empty() {
                            incoming.sign(&subscription.api_key);
                        }
                        self.sink.deliver(
                            subscription,
                            "transactionEvent",
                            NotificationBody::Transfer(incoming),
                        );
                    }
                }
                if notification.confirmed && notification.success {
                    self.gather_to_master(&owner, &notification).await;
                }
            }
        }
    }

    /// Token transfers pass when the symbol is opted in; native transfers
    /// when the subscription reports the main coin.
    fn asset_allowed(
        &self,
        subscription: &Subscription,
        notification: &TransferNotification,
    ) -> bool {
        if notification.native_coin {
            subscription.report_main_coin
        } else if notification.smart_contract {
            subscription.reports_token(&notification.token_symbol)
        } else {
            true
        }
    }
}
