//! Sweep-to-master.
//!
//! When a confirmed, successful incoming transfer lands at an owned
//! address of a gather-enabled service, the full native balance net of the
//! estimated fee is forwarded to the first master address. The resulting
//! transaction is recorded with `ignore` set so the service is not
//! notified about its own sweep.

use crate::ledger::LedgerRecord;
use crate::manager::Engine;
use crate::notify::TransferNotification;
use address_book::AddressRecord;
use shared_types::{ChainError, ChainReader, ChainTransfers};
use tracing::{debug, error, warn};

impl Engine {
    pub(crate) async fn gather_to_master(
        &self,
        owner: &AddressRecord,
        notification: &TransferNotification,
    ) {
        let Ok(subscription) = self.subscriptions.get(owner.service_id) else {
            return;
        };
        if !subscription.gather_to_master {
            return;
        }
        let Some(master) = subscription.master_list.first() else {
            warn!(service = owner.service_id, "gather enabled without a master list");
            return;
        };
        if !notification.native_coin {
            // Token sweeps wait on the token-transfer flow.
            return;
        }
        let Some(private_key) = owner.private_key.as_deref() else {
            debug!(address = %owner.address, "watch-only address, can not gather");
            return;
        };

        warn!(
            service = owner.service_id,
            from = %owner.address,
            to = %master,
            "gathering native coin to master"
        );
        let tx_id = match self
            .client
            .transfer_all_by_key(private_key, &owner.address, master)
            .await
        {
            Ok(tx_id) => tx_id,
            Err(ChainError::NothingToTransfer) => {
                // Balance does not cover the fee; skip silently.
                debug!(address = %owner.address, "nothing to gather after fee");
                return;
            }
            Err(e) => {
                warn!(service = owner.service_id, error = %e, "can not gather to master");
                return;
            }
        };

        match self.client.transfer_by_hash(&tx_id).await {
            Ok(transfer) => {
                let mut record = LedgerRecord::new(transfer);
                record.ignore = true;
                let ledger = self.ledger.write().await;
                if let Err(e) = ledger.upsert(&record) {
                    error!(tx = %tx_id, error = %e, "can not save gather transaction");
                }
            }
            Err(e) => {
                error!(tx = %tx_id, error = %e, "can not load gather transaction info");
            }
        }
    }
}
