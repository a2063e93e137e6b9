//! Sweep-to-master behavior.

use adapter_tests::{native_transfer, reporting_service, Harness};
use primitive_types::U256;
use shared_bus::{EventListener, TransactionEvent};
use subscriptions::SubscriptionError;

fn sweeping_service(service_id: u64, master: &str) -> subscriptions::Subscription {
    let mut subscription = reporting_service(service_id);
    subscription.gather_to_master = true;
    subscription.master_list = vec![master.to_string()];
    subscription
}

const MASTER: &str = "0x1212121212121212121212121212121212121212";

#[tokio::test]
async fn underfunded_sweep_is_skipped_silently() {
    let h = Harness::new(3);
    h.add_service(sweeping_service(9, MASTER));
    let owned = h.watch_keyed_address([0x42u8; 32], 9);

    // Balance 100, estimated fee 120: nothing to forward.
    h.chain.set_balance(&owned.address, U256::from(100u64));
    h.chain.set_fee(U256::from(120u64));

    let mut incoming = native_transfer("0x20", &owned.address, 100, 50, false);
    incoming.confirmed = true;
    incoming.confirmations = 3;
    h.manager.on_transaction(&TransactionEvent { transfer: incoming });
    h.manager.drain().await;

    // No outbound transfer was constructed and no ignore row inserted.
    assert!(h.chain.swept().is_empty());
    assert!(matches!(
        h.manager.transfer_by_id("0xsweep0").await,
        Err(SubscriptionError::UnknownTransaction)
    ));
    // The incoming notification itself still went out.
    assert_eq!(h.sink.transfer_deliveries().len(), 1);
}

#[tokio::test]
async fn funded_sweep_forwards_balance_and_suppresses_its_notification() {
    let h = Harness::new(3);
    h.add_service(sweeping_service(9, MASTER));
    let owned = h.watch_keyed_address([0x42u8; 32], 9);

    h.chain.set_balance(&owned.address, U256::from(1_000u64));
    h.chain.set_fee(U256::from(120u64));

    let mut incoming = native_transfer("0x21", &owned.address, 1_000, 60, false);
    incoming.confirmed = true;
    incoming.confirmations = 3;
    h.manager.on_transaction(&TransactionEvent { transfer: incoming });
    h.manager.drain().await;

    let swept = h.chain.swept();
    assert_eq!(swept.len(), 1);
    assert_eq!(swept[0].to, MASTER);
    assert_eq!(swept[0].amount, U256::from(880u64));

    // The sweep landed in the ledger flagged ignore.
    let row = h.manager.transfer_by_id(&swept[0].tx_id).await.unwrap();
    assert!(row.ignore);

    // Only the original incoming transfer was notified.
    let transfers = h.sink.transfer_deliveries();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].tx_id, "0x21");
}

#[tokio::test]
async fn unconfirmed_incoming_transfer_does_not_sweep() {
    let h = Harness::new(3);
    h.add_service(sweeping_service(9, MASTER));
    let owned = h.watch_keyed_address([0x42u8; 32], 9);
    h.chain.set_balance(&owned.address, U256::from(1_000u64));
    h.chain.set_fee(U256::from(1u64));

    // Fresh in-block observation: one confirmation, not settled yet.
    h.manager.on_transaction(&TransactionEvent {
        transfer: native_transfer("0x22", &owned.address, 1_000, 70, false),
    });
    h.manager.drain().await;

    assert!(h.chain.swept().is_empty());
}

#[tokio::test]
async fn watch_only_addresses_never_sweep() {
    let h = Harness::new(3);
    h.add_service(sweeping_service(9, MASTER));
    let watched = "0x3535353535353535353535353535353535353535";
    h.watch_address(watched, 9, 0, 0);
    h.chain.set_balance(watched, U256::from(1_000u64));
    h.chain.set_fee(U256::from(1u64));

    let mut incoming = native_transfer("0x23", watched, 1_000, 80, false);
    incoming.confirmed = true;
    incoming.confirmations = 3;
    h.manager.on_transaction(&TransactionEvent { transfer: incoming });
    h.manager.drain().await;

    assert!(h.chain.swept().is_empty());
}
