//! Confirmation engine behavior: mempool promotion, the confirmation
//! advance and replay idempotence.

use adapter_tests::{native_transfer, reporting_service, Harness};
use shared_bus::{BlockEvent, EventListener, TransactionEvent};

const WATCHED: &str = "0x3535353535353535353535353535353535353535";

fn block(number: u64) -> BlockEvent {
    BlockEvent {
        number,
        id: format!("0xb{number}"),
        timestamp: 1_700_000_000 + number as i64,
    }
}

#[tokio::test]
async fn mempool_to_block_promotion() {
    let h = Harness::new(3);
    h.add_service(reporting_service(5));
    h.watch_address(WATCHED, 5, 77, 88);

    // Seen in the pool first.
    let pending = native_transfer("0x01", WATCHED, 100, 0, true);
    h.manager.on_transaction(&TransactionEvent {
        transfer: pending.clone(),
    });
    h.manager.drain().await;

    let transfers = h.sink.transfer_deliveries();
    assert_eq!(transfers.len(), 1, "exactly one pending notification");
    assert!(transfers[0].in_pool);
    assert_eq!(transfers[0].confirmations, 0);
    assert_eq!(transfers[0].user_id, 77);
    assert_eq!(transfers[0].invoice_id, 88);

    // Then included in block 100.
    let mut included = pending;
    included.in_pool = false;
    included.block_number = 100;
    h.manager.on_transaction(&TransactionEvent { transfer: included });
    h.manager.drain().await;

    let transfers = h.sink.transfer_deliveries();
    assert_eq!(transfers.len(), 2, "exactly one additional notification");
    assert!(!transfers[1].in_pool);
    assert_eq!(transfers[1].confirmations, 1);

    let row = h.manager.transfer_by_id("0x01").await.unwrap();
    assert_eq!(row.transfer.block_number, 100);
    assert!(!row.transfer.in_pool);
    assert_eq!(row.transfer.confirmations, 1);
    assert!(!row.transfer.confirmed);
}

#[tokio::test]
async fn replaying_an_event_is_idempotent() {
    let h = Harness::new(3);
    h.add_service(reporting_service(5));
    h.watch_address(WATCHED, 5, 0, 0);

    let transfer = native_transfer("0x02", WATCHED, 50, 10, false);
    for _ in 0..2 {
        h.manager.on_transaction(&TransactionEvent {
            transfer: transfer.clone(),
        });
    }
    h.manager.drain().await;

    // One ledger insert, at most one notification per subscriber.
    assert_eq!(h.sink.transfer_deliveries().len(), 1);
    let rows = h.manager.transfers_for_address(WATCHED).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn confirmation_advance_to_threshold() {
    let h = Harness::new(3);
    h.add_service(reporting_service(5));
    h.watch_address(WATCHED, 5, 0, 0);

    h.manager.on_transaction(&TransactionEvent {
        transfer: native_transfer("0x03", WATCHED, 10, 100, false),
    });
    h.manager.drain().await;

    // Height 100: only the insert notification, one confirmation.
    h.manager.on_block(&block(100));
    h.manager.drain().await;
    let transfers = h.sink.transfer_deliveries();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].confirmations, 1);
    let row = h.manager.transfer_by_id("0x03").await.unwrap();
    assert!(!row.transfer.confirmed);

    // Height 101: a progress tick, still unconfirmed.
    h.manager.on_block(&block(101));
    h.manager.drain().await;
    let transfers = h.sink.transfer_deliveries();
    assert_eq!(transfers.len(), 2);
    assert_eq!(transfers[1].confirmations, 2);
    assert!(!transfers[1].confirmed);
    let row = h.manager.transfer_by_id("0x03").await.unwrap();
    assert!(!row.transfer.confirmed);

    // Height 102: crosses the threshold.
    h.manager.on_block(&block(102));
    h.manager.drain().await;
    let transfers = h.sink.transfer_deliveries();
    assert_eq!(transfers.len(), 3);
    assert_eq!(transfers[2].confirmations, 3);
    assert!(transfers[2].confirmed);
    let row = h.manager.transfer_by_id("0x03").await.unwrap();
    assert!(row.transfer.confirmed);
    assert_eq!(row.transfer.confirmations, 3);

    // Height 103: settled, no further notifications or state changes.
    h.manager.on_block(&block(103));
    h.manager.drain().await;
    assert_eq!(h.sink.transfer_deliveries().len(), 3);
    let row = h.manager.transfer_by_id("0x03").await.unwrap();
    assert_eq!(row.transfer.confirmations, 3);
}

#[tokio::test]
async fn block_notifications_fan_out_to_subscribed_services() {
    let h = Harness::new(3);
    let mut with_blocks = reporting_service(5);
    with_blocks.report_new_block = true;
    h.add_service(with_blocks);
    let mut without_blocks = reporting_service(6);
    without_blocks.event_url = "http://other.example/hook".into();
    h.add_service(without_blocks);

    h.manager.on_block(&block(42));
    h.manager.drain().await;

    let deliveries = h.sink.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].service_id, 5);
    assert_eq!(deliveries[0].method, "blockEvent");
    assert_eq!(h.sink.block_numbers(), vec![42]);
}

#[tokio::test]
async fn direction_and_asset_filters_apply() {
    let h = Harness::new(3);
    // Service 5 only wants incoming native transfers.
    let mut incoming_only = reporting_service(5);
    incoming_only.report_outgoing_tx = false;
    h.add_service(incoming_only);
    h.watch_address(WATCHED, 5, 0, 0);

    // Incoming native: delivered.
    h.manager.on_transaction(&TransactionEvent {
        transfer: native_transfer("0x10", WATCHED, 5, 10, false),
    });
    // Outgoing native: filtered by direction.
    let mut outgoing = native_transfer("0x11", "0x4444444444444444444444444444444444444444", 5, 11, false);
    outgoing.from = WATCHED.into();
    h.manager.on_transaction(&TransactionEvent { transfer: outgoing });
    // Incoming token transfer with no token opt-in: filtered by asset.
    let mut token = native_transfer("0x12", WATCHED, 5, 12, false);
    token.native_coin = false;
    token.smart_contract = true;
    token.symbol = String::new();
    token.token_symbol = "USDT".into();
    h.manager.on_transaction(&TransactionEvent { transfer: token });
    h.manager.drain().await;

    let transfers = h.sink.transfer_deliveries();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].tx_id, "0x10");
}
