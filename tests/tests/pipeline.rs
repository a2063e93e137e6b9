//! End-to-end pipeline: watcher → bus → engine + cache, over a mock
//! chain with a multi-block gap.

use adapter_tests::{cache_fixture, native_transfer, reporting_service, Harness};
use chain_watch::{LastSeenState, WatchConfig, Watcher};
use shared_bus::EventBus;
use shared_types::{BlockSummary, ChainClient, TransferCache};
use std::sync::Arc;
use std::time::Duration;
use storage::MemoryBinStore;
use tokio::sync::watch;

const WATCHED: &str = "0x3535353535353535353535353535353535353535";

#[tokio::test]
async fn gap_catch_up_flows_through_both_consumers() {
    let h = Harness::new(3);
    let mut service = reporting_service(5);
    service.report_new_block = true;
    h.add_service(service);
    h.watch_address(WATCHED, 5, 0, 0);

    // Four blocks appear between polls; each carries one relevant
    // transfer and one unrelated transfer.
    for number in 1..=4u64 {
        h.chain.add_block(BlockSummary {
            id: format!("0xb{number}"),
            number,
            parent_hash: format!("0xb{}", number - 1),
            timestamp: 1_000 + number as i64,
            transactions: vec![
                native_transfer(&format!("0xt{number}"), WATCHED, 10, number, false),
                native_transfer(
                    &format!("0xother{number}"),
                    "0x4444444444444444444444444444444444444444",
                    10,
                    number,
                    false,
                ),
            ],
        });
    }

    let (bus, mut dispatcher) = EventBus::new();
    dispatcher.register(h.manager.clone());
    let (_cache_dir, cache, _cache_loop) = cache_fixture();
    dispatcher.register(cache.clone());
    let _dispatch = dispatcher.spawn();

    let chain: Arc<dyn ChainClient> = h.chain.clone();
    let state = LastSeenState::load(Arc::new(MemoryBinStore::new())).unwrap();
    let (quit_tx, quit_rx) = watch::channel(false);
    let watcher = Watcher::new(
        chain,
        h.addresses.clone(),
        bus,
        WatchConfig {
            run: true,
            poll_interval: 1,
            debug: false,
        },
        state,
        quit_rx,
    );
    let watcher_handle = watcher.spawn();

    // Wait until the newest transfer reaches the cache.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        cache.drain().await;
        if cache.transfer_info("0xt4").await.is_ok() {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "pipeline did not deliver block 4 in time"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    quit_tx.send(true).unwrap();
    let _ = watcher_handle.await;
    h.manager.drain().await;
    cache.drain().await;

    // Block events arrived strictly ascending.
    let block_numbers = h.sink.block_numbers();
    assert_eq!(block_numbers, vec![1, 2, 3, 4]);

    // Every watched transfer is in the ledger, ascending by block.
    let rows = h.manager.transfers_for_address(WATCHED).await.unwrap();
    let blocks: Vec<u64> = rows.iter().map(|r| r.transfer.block_number).collect();
    assert_eq!(blocks, vec![1, 2, 3, 4]);

    // The engine confirmed everything deep enough: with threshold 3,
    // blocks 1 and 2 are settled once block 4 ticks.
    assert!(rows[0].transfer.confirmed);
    assert!(rows[1].transfer.confirmed);
    assert!(!rows[3].transfer.confirmed);

    // The cache mirrors the watched transfers and advanced their counts.
    let cached = cache.transfer_info("0xt1").await.unwrap();
    assert_eq!(cached.confirmations, 4);
    assert!(cached.confirmed);
    // Unrelated transfers never produced events.
    assert!(cache.transfer_info("0xother1").await.is_err());
}
