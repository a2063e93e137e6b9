//! The watch loop.

use crate::config::WatchConfig;
use crate::state::LastSeenState;
use address_book::AddressBook;
use shared_bus::EventBus;
use shared_types::{ChainClient, ChainError, ChainInfo, ChainReader, TransferRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Consecutive failures of the same block fetch before escalation.
const MAX_BLOCK_RETRIES: u32 = 3;

/// Single-task poller that converts upstream chain state into ordered bus
/// events.
pub struct Watcher {
    client: Arc<dyn ChainClient>,
    addresses: Arc<AddressBook>,
    bus: EventBus,
    config: WatchConfig,
    state: LastSeenState,
    quit: watch::Receiver<bool>,
    failing_block: u64,
    failure_streak: u32,
}

impl Watcher {
    pub fn new(
        client: Arc<dyn ChainClient>,
        addresses: Arc<AddressBook>,
        bus: EventBus,
        config: WatchConfig,
        state: LastSeenState,
        quit: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            addresses,
            bus,
            config,
            state,
            quit,
            failing_block: 0,
            failure_streak: 0,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        if !self.config.run {
            info!("watcher disabled by configuration");
            return;
        }
        let last_seen = self.state.block_number();
        if last_seen == 0 {
            warn!("restarting from block 0");
        } else {
            info!(block = last_seen, "restarting from last seen block");
        }
        let interval = Duration::from_secs(self.config.poll_interval.max(1));
        loop {
            if let Err(e) = self.iteration().await {
                error!(error = %e, "watch iteration aborted");
            }
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = self.quit.changed() => {
                    info!("watcher stopping on shutdown signal");
                    return;
                }
            }
            if self.quit_requested() {
                info!("watcher stopping on shutdown signal");
                return;
            }
        }
    }

    fn quit_requested(&self) -> bool {
        *self.quit.borrow()
    }

    /// One poll iteration: mempool, height probe, catch-up, commit.
    async fn iteration(&mut self) -> Result<(), ChainError> {
        // Mempool phase: pending transfers are observed before any block
        // events of the same iteration.
        let pool = self.client.mempool_content().await?;
        if pool.is_empty() {
            if self.config.debug {
                debug!("mempool is empty");
            }
        } else {
            debug!(count = pool.len(), "processing mempool transactions");
            for transfer in pool {
                if !transfer.success {
                    debug!(tx = %transfer.tx_id, "unsuccessful pool transaction, skipping");
                    continue;
                }
                self.process_transfer(transfer).await;
            }
        }

        // Height probe.
        let current = self.client.block_number().await?;
        let last_seen = self.state.block_number();
        if current <= last_seen {
            if self.config.debug {
                debug!(block = current, "no new blocks");
            }
            return Ok(());
        }
        info!(chain = self.client.chain_name(), block = current, "current block");
        if current - last_seen > 1 {
            warn!(
                ahead = current - last_seen,
                "overtake or missed blocks, catching up"
            );
        }

        // Catch-up: ascending, one commit per fully processed block.
        for block_number in (last_seen + 1)..=current {
            if let Err(e) = self.process_block(block_number).await {
                self.note_block_failure(block_number);
                return Err(e);
            }
            self.failure_streak = 0;
            if let Err(e) = self.state.update(block_number) {
                error!(block = block_number, error = %e, "can not persist last seen state");
            }
            if self.quit_requested() {
                // Finish the in-progress block, then let the outer loop
                // observe the signal.
                return Ok(());
            }
        }
        Ok(())
    }

    async fn process_block(&mut self, block_number: u64) -> Result<(), ChainError> {
        if self.config.debug {
            debug!(block = block_number, "processing block");
        }
        let block = self.client.block_by_number(block_number, true).await?;
        for transfer in block.transactions {
            self.process_transfer(transfer).await;
        }
        // The block event follows all of its transaction events; the
        // subscription engine uses it as the confirmation-advance tick.
        if self
            .bus
            .publish_block(block_number, block.id, block.timestamp)
            .await
            .is_err()
        {
            debug!("event bus closed, dropping block event");
        }
        Ok(())
    }

    /// Emit a transaction event when either endpoint is known. One event
    /// per transaction even when both are.
    async fn process_transfer(&self, transfer: TransferRecord) {
        let from_known = self.addresses.is_known(&transfer.from);
        let to_known = self.addresses.is_known(&transfer.to);
        if !from_known && !to_known {
            return;
        }
        if self.config.debug {
            debug!(
                tx = %transfer.tx_id,
                from = %transfer.from,
                to = %transfer.to,
                "address known, firing event"
            );
        }
        if self.bus.publish_transaction(transfer).await.is_err() {
            debug!("event bus closed, dropping transaction event");
        }
    }

    fn note_block_failure(&mut self, block_number: u64) {
        if self.failing_block == block_number {
            self.failure_streak += 1;
        } else {
            self.failing_block = block_number;
            self.failure_streak = 1;
        }
        if self.failure_streak >= MAX_BLOCK_RETRIES {
            error!(
                block = block_number,
                attempts = self.failure_streak,
                "block fetch keeps failing, service continues to retry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use address_book::{AddressBook, AddressBookConfig, CF_ADDRESSES};
    use async_trait::async_trait;
    use primitive_types::U256;
    use shared_bus::{BlockEvent, EventListener, TransactionEvent};
    use shared_crypto::EthAddressCodec;
    use shared_types::{
        AddressCodec, BlockSummary, ChainBalances, ChainInfo, ChainReader, ChainTransfers,
        TokenInfo,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use storage::{KvDb, MemoryBinStore};

    struct MockChain {
        head: AtomicU64,
        blocks: Mutex<HashMap<u64, BlockSummary>>,
        pool: Mutex<Vec<TransferRecord>>,
        fail_pool: std::sync::atomic::AtomicBool,
    }

    impl MockChain {
        fn new() -> Self {
            Self {
                head: AtomicU64::new(0),
                blocks: Mutex::new(HashMap::new()),
                pool: Mutex::new(Vec::new()),
                fail_pool: std::sync::atomic::AtomicBool::new(false),
            }
        }

        fn add_block(&self, summary: BlockSummary) {
            self.head.fetch_max(summary.number, Ordering::SeqCst);
            self.blocks.lock().unwrap().insert(summary.number, summary);
        }
    }

    impl ChainInfo for MockChain {
        fn chain_name(&self) -> &str {
            "Mocknet"
        }
        fn chain_id(&self) -> &str {
            "mocknet"
        }
        fn chain_symbol(&self) -> &str {
            "MOCK"
        }
        fn decimals(&self) -> u32 {
            18
        }
        fn min_confirmations(&self) -> u64 {
            3
        }
        fn tokens(&self) -> Vec<TokenInfo> {
            Vec::new()
        }
        fn token_protocols(&self) -> Vec<String> {
            Vec::new()
        }
        fn address_codec(&self) -> Arc<dyn AddressCodec> {
            Arc::new(EthAddressCodec)
        }
    }

    #[async_trait]
    impl ChainReader for MockChain {
        async fn block_number(&self) -> Result<u64, ChainError> {
            Ok(self.head.load(Ordering::SeqCst))
        }

        async fn block_by_number(&self, number: u64, _full: bool) -> Result<BlockSummary, ChainError> {
            self.blocks
                .lock()
                .unwrap()
                .get(&number)
                .cloned()
                .ok_or(ChainError::Transport("missing block".into()))
        }

        async fn mempool_content(&self) -> Result<Vec<TransferRecord>, ChainError> {
            if self.fail_pool.load(Ordering::SeqCst) {
                return Err(ChainError::Transport("pool down".into()));
            }
            Ok(self.pool.lock().unwrap().clone())
        }

        async fn transfer_by_hash(&self, _tx_id: &str) -> Result<TransferRecord, ChainError> {
            Err(ChainError::TransactionNotFound)
        }

        async fn transfer_by_position(&self, _b: u64, _i: u32) -> Result<TransferRecord, ChainError> {
            Err(ChainError::TransactionNotFound)
        }
    }

    #[async_trait]
    impl ChainBalances for MockChain {
        async fn balance_of(&self, _address: &str) -> Result<U256, ChainError> {
            Ok(U256::zero())
        }
        async fn token_balance_of(&self, _a: &str, _s: &str) -> Result<U256, ChainError> {
            Ok(U256::zero())
        }
    }

    #[async_trait]
    impl ChainTransfers for MockChain {
        async fn transfer_by_key(
            &self,
            _k: &[u8],
            _f: &str,
            _t: &str,
            _a: U256,
        ) -> Result<String, ChainError> {
            Err(ChainError::SignError)
        }
        async fn transfer_all_by_key(
            &self,
            _k: &[u8],
            _f: &str,
            _t: &str,
        ) -> Result<String, ChainError> {
            Err(ChainError::SignError)
        }
        async fn estimated_fee(&self, _f: &str, _t: &str, _a: U256) -> Result<U256, ChainError> {
            Ok(U256::zero())
        }
        async fn token_transfer_by_key(
            &self,
            _k: &[u8],
            _f: &str,
            _t: &str,
            _a: U256,
            _s: &str,
        ) -> Result<String, ChainError> {
            Err(ChainError::TokenTransfers)
        }
        async fn token_estimated_fee(
            &self,
            _f: &str,
            _t: &str,
            _a: U256,
            _s: &str,
        ) -> Result<U256, ChainError> {
            Err(ChainError::TokenTransfers)
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl EventListener for Recorder {
        fn on_block(&self, event: &BlockEvent) {
            self.seen.lock().unwrap().push(format!("block:{}", event.number));
        }
        fn on_transaction(&self, event: &TransactionEvent) {
            self.seen
                .lock()
                .unwrap()
                .push(format!("tx:{}", event.transfer.tx_id));
        }
    }

    fn transfer_to(address: &str, id: &str) -> TransferRecord {
        TransferRecord {
            tx_id: id.into(),
            transfer: true,
            success: true,
            native_coin: true,
            from: "0x9999999999999999999999999999999999999999".into(),
            to: address.into(),
            amount: U256::from(10u64),
            ..Default::default()
        }
    }

    fn test_book(dir: &tempfile::TempDir) -> Arc<AddressBook> {
        let db = KvDb::open(&dir.path().join("addr.db"), &[CF_ADDRESSES]).unwrap();
        let config = AddressBookConfig {
            enable_generate: false,
            ..Default::default()
        };
        Arc::new(AddressBook::open(db, Arc::new(EthAddressCodec), config).unwrap())
    }

    #[tokio::test]
    async fn catch_up_emits_ordered_events_and_commits_state() {
        let dir = tempfile::tempdir().unwrap();
        let book = test_book(&dir);
        let watched = "0x3535353535353535353535353535353535353535";
        book.insert_with(watched, |r| r.watch_only = true).unwrap();

        let chain = Arc::new(MockChain::new());
        for number in 1..=3u64 {
            chain.add_block(BlockSummary {
                id: format!("0xb{number}"),
                number,
                parent_hash: format!("0xb{}", number - 1),
                timestamp: 1_000 + number as i64,
                transactions: vec![transfer_to(watched, &format!("0xt{number}"))],
            });
        }

        let (bus, mut dispatcher) = shared_bus::EventBus::new();
        let recorder = Arc::new(Recorder::default());
        dispatcher.register(recorder.clone());
        let dispatch_handle = dispatcher.spawn();

        let state_store = Arc::new(MemoryBinStore::new());
        let state = LastSeenState::load(state_store.clone()).unwrap();
        let (quit_tx, quit_rx) = watch::channel(false);

        let mut watcher = Watcher::new(
            chain.clone(),
            book,
            bus,
            WatchConfig::default(),
            state,
            quit_rx,
        );
        watcher.iteration().await.unwrap();
        quit_tx.send(true).unwrap();
        drop(watcher);
        dispatch_handle.await.unwrap();

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                "tx:0xt1".to_string(),
                "block:1".into(),
                "tx:0xt2".into(),
                "block:2".into(),
                "tx:0xt3".into(),
                "block:3".into(),
            ]
        );

        // Last-seen state committed to the newest block.
        let state = LastSeenState::load(state_store).unwrap();
        assert_eq!(state.block_number(), 3);
    }

    #[tokio::test]
    async fn unrelated_transfers_emit_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let book = test_book(&dir);
        let chain = Arc::new(MockChain::new());
        chain.add_block(BlockSummary {
            id: "0xb1".into(),
            number: 1,
            parent_hash: "0xb0".into(),
            timestamp: 1,
            transactions: vec![transfer_to(
                "0x4444444444444444444444444444444444444444",
                "0xt1",
            )],
        });

        let (bus, mut dispatcher) = shared_bus::EventBus::new();
        let recorder = Arc::new(Recorder::default());
        dispatcher.register(recorder.clone());
        let dispatch_handle = dispatcher.spawn();

        let state = LastSeenState::load(Arc::new(MemoryBinStore::new())).unwrap();
        let (_quit_tx, quit_rx) = watch::channel(false);
        let mut watcher = Watcher::new(
            chain,
            book,
            bus,
            WatchConfig::default(),
            state,
            quit_rx,
        );
        watcher.iteration().await.unwrap();
        drop(watcher);
        dispatch_handle.await.unwrap();

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec!["block:1".to_string()]
        );
    }

    #[tokio::test]
    async fn mempool_failure_aborts_before_block_processing() {
        let dir = tempfile::tempdir().unwrap();
        let chain = Arc::new(MockChain::new());
        chain.add_block(BlockSummary {
            id: "0xb1".into(),
            number: 1,
            parent_hash: "0xb0".into(),
            timestamp: 1,
            transactions: Vec::new(),
        });
        chain.fail_pool.store(true, Ordering::SeqCst);

        let (bus, dispatcher) = shared_bus::EventBus::new();
        let _dispatch = dispatcher.spawn();
        let state_store = Arc::new(MemoryBinStore::new());
        let state = LastSeenState::load(state_store.clone()).unwrap();
        let (_quit_tx, quit_rx) = watch::channel(false);

        let mut watcher = Watcher::new(
            chain,
            test_book(&dir),
            bus,
            WatchConfig::default(),
            state,
            quit_rx,
        );
        assert!(watcher.iteration().await.is_err());
        // State never advanced: the failed iteration did not reach commit.
        drop(watcher);
        let state = LastSeenState::load(state_store).unwrap();
        assert_eq!(state.block_number(), 0);
    }
}
