//! Shared fixtures for the cross-crate test suite: an in-process mock
//! chain client, a recording notification sink and a wired harness of
//! address book + subscription engine + transaction cache.

use address_book::{AddressBook, AddressBookConfig, AddressRecord, CF_ADDRESSES};
use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::U256;
use shared_crypto::EthAddressCodec;
use shared_types::{
    AddressCodec, BlockSummary, ChainBalances, ChainClient, ChainError, ChainInfo, ChainReader,
    ChainTransfers, TokenInfo, TransferRecord,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use storage::KvDb;
use subscriptions::{
    EngineConfig, NotificationBody, NotificationSink, ServiceId, Subscription,
    SubscriptionManager, SubscriptionStore, TxLedger, LEDGER_COLUMN_FAMILIES,
};
use tokio::task::JoinHandle;
use tx_cache::{TxCacheConfig, TxCacheManager, CACHE_COLUMN_FAMILIES};

/// A sweep submitted through the mock chain.
#[derive(Debug, Clone)]
pub struct SweptTransfer {
    pub tx_id: String,
    pub from: String,
    pub to: String,
    pub amount: U256,
}

/// In-process chain client covering everything the engine exercises.
pub struct MockChain {
    head: AtomicU64,
    min_confirmations: u64,
    blocks: Mutex<HashMap<u64, BlockSummary>>,
    pool: Mutex<Vec<TransferRecord>>,
    transactions: Mutex<HashMap<String, TransferRecord>>,
    balances: Mutex<HashMap<String, U256>>,
    fee: Mutex<U256>,
    swept: Mutex<Vec<SweptTransfer>>,
    sweep_counter: AtomicU64,
}

impl MockChain {
    pub fn new(min_confirmations: u64) -> Self {
        Self {
            head: AtomicU64::new(0),
            min_confirmations,
            blocks: Mutex::new(HashMap::new()),
            pool: Mutex::new(Vec::new()),
            transactions: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            fee: Mutex::new(U256::zero()),
            swept: Mutex::new(Vec::new()),
            sweep_counter: AtomicU64::new(0),
        }
    }

    pub fn add_block(&self, summary: BlockSummary) {
        self.head.fetch_max(summary.number, Ordering::SeqCst);
        let mut transactions = self.transactions.lock();
        for transfer in &summary.transactions {
            transactions.insert(transfer.tx_id.clone(), transfer.clone());
        }
        drop(transactions);
        self.blocks.lock().insert(summary.number, summary);
    }

    pub fn set_pool(&self, transfers: Vec<TransferRecord>) {
        *self.pool.lock() = transfers;
    }

    pub fn set_balance(&self, address: &str, balance: U256) {
        self.balances.lock().insert(address.to_lowercase(), balance);
    }

    pub fn set_fee(&self, fee: U256) {
        *self.fee.lock() = fee;
    }

    pub fn swept(&self) -> Vec<SweptTransfer> {
        self.swept.lock().clone()
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
        self.min_confirmations
    }
    fn tokens(&self) -> Vec<TokenInfo> {
        vec![TokenInfo {
            contract_address: "0xdAC17F958D2ee523a2206206994597C13D831ec7".into(),
            name: "TetherToken".into(),
            symbol: "USDT".into(),
            decimals: 6,
            protocol: "ERC20".into(),
        }]
    }
    fn token_protocols(&self) -> Vec<String> {
        vec!["ERC20".into()]
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
            .get(&number)
            .cloned()
            .ok_or_else(|| ChainError::Transport(format!("missing block {number}")))
    }

    async fn mempool_content(&self) -> Result<Vec<TransferRecord>, ChainError> {
        Ok(self.pool.lock().clone())
    }

    async fn transfer_by_hash(&self, tx_id: &str) -> Result<TransferRecord, ChainError> {
        let mut record = self
            .transactions
            .lock()
            .get(tx_id)
            .cloned()
            .ok_or(ChainError::TransactionNotFound)?;
        let head = self.head.load(Ordering::SeqCst);
        if record.block_number == 0 {
            record.in_pool = true;
        } else {
            record.confirmations = head.saturating_sub(record.block_number) + 1;
            record.confirmed = record.confirmations >= self.min_confirmations;
        }
        Ok(record)
    }

    async fn transfer_by_position(
        &self,
        _block_number: u64,
        _index: u32,
    ) -> Result<TransferRecord, ChainError> {
        Err(ChainError::TransactionNotFound)
    }
}

#[async_trait]
impl ChainBalances for MockChain {
    async fn balance_of(&self, address: &str) -> Result<U256, ChainError> {
        Ok(self
            .balances
            .lock()
            .get(&address.to_lowercase())
            .copied()
            .unwrap_or_default())
    }

    async fn token_balance_of(&self, _address: &str, _symbol: &str) -> Result<U256, ChainError> {
        Ok(U256::zero())
    }
}

#[async_trait]
impl ChainTransfers for MockChain {
    async fn transfer_by_key(
        &self,
        _private_key: &[u8],
        from: &str,
        to: &str,
        amount: U256,
    ) -> Result<String, ChainError> {
        let balance = self.balance_of(from).await?;
        let fee = *self.fee.lock();
        if amount + fee > balance {
            return Err(ChainError::InsufficientFunds);
        }
        let tx_id = format!("0xsend{}", self.sweep_counter.fetch_add(1, Ordering::SeqCst));
        let head = self.head.load(Ordering::SeqCst);
        self.transactions.lock().insert(
            tx_id.clone(),
            TransferRecord {
                tx_id: tx_id.clone(),
                block_number: head,
                transfer: true,
                success: true,
                native_coin: true,
                symbol: self.chain_symbol().into(),
                from: from.to_string(),
                to: to.to_string(),
                amount,
                fee,
                decimals: 18,
                ..Default::default()
            },
        );
        Ok(tx_id)
    }

    async fn transfer_all_by_key(
        &self,
        _private_key: &[u8],
        from: &str,
        to: &str,
    ) -> Result<String, ChainError> {
        let balance = self.balance_of(from).await?;
        let fee = *self.fee.lock();
        if fee >= balance {
            return Err(ChainError::NothingToTransfer);
        }
        let amount = balance - fee;
        let tx_id = format!("0xsweep{}", self.sweep_counter.fetch_add(1, Ordering::SeqCst));
        let head = self.head.load(Ordering::SeqCst);
        self.transactions.lock().insert(
            tx_id.clone(),
            TransferRecord {
                tx_id: tx_id.clone(),
                block_number: head,
                transfer: true,
                success: true,
                native_coin: true,
                symbol: self.chain_symbol().into(),
                from: from.to_string(),
                to: to.to_string(),
                amount,
                fee,
                decimals: 18,
                ..Default::default()
            },
        );
        self.balances.lock().insert(from.to_lowercase(), U256::zero());
        self.swept.lock().push(SweptTransfer {
            tx_id: tx_id.clone(),
            from: from.to_string(),
            to: to.to_string(),
            amount,
        });
        Ok(tx_id)
    }

    async fn estimated_fee(
        &self,
        _from: &str,
        _to: &str,
        _amount: U256,
    ) -> Result<U256, ChainError> {
        Ok(*self.fee.lock())
    }

    async fn token_transfer_by_key(
        &self,
        _private_key: &[u8],
        _from: &str,
        _to: &str,
        _amount: U256,
        _symbol: &str,
    ) -> Result<String, ChainError> {
        Err(ChainError::TokenTransfers)
    }

    async fn token_estimated_fee(
        &self,
        _from: &str,
        _to: &str,
        _amount: U256,
        _symbol: &str,
    ) -> Result<U256, ChainError> {
        Err(ChainError::TokenTransfers)
    }
}

/// One captured delivery.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub service_id: ServiceId,
    pub method: &'static str,
    pub body: NotificationBody,
}

/// Sink that records instead of posting webhooks.
#[derive(Default)]
pub struct RecordingSink {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingSink {
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    pub fn transfer_deliveries(&self) -> Vec<subscriptions::TransferNotification> {
        self.deliveries
            .lock()
            .iter()
            .filter_map(|d| match &d.body {
                NotificationBody::Transfer(n) => Some(n.clone()),
                NotificationBody::Block(_) => None,
            })
            .collect()
    }

    pub fn block_numbers(&self) -> Vec<u64> {
        self.deliveries
            .lock()
            .iter()
            .filter_map(|d| match &d.body {
                NotificationBody::Block(b) => Some(b.block_number),
                NotificationBody::Transfer(_) => None,
            })
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, subscription: Subscription, method: &'static str, body: NotificationBody) {
        self.deliveries.lock().push(Delivery {
            service_id: subscription.service_id,
            method,
            body,
        });
    }
}

/// A wired engine: mock chain, address book, subscription store, ledger
/// and recording sink, all on temporary storage.
pub struct Harness {
    _dir: tempfile::TempDir,
    pub chain: Arc<MockChain>,
    pub addresses: Arc<AddressBook>,
    pub manager: Arc<SubscriptionManager>,
    pub sink: Arc<RecordingSink>,
    pub engine_loop: JoinHandle<()>,
}

impl Harness {
    pub fn new(min_confirmations: u64) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let chain = Arc::new(MockChain::new(min_confirmations));
        let codec: Arc<dyn AddressCodec> = Arc::new(EthAddressCodec);

        let address_db =
            KvDb::open(&dir.path().join("addresses.db"), &[CF_ADDRESSES]).expect("address db");
        let addresses = Arc::new(
            AddressBook::open(
                address_db,
                codec,
                AddressBookConfig {
                    enable_generate: false,
                    ..Default::default()
                },
            )
            .expect("address book"),
        );

        let subscription_store =
            SubscriptionStore::load(Arc::new(storage::MemoryBinStore::new())).expect("store");
        let ledger = TxLedger::new(
            KvDb::open(&dir.path().join("transactions.db"), LEDGER_COLUMN_FAMILIES)
                .expect("ledger db"),
        );
        let sink = Arc::new(RecordingSink::default());
        let chain_client: Arc<dyn ChainClient> = chain.clone();
        let (manager, engine_loop) = SubscriptionManager::with_sink(
            EngineConfig::default(),
            subscription_store,
            ledger,
            addresses.clone(),
            chain_client,
            sink.clone(),
        );

        Self {
            _dir: dir,
            chain,
            addresses,
            manager,
            sink,
            engine_loop,
        }
    }

    /// Register a service subscription.
    pub fn add_service(&self, subscription: Subscription) {
        self.manager
            .subscriptions()
            .insert(subscription)
            .expect("insert subscription");
    }

    /// Watch an address for a service, returning its record.
    pub fn watch_address(
        &self,
        address: &str,
        service_id: ServiceId,
        user_id: i64,
        invoice_id: i64,
    ) -> AddressRecord {
        self.addresses
            .insert_with(address, |record| {
                record.watch_only = true;
                record.subscribed = true;
                record.service_id = service_id;
                record.user_id = user_id;
                record.invoice_id = invoice_id;
            })
            .expect("insert address")
    }

    /// Watch a keyed (spendable) address for a service.
    pub fn watch_keyed_address(
        &self,
        private_key: [u8; 32],
        service_id: ServiceId,
    ) -> AddressRecord {
        let codec = EthAddressCodec;
        let (address, _) = codec.address_from_key(&private_key).expect("derive");
        self.addresses
            .insert_with(&address, |record| {
                record.private_key = Some(private_key.to_vec());
                record.subscribed = true;
                record.service_id = service_id;
            })
            .expect("insert keyed address")
    }
}

/// A wired transaction cache on temporary storage.
pub fn cache_fixture() -> (tempfile::TempDir, Arc<TxCacheManager>, JoinHandle<()>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = KvDb::open(&dir.path().join("txcache.db"), CACHE_COLUMN_FAMILIES).expect("cache db");
    let (cache, handle) = TxCacheManager::new(
        TxCacheConfig {
            confirmations: 3,
            register_confirmations: 50,
            debug: false,
        },
        db,
    );
    (dir, cache, handle)
}

/// A native transfer between two fixed addresses.
pub fn native_transfer(tx_id: &str, to: &str, amount: u64, block: u64, in_pool: bool) -> TransferRecord {
    TransferRecord {
        tx_id: tx_id.into(),
        timestamp: 1_700_000_000,
        block_number: block,
        success: true,
        transfer: true,
        native_coin: true,
        symbol: "MOCK".into(),
        from: "0x9999999999999999999999999999999999999999".into(),
        to: to.into(),
        amount: U256::from(amount),
        fee: U256::from(21u64),
        decimals: 18,
        in_pool,
        ..Default::default()
    }
}

/// Shorthand for a service that reports everything native.
pub fn reporting_service(service_id: ServiceId) -> Subscription {
    Subscription {
        service_id,
        event_url: "http://svc.example/hook".into(),
        report_new_block: false,
        report_incoming_tx: true,
        report_outgoing_tx: true,
        report_main_coin: true,
        ..Default::default()
    }
}
