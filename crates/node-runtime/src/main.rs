//! # EVM Backend Adapter Runtime
//!
//! Startup wires the components in dependency order: storage manager,
//! contract registry, chain client, address book, watcher, subscription
//! engine, transaction cache and the RPC endpoint. All configuration is
//! loaded once here and passed to each component by value; a process-wide
//! quit channel drives shutdown.

mod config;

use abi_registry::ContractRegistry;
use address_book::{AddressBook, AddressBookConfig, CF_ADDRESSES};
use anyhow::{anyhow, bail, Context, Result};
use chain_client::{ClientConfig, EvmClient, HttpTransport, RpcTransport};
use chain_watch::{LastSeenState, WatchConfig, Watcher};
use clap::Parser;
use config::GlobalConfig;
use rpc_endpoint::ApiState;
use shared_bus::EventBus;
use shared_types::ChainInfo;
use std::net::ToSocketAddrs;
use std::path::PathBuf;
use std::sync::Arc;
use storage::StorageManager;
use subscriptions::{
    EngineConfig, SubscriptionManager, SubscriptionStore, TxLedger, LEDGER_COLUMN_FAMILIES,
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tx_cache::{TxCacheConfig, TxCacheManager, CACHE_COLUMN_FAMILIES};

const APP_NAME: &str = "EVM Backend Adapter";

#[derive(Debug, Parser)]
#[command(name = "backend-adapter", about = "EVM backend connection adapter")]
struct Cli {
    /// Path to the global config file.
    #[arg(short, long, default_value = "config.hcl")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();
    if let Err(e) = run(cli).await {
        error!(error = %e, "initialization failed");
        std::process::exit(1);
    }
    info!("application stopped");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<()> {
    info!("{} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));
    let global = GlobalConfig::load(&cli.config)?;

    info!("node connection settings:");
    if global.node_use_ipc {
        info!("- node connection    : ipc socket");
        info!("- node ipc socket    : {}", global.node_ipc_socket);
    } else {
        info!("- node connection    : http-rpc");
        info!("- node url           : {}", global.node_http_url());
    }

    let storage = StorageManager::open(&global.data_path)
        .with_context(|| format!("can not open data directory {}", global.data_path))?;

    // Contract registry.
    let abi_storage = storage.module("abi")?;
    let registry = Arc::new(ContractRegistry::new(Arc::new(
        abi_storage.bin_file("known_contracts.json"),
    )));
    registry
        .init()
        .map_err(|e| anyhow!("can not load contract registry: {e}"))?;

    // Chain client over the configured transport.
    let transport: Arc<dyn RpcTransport> = if global.node_use_ipc {
        ipc_transport(&global)?
    } else {
        Arc::new(HttpTransport::new(
            global.node_http_url(),
            global.additional_headers.clone(),
        ))
    };
    let client_storage = storage.module("client")?;
    let client_config = ClientConfig::load(&client_storage.bin_file("config.json"))
        .map_err(|e| anyhow!("can not load client config: {e}"))?;
    let client = Arc::new(EvmClient::new(transport, registry, client_config));
    let chain: Arc<dyn shared_types::ChainClient> = client;

    info!("blockchain info:");
    info!("- chain name : {}", chain.chain_name());
    info!("- chain id   : {}", chain.chain_id());
    for token in chain.tokens() {
        info!("- token      : {} ({})", token.name, token.symbol);
    }

    // Address book.
    let address_storage = storage.module("address")?;
    let address_config = AddressBookConfig::load(&address_storage.bin_file("config.json"))
        .map_err(|e| anyhow!("can not load address book config: {e}"))?;
    let addresses = Arc::new(
        AddressBook::open(
            address_storage.kv_db("addresses.db", &[CF_ADDRESSES])?,
            chain.address_codec(),
            address_config,
        )
        .map_err(|e| anyhow!("can not init address book: {e}"))?,
    );

    // Event bus and its consumers.
    let (bus, mut dispatcher) = EventBus::new();
    let quit = watch::channel(false);
    let (quit_tx, quit_rx) = quit;

    let subs_storage = storage.module("subscriptions")?;
    let engine_config = EngineConfig::load(&subs_storage.bin_file("config.json"))
        .map_err(|e| anyhow!("can not load subscriptions config: {e}"))?;
    let subscription_store =
        SubscriptionStore::load(Arc::new(subs_storage.bin_file("subscribers.json")))
            .map_err(|e| anyhow!("can not load subscriptions: {e}"))?;
    let ledger = TxLedger::new(subs_storage.kv_db("transactions.db", LEDGER_COLUMN_FAMILIES)?);
    let (subscription_manager, _engine_loop) = SubscriptionManager::new(
        engine_config,
        subscription_store,
        ledger,
        addresses.clone(),
        chain.clone(),
    );

    let cache_storage = storage.module("txcache")?;
    let cache_config = TxCacheConfig::load(&cache_storage.bin_file("config.json"))
        .map_err(|e| anyhow!("can not load txcache config: {e}"))?;
    let (tx_cache, _cache_loop) = TxCacheManager::new(
        cache_config,
        cache_storage.kv_db("txcache.db", CACHE_COLUMN_FAMILIES)?,
    );

    dispatcher.register(subscription_manager.clone());
    dispatcher.register(tx_cache.clone());
    let _dispatcher_loop = dispatcher.spawn();

    // Watcher.
    let watchdog_storage = storage.module("watchdog")?;
    let watch_config = WatchConfig::load(&watchdog_storage.bin_file("config.json"))
        .map_err(|e| anyhow!("can not load watcher config: {e}"))?;
    let last_seen = LastSeenState::load(Arc::new(watchdog_storage.bin_file("state.json")))
        .map_err(|e| anyhow!("can not load watcher state: {e}"))?;
    let watcher = Watcher::new(
        chain.clone(),
        addresses.clone(),
        bus,
        watch_config,
        last_seen,
        quit_rx.clone(),
    );
    let watcher_handle = watcher.spawn();

    // RPC endpoint.
    let bind_addr = global
        .rpc_bind_addr()
        .to_socket_addrs()
        .with_context(|| format!("can not resolve rpc bind address {}", global.rpc_bind_addr()))?
        .next()
        .ok_or_else(|| anyhow!("can not resolve rpc bind address"))?;
    let state = ApiState {
        client: chain,
        addresses,
        subscriptions: subscription_manager,
        cache: tx_cache,
        debug: global.debug_mode,
    };
    let mut serve_task = tokio::spawn(rpc_endpoint::serve(bind_addr, state, quit_rx));

    info!("init complete");

    tokio::select! {
        _ = shutdown_signal() => {
            warn!("quit application by os signal");
        }
        result = &mut serve_task => {
            result.context("endpoint task panicked")??;
            bail!("rpc endpoint stopped unexpectedly");
        }
    }

    let _ = quit_tx.send(true);
    if let Ok(Err(e)) = serve_task.await {
        error!(error = %e, "endpoint shutdown error");
    }
    let _ = watcher_handle.await;
    Ok(())
}

#[cfg(unix)]
fn ipc_transport(global: &GlobalConfig) -> Result<Arc<dyn RpcTransport>> {
    Ok(Arc::new(chain_client::IpcTransport::new(
        &global.node_ipc_socket,
    )))
}

#[cfg(not(unix))]
fn ipc_transport(_global: &GlobalConfig) -> Result<Arc<dyn RpcTransport>> {
    bail!("ipc transport is only available on unix platforms")
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
