//! The EVM chain client.

use crate::config::ClientConfig;
use crate::transport::RpcTransport;
use abi_registry::{ContractRegistry, Erc20Abi};
use shared_crypto::EthAddressCodec;
use shared_types::{AddressCodec, ChainInfo, TokenInfo};
use std::sync::Arc;

/// Chain client over one upstream node.
///
/// Shared as `Arc<EvmClient>`; every method takes `&self` and the
/// transport is internally synchronized, so the handle is freely cloned
/// into the watcher, the subscription engine and the RPC endpoint.
pub struct EvmClient {
    pub(crate) transport: Arc<dyn RpcTransport>,
    pub(crate) registry: Arc<ContractRegistry>,
    pub(crate) erc20: Erc20Abi,
    pub(crate) codec: Arc<dyn AddressCodec>,
    pub(crate) config: ClientConfig,
}

impl EvmClient {
    pub fn new(
        transport: Arc<dyn RpcTransport>,
        registry: Arc<ContractRegistry>,
        config: ClientConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            erc20: Erc20Abi::new(),
            codec: Arc::new(EthAddressCodec),
            config,
        }
    }

    pub(crate) fn token_by_symbol(&self, symbol: &str) -> Option<&TokenInfo> {
        self.config
            .tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    pub(crate) fn token_by_address(&self, contract_address: &str) -> Option<&TokenInfo> {
        self.config
            .tokens
            .iter()
            .find(|t| t.contract_address.eq_ignore_ascii_case(contract_address))
    }

    /// Re-encode an address into canonical checksum form; anything that
    /// fails to decode passes through unchanged so raw node output never
    /// aborts classification.
    pub(crate) fn normalize_address(&self, address: &str) -> String {
        self.codec
            .normalize(address)
            .unwrap_or_else(|_| address.to_string())
    }
}

impl ChainInfo for EvmClient {
    fn chain_name(&self) -> &str {
        &self.config.chain_name
    }

    fn chain_id(&self) -> &str {
        &self.config.chain_id
    }

    fn chain_symbol(&self) -> &str {
        &self.config.chain_symbol
    }

    fn decimals(&self) -> u32 {
        self.config.decimals
    }

    fn min_confirmations(&self) -> u64 {
        self.config.confirmations
    }

    fn tokens(&self) -> Vec<TokenInfo> {
        self.config.tokens.clone()
    }

    fn token_protocols(&self) -> Vec<String> {
        let mut protocols: Vec<String> = Vec::new();
        for token in &self.config.tokens {
            if !token.protocol.is_empty() && !protocols.contains(&token.protocol) {
                protocols.push(token.protocol.clone());
            }
        }
        protocols
    }

    fn address_codec(&self) -> Arc<dyn AddressCodec> {
        self.codec.clone()
    }
}
