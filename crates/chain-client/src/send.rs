//! Balance queries, fee estimation and signed transfer submission.

use crate::client::EvmClient;
use async_trait::async_trait;
use primitive_types::U256;
use shared_crypto::{KeyPair, LegacyTransaction};
use shared_types::hexnum::bytes_to_hex;
use shared_types::{ChainBalances, ChainError, ChainTransfers};
use tracing::{debug, warn};

impl EvmClient {
    /// Estimated fee with the gas price and limit that produced it.
    pub(crate) async fn estimated_fee_parts(
        &self,
        from: &str,
        to: &str,
        data: &str,
        amount: U256,
    ) -> Result<(U256, U256, u64), ChainError> {
        let gas = self.estimate_gas(from, to, data, amount).await?;
        let gas_price = self.get_gas_price().await?;
        Ok((gas_price * U256::from(gas), gas_price, gas))
    }

    /// Sign and submit without balance checks; callers validate first.
    async fn send_by_key_unchecked(
        &self,
        private_key: &[u8],
        from: &str,
        to: &str,
        amount: U256,
        gas_price: U256,
        gas_limit: u64,
    ) -> Result<String, ChainError> {
        let to_bytes = self
            .codec
            .decode(to)
            .map_err(|_| ChainError::InvalidAddress(to.to_string()))?;
        let mut recipient = [0u8; 20];
        recipient.copy_from_slice(&to_bytes);

        let key = KeyPair::from_bytes(private_key).map_err(|_| ChainError::SignError)?;
        let nonce = self.get_pending_nonce(from).await?;
        let chain_id = self.get_chain_id().await?;

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to: Some(recipient),
            value: amount,
            data: Vec::new(),
            chain_id,
        };
        let signed = tx.sign(&key).map_err(|_| ChainError::SignError)?;
        debug!(
            tx = %bytes_to_hex(&signed.hash()),
            nonce,
            chain = chain_id,
            "submitting signed transfer"
        );
        self.send_raw_transaction(signed.raw()).await
    }

    /// Resolve and verify the sender of a key against a claimed address.
    fn sender_for_key(&self, private_key: &[u8], from: &str) -> Result<String, ChainError> {
        let (derived, _) = self
            .codec
            .address_from_key(private_key)
            .map_err(|_| ChainError::SignError)?;
        if !from.is_empty() && !derived.eq_ignore_ascii_case(from) {
            return Err(ChainError::AddressKeyMismatch);
        }
        Ok(derived)
    }
}

#[async_trait]
impl ChainBalances for EvmClient {
    async fn balance_of(&self, address: &str) -> Result<U256, ChainError> {
        self.get_balance(address).await
    }

    async fn token_balance_of(&self, address: &str, symbol: &str) -> Result<U256, ChainError> {
        let token = self
            .token_by_symbol(symbol)
            .or_else(|| self.token_by_address(symbol))
            .ok_or(ChainError::UnknownToken)?;
        let owner_bytes = self
            .codec
            .decode(address)
            .map_err(|_| ChainError::InvalidAddress(address.to_string()))?;
        let mut owner = [0u8; 20];
        owner.copy_from_slice(&owner_bytes);
        let call_data = self
            .erc20
            .encode_balance_of(owner)
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;
        let result = self
            .eth_call(&token.contract_address, &bytes_to_hex(&call_data))
            .await?;
        let payload = shared_types::hexnum::parse_hex_bytes(&result)
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;
        Ok(self.erc20.decode_amount(&payload))
    }
}

#[async_trait]
impl ChainTransfers for EvmClient {
    async fn transfer_by_key(
        &self,
        private_key: &[u8],
        from: &str,
        to: &str,
        amount: U256,
    ) -> Result<String, ChainError> {
        let from = self.sender_for_key(private_key, from)?;
        if !self.codec.is_valid(to) {
            return Err(ChainError::InvalidAddress(to.to_string()));
        }
        let balance = self.get_balance(&from).await?;
        let (fee, gas_price, gas) = self.estimated_fee_parts(&from, to, "", balance).await?;
        if amount + fee > balance {
            warn!(%from, "transfer rejected, amount plus fee exceeds balance");
            return Err(ChainError::InsufficientFunds);
        }
        self.send_by_key_unchecked(private_key, &from, to, amount, gas_price, gas)
            .await
    }

    async fn transfer_all_by_key(
        &self,
        private_key: &[u8],
        from: &str,
        to: &str,
    ) -> Result<String, ChainError> {
        let from = self.sender_for_key(private_key, from)?;
        if !self.codec.is_valid(to) {
            return Err(ChainError::InvalidAddress(to.to_string()));
        }
        let balance = self.get_balance(&from).await?;
        let (fee, gas_price, gas) = self.estimated_fee_parts(&from, to, "", balance).await?;
        if fee >= balance {
            return Err(ChainError::NothingToTransfer);
        }
        let amount = balance - fee;
        debug!(%from, amount = %amount, fee = %fee, "sweeping full balance");
        self.send_by_key_unchecked(private_key, &from, to, amount, gas_price, gas)
            .await
    }

    async fn estimated_fee(
        &self,
        from: &str,
        to: &str,
        amount: U256,
    ) -> Result<U256, ChainError> {
        let (fee, _, _) = self.estimated_fee_parts(from, to, "", amount).await?;
        Ok(fee)
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
