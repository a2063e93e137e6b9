//! Shared endpoint state and the request context.

use crate::errors::ApiError;
use address_book::AddressBook;
use shared_types::{AddressCodec, ChainClient, ChainInfo, TransferCache};
use std::sync::Arc;
use subscriptions::{Subscription, SubscriptionManager};
use tracing::warn;

/// Everything a method handler can reach, cloned per request.
#[derive(Clone)]
pub struct ApiState {
    pub client: Arc<dyn ChainClient>,
    pub addresses: Arc<AddressBook>,
    pub subscriptions: Arc<SubscriptionManager>,
    pub cache: Arc<dyn TransferCache>,
    pub debug: bool,
}

impl ApiState {
    pub fn codec(&self) -> Arc<dyn AddressCodec> {
        self.client.address_codec()
    }

    /// Re-encode a caller-supplied address into canonical form.
    pub fn normalize_address(&self, address: &str) -> Result<String, ApiError> {
        self.codec()
            .normalize(address)
            .map_err(|_| ApiError::validation("invalid address"))
    }

    /// Resolve a non-internal service subscription.
    pub fn external_subscription(&self, service_id: u64) -> Result<Subscription, ApiError> {
        let subscription = self
            .subscriptions
            .subscriptions()
            .get(service_id)
            .map_err(|e| ApiError::server(e.to_string()))?;
        if subscription.internal {
            return Err(ApiError::server("unknown serviceId"));
        }
        Ok(subscription)
    }
}

/// Per-request ambient data extracted from the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub api_token: Option<String>,
    pub remote_addr: String,
}

impl RequestContext {
    /// Check the caller's token against a service's configured token.
    /// Services without a token accept any caller.
    pub fn ensure_authorized(&self, subscription: &Subscription) -> Result<(), ApiError> {
        if subscription.api_token.is_empty() {
            return Ok(());
        }
        match &self.api_token {
            Some(token) if *token == subscription.api_token => Ok(()),
            _ => {
                warn!(
                    service = subscription.service_id,
                    remote = %self.remote_addr,
                    "unauthorized api access attempt"
                );
                Err(ApiError::unauthorized("invalid api token"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with_token(token: &str) -> Subscription {
        Subscription {
            service_id: 5,
            api_token: token.into(),
            ..Default::default()
        }
    }

    #[test]
    fn tokenless_service_accepts_anyone() {
        let ctx = RequestContext::default();
        ctx.ensure_authorized(&service_with_token("")).unwrap();
    }

    #[test]
    fn wrong_or_missing_token_is_unauthorized() {
        let service = service_with_token("secret");
        let missing = RequestContext::default();
        assert!(missing.ensure_authorized(&service).is_err());
        let wrong = RequestContext {
            api_token: Some("nope".into()),
            ..Default::default()
        };
        assert!(wrong.ensure_authorized(&service).is_err());
        let right = RequestContext {
            api_token: Some("secret".into()),
            ..Default::default()
        };
        right.ensure_authorized(&service).unwrap();
    }
}
