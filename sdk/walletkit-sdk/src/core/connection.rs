use async_trait::async_trait;
use futures::stream::BoxStream;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::error::Error;
use thiserror::Error;

use crate::types::SlotBalance;

/// Error type raised by external collaborators (wallets, transports)
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Live balance notifications for one address. Dropping the stream
/// releases the underlying transport subscription.
pub type BalanceStream = BoxStream<'static, Result<SlotBalance, BoxError>>;

/// Generic transport failure for connection implementations that have no
/// richer error type of their own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// RPC/transport client for a single chain.
#[async_trait]
pub trait SolConnection: Send + Sync {
    async fn get_balance(&self, address: &Pubkey) -> Result<SlotBalance, BoxError>;

    /// Attach a push listener for balance changes of `address`.
    async fn watch_balance(&self, address: &Pubkey) -> Result<BalanceStream, BoxError>;

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, BoxError>;

    async fn get_latest_blockhash(&self) -> Result<Hash, BoxError>;
}
