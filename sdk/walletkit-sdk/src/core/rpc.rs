use async_trait::async_trait;
use futures::StreamExt;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcAccountInfoConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::core::connection::{BalanceStream, BoxError, SolConnection};
use crate::types::{Lamports, SlotBalance};

/// `SolConnection` backed by a JSON-RPC endpoint and its WebSocket
/// subscription endpoint.
pub struct RpcConnection {
    rpc: Arc<RpcClient>,
    ws_url: String,
}

impl RpcConnection {
    pub fn new(rpc_url: impl Into<String>, ws_url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            rpc: Arc::new(RpcClient::new_with_commitment(rpc_url.into(), commitment)),
            ws_url: ws_url.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.rpc_url(), config.ws_url(), config.commitment())
    }

    pub fn rpc_client(&self) -> &RpcClient {
        &self.rpc
    }
}

#[async_trait]
impl SolConnection for RpcConnection {
    async fn get_balance(&self, address: &Pubkey) -> Result<SlotBalance, BoxError> {
        let response = self
            .rpc
            .get_balance_with_commitment(address, self.rpc.commitment())
            .await?;
        Ok(SlotBalance {
            slot: response.context.slot,
            lamports: Some(Lamports(response.value)),
        })
    }

    async fn watch_balance(&self, address: &Pubkey) -> Result<BalanceStream, BoxError> {
        // Connect up front so connection failures surface to the caller.
        let client = PubsubClient::new(&self.ws_url).await?;
        let (tx, rx) = mpsc::unbounded_channel();
        let address = *address;
        let commitment = self.rpc.commitment();

        tokio::spawn(async move {
            let config = RpcAccountInfoConfig {
                commitment: Some(commitment),
                ..Default::default()
            };
            let (mut notifications, unsubscribe) =
                match client.account_subscribe(&address, Some(config)).await {
                    Ok(subscription) => subscription,
                    Err(e) => {
                        warn!(%address, error = %e, "account subscription failed");
                        let _ = tx.send(Err(Box::new(e) as BoxError));
                        return;
                    },
                };
            debug!(%address, "account subscription attached");

            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    notification = notifications.next() => match notification {
                        Some(response) => {
                            let update = SlotBalance {
                                slot: response.context.slot,
                                lamports: Some(Lamports(response.value.lamports)),
                            };
                            if tx.send(Ok(update)).is_err() {
                                break;
                            }
                        },
                        None => break,
                    },
                }
            }

            drop(notifications);
            unsubscribe().await;
            debug!(%address, "account subscription released");
        });

        Ok(UnboundedReceiverStream::new(rx).boxed())
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, BoxError> {
        Ok(self.rpc.send_transaction(tx).await?)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, BoxError> {
        Ok(self.rpc.get_latest_blockhash().await?)
    }
}
