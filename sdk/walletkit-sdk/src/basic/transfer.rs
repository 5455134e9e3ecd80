use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::advanced::builders;
use crate::basic::cache::CacheInvalidator;
use crate::basic::capability::CapabilityResolver;
use crate::basic::submission::{SubmissionController, SubmissionInFlight, SubmissionState};
use crate::core::connection::{BoxError, SolConnection};
use crate::core::constants::{DEFAULT_LAMPORTS, DEFAULT_RECIPIENT_ADDRESS};
use crate::core::wallet::WalletCapabilities;
use crate::error::Result;
use crate::types::{BalanceKey, Denomination, Lamports, SolanaChain, WalletAccount};
use crate::utils;

/// Who receives a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Base-58 address typed by the user
    Address(String),
    /// One of the connected accounts
    Account(WalletAccount),
}

/// Raw form input for a native token transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub amount: String,
    pub denomination: Denomination,
    pub recipient: Recipient,
}

impl TransferRequest {
    pub fn lamports(amount: impl Into<String>, recipient: Recipient) -> Self {
        Self {
            amount: amount.into(),
            denomination: Denomination::Lamports,
            recipient,
        }
    }

    pub fn sol(amount: impl Into<String>, recipient: Recipient) -> Self {
        Self {
            amount: amount.into(),
            denomination: Denomination::Sol,
            recipient,
        }
    }
}

impl Default for TransferRequest {
    fn default() -> Self {
        Self::lamports(
            DEFAULT_LAMPORTS.to_string(),
            Recipient::Address(DEFAULT_RECIPIENT_ADDRESS.to_string()),
        )
    }
}

/// Transfer form controller for one sending account on one chain.
///
/// On success both the sender's and the recipient's balances are
/// invalidated, whether or not the recipient is being displayed.
pub struct TransferController {
    account: WalletAccount,
    wallet: WalletCapabilities,
    chain: SolanaChain,
    connection: Arc<dyn SolConnection>,
    cache: Arc<dyn CacheInvalidator>,
    controller: SubmissionController,
}

impl TransferController {
    pub fn new(
        account: WalletAccount,
        wallet: WalletCapabilities,
        chain: SolanaChain,
        connection: Arc<dyn SolConnection>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            account,
            wallet,
            chain,
            connection,
            cache,
            controller: SubmissionController::new("transfer"),
        }
    }

    pub fn account(&self) -> &WalletAccount {
        &self.account
    }

    pub fn chain(&self) -> SolanaChain {
        self.chain
    }

    pub fn state(&self) -> SubmissionState {
        self.controller.state()
    }

    pub fn watch(&self) -> watch::Receiver<SubmissionState> {
        self.controller.watch()
    }

    pub fn is_pending(&self) -> bool {
        self.controller.is_pending()
    }

    pub fn dismiss_error(&self) {
        self.controller.dismiss_error()
    }

    pub fn dismiss_success(&self) {
        self.controller.dismiss_success()
    }

    /// Explorer link for the last successful transfer
    pub fn explorer_link(&self) -> Option<String> {
        self.state()
            .success()
            .map(|signature| utils::explorer_transaction_link(signature, self.chain))
    }

    pub async fn submit(
        &self,
        request: TransferRequest,
    ) -> std::result::Result<SubmissionState, SubmissionInFlight> {
        self.controller
            .submit(
                || self.validate(&request),
                |(amount, recipient)| self.execute(amount, recipient),
            )
            .await
    }

    fn validate(&self, request: &TransferRequest) -> Result<(Lamports, Pubkey)> {
        let amount = utils::parse_base_units(&request.amount, request.denomination)?;
        let recipient = match &request.recipient {
            Recipient::Address(address) => utils::parse_address(address)?,
            Recipient::Account(account) => account.address,
        };
        Ok((amount, recipient))
    }

    async fn execute(
        &self,
        amount: Lamports,
        recipient: Pubkey,
    ) -> std::result::Result<Signature, BoxError> {
        let sender = CapabilityResolver::new(&self.account, &self.wallet)
            .transaction_sender(self.chain, self.connection.clone())?;

        let blockhash = self.connection.get_latest_blockhash().await?;
        let tx = builders::transfer_transaction(&self.account.address, &recipient, amount, blockhash);
        let signature = sender.sign_and_send(tx).await?;

        self.cache
            .invalidate(BalanceKey::new(self.account.address, self.chain));
        self.cache.invalidate(BalanceKey::new(recipient, self.chain));

        info!(
            from = %self.account.address,
            to = %recipient,
            %amount,
            %signature,
            mode = ?sender.mode(),
            "transfer submitted"
        );
        Ok(signature)
    }
}
