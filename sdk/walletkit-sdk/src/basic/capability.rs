use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use tracing::debug;

use crate::core::connection::{BoxError, SolConnection};
use crate::core::constants::{SIGN_AND_SEND_TRANSACTION, SIGN_IN, SIGN_MESSAGE, SIGN_TRANSACTION};
use crate::core::signer::{MessageSigner, SignInSigner, TransactionSendingSigner, TransactionSigner};
use crate::core::wallet::WalletCapabilities;
use crate::error::{Result, WalletKitError};
use crate::types::{SolanaChain, WalletAccount};

/// Operations a form can ask an account for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    MessageSigning,
    TransactionSigningAndSending,
    SignIn,
}

impl CapabilityKind {
    /// Feature name reported when the capability is missing entirely
    pub fn feature_name(&self) -> &'static str {
        match self {
            CapabilityKind::MessageSigning => SIGN_MESSAGE,
            CapabilityKind::TransactionSigningAndSending => SIGN_AND_SEND_TRANSACTION,
            CapabilityKind::SignIn => SIGN_IN,
        }
    }
}

/// How a resolved sender gets a transaction on chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    /// The wallet signs and submits
    Combined,
    /// The wallet signs, the RPC connection submits
    SignThenSubmit,
}

/// A transaction sender bound to an account and chain
#[derive(Clone)]
pub struct ResolvedSender {
    mode: SendMode,
    chain: SolanaChain,
    inner: SenderInner,
}

#[derive(Clone)]
enum SenderInner {
    Combined(Arc<dyn TransactionSendingSigner>),
    Composed {
        signer: Arc<dyn TransactionSigner>,
        connection: Arc<dyn SolConnection>,
    },
}

impl ResolvedSender {
    pub fn mode(&self) -> SendMode {
        self.mode
    }

    pub fn chain(&self) -> SolanaChain {
        self.chain
    }

    /// Sign `tx` and put it on chain, returning its signature
    pub async fn sign_and_send(&self, tx: Transaction) -> std::result::Result<Signature, BoxError> {
        match &self.inner {
            SenderInner::Combined(sender) => sender.sign_and_send_transaction(tx, self.chain).await,
            SenderInner::Composed { signer, connection } => {
                let signed = signer.sign_transaction(tx, self.chain).await?;
                connection.send_transaction(&signed).await
            },
        }
    }
}

#[async_trait]
impl TransactionSendingSigner for ResolvedSender {
    fn pubkey(&self) -> Pubkey {
        match &self.inner {
            SenderInner::Combined(sender) => sender.pubkey(),
            SenderInner::Composed { signer, .. } => signer.pubkey(),
        }
    }

    async fn sign_and_send_transaction(
        &self,
        tx: Transaction,
        _chain: SolanaChain,
    ) -> std::result::Result<Signature, BoxError> {
        self.sign_and_send(tx).await
    }
}

/// Picks the wallet callable that serves a requested capability.
///
/// Pure selection over tables the wallet integration already resolved:
/// nothing here touches the network or calls into the wallet.
pub struct CapabilityResolver<'a> {
    account: &'a WalletAccount,
    wallet: &'a WalletCapabilities,
}

impl<'a> CapabilityResolver<'a> {
    pub fn new(account: &'a WalletAccount, wallet: &'a WalletCapabilities) -> Self {
        Self { account, wallet }
    }

    /// Resolve a sender, preferring the wallet's combined sign-and-send
    /// feature and falling back to sign-only plus RPC submission.
    pub fn transaction_sender(
        &self,
        chain: SolanaChain,
        connection: Arc<dyn SolConnection>,
    ) -> Result<ResolvedSender> {
        self.require_chain(chain)?;

        if self.account.supports_feature(SIGN_AND_SEND_TRANSACTION) {
            if let Ok(sender) = self.wallet.sign_and_send_transaction() {
                debug!(account = %self.account.address, %chain, "resolved combined sender");
                return Ok(ResolvedSender {
                    mode: SendMode::Combined,
                    chain,
                    inner: SenderInner::Combined(sender),
                });
            }
        }

        if self.account.supports_feature(SIGN_TRANSACTION) {
            if let Ok(signer) = self.wallet.sign_transaction() {
                debug!(account = %self.account.address, %chain, "resolved sign-then-submit sender");
                return Ok(ResolvedSender {
                    mode: SendMode::SignThenSubmit,
                    chain,
                    inner: SenderInner::Composed { signer, connection },
                });
            }
        }

        // Nothing usable: report whichever layer is missing the preferred feature.
        if self.account.supports_feature(SIGN_AND_SEND_TRANSACTION) {
            return Err(self.wallet.sign_and_send_transaction().err().unwrap_or_else(|| {
                WalletKitError::capability_unimplemented(SIGN_AND_SEND_TRANSACTION)
            }));
        }
        if self.account.supports_feature(SIGN_TRANSACTION) {
            return Err(self.wallet.sign_transaction().err().unwrap_or_else(|| {
                WalletKitError::capability_unimplemented(SIGN_TRANSACTION)
            }));
        }
        Err(WalletKitError::capability_unimplemented(
            CapabilityKind::TransactionSigningAndSending.feature_name(),
        ))
    }

    pub fn message_signer(&self) -> Result<Arc<dyn MessageSigner>> {
        self.require_feature(CapabilityKind::MessageSigning)?;
        self.wallet.sign_message()
    }

    /// Sign-in is a wallet-level feature: it produces an account rather
    /// than acting on one.
    pub fn sign_in(wallet: &WalletCapabilities) -> Result<Arc<dyn SignInSigner>> {
        wallet.sign_in()
    }

    fn require_feature(&self, kind: CapabilityKind) -> Result<()> {
        if self.account.supports_feature(kind.feature_name()) {
            Ok(())
        } else {
            Err(WalletKitError::capability_unimplemented(kind.feature_name()))
        }
    }

    fn require_chain(&self, chain: SolanaChain) -> Result<()> {
        if self.account.supports_chain(chain) {
            Ok(())
        } else {
            Err(WalletKitError::chain_unsupported(
                chain.as_str(),
                self.account.chains.iter().map(|c| c.as_str()),
            ))
        }
    }
}
