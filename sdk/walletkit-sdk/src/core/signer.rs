//! Signing capabilities a wallet exposes for one of its accounts.
//!
//! These are implemented by the wallet integration layer (a browser wallet
//! bridge, a hardware wallet, a local keypair). The SDK never signs anything
//! itself; it only decides which of these to call and in what order.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::core::connection::BoxError;
use crate::types::{SolanaChain, WalletAccount};

/// `solana:signAndSendTransaction`: the wallet signs and submits in one step.
#[async_trait]
pub trait TransactionSendingSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    async fn sign_and_send_transaction(
        &self,
        tx: Transaction,
        chain: SolanaChain,
    ) -> Result<Signature, BoxError>;
}

/// `solana:signTransaction`: the wallet only signs; submission is up to the caller.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    async fn sign_transaction(
        &self,
        tx: Transaction,
        chain: SolanaChain,
    ) -> Result<Transaction, BoxError>;
}

/// `solana:signMessage`
#[async_trait]
pub trait MessageSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, BoxError>;
}

/// Sign-in request. Fields left empty are filled in by the wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInInput {
    pub domain: Option<String>,
    pub address: Option<Pubkey>,
    pub statement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOutput {
    pub account: WalletAccount,
    pub signed_message: Vec<u8>,
    pub signature: Signature,
}

/// `solana:signIn`
#[async_trait]
pub trait SignInSigner: Send + Sync {
    async fn sign_in(&self, input: SignInInput) -> Result<SignInOutput, BoxError>;
}
