#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify};
use tokio_stream::wrappers::UnboundedReceiverStream;
use walletkit_sdk::core::connection::{BalanceStream, BoxError, SolConnection, TransportError};
use walletkit_sdk::core::constants::{SIGN_AND_SEND_TRANSACTION, SIGN_IN, SIGN_MESSAGE, SIGN_TRANSACTION};
use walletkit_sdk::core::signer::{
    MessageSigner, SignInInput, SignInOutput, SignInSigner, TransactionSendingSigner,
    TransactionSigner,
};
use walletkit_sdk::core::wallet::{Capability, WalletCapabilities, WalletStandardError};
use walletkit_sdk::types::{Lamports, SlotBalance, SolanaChain, WalletAccount};
use walletkit_sdk::SubmissionState;

type WatchSender = mpsc::UnboundedSender<Result<SlotBalance, BoxError>>;

/// In-memory transport with scripted balances and push notifications
#[derive(Default)]
pub struct MockConnection {
    pub blockhash: Hash,
    balances: Mutex<HashMap<Pubkey, SlotBalance>>,
    watchers: Mutex<HashMap<Pubkey, Vec<WatchSender>>>,
    sent: Mutex<Vec<Transaction>>,
    balance_gate: Mutex<Option<Arc<Notify>>>,
    watch_gate: Mutex<Option<Arc<Notify>>>,
    fail_balance: Mutex<Option<String>>,
    fail_watch: Mutex<Option<String>>,
    fail_send: Mutex<Option<String>>,
    pub balance_calls: AtomicUsize,
    pub blockhash_calls: AtomicUsize,
}

impl MockConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            blockhash: Hash::new_unique(),
            ..Default::default()
        })
    }

    pub fn set_balance(&self, address: Pubkey, slot: u64, lamports: u64) {
        self.balances.lock().insert(
            address,
            SlotBalance {
                slot,
                lamports: Some(Lamports(lamports)),
            },
        );
    }

    /// Push a live notification to every open watcher of `address`
    pub fn notify(&self, address: Pubkey, slot: u64, lamports: u64) {
        self.push(
            address,
            Ok(SlotBalance {
                slot,
                lamports: Some(Lamports(lamports)),
            }),
        );
    }

    /// Push a notification for an account that no longer exists
    pub fn notify_empty(&self, address: Pubkey, slot: u64) {
        self.push(address, Ok(SlotBalance { slot, lamports: None }));
    }

    pub fn notify_error(&self, address: Pubkey, message: &str) {
        self.push(address, Err(Box::new(TransportError::new(message))));
    }

    fn push(&self, address: Pubkey, item: Result<SlotBalance, BoxError>) {
        let mut watchers = self.watchers.lock();
        let senders = watchers.entry(address).or_default();
        senders.retain(|s| !s.is_closed());
        if let Some((last, rest)) = senders.split_last() {
            for sender in rest {
                let copy = match &item {
                    Ok(v) => Ok(*v),
                    Err(e) => Err(Box::new(TransportError::new(e.to_string())) as BoxError),
                };
                let _ = sender.send(copy);
            }
            let _ = last.send(item);
        }
    }

    /// Watchers whose stream is still held by a subscriber
    pub fn open_watchers(&self, address: &Pubkey) -> usize {
        self.watchers
            .lock()
            .get(address)
            .map(|senders| senders.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }

    pub async fn wait_for_watcher(&self, address: &Pubkey) {
        while self.open_watchers(address) == 0 {
            tokio::task::yield_now().await;
        }
    }

    /// Make balance fetches wait until the returned gate is notified
    pub fn hold_balance_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.balance_gate.lock() = Some(gate.clone());
        gate
    }

    /// Make the next watch attach wait until the returned gate is notified
    pub fn hold_watches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.watch_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn fail_balance_with(&self, message: &str) {
        *self.fail_balance.lock() = Some(message.to_string());
    }

    pub fn clear_balance_failure(&self) {
        *self.fail_balance.lock() = None;
    }

    pub fn fail_watch_with(&self, message: &str) {
        *self.fail_watch.lock() = Some(message.to_string());
    }

    pub fn fail_send_with(&self, message: &str) {
        *self.fail_send.lock() = Some(message.to_string());
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl SolConnection for MockConnection {
    async fn get_balance(&self, address: &Pubkey) -> Result<SlotBalance, BoxError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.balance_gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(message) = self.fail_balance.lock().clone() {
            return Err(Box::new(TransportError::new(message)));
        }
        Ok(self
            .balances
            .lock()
            .get(address)
            .copied()
            .unwrap_or(SlotBalance {
                slot: 0,
                lamports: None,
            }))
    }

    async fn watch_balance(&self, address: &Pubkey) -> Result<BalanceStream, BoxError> {
        let gate = self.watch_gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(message) = self.fail_watch.lock().clone() {
            return Err(Box::new(TransportError::new(message)));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.watchers.lock().entry(*address).or_default().push(tx);
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, BoxError> {
        if let Some(message) = self.fail_send.lock().clone() {
            return Err(Box::new(TransportError::new(message)));
        }
        let signature = *tx.signatures.first().ok_or("No signature")?;
        self.sent.lock().push(tx.clone());
        Ok(signature)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, BoxError> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.blockhash)
    }
}

/// Wallet backed by a local keypair, with call accounting and fault injection
pub struct MockWallet {
    pub keypair: Keypair,
    pub calls: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
    failure: Mutex<Option<WalletStandardError>>,
    observer: Mutex<Option<watch::Receiver<SubmissionState>>>,
    observed: Mutex<Vec<SubmissionState>>,
    wrong_key: bool,
}

impl MockWallet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(false))
    }

    /// A wallet that signs with a key other than the account's
    pub fn with_wrong_key() -> Arc<Self> {
        Arc::new(Self::build(true))
    }

    fn build(wrong_key: bool) -> Self {
        Self {
            keypair: Keypair::new(),
            calls: AtomicUsize::new(0),
            gate: Mutex::new(None),
            failure: Mutex::new(None),
            observer: Mutex::new(None),
            observed: Mutex::new(Vec::new()),
            wrong_key,
        }
    }

    pub fn address(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Hold every signing call until the returned gate is notified
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    pub fn fail_with(&self, error: WalletStandardError) {
        *self.failure.lock() = Some(error);
    }

    /// Record the controller state seen at the moment the wallet is called
    pub fn observe(&self, state: watch::Receiver<SubmissionState>) {
        *self.observer.lock() = Some(state);
    }

    pub fn observed(&self) -> Vec<SubmissionState> {
        self.observed.lock().clone()
    }

    async fn enter(&self) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(observer) = self.observer.lock().as_ref() {
            self.observed.lock().push(observer.borrow().clone());
        }
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(error) = self.failure.lock().clone() {
            return Err(Box::new(error));
        }
        Ok(())
    }

    fn sign(&self, mut tx: Transaction) -> Result<Transaction, BoxError> {
        let blockhash = tx.message.recent_blockhash;
        tx.try_sign(&[&self.keypair], blockhash)?;
        Ok(tx)
    }
}

#[async_trait]
impl TransactionSendingSigner for MockWallet {
    fn pubkey(&self) -> Pubkey {
        self.address()
    }

    async fn sign_and_send_transaction(
        &self,
        tx: Transaction,
        _chain: SolanaChain,
    ) -> Result<Signature, BoxError> {
        self.enter().await?;
        let signed = self.sign(tx)?;
        Ok(signed.signatures[0])
    }
}

#[async_trait]
impl TransactionSigner for MockWallet {
    fn pubkey(&self) -> Pubkey {
        self.address()
    }

    async fn sign_transaction(
        &self,
        tx: Transaction,
        _chain: SolanaChain,
    ) -> Result<Transaction, BoxError> {
        self.enter().await?;
        self.sign(tx)
    }
}

#[async_trait]
impl MessageSigner for MockWallet {
    fn pubkey(&self) -> Pubkey {
        self.address()
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, BoxError> {
        self.enter().await?;
        if self.wrong_key {
            return Ok(Keypair::new().sign_message(message));
        }
        Ok(self.keypair.sign_message(message))
    }
}

#[async_trait]
impl SignInSigner for MockWallet {
    async fn sign_in(&self, input: SignInInput) -> Result<SignInOutput, BoxError> {
        self.enter().await?;
        let signed_message = input.statement.unwrap_or_default().into_bytes();
        Ok(SignInOutput {
            account: account_for(self, &[SIGN_MESSAGE]),
            signature: self.keypair.sign_message(&signed_message),
            signed_message,
        })
    }
}

/// Devnet account owned by `wallet` advertising `features`
pub fn account_for(wallet: &MockWallet, features: &[&str]) -> WalletAccount {
    let mut account =
        WalletAccount::new("Mock Wallet", wallet.address()).with_chain(SolanaChain::Devnet);
    for feature in features {
        account = account.with_feature(*feature);
    }
    account
}

/// Capability table registering `wallet` under `features`
pub fn capabilities_for(wallet: &Arc<MockWallet>, features: &[&str]) -> WalletCapabilities {
    let mut caps = WalletCapabilities::new("Mock Wallet").with_chain(SolanaChain::Devnet);
    for feature in features {
        let capability = match *feature {
            SIGN_AND_SEND_TRANSACTION => Capability::SignAndSendTransaction(wallet.clone()),
            SIGN_TRANSACTION => Capability::SignTransaction(wallet.clone()),
            SIGN_MESSAGE => Capability::SignMessage(wallet.clone()),
            SIGN_IN => Capability::SignIn(wallet.clone()),
            other => panic!("unknown feature {other}"),
        };
        caps = caps.with_capability(capability);
    }
    caps
}
