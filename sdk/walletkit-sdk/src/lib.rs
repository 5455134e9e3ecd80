pub mod advanced;
pub mod basic;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

pub use crate::basic::accounts::AccountDirectory;
pub use crate::basic::balance::{
    BalanceSubscription, BalanceSubscriptionManager, BalanceUpdate, CancelHandle, UpdateOrigin,
};
pub use crate::basic::cache::{BalanceCache, CacheInvalidator};
pub use crate::basic::capability::{CapabilityKind, CapabilityResolver, ResolvedSender, SendMode};
pub use crate::basic::message::MessageSigningController;
pub use crate::basic::sign_in::SignInController;
pub use crate::basic::submission::{SubmissionController, SubmissionInFlight, SubmissionState};
pub use crate::basic::transfer::{Recipient, TransferController, TransferRequest};
pub use crate::config::ClientConfig;
pub use crate::core::connection::SolConnection;
pub use crate::core::rpc::RpcConnection;
pub use crate::core::wallet::{Capability, WalletCapabilities};
pub use crate::error::{classify_error, Result, WalletKitError};
pub use crate::types::{BalanceKey, Denomination, Lamports, SolanaChain, WalletAccount};
pub use crate::utils::{format_base_units, parse_base_units};
