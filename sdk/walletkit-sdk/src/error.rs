use std::error::Error;
use thiserror::Error;

use crate::core::connection::{BoxError, TransportError};
use crate::core::wallet::{WalletStandardError, WalletStandardErrorCode};

const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Closed error taxonomy for every failure the SDK surfaces to a UI
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletKitError {
    /// User input that could not be turned into a request
    #[error("{reason}")]
    InputInvalid { reason: String },

    /// The account does not advertise the feature
    #[error("This account does not support the {feature_name} feature")]
    CapabilityUnimplemented { feature_name: String },

    /// The account is not usable on the requested chain
    #[error(
        "This account does not support the chain {chain}. Chains supported: {}",
        join_sorted(.supported_chains)
    )]
    ChainUnsupported {
        chain: String,
        supported_chains: Vec<String>,
    },

    /// The wallet itself does not implement the feature
    #[error(
        "The wallet '{wallet_name}' ({}) does not support the {feature_name} feature. Features supported: {}",
        join_sorted(.supported_chains),
        join_sorted(.supported_features)
    )]
    WalletFeatureUnimplemented {
        wallet_name: String,
        feature_name: String,
        supported_chains: Vec<String>,
        supported_features: Vec<String>,
    },

    /// RPC or subscription transport failure
    #[error("Network request failed: {message}")]
    TransportFailure { message: String },

    #[error("{message}")]
    Unknown { message: String },
}

impl WalletKitError {
    pub fn input_invalid(reason: impl Into<String>) -> Self {
        Self::InputInvalid {
            reason: reason.into(),
        }
    }

    pub fn capability_unimplemented(feature_name: impl Into<String>) -> Self {
        Self::CapabilityUnimplemented {
            feature_name: feature_name.into(),
        }
    }

    pub fn chain_unsupported<I, S>(chain: impl Into<String>, supported_chains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ChainUnsupported {
            chain: chain.into(),
            supported_chains: sorted(supported_chains),
        }
    }

    pub fn wallet_feature_unimplemented<C, F, S, T>(
        wallet_name: impl Into<String>,
        feature_name: impl Into<String>,
        supported_chains: C,
        supported_features: F,
    ) -> Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
        F: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::WalletFeatureUnimplemented {
            wallet_name: wallet_name.into(),
            feature_name: feature_name.into(),
            supported_chains: sorted(supported_chains),
            supported_features: sorted(supported_features),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure {
            message: message.into(),
        }
    }

    /// Whether the user can fix this by editing the form
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InputInvalid { .. })
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, WalletKitError>;

fn sorted<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut items: Vec<String> = items.into_iter().map(Into::into).collect();
    items.sort();
    items
}

fn join_sorted(items: &[String]) -> String {
    let mut items = items.to_vec();
    items.sort();
    items.join(", ")
}

/// Map an arbitrary failure into the closed taxonomy.
///
/// The whole `source()` chain is searched, in this order: an already typed
/// error, the three wallet-standard markers (account feature, account chain,
/// wallet feature), any other wallet-standard error, a transport error, and
/// finally any error with a message.
/// Never panics and always produces a value.
pub fn classify_error(raw: &(dyn Error + 'static)) -> WalletKitError {
    let chain = || std::iter::successors(Some(raw), |&e| e.source());

    if let Some(typed) = chain().find_map(|e| e.downcast_ref::<WalletKitError>()) {
        return typed.clone();
    }

    for code in [
        WalletStandardErrorCode::AccountFeatureUnimplemented,
        WalletStandardErrorCode::AccountChainUnsupported,
        WalletStandardErrorCode::WalletFeatureUnimplemented,
    ] {
        let marker = chain()
            .filter_map(|e| e.downcast_ref::<WalletStandardError>())
            .find(|e| e.code == code);
        if let Some(marker) = marker {
            return marker.to_typed();
        }
    }

    if let Some(marker) = chain().find_map(|e| e.downcast_ref::<WalletStandardError>()) {
        return marker.to_typed();
    }

    if chain().any(is_transport_error) {
        return WalletKitError::transport(raw.to_string());
    }

    let message = raw.to_string();
    if message.trim().is_empty() {
        WalletKitError::Unknown {
            message: UNKNOWN_ERROR_MESSAGE.to_string(),
        }
    } else {
        WalletKitError::Unknown { message }
    }
}

/// Classify an error raised by a wallet callable or the transport
pub fn classify_boxed(raw: BoxError) -> WalletKitError {
    classify_error(raw.as_ref())
}

fn is_transport_error(err: &(dyn Error + 'static)) -> bool {
    err.is::<TransportError>()
        || err.is::<solana_client::client_error::ClientError>()
        || err.is::<solana_client::nonblocking::pubsub_client::PubsubClientError>()
}
