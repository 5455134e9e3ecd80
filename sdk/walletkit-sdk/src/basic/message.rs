use solana_sdk::signature::Signature;
use tokio::sync::watch;

use crate::basic::capability::CapabilityResolver;
use crate::basic::submission::{SubmissionController, SubmissionInFlight, SubmissionState};
use crate::core::connection::BoxError;
use crate::core::wallet::WalletCapabilities;
use crate::error::{Result, WalletKitError};
use crate::types::WalletAccount;

/// Sign-message form controller for one account
pub struct MessageSigningController {
    account: WalletAccount,
    wallet: WalletCapabilities,
    controller: SubmissionController,
}

impl MessageSigningController {
    pub fn new(account: WalletAccount, wallet: WalletCapabilities) -> Self {
        Self {
            account,
            wallet,
            controller: SubmissionController::new("sign-message"),
        }
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

    pub async fn submit(
        &self,
        text: &str,
    ) -> std::result::Result<SubmissionState, SubmissionInFlight> {
        self.controller
            .submit(|| validate(text), |message| self.sign(message))
            .await
    }

    async fn sign(&self, message: Vec<u8>) -> std::result::Result<Signature, BoxError> {
        let signer = CapabilityResolver::new(&self.account, &self.wallet).message_signer()?;
        let signature = signer.sign_message(&message).await?;

        // The signature must come from this account's key.
        if !signature.verify(self.account.address.as_ref(), &message) {
            return Err(WalletKitError::Unknown {
                message: format!(
                    "The wallet did not return a signature for {}",
                    self.account.address
                ),
            }
            .into());
        }
        Ok(signature)
    }
}

fn validate(text: &str) -> Result<Vec<u8>> {
    if text.is_empty() {
        return Err(WalletKitError::input_invalid("Please enter a message to sign"));
    }
    Ok(text.as_bytes().to_vec())
}
