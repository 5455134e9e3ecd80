use tokio::sync::watch;
use tracing::info;

use crate::basic::capability::CapabilityResolver;
use crate::basic::submission::{SubmissionController, SubmissionInFlight, SubmissionState};
use crate::core::connection::BoxError;
use crate::core::constants::DEFAULT_SIGN_IN_STATEMENT;
use crate::core::signer::{SignInInput, SignInOutput};
use crate::core::wallet::WalletCapabilities;

/// Sign-in flow for one wallet. Succeeds with the account the wallet signed in.
pub struct SignInController {
    wallet: WalletCapabilities,
    controller: SubmissionController<SignInOutput>,
}

impl SignInController {
    pub fn new(wallet: WalletCapabilities) -> Self {
        Self {
            wallet,
            controller: SubmissionController::new("sign-in"),
        }
    }

    pub fn state(&self) -> SubmissionState<SignInOutput> {
        self.controller.state()
    }

    pub fn watch(&self) -> watch::Receiver<SubmissionState<SignInOutput>> {
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

    /// Sign in with `statement`, or the default statement when `None`.
    pub async fn submit(
        &self,
        statement: Option<String>,
    ) -> Result<SubmissionState<SignInOutput>, SubmissionInFlight> {
        let input = SignInInput {
            statement: Some(statement.unwrap_or_else(|| DEFAULT_SIGN_IN_STATEMENT.to_string())),
            ..Default::default()
        };

        self.controller
            .submit(
                || Ok(input),
                |input| async move {
                    let signer = CapabilityResolver::sign_in(&self.wallet)?;
                    let output = signer.sign_in(input).await?;
                    info!(
                        wallet = %self.wallet.wallet_name,
                        account = %output.account.address,
                        "signed in"
                    );
                    Ok::<_, BoxError>(output)
                },
            )
            .await
    }
}
