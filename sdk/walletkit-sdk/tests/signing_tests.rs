mod common;

use common::{account_for, capabilities_for, MockWallet};
use walletkit_sdk::core::constants::{DEFAULT_SIGN_IN_STATEMENT, SIGN_IN, SIGN_MESSAGE};
use walletkit_sdk::core::wallet::{
    WalletStandardError, WalletStandardErrorCode, WalletStandardErrorContext,
};
use walletkit_sdk::{
    MessageSigningController, SignInController, SubmissionState, WalletKitError,
};

//=============================================================================
// Message signing
//=============================================================================

#[tokio::test]
async fn test_sign_message_returns_verifiable_signature() {
    let wallet = MockWallet::new();
    let controller = MessageSigningController::new(
        account_for(&wallet, &[SIGN_MESSAGE]),
        capabilities_for(&wallet, &[SIGN_MESSAGE]),
    );
    wallet.observe(controller.watch());

    let state = controller.submit("Hello, Solana").await.unwrap();

    let signature = state.success().expect("signing should succeed");
    assert!(signature.verify(wallet.address().as_ref(), b"Hello, Solana"));
    assert_eq!(wallet.observed(), vec![SubmissionState::Pending]);

    controller.dismiss_success();
    assert!(controller.state().is_idle());
}

#[tokio::test]
async fn test_empty_message_is_rejected_before_wallet() {
    let wallet = MockWallet::new();
    let controller = MessageSigningController::new(
        account_for(&wallet, &[SIGN_MESSAGE]),
        capabilities_for(&wallet, &[SIGN_MESSAGE]),
    );

    let state = controller.submit("").await.unwrap();

    assert_eq!(
        state,
        SubmissionState::Failed(WalletKitError::input_invalid("Please enter a message to sign"))
    );
    assert_eq!(wallet.calls(), 0);
}

#[tokio::test]
async fn test_account_without_sign_message() {
    let wallet = MockWallet::new();
    let controller = MessageSigningController::new(
        account_for(&wallet, &[]),
        capabilities_for(&wallet, &[SIGN_MESSAGE]),
    );

    let state = controller.submit("hi").await.unwrap();

    assert_eq!(
        state.error().unwrap().to_string(),
        "This account does not support the solana:signMessage feature"
    );
    assert_eq!(wallet.calls(), 0);
}

#[tokio::test]
async fn test_signature_from_another_key_is_rejected() {
    let wallet = MockWallet::with_wrong_key();
    let controller = MessageSigningController::new(
        account_for(&wallet, &[SIGN_MESSAGE]),
        capabilities_for(&wallet, &[SIGN_MESSAGE]),
    );

    let state = controller.submit("hi").await.unwrap();

    assert_eq!(
        state,
        SubmissionState::Failed(WalletKitError::Unknown {
            message: format!("The wallet did not return a signature for {}", wallet.address()),
        })
    );
}

#[tokio::test]
async fn test_wallet_chain_marker_is_classified() {
    let wallet = MockWallet::new();
    wallet.fail_with(WalletStandardError::new(
        WalletStandardErrorCode::AccountChainUnsupported,
        WalletStandardErrorContext {
            chain: Some("solana:testnet".into()),
            supported_chains: vec!["solana:mainnet".into(), "solana:devnet".into()],
            ..Default::default()
        },
    ));
    let controller = MessageSigningController::new(
        account_for(&wallet, &[SIGN_MESSAGE]),
        capabilities_for(&wallet, &[SIGN_MESSAGE]),
    );

    let state = controller.submit("hi").await.unwrap();

    assert_eq!(
        state,
        SubmissionState::Failed(WalletKitError::chain_unsupported(
            "solana:testnet",
            ["solana:devnet", "solana:mainnet"],
        ))
    );
}

//=============================================================================
// Sign-in
//=============================================================================

#[tokio::test]
async fn test_sign_in_uses_default_statement() {
    let wallet = MockWallet::new();
    let controller = SignInController::new(capabilities_for(&wallet, &[SIGN_IN]));

    let state = controller.submit(None).await.unwrap();

    let output = state.success().expect("sign-in should succeed");
    assert_eq!(output.signed_message, DEFAULT_SIGN_IN_STATEMENT.as_bytes());
    assert_eq!(output.account.address, wallet.address());
    assert!(output
        .signature
        .verify(wallet.address().as_ref(), &output.signed_message));
}

#[tokio::test]
async fn test_sign_in_with_custom_statement() {
    let wallet = MockWallet::new();
    let controller = SignInController::new(capabilities_for(&wallet, &[SIGN_IN]));

    let state = controller.submit(Some("Welcome back".into())).await.unwrap();

    assert_eq!(state.success().unwrap().signed_message, b"Welcome back");

    controller.dismiss_error();
    assert!(controller.state().success().is_some());
    controller.dismiss_success();
    assert!(controller.state().is_idle());
}

#[tokio::test]
async fn test_sign_in_unsupported_by_wallet() {
    let wallet = MockWallet::new();
    let caps = capabilities_for(&wallet, &[SIGN_MESSAGE]);
    let controller = SignInController::new(caps);

    let state = controller.submit(None).await.unwrap();

    assert_eq!(
        state,
        SubmissionState::Failed(WalletKitError::wallet_feature_unimplemented(
            "Mock Wallet",
            SIGN_IN,
            ["solana:devnet"],
            [SIGN_MESSAGE],
        ))
    );
    assert_eq!(wallet.calls(), 0);

    controller.dismiss_error();
    assert!(controller.state().is_idle());
}
