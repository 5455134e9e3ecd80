// Wallet-standard feature names
pub const SIGN_AND_SEND_TRANSACTION: &str = "solana:signAndSendTransaction";
pub const SIGN_TRANSACTION: &str = "solana:signTransaction";
pub const SIGN_MESSAGE: &str = "solana:signMessage";
pub const SIGN_IN: &str = "solana:signIn";

pub const SOL_DECIMALS: u32 = 9;
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub const MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const MAINNET_WS_URL: &str = "wss://api.mainnet-beta.solana.com";
pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";
pub const DEVNET_WS_URL: &str = "wss://api.devnet.solana.com";
pub const TESTNET_RPC_URL: &str = "https://api.testnet.solana.com";
pub const TESTNET_WS_URL: &str = "wss://api.testnet.solana.com";
pub const LOCALNET_RPC_URL: &str = "http://127.0.0.1:8899";
pub const LOCALNET_WS_URL: &str = "ws://127.0.0.1:8900";

pub const EXPLORER_URL: &str = "https://explorer.solana.com";

// Transfer form defaults (devnet)
pub const DEFAULT_RECIPIENT_ADDRESS: &str = "dDCQNnDmNbFVi8cQhKAgXhyhXeJ625tvwsunRyRc7c8";
pub const DEFAULT_LAMPORTS: u64 = 7;

pub const DEFAULT_SIGN_IN_STATEMENT: &str = "You will enjoy being signed in.";

/// Buffered invalidation notices per balance cache
pub const INVALIDATION_CHANNEL_CAPACITY: usize = 64;
