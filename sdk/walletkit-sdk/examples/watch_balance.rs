//! Print the live balance of an address.
//!
//! ```text
//! cargo run --example watch_balance -- <ADDRESS> [CONFIG.toml]
//! ```

use anyhow::{bail, Context};
use futures::StreamExt;
use std::sync::Arc;
use walletkit_sdk::{
    logging, utils, BalanceSubscriptionManager, ClientConfig, Denomination, RpcConnection,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(address) = args.next() else {
        bail!("usage: watch_balance <ADDRESS> [CONFIG.toml]");
    };
    let config = match args.next() {
        Some(path) => ClientConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => ClientConfig::default(),
    };
    logging::init(&config.log_filter);

    let address = utils::parse_address(&address)?;
    let connection = Arc::new(RpcConnection::from_config(&config));
    let manager = BalanceSubscriptionManager::default();
    let mut subscription = manager.subscribe(connection, address, config.chain);

    println!("Watching {} on {}", address, config.chain);
    while let Some(item) = subscription.next().await {
        match item {
            Ok(update) => match update.lamports {
                Some(lamports) => println!(
                    "#{} slot {}: {} SOL",
                    update.sequence,
                    update.slot,
                    utils::format_base_units(lamports, Denomination::Sol)
                ),
                None => println!("#{} slot {}: no account", update.sequence, update.slot),
            },
            Err(error) => eprintln!("{error}"),
        }
    }
    Ok(())
}
