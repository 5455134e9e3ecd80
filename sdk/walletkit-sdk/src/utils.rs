use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::str::FromStr;

use crate::core::constants::EXPLORER_URL;
use crate::error::{Result, WalletKitError};
use crate::types::{Denomination, Lamports, SolanaChain};

//=============================================================================
// Quantity conversion
//=============================================================================

/// Parse a user-entered quantity into exact smallest units.
///
/// Only plain non-negative decimal literals are accepted: no sign, no
/// exponent, at most one decimal point, and no decimal point at all for
/// integer denominations. Fractional digits beyond the denomination's
/// precision are truncated. Surrounding whitespace is ignored.
///
/// The digits are shifted as text and parsed once, so no floating point
/// value ever exists and long inputs do not pick up rounding errors.
pub fn parse_base_units(input: &str, denomination: Denomination) -> Result<Lamports> {
    let invalid =
        || WalletKitError::input_invalid(format!("Could not parse token quantity: {}", input));

    let trimmed = input.trim();
    let decimals = denomination.decimals() as usize;

    let (whole, fraction) = match trimmed.split_once('.') {
        Some(_) if decimals == 0 => return Err(invalid()),
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let mut digits = String::with_capacity(whole.len() + decimals);
    digits.push_str(whole);
    digits.extend(fraction.chars().take(decimals));
    for _ in fraction.len().min(decimals)..decimals {
        digits.push('0');
    }

    digits.parse::<u64>().map(Lamports).map_err(|_| {
        WalletKitError::input_invalid(format!("Token quantity is too large: {}", input))
    })
}

/// Format an amount for display. Trailing fractional zeros are dropped.
pub fn format_base_units(amount: Lamports, denomination: Denomination) -> String {
    let decimals = denomination.decimals();
    if decimals == 0 {
        return amount.0.to_string();
    }

    let base = 10u64.pow(decimals);
    let whole = amount.0 / base;
    let fraction = amount.0 % base;
    if fraction == 0 {
        return whole.to_string();
    }

    let fraction = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Parse a quantity of SOL into lamports
pub fn sol_to_lamports(input: &str) -> Result<Lamports> {
    parse_base_units(input, Denomination::Sol)
}

/// Parse a quantity already expressed in lamports
pub fn parse_lamports(input: &str) -> Result<Lamports> {
    parse_base_units(input, Denomination::Lamports)
}

pub fn lamports_to_sol_string(amount: Lamports) -> String {
    format_base_units(amount, Denomination::Sol)
}

//=============================================================================
// Base-58 helpers
//=============================================================================

pub fn parse_address(input: &str) -> Result<Pubkey> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(WalletKitError::input_invalid(
            "Please enter a recipient address",
        ));
    }
    Pubkey::from_str(trimmed)
        .map_err(|_| WalletKitError::input_invalid(format!("Invalid address: {}", trimmed)))
}

pub fn signature_from_base58(input: &str) -> Result<Signature> {
    Signature::from_str(input.trim())
        .map_err(|_| WalletKitError::input_invalid(format!("Invalid signature: {}", input)))
}

pub fn signature_to_base58(signature: &Signature) -> String {
    signature.to_string()
}

//=============================================================================
// Explorer links
//=============================================================================

pub fn explorer_transaction_link(signature: &Signature, chain: SolanaChain) -> String {
    format!(
        "{}/tx/{}?cluster={}",
        EXPLORER_URL,
        signature,
        chain.explorer_cluster()
    )
}

pub fn explorer_address_link(address: &Pubkey, chain: SolanaChain) -> String {
    format!(
        "{}/address/{}?cluster={}",
        EXPLORER_URL,
        address,
        chain.explorer_cluster()
    )
}
