use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;

use crate::advanced::instructions;
use crate::types::Lamports;

/// Unsigned transaction paid for by `fee_payer`, stamped with `recent_blockhash`.
pub fn unsigned_transaction(
    instructions: &[Instruction],
    fee_payer: &Pubkey,
    recent_blockhash: Hash,
) -> Transaction {
    let mut message = Message::new(instructions, Some(fee_payer));
    message.recent_blockhash = recent_blockhash;
    Transaction::new_unsigned(message)
}

/// Single-instruction native transfer where the sender also pays the fee.
pub fn transfer_transaction(
    source: &Pubkey,
    destination: &Pubkey,
    amount: Lamports,
    recent_blockhash: Hash,
) -> Transaction {
    let ix = instructions::transfer(source, destination, amount);
    unsigned_transaction(&[ix], source, recent_blockhash)
}
