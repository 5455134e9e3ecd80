use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;

use crate::types::Lamports;

/// System-program transfer of native lamports from `source` to `destination`
#[allow(deprecated)]
pub fn transfer(source: &Pubkey, destination: &Pubkey, amount: Lamports) -> Instruction {
    solana_sdk::system_instruction::transfer(source, destination, amount.get())
}
