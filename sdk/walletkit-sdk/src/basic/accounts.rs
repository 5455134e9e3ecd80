use crate::basic::transfer::Recipient;
use crate::error::{Result, WalletKitError};
use crate::types::{SolanaChain, WalletAccount};

/// Accounts of every connected wallet, used to pick transfer recipients
#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    accounts: Vec<WalletAccount>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an account, keyed by its storage key
    pub fn insert(&mut self, account: WalletAccount) {
        let key = account.storage_key();
        match self.accounts.iter_mut().find(|a| a.storage_key() == key) {
            Some(existing) => *existing = account,
            None => self.accounts.push(account),
        }
    }

    pub fn remove_wallet(&mut self, wallet_name: &str) {
        self.accounts.retain(|a| a.wallet_name != wallet_name);
    }

    pub fn accounts(&self) -> &[WalletAccount] {
        &self.accounts
    }

    /// Accounts that can receive on `chain`
    pub fn accounts_for_chain(&self, chain: SolanaChain) -> impl Iterator<Item = &WalletAccount> {
        self.accounts.iter().filter(move |a| a.supports_chain(chain))
    }

    pub fn find(&self, storage_key: &str) -> Option<&WalletAccount> {
        self.accounts.iter().find(|a| a.storage_key() == storage_key)
    }

    /// Resolve the recipient picked in the UI
    pub fn resolve_recipient(&self, storage_key: Option<&str>) -> Result<Recipient> {
        storage_key
            .and_then(|key| self.find(key))
            .cloned()
            .map(Recipient::Account)
            .ok_or_else(|| {
                WalletKitError::input_invalid("The address of the recipient could not be found")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey::Pubkey;

    fn directory() -> (AccountDirectory, WalletAccount, WalletAccount) {
        let devnet = WalletAccount::new("Phantom", Pubkey::new_unique()).with_chain(SolanaChain::Devnet);
        let mainnet =
            WalletAccount::new("Backpack", Pubkey::new_unique()).with_chain(SolanaChain::Mainnet);
        let mut dir = AccountDirectory::new();
        dir.insert(devnet.clone());
        dir.insert(mainnet.clone());
        (dir, devnet, mainnet)
    }

    #[test]
    fn test_accounts_are_filtered_by_chain() {
        let (dir, devnet, _) = directory();
        let found: Vec<_> = dir.accounts_for_chain(SolanaChain::Devnet).collect();
        assert_eq!(found, vec![&devnet]);
    }

    #[test]
    fn test_recipient_resolution() {
        let (dir, _, mainnet) = directory();
        assert_eq!(
            dir.resolve_recipient(Some(&mainnet.storage_key())).unwrap(),
            Recipient::Account(mainnet)
        );
        assert_eq!(
            dir.resolve_recipient(None).unwrap_err(),
            WalletKitError::input_invalid("The address of the recipient could not be found")
        );
    }

    #[test]
    fn test_insert_replaces_same_account() {
        let (mut dir, devnet, _) = directory();
        dir.insert(devnet.clone().with_label("main"));
        assert_eq!(dir.accounts().len(), 2);
        assert_eq!(dir.find(&devnet.storage_key()).unwrap().label.as_deref(), Some("main"));

        dir.remove_wallet("Phantom");
        assert!(dir.find(&devnet.storage_key()).is_none());
    }
}
