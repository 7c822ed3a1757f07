//! Withheld-fee state machine for a single mint
//!
//! Per token account:
//!   0 --transfer--> N --withdraw-from-accounts--> 0
//!   0 --transfer--> N --harvest-to-mint--> 0   (pool += N)
//! Mint pool:
//!   0 --harvest--> M --withdraw-from-mint--> 0
//!
//! Value only moves between balances, withheld accumulators and the pool; a
//! drained accumulator moves zero on a second collection.

use std::collections::BTreeMap;

use withheld_math::safe_add_u128;

use crate::core::{SdkError, SdkResult};
use crate::prelude::*;

/// Balance and withheld accumulator of one token account
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerAccount {
    pub owner: Pubkey,
    pub balance: u64,
    pub withheld: u64,
}

#[derive(Clone, Debug, Default)]
pub struct WithheldLedger {
    accounts: BTreeMap<Pubkey, LedgerAccount>,
    pool: u64,
}

impl WithheldLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_account(&mut self, address: Pubkey, owner: Pubkey) {
        self.accounts.entry(address).or_insert(LedgerAccount {
            owner,
            ..LedgerAccount::default()
        });
    }

    /// Remove an account; only empty accounts may close
    pub fn close_account(&mut self, address: &Pubkey) -> SdkResult<LedgerAccount> {
        let account = self.account(address)?;
        if account.balance != 0 || account.withheld != 0 {
            return Err(SdkError::TransactionRejected(format!(
                "account {} still holds {} tokens and {} withheld",
                address, account.balance, account.withheld
            )));
        }
        self.accounts
            .remove(address)
            .ok_or(SdkError::AccountNotFound(*address))
    }

    pub fn account(&self, address: &Pubkey) -> SdkResult<LedgerAccount> {
        self.accounts
            .get(address)
            .copied()
            .ok_or(SdkError::AccountNotFound(*address))
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Pubkey, &LedgerAccount)> {
        self.accounts.iter()
    }

    pub fn pool(&self) -> u64 {
        self.pool
    }

    pub fn mint(&mut self, destination: &Pubkey, amount: u64) -> SdkResult<()> {
        let account = self.account_mut(destination)?;
        account.balance = checked_credit(account.balance, amount)?;
        Ok(())
    }

    /// Move `gross` from source, deliver `gross - fee`, withhold `fee` at destination
    pub fn transfer(
        &mut self,
        source: &Pubkey,
        destination: &Pubkey,
        gross: u64,
        fee: u64,
    ) -> SdkResult<()> {
        if fee > gross {
            return Err(SdkError::InvalidParameters(format!(
                "fee {} exceeds transfer amount {}",
                fee, gross
            )));
        }
        // validate both sides before mutating
        let from = self.account(source)?;
        let to = self.account(destination)?;
        if from.balance < gross {
            return Err(SdkError::TransactionRejected(format!(
                "insufficient funds: {} holds {}, transfer needs {}",
                source, from.balance, gross
            )));
        }
        let net = gross - fee;
        if source != destination {
            checked_credit(to.balance, net)?;
        }
        checked_credit(to.withheld, fee)?;

        self.account_mut(source)?.balance -= gross;
        let to = self.account_mut(destination)?;
        to.balance += net;
        to.withheld += fee;
        Ok(())
    }

    /// Drain each source's withheld fees into the destination balance
    pub fn withdraw_from_accounts(
        &mut self,
        sources: &[Pubkey],
        destination: &Pubkey,
    ) -> SdkResult<u64> {
        self.account(destination)?;
        let moved = self.drain(sources)?;
        let to = self.account_mut(destination)?;
        to.balance = checked_credit(to.balance, moved)?;
        Ok(moved)
    }

    /// Drain each source's withheld fees into the mint pool
    pub fn harvest_to_mint(&mut self, sources: &[Pubkey]) -> SdkResult<u64> {
        let moved = self.drain(sources)?;
        self.pool = checked_credit(self.pool, moved)?;
        Ok(moved)
    }

    /// Drain the mint pool into the destination balance
    pub fn withdraw_from_mint(&mut self, destination: &Pubkey) -> SdkResult<u64> {
        let moved = self.pool;
        let to = self.account_mut(destination)?;
        to.balance = checked_credit(to.balance, moved)?;
        self.pool = 0;
        Ok(moved)
    }

    /// Withheld fees across all accounts plus the mint pool
    pub fn total_withheld(&self) -> u128 {
        self.accounts
            .values()
            .map(|a| u128::from(a.withheld))
            .sum::<u128>()
            + u128::from(self.pool)
    }

    /// Token balances plus everything withheld
    pub fn total_value(&self) -> u128 {
        self.accounts
            .values()
            .map(|a| u128::from(a.balance))
            .sum::<u128>()
            + self.total_withheld()
    }

    fn drain(&mut self, sources: &[Pubkey]) -> SdkResult<u64> {
        for source in sources {
            self.account(source)?;
        }
        let mut moved = 0u128;
        for source in sources {
            let account = self.account_mut(source)?;
            moved = safe_add_u128(moved, u128::from(account.withheld))?;
            account.withheld = 0;
        }
        Ok(withheld_math::to_amount(moved)?)
    }

    fn account_mut(&mut self, address: &Pubkey) -> SdkResult<&mut LedgerAccount> {
        self.accounts
            .get_mut(address)
            .ok_or(SdkError::AccountNotFound(*address))
    }
}

fn checked_credit(current: u64, amount: u64) -> SdkResult<u64> {
    current.checked_add(amount).ok_or_else(|| {
        SdkError::TransactionRejected(format!("overflow crediting {} to {}", amount, current))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (WithheldLedger, Pubkey, Pubkey) {
        let mut ledger = WithheldLedger::new();
        let source = Pubkey::new_unique();
        let destination = Pubkey::new_unique();
        ledger.open_account(source, Pubkey::new_unique());
        ledger.open_account(destination, Pubkey::new_unique());
        ledger.mint(&source, 1_000_000_000).unwrap();
        (ledger, source, destination)
    }

    #[test]
    fn test_transfer_withholds_at_destination() {
        let (mut ledger, source, destination) = setup();
        ledger.transfer(&source, &destination, 1_000_000, 5_000).unwrap();

        let to = ledger.account(&destination).unwrap();
        assert_eq!(to.balance, 995_000);
        assert_eq!(to.withheld, 5_000);
        assert_eq!(ledger.account(&source).unwrap().balance, 999_000_000);
    }

    #[test]
    fn test_withheld_accumulates() {
        let (mut ledger, source, destination) = setup();
        ledger.transfer(&source, &destination, 1_000_000, 5_000).unwrap();
        ledger.transfer(&source, &destination, 1_000_000, 5_000).unwrap();
        assert_eq!(ledger.account(&destination).unwrap().withheld, 10_000);
    }

    #[test]
    fn test_harvest_then_withdraw_does_not_double_credit() {
        let (mut ledger, source, destination) = setup();
        ledger.transfer(&source, &destination, 1_000_000, 5_000).unwrap();

        assert_eq!(ledger.harvest_to_mint(&[destination]).unwrap(), 5_000);
        assert_eq!(ledger.pool(), 5_000);
        assert_eq!(ledger.withdraw_from_mint(&destination).unwrap(), 5_000);
        assert_eq!(ledger.pool(), 0);

        // already drained by the harvest
        assert_eq!(ledger.withdraw_from_accounts(&[destination], &destination).unwrap(), 0);
        assert_eq!(ledger.account(&destination).unwrap().balance, 1_000_000);
    }

    #[test]
    fn test_insufficient_funds_leaves_state_untouched() {
        let (mut ledger, source, destination) = setup();
        let before = ledger.total_value();
        assert!(ledger.transfer(&destination, &source, 1, 0).is_err());
        assert_eq!(ledger.total_value(), before);
    }

    #[test]
    fn test_close_requires_empty_account() {
        let (mut ledger, source, destination) = setup();
        ledger.transfer(&source, &destination, 1_000_000, 5_000).unwrap();
        assert!(ledger.close_account(&destination).is_err());
    }
}
