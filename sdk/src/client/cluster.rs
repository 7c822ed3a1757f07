//! Boundary between the services and a running cluster

use async_trait::async_trait;
use solana_sdk::{account::Account, instruction::Instruction};

use crate::core::SdkResult;
use crate::prelude::*;

/// Everything the services need from a cluster
///
/// `send_and_confirm` returns only once the transaction reached the client's
/// commitment level. A program rejection surfaces as
/// `SdkError::TransactionRejected`; an unobservable outcome surfaces as
/// `SdkError::ConfirmationFailed` after the implementation gave up retrying.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> SdkResult<u64>;

    /// Submit `instructions` as one transaction paid by `payer`
    ///
    /// `signers` lists additional keys; the payer is always included.
    async fn send_and_confirm(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
    ) -> SdkResult<Signature>;

    async fn get_account(&self, address: &Pubkey) -> SdkResult<Option<Account>>;

    /// Accounts owned by `program` whose first 32 bytes equal `mint`
    async fn get_token_accounts_by_mint(
        &self,
        program: &Pubkey,
        mint: &Pubkey,
    ) -> SdkResult<Vec<(Pubkey, Account)>>;

    async fn get_balance(&self, address: &Pubkey) -> SdkResult<u64>;

    /// Request lamports and wait for them to land
    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> SdkResult<Signature>;

    async fn current_epoch(&self) -> SdkResult<u64>;
}

/// Payer first, then every other signer once
pub(crate) fn signer_set<'a>(payer: &'a Keypair, signers: &[&'a Keypair]) -> Vec<&'a Keypair> {
    let mut all = vec![payer];
    for signer in signers {
        if !all.iter().any(|s| s.pubkey() == signer.pubkey()) {
            all.push(signer);
        }
    }
    all
}
