use std::sync::Arc;

use tracing::info;

use crate::{
    client::{ClusterClient, MintService},
    core::{token_program_id, SdkError, SdkResult},
    instructions::{
        close_account_instruction, create_token_account_instruction, mint_to_instruction,
        token_account_address, transfer_with_fee_instruction,
    },
    prelude::*,
    protocol::{quote_transfer, unpack_token_account, TokenAccountView, TransferQuote},
};

/// A confirmed fee-bearing transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    pub signature: Signature,
    pub quote: TransferQuote,
}

/// Service for token accounts, minting and fee-bearing transfers
pub struct TokenService {
    cluster: Arc<dyn ClusterClient>,
    mints: MintService,
}

impl TokenService {
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self {
            mints: MintService::new(cluster.clone()),
            cluster,
        }
    }

    /// Create the associated token account of `owner` for `mint`
    ///
    /// Existing accounts are left as they are.
    pub async fn create_account(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> SdkResult<(Pubkey, Signature)> {
        let address = token_account_address(owner, mint);
        let instruction = create_token_account_instruction(&payer.pubkey(), owner, mint);
        let signature = self
            .cluster
            .send_and_confirm(&[instruction], payer, &[])
            .await?;

        info!(%address, %owner, %mint, %signature, "created token account");
        Ok((address, signature))
    }

    pub async fn mint_to(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        mint_authority: &Keypair,
        amount: u64,
    ) -> SdkResult<Signature> {
        let view = self.mints.fetch(mint).await?;
        if view.mint_authority != Some(mint_authority.pubkey()) {
            return Err(SdkError::Unauthorized(format!(
                "{} is not the mint authority of {}",
                mint_authority.pubkey(),
                mint
            )));
        }

        let instruction =
            mint_to_instruction(mint, destination, &mint_authority.pubkey(), amount)?;
        let signature = self
            .cluster
            .send_and_confirm(&[instruction], payer, &[mint_authority])
            .await?;

        info!(%mint, %destination, amount, %signature, "minted");
        Ok(signature)
    }

    /// Close an empty token account, returning its rent to `destination`
    ///
    /// Accounts still holding tokens or withheld fees cannot close.
    pub async fn close_account(
        &self,
        payer: &Keypair,
        account: &Pubkey,
        destination: &Pubkey,
        owner: &Keypair,
    ) -> SdkResult<Signature> {
        let view = self.fetch(account).await?;
        if view.owner != owner.pubkey() {
            return Err(SdkError::Unauthorized(format!(
                "{} does not own {}",
                owner.pubkey(),
                account
            )));
        }
        if view.amount != 0 || view.withheld() != 0 {
            return Err(SdkError::InvalidParameters(format!(
                "account {} still holds {} tokens and {} withheld",
                account,
                view.amount,
                view.withheld()
            )));
        }

        let instruction = close_account_instruction(account, destination, &owner.pubkey())?;
        let signature = self
            .cluster
            .send_and_confirm(&[instruction], payer, &[owner])
            .await?;

        info!(%account, %destination, %signature, "closed token account");
        Ok(signature)
    }

    pub async fn fetch(&self, account: &Pubkey) -> SdkResult<TokenAccountView> {
        let data = self
            .cluster
            .get_account(account)
            .await?
            .ok_or(SdkError::AccountNotFound(*account))?;
        if data.owner != token_program_id() {
            return Err(SdkError::deserialization(
                account,
                format!("owned by {}, not the token program", data.owner),
            ));
        }
        unpack_token_account(account, &data.data)
    }

    /// Expected fee and net amount for a transfer of `gross` at the current epoch
    pub async fn quote(&self, mint: &Pubkey, gross: u64) -> SdkResult<TransferQuote> {
        let view = self.mints.fetch(mint).await?;
        let epoch = self.cluster.current_epoch().await?;
        quote_transfer(&view, epoch, gross)
    }

    /// Transfer `gross` tokens, stating the fee the mint will withhold
    ///
    /// All checks run before anything is submitted.
    pub async fn transfer_with_fee(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        source: &Pubkey,
        destination: &Pubkey,
        owner: &Keypair,
        gross: u64,
    ) -> SdkResult<TransferReceipt> {
        let view = self.mints.fetch(mint).await?;
        let epoch = self.cluster.current_epoch().await?;
        let quote = quote_transfer(&view, epoch, gross)?;

        let from = self.fetch(source).await?;
        if from.mint != *mint {
            return Err(SdkError::InvalidParameters(format!(
                "source {} belongs to mint {}",
                source, from.mint
            )));
        }
        if from.owner != owner.pubkey() {
            return Err(SdkError::Unauthorized(format!(
                "{} does not own {}",
                owner.pubkey(),
                source
            )));
        }
        if from.amount < gross {
            return Err(SdkError::InvalidParameters(format!(
                "source {} holds {}, transfer needs {}",
                source, from.amount, gross
            )));
        }

        let instruction = transfer_with_fee_instruction(
            source,
            mint,
            destination,
            &owner.pubkey(),
            view.decimals,
            &quote,
        )?;
        let signature = self
            .cluster
            .send_and_confirm(&[instruction], payer, &[owner])
            .await?;

        info!(
            %source,
            %destination,
            gross = quote.gross(),
            fee = quote.fee(),
            net = quote.net(),
            %signature,
            "transferred with fee"
        );
        Ok(TransferReceipt { signature, quote })
    }
}
