use std::sync::Arc;

use tracing::info;

use crate::{
    client::ClusterClient,
    core::{token_program_id, SdkError, SdkResult},
    instructions::{close_mint_instruction, create_mint_instructions, MintSpec},
    prelude::*,
    protocol::{unpack_mint, MintView},
};

/// Service for mint creation, inspection and closing
pub struct MintService {
    cluster: Arc<dyn ClusterClient>,
}

impl MintService {
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self { cluster }
    }

    /// Create `mint` with the extensions in `spec` in a single transaction
    pub async fn create_mint(
        &self,
        payer: &Keypair,
        mint: &Keypair,
        spec: &MintSpec,
    ) -> SdkResult<Signature> {
        spec.validate()?;
        let space = spec.account_len()?;
        let lamports = self
            .cluster
            .minimum_balance_for_rent_exemption(space)
            .await?;

        let instructions =
            create_mint_instructions(&payer.pubkey(), &mint.pubkey(), lamports, spec)?;
        let signature = self
            .cluster
            .send_and_confirm(&instructions, payer, &[mint])
            .await?;

        info!(
            mint = %mint.pubkey(),
            %signature,
            decimals = spec.decimals,
            space,
            "created mint"
        );
        Ok(signature)
    }

    pub async fn fetch(&self, mint: &Pubkey) -> SdkResult<MintView> {
        let account = self
            .cluster
            .get_account(mint)
            .await?
            .ok_or(SdkError::AccountNotFound(*mint))?;
        if account.owner != token_program_id() {
            return Err(SdkError::deserialization(
                mint,
                format!("owned by {}, not the token program", account.owner),
            ));
        }
        unpack_mint(mint, &account.data)
    }

    /// Close a zero-supply mint, returning its rent to `destination`
    pub async fn close(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        close_authority: &Keypair,
    ) -> SdkResult<Signature> {
        let view = self.fetch(mint).await?;
        match view.close_authority {
            Some(authority) if authority == close_authority.pubkey() => {}
            Some(authority) => {
                return Err(SdkError::Unauthorized(format!(
                    "{} is not the close authority of {} ({})",
                    close_authority.pubkey(),
                    mint,
                    authority
                )))
            }
            None => {
                return Err(SdkError::InvalidParameters(format!(
                    "mint {} has no close authority",
                    mint
                )))
            }
        }
        if view.supply != 0 {
            return Err(SdkError::InvalidParameters(format!(
                "mint {} still has supply {}",
                mint, view.supply
            )));
        }

        let instruction = close_mint_instruction(mint, destination, &close_authority.pubkey())?;
        let signature = self
            .cluster
            .send_and_confirm(&[instruction], payer, &[close_authority])
            .await?;

        info!(%mint, %destination, %signature, "closed mint");
        Ok(signature)
    }
}
