//! Discovery of token accounts holding withheld fees

use std::sync::Arc;

use tracing::debug;

use crate::{
    client::{ClusterClient, MintService},
    core::{token_program_id, SdkError, SdkResult, WithheldAccount, WithheldSnapshot},
    prelude::*,
    protocol::unpack_token_account,
};

pub struct DiscoveryService {
    cluster: Arc<dyn ClusterClient>,
    mints: MintService,
}

impl DiscoveryService {
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self {
            mints: MintService::new(cluster.clone()),
            cluster,
        }
    }

    /// Token accounts of `mint` with a non-zero withheld balance, by address
    ///
    /// Any account that fails to unpack aborts the pass.
    pub async fn find_withheld(&self, mint: &Pubkey) -> SdkResult<Vec<WithheldAccount>> {
        let accounts = self
            .cluster
            .get_token_accounts_by_mint(&token_program_id(), mint)
            .await?;
        let scanned = accounts.len();

        let mut withheld = Vec::new();
        for (address, account) in accounts {
            let view = unpack_token_account(&address, &account.data)?;
            if view.mint != *mint {
                return Err(SdkError::deserialization(
                    &address,
                    format!("belongs to mint {}, expected {}", view.mint, mint),
                ));
            }
            if view.withheld() > 0 {
                debug!(%address, withheld = view.withheld(), "withheld fees found");
                withheld.push(WithheldAccount {
                    address,
                    owner: view.owner,
                    withheld_amount: view.withheld(),
                });
            }
        }
        withheld.sort_by_key(|account| account.address);

        debug!(%mint, scanned, holding = withheld.len(), "discovery pass complete");
        Ok(withheld)
    }

    /// Withheld fees in token accounts and in the mint pool
    pub async fn snapshot(&self, mint: &Pubkey) -> SdkResult<WithheldSnapshot> {
        let accounts = self.find_withheld(mint).await?;
        let mint_pool = self.mints.fetch(mint).await?.withheld_amount();
        Ok(WithheldSnapshot {
            accounts,
            mint_pool,
        })
    }

    pub async fn total_withheld(&self, mint: &Pubkey) -> SdkResult<u128> {
        Ok(self.snapshot(mint).await?.total())
    }
}
