// Command modules for the withheld CLI

pub mod airdrop;
pub mod collect;
pub mod demo;
pub mod discover;
pub mod mint;
pub mod quote;
pub mod transfer;
pub mod utils;

use anyhow::{Context, Result};
use withheld_sdk::{config::WithheldConfig, ensure_funded, prelude::*, FeeClient, WalletStore};

/// Config, client and wallets shared by every cluster-facing command
pub struct CliContext {
    pub config: WithheldConfig,
    pub client: FeeClient,
    pub wallets: WalletStore,
}

impl CliContext {
    pub fn new(config: WithheldConfig) -> Result<Self> {
        let client = FeeClient::from_config(&config).context("Failed to build cluster client")?;
        let wallets = WalletStore::new(config.wallet.dir.clone());
        Ok(Self {
            config,
            client,
            wallets,
        })
    }

    /// Payer keypair, airdropped to when its balance is below the threshold
    pub async fn funded_payer(&self) -> Result<Keypair> {
        let payer = self
            .wallets
            .get_or_create(&self.config.wallet.payer)
            .context("Failed to load payer keypair")?;
        let balance = ensure_funded(
            self.client.cluster.as_ref(),
            &payer.pubkey(),
            self.config.wallet.min_balance_lamports,
            self.config.wallet.airdrop_lamports,
        )
        .await
        .context("Failed to fund payer")?;
        utils::info(&format!("Payer {} holds {} lamports", payer.pubkey(), balance));
        Ok(payer)
    }

    pub fn recipient(&self) -> Result<Keypair> {
        self.wallets
            .get_or_create(&self.config.wallet.recipient)
            .context("Failed to load recipient keypair")
    }

    pub fn explorer_url(&self, signature: &Signature) -> String {
        utils::explorer_url(&self.config.cluster, signature)
    }
}
