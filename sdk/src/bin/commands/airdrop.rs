// Devnet and localnet funding

use anyhow::{Context, Result};
use clap::Args;
use withheld_sdk::prelude::*;

use super::utils::{parse_pubkey, success};
use super::CliContext;

#[derive(Args)]
pub struct AirdropCmd {
    /// Lamports to request (defaults to the configured airdrop size)
    #[arg(long)]
    lamports: Option<u64>,

    /// Receiving address (defaults to the payer)
    #[arg(long)]
    to: Option<String>,
}

pub async fn execute(cmd: AirdropCmd, ctx: &CliContext) -> Result<()> {
    let address = match cmd.to {
        Some(to) => parse_pubkey(&to)?,
        None => ctx
            .wallets
            .get_or_create(&ctx.config.wallet.payer)
            .context("Failed to load payer keypair")?
            .pubkey(),
    };
    let lamports = cmd.lamports.unwrap_or(ctx.config.wallet.airdrop_lamports);

    let signature = ctx
        .client
        .cluster
        .request_airdrop(&address, lamports)
        .await
        .context("Airdrop failed")?;
    let balance = ctx.client.cluster.get_balance(&address).await?;

    success(&format!("Airdropped {} lamports to {} (balance {})", lamports, address, balance));
    println!("  {}", ctx.explorer_url(&signature));
    Ok(())
}
