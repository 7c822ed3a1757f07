// Withdraw and harvest withheld fees

use anyhow::{Context, Result};
use clap::Args;
use withheld_sdk::{instructions::token_account_address, prelude::*, CollectionPath, SdkError};

use super::utils::{load_keypair, parse_pubkey, success, warn};
use super::CliContext;

#[derive(Args)]
pub struct CollectCmd {
    /// Mint address
    #[arg(long)]
    mint: String,

    /// withdraw (accounts -> destination) or harvest (accounts -> mint -> destination)
    #[arg(long, default_value = "withdraw")]
    path: CollectionPath,

    /// Only drain fees already harvested into the mint
    #[arg(long, conflicts_with = "path")]
    mint_pool: bool,

    /// Token account receiving the fees (defaults to the payer's account)
    #[arg(long)]
    destination: Option<String>,

    /// Keypair file of the withdraw withheld authority (defaults to the payer)
    #[arg(long)]
    authority: Option<String>,
}

pub async fn execute(cmd: CollectCmd, ctx: &CliContext) -> Result<()> {
    let mint = parse_pubkey(&cmd.mint)?;
    let payer = ctx.funded_payer().await?;
    let destination = match cmd.destination {
        Some(destination) => parse_pubkey(&destination)?,
        None => token_account_address(&payer.pubkey(), &mint),
    };

    let authority = match &cmd.authority {
        Some(path) => Some(load_keypair(path)?),
        None => None,
    };
    let collector = ctx
        .client
        .collector(mint, &payer, Some(authority.as_ref().unwrap_or(&payer)))
        .with_batch_size(ctx.config.flow.sources_per_transaction);

    let result = if cmd.mint_pool {
        collector.drain_mint(&destination).await.map(|r| vec![r])
    } else {
        collector.collect(cmd.path, &destination).await
    };
    let receipts = match result {
        Err(SdkError::NothingToCollect(reason)) => {
            warn(&reason);
            return Ok(());
        }
        other => other.context("Collection failed")?,
    };

    for receipt in receipts {
        success(&format!(
            "{}: {} from {} account(s)",
            receipt.kind,
            receipt.amount,
            receipt.sources.len()
        ));
        for signature in &receipt.signatures {
            println!("  {}", ctx.explorer_url(signature));
        }
    }
    Ok(())
}
