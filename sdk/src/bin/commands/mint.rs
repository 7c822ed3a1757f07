// Mint creation and closing

use anyhow::{Context, Result};
use clap::Args;
use withheld_sdk::{instructions::MintSpec, prelude::*, TransferFeeParams};

use super::utils::{info, parse_pubkey, success};
use super::CliContext;

#[derive(Args)]
pub struct CreateMintCmd {
    /// Decimals (overrides config)
    #[arg(long)]
    decimals: Option<u8>,

    /// Transfer fee in basis points (overrides config)
    #[arg(long)]
    fee_bps: Option<u16>,

    /// Maximum fee per transfer in raw units (overrides config)
    #[arg(long)]
    max_fee: Option<u64>,

    /// Install the payer as close authority
    #[arg(long)]
    close_authority: bool,
}

#[derive(Args)]
pub struct CloseMintCmd {
    /// Mint address
    #[arg(long)]
    mint: String,

    /// Receiver of the reclaimed rent (defaults to the payer)
    #[arg(long)]
    destination: Option<String>,
}

pub async fn create(cmd: CreateMintCmd, ctx: &CliContext) -> Result<()> {
    let defaults = &ctx.config.mint;
    let fee = TransferFeeParams::new(
        cmd.fee_bps.unwrap_or(defaults.transfer_fee_basis_points),
        cmd.max_fee.unwrap_or(defaults.maximum_fee),
    )?;

    let payer = ctx.funded_payer().await?;
    let mint = Keypair::new();
    let mut spec = MintSpec::new(cmd.decimals.unwrap_or(defaults.decimals), payer.pubkey())
        .with_transfer_fee(Some(payer.pubkey()), Some(payer.pubkey()), fee);
    if cmd.close_authority || defaults.close_authority {
        spec = spec.with_close_authority(payer.pubkey());
    }

    info(&format!("Creating mint {}", mint.pubkey()));
    let signature = ctx
        .client
        .mint
        .create_mint(&payer, &mint, &spec)
        .await
        .context("Failed to create mint")?;

    success(&format!(
        "Created mint {} ({} bps, max fee {})",
        mint.pubkey(),
        fee.basis_points,
        fee.maximum_fee
    ));
    println!("  {}", ctx.explorer_url(&signature));
    Ok(())
}

pub async fn close(cmd: CloseMintCmd, ctx: &CliContext) -> Result<()> {
    let mint = parse_pubkey(&cmd.mint)?;
    let payer = ctx.funded_payer().await?;
    let destination = match cmd.destination {
        Some(destination) => parse_pubkey(&destination)?,
        None => payer.pubkey(),
    };

    let signature = ctx
        .client
        .mint
        .close(&payer, &mint, &destination, &payer)
        .await
        .context("Failed to close mint")?;

    success(&format!("Closed mint {}", mint));
    println!("  {}", ctx.explorer_url(&signature));
    Ok(())
}
