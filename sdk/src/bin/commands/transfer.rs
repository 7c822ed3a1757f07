// Fee-bearing transfers

use anyhow::{Context, Result};
use clap::Args;
use withheld_sdk::{instructions::token_account_address, prelude::*};

use super::utils::{format_amount, info, parse_pubkey, success};
use super::CliContext;

#[derive(Args)]
pub struct TransferCmd {
    /// Mint address
    #[arg(long)]
    mint: String,

    /// Raw amount to send; the fee comes out of it
    #[arg(long)]
    amount: u64,

    /// Receiving wallet (defaults to the configured recipient)
    #[arg(long)]
    to: Option<String>,
}

pub async fn execute(cmd: TransferCmd, ctx: &CliContext) -> Result<()> {
    let mint = parse_pubkey(&cmd.mint)?;
    let payer = ctx.funded_payer().await?;
    let owner = match cmd.to {
        Some(to) => parse_pubkey(&to)?,
        None => ctx.recipient()?.pubkey(),
    };

    let source = token_account_address(&payer.pubkey(), &mint);
    let (destination, _) = ctx
        .client
        .tokens
        .create_account(&payer, &mint, &owner)
        .await
        .context("Failed to create destination account")?;

    let quote = ctx.client.tokens.quote(&mint, cmd.amount).await?;
    let decimals = ctx.client.mint.fetch(&mint).await?.decimals;
    info(&format!(
        "Sending {} with fee {} (net {})",
        format_amount(quote.gross(), decimals),
        format_amount(quote.fee(), decimals),
        format_amount(quote.net(), decimals)
    ));

    let receipt = ctx
        .client
        .tokens
        .transfer_with_fee(&payer, &mint, &source, &destination, &payer, cmd.amount)
        .await
        .context("Transfer failed")?;

    success(&format!(
        "Transferred {} to {}, {} withheld",
        receipt.quote.net(),
        destination,
        receipt.quote.fee()
    ));
    println!("  {}", ctx.explorer_url(&receipt.signature));
    Ok(())
}
