// Withheld fee discovery

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use super::utils::{info, parse_pubkey};
use super::CliContext;

#[derive(Args)]
pub struct DiscoverCmd {
    /// Mint address
    #[arg(long)]
    mint: String,

    /// Print the snapshot as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(cmd: DiscoverCmd, ctx: &CliContext) -> Result<()> {
    let mint = parse_pubkey(&cmd.mint)?;
    let snapshot = ctx
        .client
        .discovery
        .snapshot(&mint)
        .await
        .context("Discovery failed")?;

    if cmd.json {
        let accounts: Vec<_> = snapshot
            .accounts
            .iter()
            .map(|account| {
                json!({
                    "address": account.address.to_string(),
                    "owner": account.owner.to_string(),
                    "withheld": account.withheld_amount,
                })
            })
            .collect();
        let output = json!({
            "mint": mint.to_string(),
            "accounts": accounts,
            "mint_pool": snapshot.mint_pool,
            "total": snapshot.total().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if snapshot.accounts.is_empty() {
        info("No token account holds withheld fees");
    }
    for account in &snapshot.accounts {
        println!(
            "{}  owner {}  withheld {}",
            account.address, account.owner, account.withheld_amount
        );
    }
    println!("Mint pool: {}", snapshot.mint_pool);
    println!("Total withheld: {}", snapshot.total());
    Ok(())
}
