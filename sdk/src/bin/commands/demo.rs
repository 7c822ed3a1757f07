// End-to-end transfer fee lifecycle

use anyhow::{Context, Result};
use clap::Args;
use withheld_sdk::{prelude::*, CollectionPath, LifecyclePlan};

use super::utils::{format_amount, info, success};
use super::CliContext;

#[derive(Args)]
pub struct DemoCmd {
    /// Transfers per collection cycle (overrides config)
    #[arg(long)]
    transfers: Option<u32>,

    /// Collection path of each cycle, e.g. `--cycle withdraw --cycle harvest`
    #[arg(long = "cycle")]
    cycles: Vec<CollectionPath>,
}

pub async fn execute(cmd: DemoCmd, ctx: &CliContext) -> Result<()> {
    let mut config = ctx.config.clone();
    if let Some(transfers) = cmd.transfers {
        config.flow.transfers = transfers;
    }
    if !cmd.cycles.is_empty() {
        config.flow.cycles = cmd.cycles;
    }
    let plan = LifecyclePlan::from_config(&config)?;

    let payer = ctx.funded_payer().await?;
    let recipient = ctx.recipient()?;
    let mint = Keypair::new();
    info(&format!(
        "Running lifecycle for mint {} ({} bps, max fee {})",
        mint.pubkey(),
        plan.fee.basis_points,
        plan.fee.maximum_fee
    ));

    let report = ctx
        .client
        .lifecycle()
        .run(&payer, &recipient.pubkey(), &mint, &plan)
        .await
        .context("Lifecycle failed")?;

    for step in &report.steps {
        for signature in &step.signatures {
            success(&format!("{} (withheld now {})", step.label, step.withheld_after));
            println!("  {}", ctx.explorer_url(signature));
        }
    }

    let destination = ctx.client.tokens.fetch(&report.destination).await?;
    println!();
    println!("Mint:                {}", report.mint);
    println!("Source account:      {}", report.source);
    println!("Destination account: {}", report.destination);
    println!("Fees charged:        {}", report.fees_charged());
    println!("Fees collected:      {}", report.collected());
    println!(
        "Destination balance: {}",
        format_amount(destination.amount, plan.decimals)
    );
    Ok(())
}
