// Fee quotes

use anyhow::Result;
use clap::Args;
use withheld_sdk::{config::WithheldConfig, FeeClient, TransferFeeParams};

use super::utils::parse_pubkey;

#[derive(Args)]
pub struct QuoteCmd {
    /// Raw amount
    amount: u64,

    /// Treat the amount as the net to deliver and solve for the gross
    #[arg(long)]
    net: bool,

    /// Read fee parameters from this mint instead of the config
    #[arg(long)]
    mint: Option<String>,
}

pub async fn execute(cmd: QuoteCmd, config: &WithheldConfig) -> Result<()> {
    let params = match &cmd.mint {
        Some(mint) => {
            let mint = parse_pubkey(mint)?;
            let client = FeeClient::from_config(config)?;
            let view = client.mint.fetch(&mint).await?;
            let epoch = client.cluster.current_epoch().await?;
            view.fee_params(epoch)?
        }
        None => config.mint.fee_params()?,
    };

    let gross = if cmd.net {
        params.gross_for_net(cmd.amount)?
    } else {
        cmd.amount
    };
    print_breakdown(&params, gross)
}

fn print_breakdown(params: &TransferFeeParams, gross: u64) -> Result<()> {
    let breakdown = params.breakdown(gross)?;
    println!(
        "Fee rate: {} bps, capped at {}",
        params.basis_points, params.maximum_fee
    );
    println!("Gross: {}", breakdown.gross);
    println!("Fee:   {}", breakdown.fee);
    println!("Net:   {}", breakdown.net);
    Ok(())
}
