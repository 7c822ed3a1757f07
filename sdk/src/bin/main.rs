// CLI for the Token-2022 transfer-fee lifecycle
//
// Runs the full create -> transfer -> collect flow, or any single step of
// it, against the cluster named in the config file.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::CliContext;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use withheld_sdk::config::{LoggingConfig, WithheldConfig};

#[derive(Parser)]
#[command(name = "withheld")]
#[command(about = "Token-2022 transfer fee CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults apply when omitted)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// RPC URL, overriding the config file
    #[arg(long)]
    rpc_url: Option<String>,

    /// Directory holding keypair files, overriding the config file
    #[arg(long)]
    wallet_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the complete transfer-fee lifecycle
    Demo(commands::demo::DemoCmd),

    /// Create a mint with the transfer fee extension
    CreateMint(commands::mint::CreateMintCmd),

    /// Close a zero-supply mint that has a close authority
    CloseMint(commands::mint::CloseMintCmd),

    /// Transfer tokens, withholding the mint's fee at the destination
    Transfer(commands::transfer::TransferCmd),

    /// List token accounts holding withheld fees
    Discover(commands::discover::DiscoverCmd),

    /// Withdraw or harvest withheld fees
    Collect(commands::collect::CollectCmd),

    /// Compute the fee for an amount
    Quote(commands::quote::QuoteCmd),

    /// Request lamports for a wallet
    Airdrop(commands::airdrop::AirdropCmd),

    /// Write a config file with default values
    InitConfig {
        /// Destination path
        #[arg(long, default_value = "withheld.toml")]
        path: PathBuf,

        /// Start from the devnet preset
        #[arg(long)]
        devnet: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => WithheldConfig::load(path)?,
        None => WithheldConfig::default(),
    };
    if let Some(rpc_url) = cli.rpc_url {
        config.cluster.rpc_url = rpc_url;
    }
    if let Some(dir) = cli.wallet_dir {
        config.wallet.dir = dir;
    }
    config.logging.json |= cli.json_logs;
    config.validate()?;

    init_logging(&config.logging);

    match cli.command {
        Commands::InitConfig { path, devnet } => {
            let preset = if devnet {
                WithheldConfig::devnet()
            } else {
                WithheldConfig::default()
            };
            preset.save(&path)?;
            commands::utils::success(&format!("Wrote {}", path.display()));
            Ok(())
        }
        Commands::Quote(cmd) => commands::quote::execute(cmd, &config).await,
        Commands::Demo(cmd) => commands::demo::execute(cmd, &CliContext::new(config)?).await,
        Commands::CreateMint(cmd) => commands::mint::create(cmd, &CliContext::new(config)?).await,
        Commands::CloseMint(cmd) => commands::mint::close(cmd, &CliContext::new(config)?).await,
        Commands::Transfer(cmd) => {
            commands::transfer::execute(cmd, &CliContext::new(config)?).await
        }
        Commands::Discover(cmd) => {
            commands::discover::execute(cmd, &CliContext::new(config)?).await
        }
        Commands::Collect(cmd) => commands::collect::execute(cmd, &CliContext::new(config)?).await,
        Commands::Airdrop(cmd) => commands::airdrop::execute(cmd, &CliContext::new(config)?).await,
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("withheld={0},withheld_sdk={0}", config.level).into());

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}
