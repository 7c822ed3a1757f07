// Utility functions for CLI commands

use anyhow::{Context, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signature},
};
use std::str::FromStr;
use withheld_sdk::{config::ClusterConfig, core::endpoints};

/// Load a keypair from a file path, expanding ~ if needed
pub fn load_keypair(path: &str) -> Result<Keypair> {
    let expanded_path = if path.starts_with('~') {
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        path.replacen('~', &home, 1)
    } else {
        path.to_string()
    };

    read_keypair_file(&expanded_path)
        .map_err(|e| anyhow::anyhow!("Failed to load keypair from {}: {}", expanded_path, e))
}

/// Parse a pubkey from string
pub fn parse_pubkey(s: &str) -> Result<Pubkey> {
    Pubkey::from_str(s).with_context(|| format!("Invalid public key: {}", s))
}

/// Explorer link for a transaction on the configured cluster
pub fn explorer_url(cluster: &ClusterConfig, signature: &Signature) -> String {
    match cluster.explorer_cluster.as_str() {
        "mainnet-beta" | "mainnet" => format!("{}/tx/{}", endpoints::EXPLORER, signature),
        "custom" => format!(
            "{}/tx/{}?cluster=custom&customUrl={}",
            endpoints::EXPLORER,
            signature,
            cluster.rpc_url
        ),
        name => format!("{}/tx/{}?cluster={}", endpoints::EXPLORER, signature, name),
    }
}

/// Render a raw amount with the mint's decimals
pub fn format_amount(amount: u64, decimals: u8) -> String {
    let scale = match 10u128.checked_pow(u32::from(decimals)) {
        Some(scale) if decimals > 0 => scale,
        _ => return amount.to_string(),
    };
    let amount = u128::from(amount);
    format!(
        "{}.{:0width$}",
        amount / scale,
        amount % scale,
        width = usize::from(decimals)
    )
}

/// Print success message with checkmark
pub fn success(msg: &str) {
    println!("[OK] {}", msg);
}

/// Print info message
pub fn info(msg: &str) {
    println!("[INFO] {}", msg);
}

/// Print warning message
pub fn warn(msg: &str) {
    eprintln!("[WARN] {}", msg);
}
