//! Keypair storage and funding

use std::path::{Path, PathBuf};

use solana_sdk::signature::{read_keypair_file, write_keypair_file};
use tracing::info;

use crate::{
    client::ClusterClient,
    core::{SdkError, SdkResult},
    prelude::*,
};

/// Named keypairs stored as `<dir>/<name>.json`
pub struct WalletStore {
    dir: PathBuf,
}

impl WalletStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Load the keypair called `name`, generating and saving it if missing
    pub fn get_or_create(&self, name: &str) -> SdkResult<Keypair> {
        let path = self.path(name);
        if path.exists() {
            return read_keypair_file(&path).map_err(|e| {
                SdkError::Wallet(format!("failed to read keypair {}: {}", path.display(), e))
            });
        }

        std::fs::create_dir_all(&self.dir)?;
        let keypair = Keypair::new();
        write_keypair_file(&keypair, &path).map_err(|e| {
            SdkError::Wallet(format!("failed to write keypair {}: {}", path.display(), e))
        })?;
        info!(name, pubkey = %keypair.pubkey(), path = %path.display(), "generated keypair");
        Ok(keypair)
    }
}

/// Airdrop `airdrop_lamports` when `address` holds less than `min_lamports`
///
/// Returns the balance after any airdrop.
pub async fn ensure_funded(
    cluster: &dyn ClusterClient,
    address: &Pubkey,
    min_lamports: u64,
    airdrop_lamports: u64,
) -> SdkResult<u64> {
    let balance = cluster.get_balance(address).await?;
    if balance >= min_lamports {
        return Ok(balance);
    }

    info!(%address, balance, airdrop_lamports, "requesting airdrop");
    cluster.request_airdrop(address, airdrop_lamports).await?;
    cluster.get_balance(address).await
}
