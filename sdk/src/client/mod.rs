pub mod base;
pub mod cluster;
pub mod collector;
pub mod discovery;
pub mod lifecycle;
pub mod mint;
pub mod token;
pub mod wallet;

use std::sync::Arc;

use crate::{config::WithheldConfig, core::SdkResult, prelude::*};

pub use base::RpcCluster;
pub use cluster::ClusterClient;
pub use collector::{CollectionReceipt, FeeCollector};
pub use discovery::DiscoveryService;
pub use lifecycle::{FeeLifecycle, LifecyclePlan, LifecycleReport, LifecycleStep};
pub use mint::MintService;
pub use token::{TokenService, TransferReceipt};
pub use wallet::{ensure_funded, WalletStore};

/// Transfer-fee client with service-based architecture
pub struct FeeClient {
    /// Cluster the services talk to
    pub cluster: Arc<dyn ClusterClient>,
    /// Mint creation and closing
    pub mint: MintService,
    /// Token accounts, minting and transfers
    pub tokens: TokenService,
    /// Withheld-fee discovery
    pub discovery: DiscoveryService,
}

impl FeeClient {
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self {
            mint: MintService::new(cluster.clone()),
            tokens: TokenService::new(cluster.clone()),
            discovery: DiscoveryService::new(cluster.clone()),
            cluster,
        }
    }

    /// Client over JSON-RPC as described by `config`
    pub fn from_config(config: &WithheldConfig) -> SdkResult<Self> {
        let cluster = RpcCluster::from_config(&config.cluster, config.retry.clone())?;
        Ok(Self::new(Arc::new(cluster)))
    }

    pub fn collector<'a>(
        &self,
        mint: Pubkey,
        payer: &'a Keypair,
        withdraw_authority: Option<&'a Keypair>,
    ) -> FeeCollector<'a> {
        FeeCollector::new(self.cluster.clone(), mint, payer, withdraw_authority)
    }

    pub fn lifecycle(&self) -> FeeLifecycle<'_> {
        FeeLifecycle::new(self)
    }
}
