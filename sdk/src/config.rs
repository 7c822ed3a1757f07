//! Configuration for the withheld client and CLI, loaded from TOML

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use withheld_math::TransferFeeParams;

use crate::core::{
    endpoints, CollectionPath, SdkError, SdkResult, DEFAULT_AIRDROP_LAMPORTS,
    DEFAULT_MIN_BALANCE_LAMPORTS, DEFAULT_SOURCES_PER_TRANSACTION,
};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WithheldConfig {
    pub cluster: ClusterConfig,
    pub wallet: WalletConfig,
    pub mint: MintConfig,
    pub flow: FlowConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

/// Where transactions go and how long to wait for them
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub rpc_url: String,

    /// processed, confirmed or finalized
    pub commitment: String,

    /// RPC request timeout in seconds
    pub timeout_secs: u64,

    /// Cluster name used in explorer links; `custom` links back to `rpc_url`
    pub explorer_cluster: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Directory holding `<name>.json` keypair files
    pub dir: PathBuf,
    pub payer: String,
    pub recipient: String,

    /// Balance below which the payer requests an airdrop (lamports)
    pub min_balance_lamports: u64,
    pub airdrop_lamports: u64,
}

/// Parameters of a newly created mint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MintConfig {
    pub decimals: u8,
    pub transfer_fee_basis_points: u16,
    pub maximum_fee: u64,

    /// Also install a close authority so the mint can be closed later
    pub close_authority: bool,
}

/// Amounts and choices for the end-to-end flow
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FlowConfig {
    pub mint_amount: u64,
    pub transfer_amount: u64,
    /// Transfers per collection cycle
    pub transfers: u32,
    /// Collection path of each cycle, in order
    pub cycles: Vec<CollectionPath>,
    pub sources_per_transaction: usize,
}

/// Resubmission policy for transactions whose confirmation was not observed
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of resubmissions after the first attempt
    pub max_retries: u32,

    /// Base delay between retries in milliseconds
    pub base_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive used when RUST_LOG is unset
    pub level: String,
    pub json: bool,
}

impl WithheldConfig {
    pub fn localnet() -> Self {
        Self::default()
    }

    pub fn devnet() -> Self {
        Self {
            cluster: ClusterConfig {
                rpc_url: endpoints::DEVNET_RPC.to_string(),
                explorer_cluster: "devnet".to_string(),
                ..ClusterConfig::default()
            },
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SdkError::Config(format!("failed to read config file {}: {}", path.display(), e))
        })?;

        let config: WithheldConfig = toml::from_str(&content).map_err(|e| {
            SdkError::Config(format!("failed to parse config file {}: {}", path.display(), e))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> SdkResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| SdkError::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content).map_err(|e| {
            SdkError::Config(format!("failed to write config file {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    pub fn validate(&self) -> SdkResult<()> {
        self.cluster.validate()?;
        self.wallet.validate()?;
        self.mint.validate()?;
        self.flow.validate()?;
        self.retry.validate()?;
        Ok(())
    }
}

impl ClusterConfig {
    pub fn commitment(&self) -> SdkResult<CommitmentConfig> {
        CommitmentConfig::from_str(&self.commitment).map_err(|_| {
            SdkError::Config(format!(
                "commitment '{}' is not processed, confirmed or finalized",
                self.commitment
            ))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> SdkResult<()> {
        if self.rpc_url.is_empty() {
            return Err(invalid("cluster.rpc_url", "empty", "a URL"));
        }
        if self.timeout_secs == 0 {
            return Err(invalid("cluster.timeout_secs", "0", "greater than 0"));
        }
        self.commitment()?;
        Ok(())
    }
}

impl WalletConfig {
    pub fn payer_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.payer))
    }

    fn validate(&self) -> SdkResult<()> {
        if self.payer.is_empty() || self.recipient.is_empty() {
            return Err(invalid("wallet.payer/recipient", "empty", "a keypair name"));
        }
        if self.payer == self.recipient {
            return Err(invalid("wallet.recipient", &self.recipient, "different from wallet.payer"));
        }
        Ok(())
    }
}

impl MintConfig {
    pub fn fee_params(&self) -> SdkResult<TransferFeeParams> {
        Ok(TransferFeeParams::new(
            self.transfer_fee_basis_points,
            self.maximum_fee,
        )?)
    }

    fn validate(&self) -> SdkResult<()> {
        self.fee_params()?;
        Ok(())
    }
}

impl FlowConfig {
    fn validate(&self) -> SdkResult<()> {
        if self.transfers == 0 {
            return Err(invalid("flow.transfers", "0", "greater than 0"));
        }
        if self.cycles.is_empty() {
            return Err(invalid("flow.cycles", "[]", "at least one collection path"));
        }
        if self.sources_per_transaction == 0 {
            return Err(invalid("flow.sources_per_transaction", "0", "greater than 0"));
        }
        let needed = u128::from(self.transfer_amount)
            * u128::from(self.transfers)
            * self.cycles.len() as u128;
        if needed > u128::from(self.mint_amount) {
            return Err(invalid(
                "flow.mint_amount",
                &self.mint_amount.to_string(),
                &format!("at least cycles * transfers * transfer_amount ({})", needed),
            ));
        }
        Ok(())
    }
}

impl RetryConfig {
    fn validate(&self) -> SdkResult<()> {
        if self.base_delay_ms == 0 {
            return Err(invalid("retry.base_delay_ms", "0", "greater than 0"));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(invalid(
                "retry.max_delay_ms",
                &self.max_delay_ms.to_string(),
                &format!("greater than or equal to base_delay_ms ({})", self.base_delay_ms),
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(invalid(
                "retry.backoff_multiplier",
                &self.backoff_multiplier.to_string(),
                "at least 1.0",
            ));
        }
        Ok(())
    }

    /// Calculate delay for retry attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(self.base_delay_ms);
        }

        let exponential_delay =
            self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis((exponential_delay as u64).min(self.max_delay_ms))
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            rpc_url: endpoints::LOCALNET_RPC.to_string(),
            commitment: "confirmed".to_string(),
            timeout_secs: 30,
            explorer_cluster: "custom".to_string(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".wallets"),
            payer: "payer".to_string(),
            recipient: "recipient".to_string(),
            min_balance_lamports: DEFAULT_MIN_BALANCE_LAMPORTS,
            airdrop_lamports: DEFAULT_AIRDROP_LAMPORTS,
        }
    }
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            decimals: 9,
            transfer_fee_basis_points: 50, // 0.5%
            maximum_fee: 5_000,
            close_authority: false,
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            mint_amount: 1_000_000_000,
            transfer_amount: 1_000_000,
            transfers: 1,
            cycles: vec![CollectionPath::Withdraw, CollectionPath::Harvest],
            sources_per_transaction: DEFAULT_SOURCES_PER_TRANSACTION,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn invalid(field: &str, value: &str, expected: &str) -> SdkError {
    SdkError::Config(format!("invalid {}: got {}, expected {}", field, value, expected))
}
