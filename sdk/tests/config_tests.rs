//! Configuration file round trips

use anyhow::Result;
use std::{fs, path::PathBuf};
use tempfile::TempDir;
use withheld_sdk::{config::WithheldConfig, CollectionPath, LifecyclePlan, SdkError};

fn create_test_config_content() -> String {
    r#"
[cluster]
rpc_url = "https://api.devnet.solana.com"
commitment = "finalized"
timeout_secs = 60
explorer_cluster = "devnet"

[wallet]
dir = "/tmp/withheld-wallets"
payer = "alice"
recipient = "bob"

[mint]
decimals = 6
transfer_fee_basis_points = 100
maximum_fee = 1000

[flow]
transfer_amount = 50000
transfers = 3
cycles = ["harvest", "withdraw", "harvest"]

[retry]
max_retries = 5
"#
    .to_string()
}

#[test]
fn test_config_loading_from_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("withheld.toml");
    fs::write(&config_path, create_test_config_content())?;

    let config = WithheldConfig::load(&config_path)?;

    assert_eq!(config.cluster.rpc_url, "https://api.devnet.solana.com");
    assert_eq!(config.cluster.timeout_secs, 60);
    assert_eq!(
        config.wallet.payer_path(),
        PathBuf::from("/tmp/withheld-wallets/alice.json")
    );
    assert_eq!(config.mint.fee_params()?.basis_points, 100);
    assert_eq!(
        config.flow.cycles,
        vec![
            CollectionPath::Harvest,
            CollectionPath::Withdraw,
            CollectionPath::Harvest
        ]
    );
    // unset fields fall back to defaults
    assert_eq!(config.flow.mint_amount, 1_000_000_000);
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.retry.base_delay_ms, 1000);
    assert!(!config.logging.json);

    let plan = LifecyclePlan::from_config(&config)?;
    assert_eq!(plan.decimals, 6);
    assert_eq!(plan.transfers, 3);

    Ok(())
}

#[test]
fn test_config_save_and_reload() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("saved.toml");

    let mut config = WithheldConfig::devnet();
    config.mint.close_authority = true;
    config.flow.cycles = vec![CollectionPath::Harvest];
    config.save(&config_path)?;

    let reloaded = WithheldConfig::load(&config_path)?;
    assert_eq!(reloaded, config);
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(
        &config_path,
        "[mint]\ntransfer_fee_basis_points = 20000\n",
    )?;

    let err = WithheldConfig::load(&config_path).unwrap_err();
    assert!(matches!(err, SdkError::Math(_)));

    fs::write(&config_path, "[flow]\ncycles = [\"sweep\"]\n")?;
    assert!(matches!(
        WithheldConfig::load(&config_path),
        Err(SdkError::Config(_))
    ));

    Ok(())
}

#[test]
fn test_missing_config_file() {
    let err = WithheldConfig::load("/nonexistent/withheld.toml").unwrap_err();
    assert!(matches!(err, SdkError::Config(_)));
}
