//! Client SDK for the Token-2022 transfer-fee lifecycle
//!
//! Creates mints with the transfer fee extension, performs fee-bearing
//! transfers, discovers token accounts holding withheld fees and collects
//! them by withdrawing from accounts or by harvesting into the mint and
//! withdrawing from there.
//!
//! ```no_run
//! # async fn demo() -> withheld_sdk::SdkResult<()> {
//! use withheld_sdk::{config::WithheldConfig, FeeClient, CollectionPath};
//! use withheld_sdk::prelude::*;
//!
//! let client = FeeClient::from_config(&WithheldConfig::devnet())?;
//! let mint = Pubkey::new_unique();
//! let destination = Pubkey::new_unique();
//! let authority = Keypair::new();
//!
//! let collector = client.collector(mint, &authority, Some(&authority));
//! let receipts = collector.collect(CollectionPath::Harvest, &destination).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod core;
pub mod instructions;
pub mod prelude;
pub mod protocol;
pub mod testing;

pub use crate::client::*;
pub use crate::core::*;
pub use withheld_math::{FeeBreakdown, MathError, TransferFeeParams};
