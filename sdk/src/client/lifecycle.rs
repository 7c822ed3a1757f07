//! End-to-end transfer-fee flow
//!
//! create mint -> create accounts -> mint supply -> then, per cycle,
//! fee-bearing transfers followed by one collection along the cycle's path.
//! Each step waits for the previous transaction to confirm, so discovery
//! always observes the state after the last transfer.

use withheld_math::TransferFeeParams;

use tracing::info;

use crate::{
    client::{CollectionReceipt, FeeClient, TransferReceipt},
    config::WithheldConfig,
    core::{CollectionPath, SdkResult},
    instructions::MintSpec,
    prelude::*,
};

/// Parameters of one lifecycle run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecyclePlan {
    pub decimals: u8,
    pub fee: TransferFeeParams,
    pub close_authority: bool,
    pub mint_amount: u64,
    pub transfer_amount: u64,
    /// Transfers before each collection
    pub transfers: u32,
    pub cycles: Vec<CollectionPath>,
    pub sources_per_transaction: usize,
}

impl LifecyclePlan {
    pub fn from_config(config: &WithheldConfig) -> SdkResult<Self> {
        config.validate()?;
        Ok(Self {
            decimals: config.mint.decimals,
            fee: config.mint.fee_params()?,
            close_authority: config.mint.close_authority,
            mint_amount: config.flow.mint_amount,
            transfer_amount: config.flow.transfer_amount,
            transfers: config.flow.transfers,
            cycles: config.flow.cycles.clone(),
            sources_per_transaction: config.flow.sources_per_transaction,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleStep {
    pub label: String,
    pub signatures: Vec<Signature>,
    /// Withheld fees across accounts and mint pool once the step confirmed
    pub withheld_after: u128,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleReport {
    pub mint: Pubkey,
    pub source: Pubkey,
    pub destination: Pubkey,
    pub steps: Vec<LifecycleStep>,
    pub transfers: Vec<TransferReceipt>,
    pub collections: Vec<CollectionReceipt>,
}

impl LifecycleReport {
    pub fn fees_charged(&self) -> u128 {
        self.transfers
            .iter()
            .map(|t| u128::from(t.quote.fee()))
            .sum()
    }

    /// Fees credited to a destination; harvests only move fees into the pool
    pub fn collected(&self) -> u128 {
        self.collections
            .iter()
            .filter(|c| c.kind != crate::core::CollectionKind::HarvestToMint)
            .map(|c| u128::from(c.amount))
            .sum()
    }

    pub fn signatures(&self) -> impl Iterator<Item = (&str, &Signature)> {
        self.steps.iter().flat_map(|step| {
            step.signatures
                .iter()
                .map(move |signature| (step.label.as_str(), signature))
        })
    }
}

/// Runs the lifecycle with `payer` as mint, fee and withdraw authority
pub struct FeeLifecycle<'c> {
    client: &'c FeeClient,
}

impl<'c> FeeLifecycle<'c> {
    pub fn new(client: &'c FeeClient) -> Self {
        Self { client }
    }

    pub async fn run(
        &self,
        payer: &Keypair,
        recipient: &Pubkey,
        mint: &Keypair,
        plan: &LifecyclePlan,
    ) -> SdkResult<LifecycleReport> {
        let mint_address = mint.pubkey();
        let mut steps = Vec::new();

        let mut spec = MintSpec::new(plan.decimals, payer.pubkey()).with_transfer_fee(
            Some(payer.pubkey()),
            Some(payer.pubkey()),
            plan.fee,
        );
        if plan.close_authority {
            spec = spec.with_close_authority(payer.pubkey());
        }
        let signature = self.client.mint.create_mint(payer, mint, &spec).await?;
        steps.push(self.step(&mint_address, "create mint", vec![signature]).await?);

        let (source, signature) = self
            .client
            .tokens
            .create_account(payer, &mint_address, &payer.pubkey())
            .await?;
        steps.push(self.step(&mint_address, "create source account", vec![signature]).await?);

        let signature = self
            .client
            .tokens
            .mint_to(payer, &mint_address, &source, payer, plan.mint_amount)
            .await?;
        steps.push(self.step(&mint_address, "mint supply", vec![signature]).await?);

        let (destination, signature) = self
            .client
            .tokens
            .create_account(payer, &mint_address, recipient)
            .await?;
        steps.push(
            self.step(&mint_address, "create destination account", vec![signature])
                .await?,
        );

        let collector = self
            .client
            .collector(mint_address, payer, Some(payer))
            .with_batch_size(plan.sources_per_transaction);
        let mut transfers = Vec::new();
        let mut collections = Vec::new();

        for (cycle, path) in plan.cycles.iter().enumerate() {
            for _ in 0..plan.transfers {
                let receipt = self
                    .client
                    .tokens
                    .transfer_with_fee(
                        payer,
                        &mint_address,
                        &source,
                        &destination,
                        payer,
                        plan.transfer_amount,
                    )
                    .await?;
                steps.push(
                    self.step(&mint_address, "transfer with fee", vec![receipt.signature])
                        .await?,
                );
                transfers.push(receipt);
            }

            for receipt in collector.collect(*path, &destination).await? {
                steps.push(
                    self.step(&mint_address, receipt.kind.label(), receipt.signatures.clone())
                        .await?,
                );
                collections.push(receipt);
            }
            info!(cycle = cycle + 1, path = ?path, "collection cycle complete");
        }

        Ok(LifecycleReport {
            mint: mint_address,
            source,
            destination,
            steps,
            transfers,
            collections,
        })
    }

    async fn step(
        &self,
        mint: &Pubkey,
        label: &str,
        signatures: Vec<Signature>,
    ) -> SdkResult<LifecycleStep> {
        let withheld_after = self.client.discovery.total_withheld(mint).await?;
        Ok(LifecycleStep {
            label: label.to_string(),
            signatures,
            withheld_after,
        })
    }
}
