//! Withdraw and harvest orchestration
//!
//! Every operation that moves fees out of token accounts re-runs discovery
//! right before building its transactions. Sources whose withheld balance
//! dropped to zero since planning are left out, and an operation with
//! nothing left to move fails with `NothingToCollect` instead of
//! submitting, so an amount is never credited twice.

use std::sync::Arc;

use tracing::{info, warn};
use withheld_math::sum_to_amount;

use crate::{
    client::{ClusterClient, DiscoveryService, MintService, TokenService},
    core::{
        CollectionKind, CollectionPath, SdkError, SdkResult, DEFAULT_SOURCES_PER_TRANSACTION,
    },
    instructions::{collection_instructions, CollectionOp},
    prelude::*,
};

/// Outcome of one collection operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionReceipt {
    pub kind: CollectionKind,
    /// One signature per submitted transaction, in order
    pub signatures: Vec<Signature>,
    /// Accounts drained; empty for withdraw-from-mint
    pub sources: Vec<Pubkey>,
    pub amount: u64,
}

/// Collects withheld fees of one mint
pub struct FeeCollector<'a> {
    mint: Pubkey,
    payer: &'a Keypair,
    withdraw_authority: Option<&'a Keypair>,
    batch_size: usize,
    cluster: Arc<dyn ClusterClient>,
    mints: MintService,
    tokens: TokenService,
    discovery: DiscoveryService,
}

impl<'a> FeeCollector<'a> {
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        mint: Pubkey,
        payer: &'a Keypair,
        withdraw_authority: Option<&'a Keypair>,
    ) -> Self {
        Self {
            mint,
            payer,
            withdraw_authority,
            batch_size: DEFAULT_SOURCES_PER_TRANSACTION,
            mints: MintService::new(cluster.clone()),
            tokens: TokenService::new(cluster.clone()),
            discovery: DiscoveryService::new(cluster.clone()),
            cluster,
        }
    }

    /// Source accounts per transaction
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn mint(&self) -> Pubkey {
        self.mint
    }

    /// Discover withheld accounts and pick the account-level operation for `path`
    pub async fn plan(&self, path: CollectionPath, destination: &Pubkey) -> SdkResult<CollectionOp> {
        let sources: Vec<Pubkey> = self
            .discovery
            .find_withheld(&self.mint)
            .await?
            .into_iter()
            .map(|account| account.address)
            .collect();
        if sources.is_empty() {
            return Err(SdkError::NothingToCollect(format!(
                "no token account of {} holds withheld fees",
                self.mint
            )));
        }

        Ok(match path {
            CollectionPath::Withdraw => CollectionOp::WithdrawFromAccounts {
                destination: *destination,
                sources,
            },
            CollectionPath::Harvest => CollectionOp::HarvestToMint { sources },
        })
    }

    /// Check authority, refresh balances, then submit `op`
    pub async fn execute(&self, op: &CollectionOp) -> SdkResult<CollectionReceipt> {
        let kind = op.kind();
        let view = self.mints.fetch(&self.mint).await?;
        if !view.has_transfer_fee() {
            return Err(SdkError::InvalidParameters(format!(
                "mint {} has no transfer fee extension",
                self.mint
            )));
        }

        let authority = if op.requires_withdraw_authority() {
            Some(self.require_withdraw_authority(view.withdraw_withheld_authority(), kind)?)
        } else {
            None
        };

        if let Some(destination) = op.destination() {
            let account = self.tokens.fetch(&destination).await?;
            if account.mint != self.mint {
                return Err(SdkError::InvalidParameters(format!(
                    "destination {} belongs to mint {}",
                    destination, account.mint
                )));
            }
        }

        let (op, amounts) = match op {
            CollectionOp::WithdrawFromMint { .. } => (op.clone(), vec![view.withheld_amount()]),
            _ => {
                let current = self.discovery.find_withheld(&self.mint).await?;
                let live: Vec<_> = current
                    .into_iter()
                    .filter(|account| op.sources().contains(&account.address))
                    .collect();
                let skipped = op.sources().len() - live.len();
                if skipped > 0 {
                    warn!(%kind, skipped, "sources hold no withheld fees anymore");
                }
                let amounts: Vec<u64> = live.iter().map(|account| account.withheld_amount).collect();
                let sources = live.into_iter().map(|account| account.address).collect();
                (op.with_sources(sources), amounts)
            }
        };

        let amount = sum_to_amount(&amounts)?;
        if amount == 0 {
            return Err(SdkError::NothingToCollect(format!(
                "{} on {} would move nothing",
                kind, self.mint
            )));
        }

        let authority_key = authority.map(|a| a.pubkey()).unwrap_or_else(|| self.payer.pubkey());
        let instructions =
            collection_instructions(&op, &self.mint, &authority_key, self.batch_size)?;
        let signers: Vec<&Keypair> = authority.into_iter().collect();
        let batch_amounts = match op {
            CollectionOp::WithdrawFromMint { .. } => vec![amount],
            _ => amounts
                .chunks(self.batch_size)
                .map(sum_to_amount)
                .collect::<Result<Vec<_>, _>>()?,
        };

        let batches = instructions.len();
        let mut signatures = Vec::with_capacity(batches);
        let mut moved = 0u64;
        for (batch, instruction) in instructions.into_iter().enumerate() {
            let signature = match self
                .cluster
                .send_and_confirm(&[instruction], self.payer, &signers)
                .await
            {
                Ok(signature) => signature,
                Err(err) => {
                    if !signatures.is_empty() {
                        warn!(
                            %kind,
                            mint = %self.mint,
                            landed = signatures.len(),
                            batches,
                            moved,
                            "collection stopped part way: {}",
                            err
                        );
                    }
                    return Err(err);
                }
            };
            let batch_amount = batch_amounts.get(batch).copied().unwrap_or(0);
            moved = moved.saturating_add(batch_amount);
            info!(
                %kind,
                %signature,
                batch = batch + 1,
                batches,
                amount = batch_amount,
                "collection batch confirmed"
            );
            signatures.push(signature);
        }

        info!(
            %kind,
            mint = %self.mint,
            amount,
            sources = op.sources().len(),
            transactions = signatures.len(),
            "collected withheld fees"
        );
        Ok(CollectionReceipt {
            kind,
            signatures,
            sources: op.sources().to_vec(),
            amount,
        })
    }

    /// Plan and execute one cycle along `path`
    ///
    /// The harvest path also drains the mint pool into `destination`, so
    /// both paths end with the fees in `destination`.
    pub async fn collect(
        &self,
        path: CollectionPath,
        destination: &Pubkey,
    ) -> SdkResult<Vec<CollectionReceipt>> {
        match path {
            CollectionPath::Withdraw => {
                let op = self.plan(path, destination).await?;
                Ok(vec![self.execute(&op).await?])
            }
            CollectionPath::Harvest => {
                let mut receipts = Vec::new();
                match self.plan(path, destination).await {
                    Ok(op) => receipts.push(self.execute(&op).await?),
                    Err(SdkError::NothingToCollect(_)) => {}
                    Err(err) => return Err(err),
                }
                receipts.push(self.drain_mint(destination).await?);
                Ok(receipts)
            }
        }
    }

    /// Move the mint's withheld pool into `destination`
    pub async fn drain_mint(&self, destination: &Pubkey) -> SdkResult<CollectionReceipt> {
        self.execute(&CollectionOp::WithdrawFromMint {
            destination: *destination,
        })
        .await
    }

    fn require_withdraw_authority(
        &self,
        expected: Option<Pubkey>,
        kind: CollectionKind,
    ) -> SdkResult<&'a Keypair> {
        let expected = expected.ok_or_else(|| {
            SdkError::Unauthorized(format!(
                "mint {} has no withdraw withheld authority",
                self.mint
            ))
        })?;
        let held = self.withdraw_authority.ok_or_else(|| {
            SdkError::Unauthorized(format!("{} needs the withdraw withheld authority", kind))
        })?;
        if held.pubkey() != expected {
            return Err(SdkError::Unauthorized(format!(
                "{} is not the withdraw withheld authority {}",
                held.pubkey(),
                expected
            )));
        }
        Ok(held)
    }
}
