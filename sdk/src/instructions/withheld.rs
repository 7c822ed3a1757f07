//! Collection paths for withheld transfer fees

use solana_sdk::instruction::Instruction;
use spl_token_2022::extension::transfer_fee::instruction as fee_instruction;

use crate::core::{token_program_id, CollectionKind, SdkError, SdkResult};
use crate::prelude::*;

/// One way of moving withheld fees
///
/// Harvesting and withdrawing from accounts resolve the same accrued amount;
/// once harvested, a fee can only leave through `WithdrawFromMint`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionOp {
    WithdrawFromAccounts {
        destination: Pubkey,
        sources: Vec<Pubkey>,
    },
    HarvestToMint {
        sources: Vec<Pubkey>,
    },
    WithdrawFromMint {
        destination: Pubkey,
    },
}

impl CollectionOp {
    pub fn kind(&self) -> CollectionKind {
        match self {
            CollectionOp::WithdrawFromAccounts { .. } => CollectionKind::WithdrawFromAccounts,
            CollectionOp::HarvestToMint { .. } => CollectionKind::HarvestToMint,
            CollectionOp::WithdrawFromMint { .. } => CollectionKind::WithdrawFromMint,
        }
    }

    /// Harvesting is permissionless; both withdrawals need the authority
    pub fn requires_withdraw_authority(&self) -> bool {
        !matches!(self, CollectionOp::HarvestToMint { .. })
    }

    pub fn sources(&self) -> &[Pubkey] {
        match self {
            CollectionOp::WithdrawFromAccounts { sources, .. }
            | CollectionOp::HarvestToMint { sources } => sources,
            CollectionOp::WithdrawFromMint { .. } => &[],
        }
    }

    pub fn destination(&self) -> Option<Pubkey> {
        match self {
            CollectionOp::WithdrawFromAccounts { destination, .. }
            | CollectionOp::WithdrawFromMint { destination } => Some(*destination),
            CollectionOp::HarvestToMint { .. } => None,
        }
    }

    /// Same operation restricted to `sources`
    pub fn with_sources(&self, sources: Vec<Pubkey>) -> Self {
        match self {
            CollectionOp::WithdrawFromAccounts { destination, .. } => {
                CollectionOp::WithdrawFromAccounts {
                    destination: *destination,
                    sources,
                }
            }
            CollectionOp::HarvestToMint { .. } => CollectionOp::HarvestToMint { sources },
            CollectionOp::WithdrawFromMint { destination } => CollectionOp::WithdrawFromMint {
                destination: *destination,
            },
        }
    }
}

/// Instructions for `op`, one per transaction
///
/// Source lists longer than `batch_size` are split across transactions.
pub fn collection_instructions(
    op: &CollectionOp,
    mint: &Pubkey,
    withdraw_authority: &Pubkey,
    batch_size: usize,
) -> SdkResult<Vec<Instruction>> {
    if batch_size == 0 {
        return Err(SdkError::InvalidParameters(
            "batch size must be greater than 0".to_string(),
        ));
    }
    let program_id = token_program_id();

    let instructions = match op {
        CollectionOp::WithdrawFromAccounts {
            destination,
            sources,
        } => sources
            .chunks(batch_size)
            .map(|chunk| {
                let refs: Vec<&Pubkey> = chunk.iter().collect();
                fee_instruction::withdraw_withheld_tokens_from_accounts(
                    &program_id,
                    mint,
                    destination,
                    withdraw_authority,
                    &[],
                    &refs,
                )
            })
            .collect::<Result<Vec<_>, _>>()?,
        CollectionOp::HarvestToMint { sources } => sources
            .chunks(batch_size)
            .map(|chunk| {
                let refs: Vec<&Pubkey> = chunk.iter().collect();
                fee_instruction::harvest_withheld_tokens_to_mint(&program_id, mint, &refs)
            })
            .collect::<Result<Vec<_>, _>>()?,
        CollectionOp::WithdrawFromMint { destination } => {
            vec![fee_instruction::withdraw_withheld_tokens_from_mint(
                &program_id,
                mint,
                destination,
                withdraw_authority,
                &[],
            )?]
        }
    };

    Ok(instructions)
}
