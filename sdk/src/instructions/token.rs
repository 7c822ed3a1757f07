//! Token account, minting and fee-bearing transfer instructions

use solana_sdk::instruction::Instruction;
use spl_associated_token_account::{
    get_associated_token_address_with_program_id,
    instruction::create_associated_token_account_idempotent,
};
use spl_token_2022::{extension::transfer_fee::instruction as fee_instruction, instruction as token_instruction};

use crate::core::{token_program_id, SdkResult};
use crate::prelude::*;
use crate::protocol::TransferQuote;

/// Associated token account of `owner` for `mint`
pub fn token_account_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(owner, mint, &token_program_id())
}

/// Create the associated token account if it does not exist yet
pub fn create_token_account_instruction(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
    create_associated_token_account_idempotent(payer, owner, mint, &token_program_id())
}

pub fn mint_to_instruction(
    mint: &Pubkey,
    destination: &Pubkey,
    mint_authority: &Pubkey,
    amount: u64,
) -> SdkResult<Instruction> {
    Ok(token_instruction::mint_to(
        &token_program_id(),
        mint,
        destination,
        mint_authority,
        &[],
        amount,
    )?)
}

/// Checked transfer that states the expected fee; the program rejects it
/// when the stated fee differs from its own calculation
pub fn transfer_with_fee_instruction(
    source: &Pubkey,
    mint: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
    decimals: u8,
    quote: &TransferQuote,
) -> SdkResult<Instruction> {
    Ok(fee_instruction::transfer_checked_with_fee(
        &token_program_id(),
        source,
        mint,
        destination,
        owner,
        &[],
        quote.gross(),
        decimals,
        quote.fee(),
    )?)
}

pub fn close_account_instruction(
    account: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
) -> SdkResult<Instruction> {
    Ok(token_instruction::close_account(
        &token_program_id(),
        account,
        destination,
        authority,
        &[],
    )?)
}
