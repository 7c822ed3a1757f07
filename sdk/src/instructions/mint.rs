//! Mint creation and closing
//!
//! A mint with extensions is created in one transaction whose instructions
//! must run in this order:
//!   1. allocate the account at the size of the requested extension set
//!   2. initialize every extension
//!   3. initialize the base mint fields
//! The program rejects extension initialization on an initialized mint.

use solana_sdk::{instruction::Instruction, system_instruction};
use spl_token_2022::{
    extension::{transfer_fee::instruction as fee_instruction, ExtensionType},
    instruction as token_instruction,
    state::Mint,
};
use withheld_math::TransferFeeParams;

use crate::core::{token_program_id, SdkError, SdkResult};
use crate::prelude::*;

/// Mint extensions this SDK can initialize
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MintExtension {
    TransferFee {
        config_authority: Option<Pubkey>,
        withdraw_authority: Option<Pubkey>,
        params: TransferFeeParams,
    },
    CloseAuthority {
        authority: Pubkey,
    },
}

impl MintExtension {
    pub fn extension_type(&self) -> ExtensionType {
        match self {
            MintExtension::TransferFee { .. } => ExtensionType::TransferFeeConfig,
            MintExtension::CloseAuthority { .. } => ExtensionType::MintCloseAuthority,
        }
    }

    fn initialize(&self, mint: &Pubkey) -> SdkResult<Instruction> {
        let program_id = token_program_id();
        let ix = match self {
            MintExtension::TransferFee {
                config_authority,
                withdraw_authority,
                params,
            } => fee_instruction::initialize_transfer_fee_config(
                &program_id,
                mint,
                config_authority.as_ref(),
                withdraw_authority.as_ref(),
                params.basis_points,
                params.maximum_fee,
            )?,
            MintExtension::CloseAuthority { authority } => {
                token_instruction::initialize_mint_close_authority(&program_id, mint, Some(authority))?
            }
        };
        Ok(ix)
    }
}

/// Everything fixed at mint creation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintSpec {
    pub decimals: u8,
    pub mint_authority: Pubkey,
    pub freeze_authority: Option<Pubkey>,
    pub extensions: Vec<MintExtension>,
}

impl MintSpec {
    pub fn new(decimals: u8, mint_authority: Pubkey) -> Self {
        Self {
            decimals,
            mint_authority,
            freeze_authority: None,
            extensions: Vec::new(),
        }
    }

    pub fn with_freeze_authority(mut self, authority: Pubkey) -> Self {
        self.freeze_authority = Some(authority);
        self
    }

    pub fn with_transfer_fee(
        mut self,
        config_authority: Option<Pubkey>,
        withdraw_authority: Option<Pubkey>,
        params: TransferFeeParams,
    ) -> Self {
        self.extensions.push(MintExtension::TransferFee {
            config_authority,
            withdraw_authority,
            params,
        });
        self
    }

    pub fn with_close_authority(mut self, authority: Pubkey) -> Self {
        self.extensions.push(MintExtension::CloseAuthority { authority });
        self
    }

    pub fn transfer_fee(&self) -> Option<TransferFeeParams> {
        self.extensions.iter().find_map(|ext| match ext {
            MintExtension::TransferFee { params, .. } => Some(*params),
            _ => None,
        })
    }

    pub fn extension_types(&self) -> Vec<ExtensionType> {
        self.extensions.iter().map(|ext| ext.extension_type()).collect()
    }

    /// Account size for the base mint plus every requested extension
    pub fn account_len(&self) -> SdkResult<usize> {
        Ok(ExtensionType::try_calculate_account_len::<Mint>(
            &self.extension_types(),
        )?)
    }

    pub fn validate(&self) -> SdkResult<()> {
        let types = self.extension_types();
        for (i, ty) in types.iter().enumerate() {
            if types[..i].contains(ty) {
                return Err(SdkError::InvalidParameters(format!(
                    "extension {:?} requested more than once",
                    ty
                )));
            }
        }
        if let Some(params) = self.transfer_fee() {
            params.validate()?;
        }
        Ok(())
    }
}

/// Ordered instructions creating `mint` as described by `spec`
pub fn create_mint_instructions(
    payer: &Pubkey,
    mint: &Pubkey,
    lamports: u64,
    spec: &MintSpec,
) -> SdkResult<Vec<Instruction>> {
    spec.validate()?;
    let program_id = token_program_id();
    let space = spec.account_len()?;

    let mut instructions = Vec::with_capacity(spec.extensions.len() + 2);
    instructions.push(system_instruction::create_account(
        payer,
        mint,
        lamports,
        space as u64,
        &program_id,
    ));
    for extension in &spec.extensions {
        instructions.push(extension.initialize(mint)?);
    }
    instructions.push(token_instruction::initialize_mint(
        &program_id,
        mint,
        &spec.mint_authority,
        spec.freeze_authority.as_ref(),
        spec.decimals,
    )?);

    Ok(instructions)
}

/// Close a mint with zero supply, returning its rent to `destination`
pub fn close_mint_instruction(
    mint: &Pubkey,
    destination: &Pubkey,
    close_authority: &Pubkey,
) -> SdkResult<Instruction> {
    Ok(token_instruction::close_account(
        &token_program_id(),
        mint,
        destination,
        close_authority,
        &[],
    )?)
}
