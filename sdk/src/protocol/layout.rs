//! Read-only views over Token-2022 account bytes

use solana_program::program_option::COption;
use spl_token_2022::{
    extension::{
        mint_close_authority::MintCloseAuthority,
        transfer_fee::{TransferFeeAmount, TransferFeeConfig},
        BaseStateWithExtensions, StateWithExtensions,
    },
    state::{Account, Mint},
};
use withheld_math::TransferFeeParams;

use crate::core::{SdkError, SdkResult};
use crate::prelude::*;

/// Mint base fields plus the extensions this SDK reads
#[derive(Clone, Debug)]
pub struct MintView {
    pub address: Pubkey,
    pub decimals: u8,
    pub supply: u64,
    pub mint_authority: Option<Pubkey>,
    pub freeze_authority: Option<Pubkey>,
    pub close_authority: Option<Pubkey>,
    pub fee_config: Option<TransferFeeConfig>,
}

impl MintView {
    pub fn has_transfer_fee(&self) -> bool {
        self.fee_config.is_some()
    }

    pub fn transfer_fee_config_authority(&self) -> Option<Pubkey> {
        self.fee_config
            .and_then(|config| Option::<Pubkey>::from(config.transfer_fee_config_authority))
    }

    pub fn withdraw_withheld_authority(&self) -> Option<Pubkey> {
        self.fee_config
            .and_then(|config| Option::<Pubkey>::from(config.withdraw_withheld_authority))
    }

    /// Fees harvested into the mint and not yet withdrawn
    pub fn withheld_amount(&self) -> u64 {
        self.fee_config
            .map(|config| u64::from(config.withheld_amount))
            .unwrap_or(0)
    }

    /// Fee parameters in force at `epoch`
    pub fn fee_params(&self, epoch: u64) -> SdkResult<TransferFeeParams> {
        let config = self.require_fee_config()?;
        let fee = config.get_epoch_fee(epoch);
        Ok(TransferFeeParams::new(
            u16::from(fee.transfer_fee_basis_points),
            u64::from(fee.maximum_fee),
        )?)
    }

    /// The fee the program itself derives for a transfer of `gross` at `epoch`
    pub fn program_fee(&self, epoch: u64, gross: u64) -> SdkResult<u64> {
        let config = self.require_fee_config()?;
        config.calculate_epoch_fee(epoch, gross).ok_or_else(|| {
            SdkError::InvalidParameters(format!(
                "program fee calculation overflowed for amount {}",
                gross
            ))
        })
    }

    fn require_fee_config(&self) -> SdkResult<&TransferFeeConfig> {
        self.fee_config.as_ref().ok_or_else(|| {
            SdkError::InvalidParameters(format!(
                "mint {} has no transfer fee extension",
                self.address
            ))
        })
    }
}

/// Token account base fields plus the withheld-fee accumulator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenAccountView {
    pub address: Pubkey,
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    /// None when the account carries no transfer-fee-amount extension
    pub withheld_amount: Option<u64>,
}

impl TokenAccountView {
    pub fn withheld(&self) -> u64 {
        self.withheld_amount.unwrap_or(0)
    }
}

/// Unpack a Token-2022 mint
pub fn unpack_mint(address: &Pubkey, data: &[u8]) -> SdkResult<MintView> {
    let state = StateWithExtensions::<Mint>::unpack(data)
        .map_err(|e| SdkError::deserialization(address, e))?;

    let close_authority = state
        .get_extension::<MintCloseAuthority>()
        .ok()
        .and_then(|ext| Option::<Pubkey>::from(ext.close_authority));
    let fee_config = state.get_extension::<TransferFeeConfig>().ok().copied();

    Ok(MintView {
        address: *address,
        decimals: state.base.decimals,
        supply: state.base.supply,
        mint_authority: coption_key(state.base.mint_authority),
        freeze_authority: coption_key(state.base.freeze_authority),
        close_authority,
        fee_config,
    })
}

/// Unpack a Token-2022 token account
pub fn unpack_token_account(address: &Pubkey, data: &[u8]) -> SdkResult<TokenAccountView> {
    let state = StateWithExtensions::<Account>::unpack(data)
        .map_err(|e| SdkError::deserialization(address, e))?;

    let withheld_amount = state
        .get_extension::<TransferFeeAmount>()
        .ok()
        .map(|ext| u64::from(ext.withheld_amount));

    Ok(TokenAccountView {
        address: *address,
        mint: state.base.mint,
        owner: state.base.owner,
        amount: state.base.amount,
        withheld_amount,
    })
}

fn coption_key(value: COption<Pubkey>) -> Option<Pubkey> {
    match value {
        COption::Some(key) => Some(key),
        COption::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pack_mint, pack_token_account, PackedMint};

    #[test]
    fn test_unpack_token_account_with_withheld() {
        let address = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let data = pack_token_account(&mint, &owner, 995_000, Some(5_000)).unwrap();

        let view = unpack_token_account(&address, &data).unwrap();
        assert_eq!(view.mint, mint);
        assert_eq!(view.owner, owner);
        assert_eq!(view.amount, 995_000);
        assert_eq!(view.withheld_amount, Some(5_000));
    }

    #[test]
    fn test_unpack_token_account_without_extension() {
        let data = pack_token_account(&Pubkey::new_unique(), &Pubkey::new_unique(), 10, None).unwrap();
        let view = unpack_token_account(&Pubkey::new_unique(), &data).unwrap();
        assert_eq!(view.withheld_amount, None);
        assert_eq!(view.withheld(), 0);
    }

    #[test]
    fn test_unpack_garbage_is_error() {
        let address = Pubkey::new_unique();
        let err = unpack_token_account(&address, &[7u8; 40]).unwrap_err();
        assert!(matches!(err, SdkError::Deserialization { address: a, .. } if a == address));
    }

    #[test]
    fn test_unpack_mint_fee_config() {
        let authority = Pubkey::new_unique();
        let packed = PackedMint {
            mint_authority: Some(authority),
            withdraw_authority: Some(authority),
            fee: Some(TransferFeeParams::new(50, 5_000).unwrap()),
            withheld: 1_234,
            ..PackedMint::default()
        };
        let data = pack_mint(&packed).unwrap();

        let view = unpack_mint(&Pubkey::new_unique(), &data).unwrap();
        assert_eq!(view.decimals, 9);
        assert_eq!(view.withdraw_withheld_authority(), Some(authority));
        assert_eq!(view.withheld_amount(), 1_234);
        assert_eq!(view.fee_params(0).unwrap(), TransferFeeParams::new(50, 5_000).unwrap());
        assert_eq!(view.program_fee(0, 1_000_000).unwrap(), 5_000);
        assert_eq!(view.close_authority, None);
    }
}
