use withheld_math::{FeeBreakdown, TransferFeeParams};

use crate::core::{SdkError, SdkResult};
use crate::protocol::MintView;

/// Expected fee for a transfer, checked against the mint before submission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferQuote {
    pub params: TransferFeeParams,
    pub breakdown: FeeBreakdown,
    pub epoch: u64,
}

impl TransferQuote {
    pub fn gross(&self) -> u64 {
        self.breakdown.gross
    }

    pub fn fee(&self) -> u64 {
        self.breakdown.fee
    }

    pub fn net(&self) -> u64 {
        self.breakdown.net
    }
}

/// Quote a fee-bearing transfer of `gross` tokens of `mint`
///
/// The client-side fee must equal the fee the mint's configuration derives on
/// its own. A mismatch is a client bug and is returned as `FeeMismatch`.
pub fn quote_transfer(mint: &MintView, epoch: u64, gross: u64) -> SdkResult<TransferQuote> {
    let params = mint.fee_params(epoch)?;
    let breakdown = params.breakdown(gross)?;

    let program_fee = mint.program_fee(epoch, gross)?;
    if program_fee != breakdown.fee {
        return Err(SdkError::FeeMismatch {
            client: breakdown.fee,
            program: program_fee,
        });
    }

    Ok(TransferQuote {
        params,
        breakdown,
        epoch,
    })
}
