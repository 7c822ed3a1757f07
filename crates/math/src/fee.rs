//! Transfer-fee formula
//!
//! fee = min(floor(gross * basis_points / 10000), maximum_fee)
//!
//! The product `gross * basis_points` is formed in u128. With `gross <= u64::MAX`
//! and `basis_points <= 10000` it stays below 2^78, so the computation is exact
//! for every amount the ledger can hold.

use serde::{Deserialize, Serialize};

use crate::{safe_div_u128, safe_mul_u128, to_amount, MathError, MathResult};

/// 100% expressed in basis points
pub const ONE_IN_BASIS_POINTS: u16 = 10_000;

/// Fee parameters of a transfer-fee mint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFeeParams {
    /// Fee rate in basis points (1/100th of a percent)
    pub basis_points: u16,
    /// Absolute cap on the fee of a single transfer
    pub maximum_fee: u64,
}

/// A transfer split into the withheld fee and the delivered amount
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub gross: u64,
    pub fee: u64,
    pub net: u64,
}

impl TransferFeeParams {
    /// Create validated fee parameters
    pub fn new(basis_points: u16, maximum_fee: u64) -> MathResult<Self> {
        let params = Self {
            basis_points,
            maximum_fee,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> MathResult<()> {
        if self.basis_points > ONE_IN_BASIS_POINTS {
            return Err(MathError::InvalidBasisPoints(self.basis_points));
        }
        Ok(())
    }

    /// Fee withheld from a transfer of `gross`
    pub fn calculate_fee(&self, gross: u64) -> MathResult<u64> {
        calculate_fee(gross, self.basis_points, self.maximum_fee)
    }

    /// Split `gross` into fee and net
    pub fn breakdown(&self, gross: u64) -> MathResult<FeeBreakdown> {
        let fee = self.calculate_fee(gross)?;
        Ok(FeeBreakdown {
            gross,
            fee,
            net: gross - fee,
        })
    }

    /// Smallest gross amount that delivers at least `net` after the fee
    pub fn gross_for_net(&self, net: u64) -> MathResult<u64> {
        self.validate()?;
        if net == 0 {
            return Ok(0);
        }

        // fee(g) <= maximum_fee, so net + maximum_fee always suffices when it fits
        let upper = (u128::from(net) + u128::from(self.maximum_fee)).min(u128::from(u64::MAX));
        let mut hi = to_amount(upper)?;
        if self.breakdown(hi)?.net < net {
            return Err(MathError::overflow(
                "gross-up",
                &[&net.to_string(), &self.basis_points.to_string()],
            ));
        }

        // net(g) is non-decreasing in g while basis_points <= 10000
        let mut lo = net;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.breakdown(mid)?.net >= net {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        Ok(lo)
    }
}

/// fee = min(floor(gross * basis_points / 10000), maximum_fee)
pub fn calculate_fee(gross: u64, basis_points: u16, maximum_fee: u64) -> MathResult<u64> {
    if basis_points > ONE_IN_BASIS_POINTS {
        return Err(MathError::InvalidBasisPoints(basis_points));
    }
    if gross == 0 || basis_points == 0 {
        return Ok(0);
    }

    let numerator = safe_mul_u128(u128::from(gross), u128::from(basis_points))?;
    let raw_fee = safe_div_u128(numerator, u128::from(ONE_IN_BASIS_POINTS))?;
    to_amount(raw_fee.min(u128::from(maximum_fee)))
}
