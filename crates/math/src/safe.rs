/// Safe arithmetic operations with overflow protection
///
/// All operations return errors instead of panicking. Token amounts on the
/// ledger are `u64`; intermediate products and totals are carried in `u128`
/// and only narrowed back through a checked conversion.

use crate::{MathError, MathResult};

// ============================================================================
// Safe Basic Arithmetic
// ============================================================================

/// Safe addition for u128 values
pub fn safe_add_u128(a: u128, b: u128) -> MathResult<u128> {
    a.checked_add(b)
        .ok_or_else(|| MathError::overflow("u128 addition", &[&a.to_string(), &b.to_string()]))
}

/// Safe multiplication for u128 values
pub fn safe_mul_u128(a: u128, b: u128) -> MathResult<u128> {
    a.checked_mul(b)
        .ok_or_else(|| MathError::overflow("u128 multiplication", &[&a.to_string(), &b.to_string()]))
}

/// Safe division for u128 values
pub fn safe_div_u128(a: u128, b: u128) -> MathResult<u128> {
    if b == 0 {
        return Err(MathError::DivisionByZero {
            context: format!("u128 division: {} / {}", a, b),
        });
    }
    Ok(a / b)
}

/// Narrow a u128 back to a ledger amount
pub fn to_amount(value: u128) -> MathResult<u64> {
    u64::try_from(value).map_err(|_| MathError::overflow("u64 conversion", &[&value.to_string()]))
}

// ============================================================================
// Totals
// ============================================================================

/// Sum ledger amounts without overflow
///
/// `u64::MAX` amounts can be summed 2^64 times before a u128 total saturates,
/// so a total over any realistic account set is exact.
pub fn sum_amounts(amounts: &[u64]) -> MathResult<u128> {
    amounts
        .iter()
        .try_fold(0u128, |acc, amount| safe_add_u128(acc, u128::from(*amount)))
}

/// Sum ledger amounts and narrow the result back to u64
pub fn sum_to_amount(amounts: &[u64]) -> MathResult<u64> {
    to_amount(sum_amounts(amounts)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_amounts_does_not_wrap() {
        let total = sum_amounts(&[u64::MAX, u64::MAX, 2]).unwrap();
        assert_eq!(total, 2 * u128::from(u64::MAX) + 2);
    }

    #[test]
    fn test_sum_to_amount_overflow() {
        assert!(matches!(
            sum_to_amount(&[u64::MAX, 1]),
            Err(MathError::Overflow { .. })
        ));
        assert_eq!(sum_to_amount(&[5_000, 5_000]).unwrap(), 10_000);
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            safe_div_u128(1, 0),
            Err(MathError::DivisionByZero { .. })
        ));
    }
}
