//! Invariant Assertions
//!
//! The non-negotiable rules of the accounting engine, written as
//! standalone checks so the contracts and the property tests share one
//! definition. A failure here is an invariant violation, not a user
//! error; it propagates all the way to transaction failure.

use crate::errors::{DstableError, DstableResult};

/// Assert global solvency: circulating stablecoin supply must not
/// exceed the vault's collateral value, both in stablecoin units.
pub fn assert_solvent(circulating: u128, collateral_value: u128) -> DstableResult<()> {
    if circulating > collateral_value {
        return Err(DstableError::IssuanceSurpassesExcessCollateral {
            circulating,
            collateral_value,
        });
    }
    Ok(())
}

/// Assert debt parity: debt-token supply and the sum of per-wallet
/// allocations may diverge only by the configured rounding tolerance.
pub fn assert_debt_parity(
    debt_supply: u128,
    allocated: u128,
    tolerance: u128,
) -> DstableResult<()> {
    let diff = if debt_supply >= allocated {
        debt_supply - allocated
    } else {
        allocated - debt_supply
    };

    if diff > tolerance {
        return Err(DstableError::DebtParityBroken {
            debt_supply,
            allocated,
            tolerance,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solvent_exact() {
        assert!(assert_solvent(100, 100).is_ok());
        assert!(assert_solvent(99, 100).is_ok());
    }

    #[test]
    fn test_insolvent_fails() {
        let err = assert_solvent(101, 100).unwrap_err();
        assert!(matches!(
            err,
            DstableError::IssuanceSurpassesExcessCollateral {
                circulating: 101,
                collateral_value: 100,
            }
        ));
    }

    #[test]
    fn test_parity_within_tolerance() {
        assert!(assert_debt_parity(100, 100, 0).is_ok());
        assert!(assert_debt_parity(102, 100, 2).is_ok());
        assert!(assert_debt_parity(100, 102, 2).is_ok());
    }

    #[test]
    fn test_parity_beyond_tolerance_fails() {
        let err = assert_debt_parity(103, 100, 2).unwrap_err();
        assert!(matches!(err, DstableError::DebtParityBroken { .. }));
    }
}
