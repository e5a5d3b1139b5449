//! Mathematical Utilities for the dSTABLE Protocol
//!
//! Every price and decimal conversion in the system goes through the
//! helpers in this module so rounding behaves identically everywhere.
//! Rounding mode is floor (truncating division) in all cases; truncation
//! is the only permitted source of rounding error, and the AMO parity
//! tolerance exists to absorb its accumulation.

use crate::errors::{DstableError, DstableResult};

/// Multiply two values and divide by a third: `a * b / c`, floor.
///
/// The multiplication runs in full `u128` width; overflow on
/// unrealistically large magnitudes is an error, never a wrap.
pub fn mul_div(a: u128, b: u128, c: u128) -> DstableResult<u128> {
    if c == 0 {
        return Err(DstableError::DivisionByZero);
    }

    let product = a.checked_mul(b).ok_or(DstableError::Overflow)?;
    Ok(product / c)
}

/// Ten to the power of `decimals`, as the fixed-point unit scale
pub fn pow10(decimals: u8) -> DstableResult<u128> {
    10u128
        .checked_pow(decimals as u32)
        .ok_or(DstableError::Overflow)
}

/// Convert a token amount to base-currency value:
/// `amount * price / 10^decimals`
pub fn base_value_of(amount: u128, price: u128, decimals: u8) -> DstableResult<u128> {
    mul_div(amount, price, pow10(decimals)?)
}

/// Convert a base-currency value to a token amount:
/// `value * 10^decimals / price`
pub fn amount_from_base_value(value: u128, price: u128, decimals: u8) -> DstableResult<u128> {
    mul_div(value, pow10(decimals)?, price)
}

/// Take a basis-point fraction of an amount: `amount * bps / 10000`
pub fn bps_of(amount: u128, bps: u128) -> DstableResult<u128> {
    mul_div(amount, bps, crate::constants::fees::BPS_DENOMINATOR)
}

/// Absolute deviation of `price` from `reference`, in basis points
pub fn deviation_bps(price: u128, reference: u128) -> DstableResult<u128> {
    let diff = if price >= reference {
        price - reference
    } else {
        reference - price
    };
    mul_div(diff, crate::constants::fees::BPS_DENOMINATOR, reference)
}

/// Safe addition with overflow check
pub fn safe_add(a: u128, b: u128) -> DstableResult<u128> {
    a.checked_add(b).ok_or(DstableError::Overflow)
}

/// Safe subtraction; underflow reports what was available
pub fn safe_sub(a: u128, b: u128) -> DstableResult<u128> {
    a.checked_sub(b).ok_or(DstableError::InsufficientBalance {
        available: a,
        requested: b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::oracle::BASE_CURRENCY_UNIT;

    const ONE_USDC: u128 = 1_000_000; // 6 decimals
    const ONE_STABLE: u128 = 1_000_000_000_000_000_000; // 18 decimals

    #[test]
    fn test_mul_div_floors() {
        assert_eq!(mul_div(10, 10, 3).unwrap(), 33);
        assert_eq!(mul_div(7, 1, 2).unwrap(), 3);
        assert_eq!(mul_div(0, 5, 2).unwrap(), 0);
    }

    #[test]
    fn test_mul_div_division_by_zero() {
        assert!(matches!(
            mul_div(1, 1, 0),
            Err(DstableError::DivisionByZero)
        ));
    }

    #[test]
    fn test_mul_div_overflow() {
        assert!(matches!(
            mul_div(u128::MAX, 2, 1),
            Err(DstableError::Overflow)
        ));
    }

    #[test]
    fn test_base_value_of_six_decimal_collateral() {
        // 1000 USDC at $1.00 = 1000 base units
        let value = base_value_of(1000 * ONE_USDC, BASE_CURRENCY_UNIT, 6).unwrap();
        assert_eq!(value, 1000 * BASE_CURRENCY_UNIT);
    }

    #[test]
    fn test_amount_from_base_value_round_trip() {
        // 1000 base units at $1.00 in 18-decimal stablecoin
        let amount = amount_from_base_value(1000 * BASE_CURRENCY_UNIT, BASE_CURRENCY_UNIT, 18)
            .unwrap();
        assert_eq!(amount, 1000 * ONE_STABLE);
    }

    #[test]
    fn test_bps_of() {
        // 100 bps of 500 USDC = 5 USDC
        assert_eq!(bps_of(500 * ONE_USDC, 100).unwrap(), 5 * ONE_USDC);
        assert_eq!(bps_of(500 * ONE_USDC, 0).unwrap(), 0);
    }

    #[test]
    fn test_deviation_bps() {
        // $1.06 against a $1.00 peg = 600 bps
        assert_eq!(
            deviation_bps(106_000_000, BASE_CURRENCY_UNIT).unwrap(),
            600
        );
        // $0.97 = 300 bps
        assert_eq!(deviation_bps(97_000_000, BASE_CURRENCY_UNIT).unwrap(), 300);
        assert_eq!(deviation_bps(BASE_CURRENCY_UNIT, BASE_CURRENCY_UNIT).unwrap(), 0);
    }

    #[test]
    fn test_safe_sub_reports_available() {
        let err = safe_sub(10, 11).unwrap_err();
        assert!(matches!(
            err,
            DstableError::InsufficientBalance {
                available: 10,
                requested: 11,
            }
        ));
    }
}
