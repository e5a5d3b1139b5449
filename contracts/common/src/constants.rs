//! Protocol Constants
//!
//! All magic numbers and configuration defaults for the dSTABLE protocol.
//! Runtime-tunable parameters (fees, peg tolerance, pauses) live on the
//! owning contract; the values here are the deployment defaults and the
//! hard bounds governance cannot exceed.

/// Token Metadata
pub mod token {
    /// Stablecoin name
    pub const STABLE_NAME: &str = "dUSD";
    /// Stablecoin symbol
    pub const STABLE_SYMBOL: &str = "dUSD";
    /// Stablecoin decimal places
    pub const STABLE_DECIMALS: u8 = 18;
    /// One stablecoin unit with decimals
    pub const ONE_STABLE: u128 = 1_000_000_000_000_000_000;

    /// Debt receipt token name
    pub const DEBT_NAME: &str = "dUSD AMO Receipt";
    /// Debt receipt token symbol
    pub const DEBT_SYMBOL: &str = "dAMO";
    /// Debt receipt decimal places; debt units track the base currency
    /// 1:1 at this scale, independent of the stablecoin's own decimals
    pub const DEBT_DECIMALS: u8 = 18;
    /// One debt unit with decimals
    pub const ONE_DEBT: u128 = 1_000_000_000_000_000_000;
}

/// Oracle Configuration
pub mod oracle {
    /// Fixed-point scale in which the oracle reports every price
    pub const BASE_CURRENCY_UNIT: u128 = 100_000_000;

    /// Price precision (8 decimals)
    pub const PRICE_DECIMALS: u8 = 8;
}

/// Fee Configuration (in basis points, 100 = 1%)
pub mod fees {
    /// Hard cap on any redemption fee governance may configure (5%)
    pub const MAX_REDEMPTION_FEE_BPS: u128 = 500;

    /// Default redemption fee applied when no per-asset override exists (0.5%)
    pub const DEFAULT_REDEMPTION_FEE_BPS: u128 = 50;

    /// Basis points denominator
    pub const BPS_DENOMINATOR: u128 = 10_000;
}

/// AMO Configuration
pub mod amo {
    /// Default peg-deviation circuit breaker threshold (5%)
    pub const DEFAULT_PEG_DEVIATION_BPS: u128 = 500;

    /// Upper bound for the configurable peg-deviation threshold (100%)
    pub const MAX_PEG_DEVIATION_BPS: u128 = 10_000;

    /// Default rounding slack permitted between debt-token supply and
    /// the allocation ledger, in debt base units. Sized for truncation
    /// drift, not for price moves; see the manager's tolerance setter.
    pub const DEFAULT_PARITY_TOLERANCE: u128 = 1_000_000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_scales_agree() {
        assert_eq!(token::ONE_STABLE, 10u128.pow(token::STABLE_DECIMALS as u32));
        assert_eq!(token::ONE_DEBT, 10u128.pow(token::DEBT_DECIMALS as u32));
        assert_eq!(
            oracle::BASE_CURRENCY_UNIT,
            10u128.pow(oracle::PRICE_DECIMALS as u32)
        );
    }

    #[test]
    fn test_fee_bounds() {
        assert!(fees::DEFAULT_REDEMPTION_FEE_BPS <= fees::MAX_REDEMPTION_FEE_BPS);
        assert!(fees::MAX_REDEMPTION_FEE_BPS < fees::BPS_DENOMINATOR);
    }
}
