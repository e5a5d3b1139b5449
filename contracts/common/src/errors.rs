//! Error Types for the dSTABLE Protocol
//!
//! Typed errors with stable codes so off-chain monitoring can tell a
//! tripped circuit breaker from a generic revert without replaying the
//! transaction. Every error aborts the whole operation; nothing in this
//! protocol recovers locally.

use crate::access_control::Role;
use crate::types::Address;

/// Result type alias for dSTABLE operations
pub type DstableResult<T> = Result<T, DstableError>;

/// Main error enum for all dSTABLE protocol errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DstableError {
    // ============ Collateral Errors ============
    /// Asset is not in the vault's allowed collateral set
    UnsupportedCollateral { asset: Address },

    /// Asset is already allowed as collateral
    CollateralAlreadyAllowed { asset: Address },

    /// Asset is not registered in the balance ledger
    UnknownAsset { asset: Address },

    /// Asset is already registered in the balance ledger
    AssetAlreadyRegistered { asset: Address },

    // ============ Authorization Errors ============
    /// Caller does not hold the required role
    MissingRole { role: Role, account: Address },

    /// Wallet is not on the AMO wallet allowlist
    AmoWalletNotAllowed { wallet: Address },

    /// Target address may not hold the debt receipt token
    HolderNotAllowed { holder: Address },

    // ============ Oracle Errors ============
    /// Oracle has no live price for the asset
    OraclePriceUnavailable { asset: Address },

    /// Asset is hard-pegged; its price entry cannot be changed
    HardPeggedAsset { asset: Address },

    // ============ Pause Errors ============
    /// Contract-wide minting pause is active
    MintingPaused,

    /// Contract-wide redemption pause is active
    RedemptionPaused,

    /// Minting is paused for this collateral asset
    AssetMintingPaused { asset: Address },

    /// Redemption is paused for this collateral asset
    AssetRedemptionPaused { asset: Address },

    /// AMO supply increases are paused by the guardian flag
    AmoIncreasePaused,

    // ============ Input Validation Errors ============
    /// Output fell below the caller's slippage floor
    SlippageExceeded { actual: u128, min: u128 },

    /// Zero amount not allowed
    ZeroAmount,

    /// Zero address not allowed
    ZeroAddress { param: &'static str },

    /// Fee exceeds the hard-coded maximum
    FeeTooHigh { fee_bps: u128, max_bps: u128 },

    /// Peg-deviation threshold above 100%
    PegDeviationOutOfRange { bps: u128 },

    // ============ Peg Guard Errors ============
    /// A watched token's price drifted beyond the peg tolerance
    PegDeviationExceeded {
        asset: Address,
        price: u128,
        deviation_bps: u128,
        max_deviation_bps: u128,
    },

    // ============ Balance Errors ============
    /// Insufficient balance for operation
    InsufficientBalance { available: u128, requested: u128 },

    /// Insufficient allowance for third-party burn
    InsufficientAllowance { available: u128, requested: u128 },

    /// Wallet's AMO allocation is smaller than the requested decrease
    InsufficientAllocation { allocated: u128, requested: u128 },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Division by zero
    DivisionByZero,

    // ============ Invariant Violations ============
    /// Issuance would push circulating supply past collateral value
    IssuanceSurpassesExcessCollateral {
        circulating: u128,
        collateral_value: u128,
    },

    /// Debt-token supply and the allocation ledger diverged past tolerance
    DebtParityBroken {
        debt_supply: u128,
        allocated: u128,
        tolerance: u128,
    },

    // ============ Reentrancy ============
    /// Entry lock was already held
    ReentrancyDetected,
}

/// Spec-level error classes, used by monitoring to bucket reverts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied bad input; terminal for the call
    InvalidInput,
    /// Caller lacks a capability
    Unauthorized,
    /// Expected-in-production precondition failed (pause, guard, oracle)
    StatePrecondition,
    /// Should-never-happen in correct operation; configuration error or exploit
    InvariantViolation,
}

impl DstableError {
    /// Returns a stable error code for logging/alerting
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedCollateral { .. } => "E010_UNSUPPORTED_COLLATERAL",
            Self::CollateralAlreadyAllowed { .. } => "E011_COLLATERAL_ALLOWED",
            Self::UnknownAsset { .. } => "E012_UNKNOWN_ASSET",
            Self::AssetAlreadyRegistered { .. } => "E013_ASSET_REGISTERED",
            Self::MissingRole { .. } => "E020_MISSING_ROLE",
            Self::AmoWalletNotAllowed { .. } => "E021_AMO_WALLET_NOT_ALLOWED",
            Self::HolderNotAllowed { .. } => "E022_HOLDER_NOT_ALLOWED",
            Self::OraclePriceUnavailable { .. } => "E030_ORACLE_UNAVAILABLE",
            Self::HardPeggedAsset { .. } => "E031_HARD_PEGGED",
            Self::MintingPaused => "E040_MINTING_PAUSED",
            Self::RedemptionPaused => "E041_REDEMPTION_PAUSED",
            Self::AssetMintingPaused { .. } => "E042_ASSET_MINTING_PAUSED",
            Self::AssetRedemptionPaused { .. } => "E043_ASSET_REDEMPTION_PAUSED",
            Self::AmoIncreasePaused => "E044_AMO_INCREASE_PAUSED",
            Self::SlippageExceeded { .. } => "E050_SLIPPAGE",
            Self::ZeroAmount => "E051_ZERO_AMOUNT",
            Self::ZeroAddress { .. } => "E052_ZERO_ADDRESS",
            Self::FeeTooHigh { .. } => "E053_FEE_TOO_HIGH",
            Self::PegDeviationOutOfRange { .. } => "E054_PEG_BPS_RANGE",
            Self::PegDeviationExceeded { .. } => "E060_PEG_DEVIATION",
            Self::InsufficientBalance { .. } => "E070_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E071_INSUFFICIENT_ALLOWANCE",
            Self::InsufficientAllocation { .. } => "E072_INSUFFICIENT_ALLOCATION",
            Self::Overflow => "E080_OVERFLOW",
            Self::DivisionByZero => "E081_DIV_ZERO",
            Self::IssuanceSurpassesExcessCollateral { .. } => "E090_EXCESS_COLLATERAL",
            Self::DebtParityBroken { .. } => "E091_DEBT_PARITY",
            Self::ReentrancyDetected => "E100_REENTRANCY",
        }
    }

    /// Classify the error into its taxonomy bucket
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedCollateral { .. }
            | Self::CollateralAlreadyAllowed { .. }
            | Self::UnknownAsset { .. }
            | Self::AssetAlreadyRegistered { .. }
            | Self::SlippageExceeded { .. }
            | Self::ZeroAmount
            | Self::ZeroAddress { .. }
            | Self::FeeTooHigh { .. }
            | Self::PegDeviationOutOfRange { .. }
            | Self::HardPeggedAsset { .. }
            | Self::InsufficientBalance { .. }
            | Self::InsufficientAllowance { .. }
            | Self::InsufficientAllocation { .. }
            | Self::Overflow
            | Self::DivisionByZero => ErrorKind::InvalidInput,

            Self::MissingRole { .. }
            | Self::AmoWalletNotAllowed { .. }
            | Self::HolderNotAllowed { .. } => ErrorKind::Unauthorized,

            Self::OraclePriceUnavailable { .. }
            | Self::MintingPaused
            | Self::RedemptionPaused
            | Self::AssetMintingPaused { .. }
            | Self::AssetRedemptionPaused { .. }
            | Self::AmoIncreasePaused
            | Self::PegDeviationExceeded { .. }
            | Self::ReentrancyDetected => ErrorKind::StatePrecondition,

            Self::IssuanceSurpassesExcessCollateral { .. } | Self::DebtParityBroken { .. } => {
                ErrorKind::InvariantViolation
            }
        }
    }

    /// Returns true if the caller can fix the condition and retry
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::SlippageExceeded { .. } => true,      // Refresh quote, widen floor
            Self::InsufficientBalance { .. } => true,   // Fund the account
            Self::InsufficientAllowance { .. } => true, // Approve more
            Self::OraclePriceUnavailable { .. } => true, // Wait for the feed
            Self::PegDeviationExceeded { .. } => true,  // Wait for the peg
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            DstableError::UnsupportedCollateral { asset: [0u8; 32] },
            DstableError::MintingPaused,
            DstableError::SlippageExceeded { actual: 1, min: 2 },
            DstableError::PegDeviationExceeded {
                asset: [0u8; 32],
                price: 106_000_000,
                deviation_bps: 600,
                max_deviation_bps: 500,
            },
            DstableError::DebtParityBroken {
                debt_supply: 10,
                allocated: 0,
                tolerance: 1,
            },
            DstableError::Overflow,
            DstableError::ReentrancyDetected,
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_kind_buckets() {
        assert_eq!(
            DstableError::SlippageExceeded { actual: 0, min: 1 }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            DstableError::MissingRole {
                role: Role::Minter,
                account: [1u8; 32],
            }
            .kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(DstableError::MintingPaused.kind(), ErrorKind::StatePrecondition);
        assert_eq!(
            DstableError::DebtParityBroken {
                debt_supply: 2,
                allocated: 0,
                tolerance: 1,
            }
            .kind(),
            ErrorKind::InvariantViolation
        );
    }

    #[test]
    fn test_guard_trip_is_recoverable() {
        let err = DstableError::PegDeviationExceeded {
            asset: [0u8; 32],
            price: 106_000_000,
            deviation_bps: 600,
            max_deviation_bps: 500,
        };
        assert!(err.is_recoverable());
        assert!(!DstableError::MintingPaused.is_recoverable());
    }
}
