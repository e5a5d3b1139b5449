//! Protocol Events for dSTABLE
//!
//! Events are collected during contract execution and can be indexed
//! off-chain for monitoring, analytics, and alerting. Guard trips and
//! pause toggles carry their own event types so monitoring can alert on
//! them specifically.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::access_control::Role;
use crate::types::Address;
use crate::Vec;

/// Event types for indexing and filtering
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Token Events (0x01 - 0x1F)
    TokenMinted = 0x01,
    TokenBurned = 0x02,
    TokenTransferred = 0x03,
    Approval = 0x04,
    HolderAllowlistSet = 0x05,

    // Vault Events (0x20 - 0x3F)
    CollateralAllowed = 0x20,
    CollateralDisallowed = 0x21,
    CollateralDeposited = 0x22,
    CollateralWithdrawn = 0x23,

    // Issuer Events (0x40 - 0x5F)
    StableIssued = 0x40,
    ExcessCollateralIssued = 0x41,
    MintingPauseSet = 0x42,
    AssetMintingPauseSet = 0x43,

    // Redeemer Events (0x60 - 0x7F)
    StableRedeemed = 0x60,
    ProtocolRedemption = 0x61,
    DefaultRedemptionFeeSet = 0x62,
    CollateralRedemptionFeeSet = 0x63,
    CollateralRedemptionFeeCleared = 0x64,
    FeeReceiverSet = 0x65,
    RedemptionPauseSet = 0x66,
    AssetRedemptionPauseSet = 0x67,

    // AMO Events (0x80 - 0x9F)
    AmoSupplyIncreased = 0x80,
    AmoSupplyDecreased = 0x81,
    AmoWalletSet = 0x82,
    PegDeviationSet = 0x83,
    ToleranceSet = 0x84,
    AmoIncreasePauseSet = 0x85,

    // Access Control Events (0xA0 - 0xBF)
    RoleGranted = 0xA0,
    RoleRevoked = 0xA1,
}

/// Main event enum containing all protocol events
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum DstableEvent {
    // ============ Token Events ============

    /// Tokens were minted
    TokenMinted {
        asset: Address,
        to: Address,
        amount: u128,
        new_total_supply: u128,
    },

    /// Tokens were burned
    TokenBurned {
        asset: Address,
        from: Address,
        amount: u128,
        new_total_supply: u128,
    },

    /// Tokens moved between holders
    TokenTransferred {
        asset: Address,
        from: Address,
        to: Address,
        amount: u128,
    },

    /// Spender allowance was set
    Approval {
        asset: Address,
        owner: Address,
        spender: Address,
        amount: u128,
    },

    /// Debt-receipt holder allowlist toggled
    HolderAllowlistSet { holder: Address, allowed: bool },

    // ============ Vault Events ============

    /// Asset admitted to the collateral set
    CollateralAllowed { asset: Address },

    /// Asset removed from the collateral set
    CollateralDisallowed { asset: Address },

    /// Collateral moved into the vault
    CollateralDeposited {
        asset: Address,
        from: Address,
        amount: u128,
    },

    /// Collateral moved out of the vault
    CollateralWithdrawn {
        asset: Address,
        to: Address,
        amount: u128,
    },

    // ============ Issuer Events ============

    /// Stablecoin issued against deposited collateral
    StableIssued {
        caller: Address,
        collateral_asset: Address,
        collateral_amount: u128,
        stable_minted: u128,
    },

    /// Stablecoin issued against system-wide excess collateral
    ExcessCollateralIssued { receiver: Address, stable_minted: u128 },

    /// Contract-wide minting pause toggled
    MintingPauseSet { paused: bool },

    /// Per-asset minting pause toggled
    AssetMintingPauseSet { asset: Address, paused: bool },

    // ============ Redeemer Events ============

    /// Stablecoin redeemed for collateral
    StableRedeemed {
        caller: Address,
        collateral_asset: Address,
        stable_burned: u128,
        collateral_out: u128,
        fee_paid: u128,
    },

    /// Fee-free protocol redemption
    ProtocolRedemption {
        caller: Address,
        collateral_asset: Address,
        stable_burned: u128,
        collateral_out: u128,
    },

    /// Default redemption fee changed
    DefaultRedemptionFeeSet { fee_bps: u128 },

    /// Per-asset redemption fee override set
    CollateralRedemptionFeeSet { asset: Address, fee_bps: u128 },

    /// Per-asset redemption fee override cleared
    CollateralRedemptionFeeCleared { asset: Address },

    /// Fee receiver changed
    FeeReceiverSet { receiver: Address },

    /// Contract-wide redemption pause toggled
    RedemptionPauseSet { paused: bool },

    /// Per-asset redemption pause toggled
    AssetRedemptionPauseSet { asset: Address, paused: bool },

    // ============ AMO Events ============

    /// Stablecoin deployed to an AMO wallet, debt recorded
    AmoSupplyIncreased {
        wallet: Address,
        stable_amount: u128,
        debt_units: u128,
    },

    /// AMO exposure unwound, debt released
    AmoSupplyDecreased {
        wallet: Address,
        stable_amount: u128,
        debt_units: u128,
    },

    /// AMO wallet allowlist toggled
    AmoWalletSet { wallet: Address, allowed: bool },

    /// Peg-deviation threshold changed
    PegDeviationSet { bps: u128 },

    /// Debt-parity tolerance changed
    ToleranceSet { tolerance: u128 },

    /// Guardian pause on AMO increases toggled
    AmoIncreasePauseSet { paused: bool },

    // ============ Access Control Events ============

    /// Role granted to an account
    RoleGranted { role: Role, account: Address },

    /// Role revoked from an account
    RoleRevoked { role: Role, account: Address },
}

impl DstableEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::TokenMinted { .. } => EventType::TokenMinted,
            Self::TokenBurned { .. } => EventType::TokenBurned,
            Self::TokenTransferred { .. } => EventType::TokenTransferred,
            Self::Approval { .. } => EventType::Approval,
            Self::HolderAllowlistSet { .. } => EventType::HolderAllowlistSet,
            Self::CollateralAllowed { .. } => EventType::CollateralAllowed,
            Self::CollateralDisallowed { .. } => EventType::CollateralDisallowed,
            Self::CollateralDeposited { .. } => EventType::CollateralDeposited,
            Self::CollateralWithdrawn { .. } => EventType::CollateralWithdrawn,
            Self::StableIssued { .. } => EventType::StableIssued,
            Self::ExcessCollateralIssued { .. } => EventType::ExcessCollateralIssued,
            Self::MintingPauseSet { .. } => EventType::MintingPauseSet,
            Self::AssetMintingPauseSet { .. } => EventType::AssetMintingPauseSet,
            Self::StableRedeemed { .. } => EventType::StableRedeemed,
            Self::ProtocolRedemption { .. } => EventType::ProtocolRedemption,
            Self::DefaultRedemptionFeeSet { .. } => EventType::DefaultRedemptionFeeSet,
            Self::CollateralRedemptionFeeSet { .. } => EventType::CollateralRedemptionFeeSet,
            Self::CollateralRedemptionFeeCleared { .. } => {
                EventType::CollateralRedemptionFeeCleared
            }
            Self::FeeReceiverSet { .. } => EventType::FeeReceiverSet,
            Self::RedemptionPauseSet { .. } => EventType::RedemptionPauseSet,
            Self::AssetRedemptionPauseSet { .. } => EventType::AssetRedemptionPauseSet,
            Self::AmoSupplyIncreased { .. } => EventType::AmoSupplyIncreased,
            Self::AmoSupplyDecreased { .. } => EventType::AmoSupplyDecreased,
            Self::AmoWalletSet { .. } => EventType::AmoWalletSet,
            Self::PegDeviationSet { .. } => EventType::PegDeviationSet,
            Self::ToleranceSet { .. } => EventType::ToleranceSet,
            Self::AmoIncreasePauseSet { .. } => EventType::AmoIncreasePauseSet,
            Self::RoleGranted { .. } => EventType::RoleGranted,
            Self::RoleRevoked { .. } => EventType::RoleRevoked,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log collecting events during execution
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct EventLog {
    events: Vec<DstableEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: DstableEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[DstableEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<DstableEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&DstableEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true when no events have been emitted
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = DstableEvent::StableIssued {
            caller: [1u8; 32],
            collateral_asset: [10u8; 32],
            collateral_amount: 1_000_000_000,
            stable_minted: 1_000_000_000_000_000_000_000,
        };

        assert_eq!(event.event_type(), EventType::StableIssued);
    }

    #[test]
    fn test_event_serialization() {
        let event = DstableEvent::AmoSupplyIncreased {
            wallet: [2u8; 32],
            stable_amount: 100_000_000_000_000_000_000,
            debt_units: 100_000_000_000_000_000_000,
        };

        let bytes = event.to_bytes();
        let restored = DstableEvent::from_bytes(&bytes).unwrap();

        assert_eq!(event, restored);
    }

    #[test]
    fn test_event_log_filter() {
        let mut log = EventLog::new();

        log.emit(DstableEvent::CollateralAllowed { asset: [10u8; 32] });
        log.emit(DstableEvent::CollateralDeposited {
            asset: [10u8; 32],
            from: [1u8; 32],
            amount: 500,
        });
        log.emit(DstableEvent::CollateralAllowed { asset: [11u8; 32] });

        assert_eq!(log.len(), 3);
        assert!(log.has_events());

        let allowed = log.filter_by_type(EventType::CollateralAllowed);
        assert_eq!(allowed.len(), 2);

        log.clear();
        assert!(log.is_empty());
    }
}
