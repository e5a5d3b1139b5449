//! Price Oracle Boundary
//!
//! The protocol consumes prices through a single call that either
//! returns a trusted value or fails. Staleness and fallback logic live
//! behind the boundary; this crate never interprets them. A price that
//! cannot be trusted must surface as an error here, not as zero; every
//! consumer is fail-closed.
//!
//! `StaticPriceOracle` is the in-crate implementation used by the test
//! harnesses and deploy tooling: a plain price book with per-asset
//! alive flags and immutable hard-peg entries (used for the debt
//! receipt token, which is priced 1:1 against the base currency).

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::oracle::BASE_CURRENCY_UNIT;
use crate::errors::{DstableError, DstableResult};
use crate::types::Address;
use crate::BTreeMap;

/// The consumed oracle interface.
///
/// `base_currency_unit` is read once at construction by every consumer
/// and held for the component's lifetime.
pub trait PriceOracle {
    /// Price of one whole unit of `asset`, scaled to the base currency
    /// unit. Fails when no trusted price exists.
    fn get_asset_price(&self, asset: Address) -> DstableResult<u128>;

    /// The fixed-point scale every price is reported in
    fn base_currency_unit(&self) -> u128;
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
struct PriceEntry {
    price: u128,
    is_alive: bool,
    hard_peg: bool,
}

/// A static price book implementing [`PriceOracle`]
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct StaticPriceOracle {
    base_unit: u128,
    entries: BTreeMap<Address, PriceEntry>,
}

impl Default for StaticPriceOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticPriceOracle {
    /// Create an empty price book at the protocol base unit
    pub fn new() -> Self {
        Self {
            base_unit: BASE_CURRENCY_UNIT,
            entries: BTreeMap::new(),
        }
    }

    /// Set an asset's price, creating or reviving its entry
    pub fn set_price(&mut self, asset: Address, price: u128) -> DstableResult<()> {
        if let Some(entry) = self.entries.get(&asset) {
            if entry.hard_peg {
                return Err(DstableError::HardPeggedAsset { asset });
            }
        }

        self.entries.insert(
            asset,
            PriceEntry {
                price,
                is_alive: true,
                hard_peg: false,
            },
        );
        Ok(())
    }

    /// Mark an existing entry alive or dead
    pub fn set_alive(&mut self, asset: Address, alive: bool) -> DstableResult<()> {
        let entry = self
            .entries
            .get_mut(&asset)
            .ok_or(DstableError::OraclePriceUnavailable { asset })?;
        if entry.hard_peg {
            return Err(DstableError::HardPeggedAsset { asset });
        }

        entry.is_alive = alive;
        Ok(())
    }

    /// Pin an asset to exactly one base currency unit, permanently.
    /// Hard-pegged entries cannot be repriced or killed afterwards.
    pub fn set_hard_peg(&mut self, asset: Address) {
        self.entries.insert(
            asset,
            PriceEntry {
                price: self.base_unit,
                is_alive: true,
                hard_peg: true,
            },
        );
    }
}

impl PriceOracle for StaticPriceOracle {
    fn get_asset_price(&self, asset: Address) -> DstableResult<u128> {
        match self.entries.get(&asset) {
            Some(entry) if entry.is_alive && entry.price > 0 => Ok(entry.price),
            _ => Err(DstableError::OraclePriceUnavailable { asset }),
        }
    }

    fn base_currency_unit(&self) -> u128 {
        self.base_unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDC: Address = [10u8; 32];
    const DEBT: Address = [11u8; 32];

    #[test]
    fn test_missing_price_fails() {
        let oracle = StaticPriceOracle::new();
        assert!(matches!(
            oracle.get_asset_price(USDC),
            Err(DstableError::OraclePriceUnavailable { .. })
        ));
    }

    #[test]
    fn test_set_and_read_price() {
        let mut oracle = StaticPriceOracle::new();
        oracle.set_price(USDC, 100_000_000).unwrap();
        assert_eq!(oracle.get_asset_price(USDC).unwrap(), 100_000_000);
    }

    #[test]
    fn test_dead_price_fails_closed() {
        let mut oracle = StaticPriceOracle::new();
        oracle.set_price(USDC, 100_000_000).unwrap();
        oracle.set_alive(USDC, false).unwrap();

        assert!(oracle.get_asset_price(USDC).is_err());

        oracle.set_alive(USDC, true).unwrap();
        assert!(oracle.get_asset_price(USDC).is_ok());
    }

    #[test]
    fn test_zero_price_fails_closed() {
        let mut oracle = StaticPriceOracle::new();
        oracle.set_price(USDC, 0).unwrap();
        assert!(oracle.get_asset_price(USDC).is_err());
    }

    #[test]
    fn test_hard_peg_is_immutable() {
        let mut oracle = StaticPriceOracle::new();
        oracle.set_hard_peg(DEBT);

        assert_eq!(
            oracle.get_asset_price(DEBT).unwrap(),
            oracle.base_currency_unit()
        );
        assert!(matches!(
            oracle.set_price(DEBT, 90_000_000),
            Err(DstableError::HardPeggedAsset { .. })
        ));
        assert!(matches!(
            oracle.set_alive(DEBT, false),
            Err(DstableError::HardPeggedAsset { .. })
        ));
    }
}
