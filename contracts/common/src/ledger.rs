//! Multi-Asset Balance Ledger
//!
//! The `Bank` stands in for the chain's token balances: every fungible
//! asset in the system (collateral tokens, the stablecoin, the debt
//! receipt) is registered here with its decimals, and all balance
//! movement goes through `mint`/`burn`/`transfer`. Token contracts apply
//! their policy (roles, allowlists, allowances) and delegate the actual
//! movement to the bank, so conservation (the sum of holder balances
//! equals total supply, per asset) holds system-wide by construction.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{DstableError, DstableResult};
use crate::math::safe_add;
use crate::types::Address;
use crate::BTreeMap;

/// Per-asset registry entry
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct AssetRecord {
    /// Decimal places of the asset's fixed-point unit
    pub decimals: u8,
    /// Total units in existence
    pub total_supply: u128,
}

/// The shared balance ledger
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Bank {
    assets: BTreeMap<Address, AssetRecord>,
    balances: BTreeMap<(Address, Address), u128>,
}

impl Bank {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new asset with its decimals
    pub fn register_asset(&mut self, asset: Address, decimals: u8) -> DstableResult<()> {
        if self.assets.contains_key(&asset) {
            return Err(DstableError::AssetAlreadyRegistered { asset });
        }

        self.assets.insert(
            asset,
            AssetRecord {
                decimals,
                total_supply: 0,
            },
        );
        Ok(())
    }

    /// Check if an asset is registered
    pub fn is_registered(&self, asset: Address) -> bool {
        self.assets.contains_key(&asset)
    }

    /// Decimals of a registered asset
    pub fn decimals_of(&self, asset: Address) -> DstableResult<u8> {
        self.assets
            .get(&asset)
            .map(|record| record.decimals)
            .ok_or(DstableError::UnknownAsset { asset })
    }

    /// Total supply of a registered asset
    pub fn total_supply_of(&self, asset: Address) -> DstableResult<u128> {
        self.assets
            .get(&asset)
            .map(|record| record.total_supply)
            .ok_or(DstableError::UnknownAsset { asset })
    }

    /// Balance of a holder in an asset; zero for unknown pairs
    pub fn balance_of(&self, asset: Address, holder: Address) -> u128 {
        self.balances.get(&(asset, holder)).copied().unwrap_or(0)
    }

    /// Create new units for a holder. Returns the new total supply.
    pub fn mint(&mut self, asset: Address, to: Address, amount: u128) -> DstableResult<u128> {
        let new_balance = safe_add(self.balance_of(asset, to), amount)?;

        let record = self
            .assets
            .get_mut(&asset)
            .ok_or(DstableError::UnknownAsset { asset })?;
        let new_supply = safe_add(record.total_supply, amount)?;

        record.total_supply = new_supply;
        self.set_balance(asset, to, new_balance);

        Ok(new_supply)
    }

    /// Destroy units held by a holder. Returns the new total supply.
    pub fn burn(&mut self, asset: Address, from: Address, amount: u128) -> DstableResult<u128> {
        let balance = self.balance_of(asset, from);

        let record = self
            .assets
            .get_mut(&asset)
            .ok_or(DstableError::UnknownAsset { asset })?;
        if balance < amount {
            return Err(DstableError::InsufficientBalance {
                available: balance,
                requested: amount,
            });
        }

        // balance <= total_supply, so this cannot underflow
        let new_supply = record.total_supply - amount;

        record.total_supply = new_supply;
        self.set_balance(asset, from, balance - amount);

        Ok(new_supply)
    }

    /// Move units between holders
    pub fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> DstableResult<()> {
        if !self.is_registered(asset) {
            return Err(DstableError::UnknownAsset { asset });
        }

        let from_balance = self.balance_of(asset, from);
        if from_balance < amount {
            return Err(DstableError::InsufficientBalance {
                available: from_balance,
                requested: amount,
            });
        }

        if from == to {
            return Ok(());
        }

        let new_to_balance = safe_add(self.balance_of(asset, to), amount)?;
        self.set_balance(asset, from, from_balance - amount);
        self.set_balance(asset, to, new_to_balance);

        Ok(())
    }

    fn set_balance(&mut self, asset: Address, holder: Address, balance: u128) {
        if balance == 0 {
            self.balances.remove(&(asset, holder));
        } else {
            self.balances.insert((asset, holder), balance);
        }
    }

    /// Sum of all holder balances for an asset. Equal to total supply
    /// at all times; exposed for conservation checks in tests.
    pub fn sum_balances(&self, asset: Address) -> u128 {
        self.balances
            .iter()
            .filter(|((a, _), _)| *a == asset)
            .map(|(_, balance)| balance)
            .sum()
    }
}
