//! Issuer Contract
//!
//! The external entry for turning collateral into stablecoin. Supplied
//! collateral is priced through the oracle, moved straight into the
//! vault (the issuer never custodies funds), and the equivalent
//! stablecoin is minted to the caller. Issuance against system-wide
//! excess collateral is a separate, privileged path that checks the
//! solvency invariant on the post-mint quantities.
//!
//! Pauses are layered: a contract-wide pause halts every mint path,
//! and a per-asset pause halts one collateral without removing it from
//! the vault's allowed set.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use dstable_collateral_vault::CollateralVault;
use dstable_common::{
    errors::{DstableError, DstableResult},
    events::{DstableEvent, EventLog},
    invariants::assert_solvent,
    is_zero_address,
    math::{amount_from_base_value, mul_div, safe_add},
    oracle::PriceOracle,
    reentrancy::ReentrancyGuard,
    Address, Bank, BTreeSet, Role, RoleTable,
};
use dstable_debt_token::DebtReceiptToken;
use dstable_token::StableToken;

/// The issuer contract state
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Issuer {
    address: Address,
    roles: RoleTable,
    minting_paused: bool,
    asset_minting_paused: BTreeSet<Address>,
    base_currency_unit: u128,
    guard: ReentrancyGuard,
    /// Events emitted by this contract
    pub events: EventLog,
}

impl Issuer {
    /// Deploy the issuer. The oracle's base currency unit is captured
    /// once here and held for the contract's lifetime.
    pub fn new(
        address: Address,
        admin: Address,
        oracle: &impl PriceOracle,
    ) -> DstableResult<Self> {
        if is_zero_address(&address) {
            return Err(DstableError::ZeroAddress { param: "address" });
        }

        Ok(Self {
            address,
            roles: RoleTable::new(admin)?,
            minting_paused: false,
            asset_minting_paused: BTreeSet::new(),
            base_currency_unit: oracle.base_currency_unit(),
            guard: ReentrancyGuard::new(),
            events: EventLog::new(),
        })
    }

    /// The issuer's own address, the holder of its `Minter` grant
    pub fn address(&self) -> Address {
        self.address
    }

    // ============ Access Control ============

    /// Check role membership on this contract's table
    pub fn has_role(&self, role: Role, account: Address) -> bool {
        self.roles.has_role(role, account)
    }

    /// Grant a role (caller must be admin)
    pub fn grant_role(&mut self, caller: Address, role: Role, account: Address) -> DstableResult<()> {
        self.roles.grant_role(caller, role, account)?;
        self.events.emit(DstableEvent::RoleGranted { role, account });
        Ok(())
    }

    /// Revoke a role (caller must be admin)
    pub fn revoke_role(&mut self, caller: Address, role: Role, account: Address) -> DstableResult<()> {
        self.roles.revoke_role(caller, role, account)?;
        self.events.emit(DstableEvent::RoleRevoked { role, account });
        Ok(())
    }

    // ============ Issuance ============

    /// Issue stablecoin against collateral. Prices `collateral_amount`
    /// of `collateral_asset`, transfers it from the caller into the
    /// vault, and mints the stablecoin equivalent to the caller.
    /// Fails with `SlippageExceeded` when the mint would fall below
    /// `min_stable_out`. Returns the amount minted.
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        &mut self,
        bank: &mut Bank,
        stable: &mut StableToken,
        vault: &mut CollateralVault,
        oracle: &impl PriceOracle,
        caller: Address,
        collateral_asset: Address,
        collateral_amount: u128,
        min_stable_out: u128,
    ) -> DstableResult<u128> {
        self.guard.enter()?;
        let result = self.issue_inner(
            bank,
            stable,
            vault,
            oracle,
            caller,
            collateral_asset,
            collateral_amount,
            min_stable_out,
        );
        self.guard.exit();
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn issue_inner(
        &mut self,
        bank: &mut Bank,
        stable: &mut StableToken,
        vault: &mut CollateralVault,
        oracle: &impl PriceOracle,
        caller: Address,
        collateral_asset: Address,
        collateral_amount: u128,
        min_stable_out: u128,
    ) -> DstableResult<u128> {
        if self.minting_paused {
            return Err(DstableError::MintingPaused);
        }
        if self.asset_minting_paused.contains(&collateral_asset) {
            return Err(DstableError::AssetMintingPaused {
                asset: collateral_asset,
            });
        }
        if !vault.is_collateral_supported(collateral_asset) {
            return Err(DstableError::UnsupportedCollateral {
                asset: collateral_asset,
            });
        }
        if is_zero_address(&caller) {
            return Err(DstableError::ZeroAddress { param: "caller" });
        }
        if collateral_amount == 0 {
            return Err(DstableError::ZeroAmount);
        }

        let base_value =
            vault.asset_value_from_amount(bank, oracle, collateral_amount, collateral_asset)?;
        let stable_out = self.base_value_to_stable_amount(oracle, stable, base_value)?;

        if stable_out == 0 {
            return Err(DstableError::ZeroAmount);
        }
        if stable_out < min_stable_out {
            return Err(DstableError::SlippageExceeded {
                actual: stable_out,
                min: min_stable_out,
            });
        }

        // The mint must not be able to fail once collateral has moved
        stable.require_role(Role::Minter, self.address)?;

        vault.deposit(bank, caller, collateral_asset, collateral_amount)?;
        stable.mint(bank, self.address, caller, stable_out)?;

        self.events.emit(DstableEvent::StableIssued {
            caller,
            collateral_asset,
            collateral_amount,
            stable_minted: stable_out,
        });
        Ok(stable_out)
    }

    /// Privileged mint against system-wide excess collateral. No
    /// collateral moves; instead the solvency bound is asserted on the
    /// post-mint quantities. Because the vault carries the debt receipt
    /// as collateral, the bound compares total supply against total
    /// vault value; AMO exposure cancels out of both sides. Requires
    /// `IncentivesManager`.
    pub fn issue_using_excess_collateral(
        &mut self,
        bank: &mut Bank,
        stable: &mut StableToken,
        vault: &CollateralVault,
        oracle: &impl PriceOracle,
        caller: Address,
        receiver: Address,
        stable_amount: u128,
    ) -> DstableResult<()> {
        self.guard.enter()?;
        let result =
            self.issue_excess_inner(bank, stable, vault, oracle, caller, receiver, stable_amount);
        self.guard.exit();
        result
    }

    fn issue_excess_inner(
        &mut self,
        bank: &mut Bank,
        stable: &mut StableToken,
        vault: &CollateralVault,
        oracle: &impl PriceOracle,
        caller: Address,
        receiver: Address,
        stable_amount: u128,
    ) -> DstableResult<()> {
        if self.minting_paused {
            return Err(DstableError::MintingPaused);
        }
        self.roles.require_role(Role::IncentivesManager, caller)?;
        if is_zero_address(&receiver) {
            return Err(DstableError::ZeroAddress { param: "receiver" });
        }
        if stable_amount == 0 {
            return Err(DstableError::ZeroAmount);
        }

        let supply_after = safe_add(stable.total_supply(bank), stable_amount)?;
        let vault_value = vault.total_value(bank, oracle)?;
        let vault_value_stable = self.base_value_to_stable_amount(oracle, stable, vault_value)?;

        assert_solvent(supply_after, vault_value_stable)?;

        stable.require_role(Role::Minter, self.address)?;
        stable.mint(bank, self.address, receiver, stable_amount)?;

        self.events.emit(DstableEvent::ExcessCollateralIssued {
            receiver,
            stable_minted: stable_amount,
        });
        Ok(())
    }

    // ============ Views ============

    /// Total stablecoin supply minus the portion attributable to AMO
    /// debt, with the debt receipt converted at its 1:1 base value.
    pub fn circulating_supply(
        &self,
        bank: &Bank,
        stable: &StableToken,
        debt: &DebtReceiptToken,
        oracle: &impl PriceOracle,
    ) -> DstableResult<u128> {
        let total = stable.total_supply(bank);
        let debt_supply = debt.total_supply(bank);
        if debt_supply == 0 {
            return Ok(total);
        }

        // Debt units track the base currency 1:1 at debt-token scale
        let amo_backed_base = mul_div(
            debt_supply,
            self.base_currency_unit,
            dstable_common::constants::token::ONE_DEBT,
        )?;
        let amo_backed_stable = self.base_value_to_stable_amount(oracle, stable, amo_backed_base)?;

        Ok(total.saturating_sub(amo_backed_stable))
    }

    /// Convert a base-currency value into stablecoin units at the
    /// stablecoin's live oracle price
    pub fn base_value_to_stable_amount(
        &self,
        oracle: &impl PriceOracle,
        stable: &StableToken,
        value: u128,
    ) -> DstableResult<u128> {
        let price = oracle.get_asset_price(stable.asset())?;
        amount_from_base_value(value, price, StableToken::decimals())
    }

    /// Asset-level mint switch; independent of the vault's allow flag
    pub fn is_asset_minting_enabled(&self, asset: Address) -> bool {
        !self.asset_minting_paused.contains(&asset)
    }

    /// Whether the contract-wide pause is active
    pub fn is_minting_paused(&self) -> bool {
        self.minting_paused
    }

    // ============ Pauses ============

    /// Toggle the per-asset mint pause (caller must hold `Pauser`)
    pub fn set_asset_minting_pause(
        &mut self,
        caller: Address,
        asset: Address,
        paused: bool,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::Pauser, caller)?;

        if paused {
            self.asset_minting_paused.insert(asset);
        } else {
            self.asset_minting_paused.remove(&asset);
        }
        self.events
            .emit(DstableEvent::AssetMintingPauseSet { asset, paused });
        Ok(())
    }

    /// Halt every mint path (caller must hold `Pauser`)
    pub fn pause_minting(&mut self, caller: Address) -> DstableResult<()> {
        self.roles.require_role(Role::Pauser, caller)?;
        self.minting_paused = true;
        self.events
            .emit(DstableEvent::MintingPauseSet { paused: true });
        Ok(())
    }

    /// Resume minting (caller must hold `Pauser`)
    pub fn unpause_minting(&mut self, caller: Address) -> DstableResult<()> {
        self.roles.require_role(Role::Pauser, caller)?;
        self.minting_paused = false;
        self.events
            .emit(DstableEvent::MintingPauseSet { paused: false });
        Ok(())
    }
}
