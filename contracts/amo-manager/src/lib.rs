//! AMO Manager Contract
//!
//! The only path by which freshly minted stablecoin is deployed into
//! yield strategies, and the only path by which that exposure is
//! unwound. Every deployed unit is mirrored by debt receipt tokens
//! minted into the collateral vault and by a per-wallet allocation
//! counter, so the exposure stays on the protocol's books instead of
//! counting as circulating supply.
//!
//! A peg-deviation circuit breaker runs fresh on every supply change:
//! it reads both the stablecoin's and the debt receipt's oracle price
//! and rejects the call when either has drifted past the configured
//! tolerance. The guard is never latched; it clears by itself once the
//! queried price returns to range. A single dead or manipulated feed
//! therefore blocks the whole AMO pathway.
//!
//! The guardian pause is an explicit flag on increases only. Winding
//! exposure down is never blocked by the pause, and the increase and
//! decrease capabilities are separately revocable roles on top of it.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use dstable_collateral_vault::CollateralVault;
use dstable_common::{
    constants::{amo, token},
    errors::{DstableError, DstableResult},
    events::{DstableEvent, EventLog},
    invariants::assert_debt_parity,
    is_zero_address,
    math::{base_value_of, deviation_bps, mul_div, safe_add, safe_sub},
    oracle::PriceOracle,
    reentrancy::ReentrancyGuard,
    Address, Bank, BTreeMap, BTreeSet, Role, RoleTable,
};
use dstable_debt_token::DebtReceiptToken;
use dstable_token::StableToken;

/// The AMO manager contract state
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct AmoManager {
    address: Address,
    roles: RoleTable,
    amo_wallets: BTreeSet<Address>,
    allocations: BTreeMap<Address, u128>,
    peg_deviation_bps: u128,
    tolerance: u128,
    increase_paused: bool,
    base_currency_unit: u128,
    guard: ReentrancyGuard,
    /// Events emitted by this contract
    pub events: EventLog,
}

impl AmoManager {
    /// Deploy the manager with default guard threshold and parity
    /// tolerance. The oracle's base currency unit is captured once.
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
            amo_wallets: BTreeSet::new(),
            allocations: BTreeMap::new(),
            peg_deviation_bps: amo::DEFAULT_PEG_DEVIATION_BPS,
            tolerance: amo::DEFAULT_PARITY_TOLERANCE,
            increase_paused: false,
            base_currency_unit: oracle.base_currency_unit(),
            guard: ReentrancyGuard::new(),
            events: EventLog::new(),
        })
    }

    /// The manager's own address: holder of the stablecoin `Minter`
    /// grant, the debt token's `AmoManager` grant, and the wallets'
    /// burn allowances
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

    // ============ Supply Operations ============

    /// Deploy `stable_amount` of fresh stablecoin to an allowlisted AMO
    /// wallet. Mints the base-value equivalent as debt receipt tokens
    /// into the vault and increments the wallet's allocation counter by
    /// the same debt units. Requires `AmoIncrease`, a clear peg guard,
    /// and the guardian pause to be off.
    #[allow(clippy::too_many_arguments)]
    pub fn increase_amo_supply(
        &mut self,
        bank: &mut Bank,
        stable: &mut StableToken,
        debt: &mut DebtReceiptToken,
        vault: &CollateralVault,
        oracle: &impl PriceOracle,
        caller: Address,
        stable_amount: u128,
        amo_wallet: Address,
    ) -> DstableResult<()> {
        self.guard.enter()?;
        let result = self.increase_inner(
            bank,
            stable,
            debt,
            vault,
            oracle,
            caller,
            stable_amount,
            amo_wallet,
        );
        self.guard.exit();
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn increase_inner(
        &mut self,
        bank: &mut Bank,
        stable: &mut StableToken,
        debt: &mut DebtReceiptToken,
        vault: &CollateralVault,
        oracle: &impl PriceOracle,
        caller: Address,
        stable_amount: u128,
        amo_wallet: Address,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::AmoIncrease, caller)?;
        if self.increase_paused {
            return Err(DstableError::AmoIncreasePaused);
        }
        if !self.amo_wallets.contains(&amo_wallet) {
            return Err(DstableError::AmoWalletNotAllowed { wallet: amo_wallet });
        }
        if stable_amount == 0 {
            return Err(DstableError::ZeroAmount);
        }

        self.check_peg(oracle, stable.asset(), debt.asset())?;

        let debt_units = self.debt_units_for(oracle, stable, stable_amount)?;
        if debt_units == 0 {
            return Err(DstableError::ZeroAmount);
        }

        // Parity is checked up front: the increase moves supply and
        // allocations by the same debt units, so the divergence it
        // would exhibit afterwards already exists now.
        let new_allocation = safe_add(self.allocation_of(amo_wallet), debt_units)?;
        assert_debt_parity(debt.total_supply(bank), self.total_allocated(), self.tolerance)?;

        // Neither mint may fail once the other has happened
        stable.require_role(Role::Minter, self.address)?;
        debt.require_role(Role::AmoManager, self.address)?;
        if !debt.is_allowed_holder(vault.address()) {
            return Err(DstableError::HolderNotAllowed {
                holder: vault.address(),
            });
        }

        stable.mint(bank, self.address, amo_wallet, stable_amount)?;
        debt.mint(bank, self.address, vault.address(), debt_units)?;
        self.allocations.insert(amo_wallet, new_allocation);

        self.events.emit(DstableEvent::AmoSupplyIncreased {
            wallet: amo_wallet,
            stable_amount,
            debt_units,
        });
        Ok(())
    }

    /// Unwind AMO exposure: burns `stable_amount` from the wallet
    /// (which must have approved this contract), burns the matching
    /// debt receipt from the vault, and decrements the wallet's
    /// allocation. Requires `AmoDecrease` and a clear peg guard; the
    /// guardian pause does not apply.
    #[allow(clippy::too_many_arguments)]
    pub fn decrease_amo_supply(
        &mut self,
        bank: &mut Bank,
        stable: &mut StableToken,
        debt: &mut DebtReceiptToken,
        vault: &CollateralVault,
        oracle: &impl PriceOracle,
        caller: Address,
        stable_amount: u128,
        amo_wallet: Address,
    ) -> DstableResult<()> {
        self.guard.enter()?;
        let result = self.decrease_inner(
            bank,
            stable,
            debt,
            vault,
            oracle,
            caller,
            stable_amount,
            amo_wallet,
        );
        self.guard.exit();
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn decrease_inner(
        &mut self,
        bank: &mut Bank,
        stable: &mut StableToken,
        debt: &mut DebtReceiptToken,
        vault: &CollateralVault,
        oracle: &impl PriceOracle,
        caller: Address,
        stable_amount: u128,
        amo_wallet: Address,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::AmoDecrease, caller)?;
        if stable_amount == 0 {
            return Err(DstableError::ZeroAmount);
        }

        self.check_peg(oracle, stable.asset(), debt.asset())?;

        let debt_units = self.debt_units_for(oracle, stable, stable_amount)?;
        if debt_units == 0 {
            return Err(DstableError::ZeroAmount);
        }

        let allocated = self.allocation_of(amo_wallet);
        if allocated < debt_units {
            return Err(DstableError::InsufficientAllocation {
                allocated,
                requested: debt_units,
            });
        }

        // Same reasoning as the increase: the decrease is symmetric,
        // so pre-existing divergence is what the check sees either way.
        assert_debt_parity(debt.total_supply(bank), self.total_allocated(), self.tolerance)?;

        // Verify everything the two burns need, so neither can fail
        // after the other has happened
        debt.require_role(Role::AmoManager, self.address)?;
        let wallet_balance = stable.balance_of(bank, amo_wallet);
        if wallet_balance < stable_amount {
            return Err(DstableError::InsufficientBalance {
                available: wallet_balance,
                requested: stable_amount,
            });
        }
        let wallet_allowance = stable.allowance(amo_wallet, self.address);
        if wallet_allowance < stable_amount {
            return Err(DstableError::InsufficientAllowance {
                available: wallet_allowance,
                requested: stable_amount,
            });
        }
        let vault_debt_balance = debt.balance_of(bank, vault.address());
        if vault_debt_balance < debt_units {
            return Err(DstableError::InsufficientBalance {
                available: vault_debt_balance,
                requested: debt_units,
            });
        }

        stable.burn_from(bank, self.address, amo_wallet, stable_amount)?;
        debt.burn(bank, self.address, vault.address(), debt_units)?;

        let remaining = safe_sub(allocated, debt_units)?;
        if remaining == 0 {
            self.allocations.remove(&amo_wallet);
        } else {
            self.allocations.insert(amo_wallet, remaining);
        }

        self.events.emit(DstableEvent::AmoSupplyDecreased {
            wallet: amo_wallet,
            stable_amount,
            debt_units,
        });
        Ok(())
    }

    // ============ Peg Guard ============

    /// Evaluate the circuit breaker against live prices for both
    /// watched tokens. Never latched: each call reads fresh prices.
    fn check_peg(
        &self,
        oracle: &impl PriceOracle,
        stable_asset: Address,
        debt_asset: Address,
    ) -> DstableResult<()> {
        for asset in [stable_asset, debt_asset] {
            let price = oracle.get_asset_price(asset)?;
            let deviation = deviation_bps(price, self.base_currency_unit)?;
            if deviation > self.peg_deviation_bps {
                return Err(DstableError::PegDeviationExceeded {
                    asset,
                    price,
                    deviation_bps: deviation,
                    max_deviation_bps: self.peg_deviation_bps,
                });
            }
        }
        Ok(())
    }

    /// Debt units backing a stablecoin amount: its base value at the
    /// live oracle price, rescaled to debt-token decimals. Tracks the
    /// base currency 1:1 regardless of the stablecoin's own decimals.
    fn debt_units_for(
        &self,
        oracle: &impl PriceOracle,
        stable: &StableToken,
        stable_amount: u128,
    ) -> DstableResult<u128> {
        let stable_price = oracle.get_asset_price(stable.asset())?;
        let base_value = base_value_of(stable_amount, stable_price, StableToken::decimals())?;
        mul_div(base_value, token::ONE_DEBT, self.base_currency_unit)
    }

    // ============ Configuration ============

    /// Set the peg-deviation threshold (caller must be admin)
    pub fn set_peg_deviation_bps(&mut self, caller: Address, bps: u128) -> DstableResult<()> {
        self.roles.require_role(Role::Admin, caller)?;
        if bps > amo::MAX_PEG_DEVIATION_BPS {
            return Err(DstableError::PegDeviationOutOfRange { bps });
        }

        self.peg_deviation_bps = bps;
        self.events.emit(DstableEvent::PegDeviationSet { bps });
        Ok(())
    }

    /// Toggle a wallet on the AMO allowlist (caller must be admin)
    pub fn set_amo_wallet_allowed(
        &mut self,
        caller: Address,
        wallet: Address,
        allowed: bool,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::Admin, caller)?;
        if is_zero_address(&wallet) {
            return Err(DstableError::ZeroAddress { param: "wallet" });
        }

        if allowed {
            self.amo_wallets.insert(wallet);
        } else {
            self.amo_wallets.remove(&wallet);
        }
        self.events
            .emit(DstableEvent::AmoWalletSet { wallet, allowed });
        Ok(())
    }

    /// Set the debt-parity tolerance (caller must be admin). Whether a
    /// fixed value is right for unbounded operation counts is an open
    /// calibration question; this setter is the governance knob for it.
    pub fn set_tolerance(&mut self, caller: Address, tolerance: u128) -> DstableResult<()> {
        self.roles.require_role(Role::Admin, caller)?;

        self.tolerance = tolerance;
        self.events.emit(DstableEvent::ToleranceSet { tolerance });
        Ok(())
    }

    /// Toggle the guardian pause on increases (caller must hold
    /// `Pauser`). Decreases are deliberately unaffected.
    pub fn set_increase_paused(&mut self, caller: Address, paused: bool) -> DstableResult<()> {
        self.roles.require_role(Role::Pauser, caller)?;

        self.increase_paused = paused;
        self.events
            .emit(DstableEvent::AmoIncreasePauseSet { paused });
        Ok(())
    }

    // ============ Views ============

    /// Whether a wallet may receive AMO deployments
    pub fn is_amo_wallet_allowed(&self, wallet: Address) -> bool {
        self.amo_wallets.contains(&wallet)
    }

    /// Debt units currently extended to a wallet
    pub fn allocation_of(&self, wallet: Address) -> u128 {
        self.allocations.get(&wallet).copied().unwrap_or(0)
    }

    /// Sum of all per-wallet allocations, in debt units
    pub fn total_allocated(&self) -> u128 {
        self.allocations.values().sum()
    }

    /// The configured peg-deviation threshold
    pub fn peg_deviation_bps(&self) -> u128 {
        self.peg_deviation_bps
    }

    /// The configured parity tolerance
    pub fn tolerance(&self) -> u128 {
        self.tolerance
    }

    /// Whether the guardian pause is active
    pub fn is_increase_paused(&self) -> bool {
        self.increase_paused
    }
}
