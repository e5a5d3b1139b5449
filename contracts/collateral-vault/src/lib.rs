//! Collateral Vault Contract
//!
//! Custodies the whitelisted collateral backing the stablecoin and
//! prices it through the oracle. Valuation is fail-closed: if any
//! allowed, held asset has no live price, `total_value` errors instead
//! of silently understating NAV.
//!
//! The debt receipt token is carried here like any other allowed asset;
//! its hard-peg oracle entry makes it riskless bookkeeping collateral.
//!
//! Withdrawal is role-gated (`CollateralWithdrawer` for the redeemer
//! and the AMO manager, `CollateralStrategy` for dust recovery). The
//! issuer only ever deposits.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use dstable_common::{
    errors::{DstableError, DstableResult},
    events::{DstableEvent, EventLog},
    is_zero_address,
    math::{base_value_of, safe_add},
    oracle::PriceOracle,
    Address, Bank, BTreeSet, Role, RoleTable,
};

/// The collateral vault contract state
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct CollateralVault {
    address: Address,
    allowed: BTreeSet<Address>,
    roles: RoleTable,
    base_currency_unit: u128,
    /// Events emitted by this contract
    pub events: EventLog,
}

impl CollateralVault {
    /// Deploy the vault. The oracle's base currency unit is captured
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
            allowed: BTreeSet::new(),
            roles: RoleTable::new(admin)?,
            base_currency_unit: oracle.base_currency_unit(),
            events: EventLog::new(),
        })
    }

    /// The vault's own holder address in the ledger
    pub fn address(&self) -> Address {
        self.address
    }

    /// The base currency unit captured at construction
    pub fn base_currency_unit(&self) -> u128 {
        self.base_currency_unit
    }

    /// Check if an asset is in the allowed collateral set
    pub fn is_collateral_supported(&self, asset: Address) -> bool {
        self.allowed.contains(&asset)
    }

    // ============ Access Control ============

    /// Check role membership on this contract's table
    pub fn has_role(&self, role: Role, account: Address) -> bool {
        self.roles.has_role(role, account)
    }

    /// Require role membership on this contract's table
    pub fn require_role(&self, role: Role, account: Address) -> DstableResult<()> {
        self.roles.require_role(role, account)
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

    // ============ Collateral Set ============

    /// Admit an asset to the collateral set. Fails fast at
    /// configuration time if the asset is unregistered or has no live
    /// oracle price, rather than at first valuation.
    pub fn allow_collateral(
        &mut self,
        bank: &Bank,
        oracle: &impl PriceOracle,
        caller: Address,
        asset: Address,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::CollateralManager, caller)?;
        if self.allowed.contains(&asset) {
            return Err(DstableError::CollateralAlreadyAllowed { asset });
        }

        bank.decimals_of(asset)?;
        oracle.get_asset_price(asset)?;

        self.allowed.insert(asset);
        self.events.emit(DstableEvent::CollateralAllowed { asset });
        Ok(())
    }

    /// Remove an asset from the collateral set. A residual balance
    /// ("dust") is permitted: it stops counting toward `total_value`
    /// and stops accepting deposits, but is not forcibly moved.
    pub fn disallow_collateral(&mut self, caller: Address, asset: Address) -> DstableResult<()> {
        self.roles.require_role(Role::CollateralManager, caller)?;
        if !self.allowed.remove(&asset) {
            return Err(DstableError::UnsupportedCollateral { asset });
        }

        self.events.emit(DstableEvent::CollateralDisallowed { asset });
        Ok(())
    }

    // ============ Custody ============

    /// Move collateral from a depositor into the vault
    pub fn deposit(
        &mut self,
        bank: &mut Bank,
        from: Address,
        asset: Address,
        amount: u128,
    ) -> DstableResult<()> {
        if !self.allowed.contains(&asset) {
            return Err(DstableError::UnsupportedCollateral { asset });
        }
        if amount == 0 {
            return Err(DstableError::ZeroAmount);
        }

        bank.transfer(asset, from, self.address, amount)?;
        self.events.emit(DstableEvent::CollateralDeposited {
            asset,
            from,
            amount,
        });
        Ok(())
    }

    /// Move collateral out of the vault (caller must hold
    /// `CollateralWithdrawer`)
    pub fn withdraw(
        &mut self,
        bank: &mut Bank,
        caller: Address,
        asset: Address,
        to: Address,
        amount: u128,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::CollateralWithdrawer, caller)?;
        self.withdraw_inner(bank, asset, to, amount)
    }

    /// Move residual dust out of the vault (caller must hold
    /// `CollateralStrategy`). Works for disallowed assets too; this is
    /// how governance clears dust left behind by `disallow_collateral`.
    pub fn strategy_withdraw(
        &mut self,
        bank: &mut Bank,
        caller: Address,
        asset: Address,
        to: Address,
        amount: u128,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::CollateralStrategy, caller)?;
        self.withdraw_inner(bank, asset, to, amount)
    }

    fn withdraw_inner(
        &mut self,
        bank: &mut Bank,
        asset: Address,
        to: Address,
        amount: u128,
    ) -> DstableResult<()> {
        if is_zero_address(&to) {
            return Err(DstableError::ZeroAddress { param: "to" });
        }
        if amount == 0 {
            return Err(DstableError::ZeroAmount);
        }

        bank.transfer(asset, self.address, to, amount)?;
        self.events
            .emit(DstableEvent::CollateralWithdrawn { asset, to, amount });
        Ok(())
    }

    // ============ Valuation ============

    /// Base-currency value of an asset amount at the live oracle price
    pub fn asset_value_from_amount(
        &self,
        bank: &Bank,
        oracle: &impl PriceOracle,
        amount: u128,
        asset: Address,
    ) -> DstableResult<u128> {
        let price = oracle.get_asset_price(asset)?;
        let decimals = bank.decimals_of(asset)?;
        base_value_of(amount, price, decimals)
    }

    /// Total base-currency value of all allowed collateral currently
    /// held. Errors if any held asset's price is unavailable; NAV is
    /// never silently understated.
    pub fn total_value(&self, bank: &Bank, oracle: &impl PriceOracle) -> DstableResult<u128> {
        let mut total: u128 = 0;

        for asset in &self.allowed {
            let balance = bank.balance_of(*asset, self.address);
            if balance == 0 {
                continue;
            }

            let value = self.asset_value_from_amount(bank, oracle, balance, *asset)?;
            total = safe_add(total, value)?;
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dstable_common::constants::oracle::BASE_CURRENCY_UNIT;
    use dstable_common::oracle::StaticPriceOracle;

    const USDC: Address = [10u8; 32];
    const WETH: Address = [11u8; 32];
    const ONE_USDC: u128 = 1_000_000;
    const ONE_WETH: u128 = 1_000_000_000_000_000_000;

    fn governance() -> Address {
        [1u8; 32]
    }

    fn vault_address() -> Address {
        [50u8; 32]
    }

    fn redeemer() -> Address {
        [2u8; 32]
    }

    fn user() -> Address {
        [3u8; 32]
    }

    fn setup() -> (Bank, StaticPriceOracle, CollateralVault) {
        let mut bank = Bank::new();
        bank.register_asset(USDC, 6).unwrap();
        bank.register_asset(WETH, 18).unwrap();
        bank.mint(USDC, user(), 10_000 * ONE_USDC).unwrap();
        bank.mint(WETH, user(), 10 * ONE_WETH).unwrap();

        let mut oracle = StaticPriceOracle::new();
        oracle.set_price(USDC, BASE_CURRENCY_UNIT).unwrap();
        oracle.set_price(WETH, 2_000 * BASE_CURRENCY_UNIT).unwrap();

        let mut vault = CollateralVault::new(vault_address(), governance(), &oracle).unwrap();
        vault
            .grant_role(governance(), Role::CollateralManager, governance())
            .unwrap();
        vault
            .grant_role(governance(), Role::CollateralWithdrawer, redeemer())
            .unwrap();
        vault
            .allow_collateral(&bank, &oracle, governance(), USDC)
            .unwrap();

        (bank, oracle, vault)
    }

    #[test]
    fn test_allow_requires_live_price() {
        let (bank, oracle, mut vault) = setup();

        let dead_asset: Address = [12u8; 32];
        let result = vault.allow_collateral(&bank, &oracle, governance(), dead_asset);
        assert!(matches!(result, Err(DstableError::UnknownAsset { .. })));

        // Registered but unpriced is still rejected
        let mut bank = bank;
        bank.register_asset(dead_asset, 18).unwrap();
        let result = vault.allow_collateral(&bank, &oracle, governance(), dead_asset);
        assert!(matches!(
            result,
            Err(DstableError::OraclePriceUnavailable { .. })
        ));
    }

    #[test]
    fn test_allow_rejects_duplicate() {
        let (bank, oracle, mut vault) = setup();
        assert!(matches!(
            vault.allow_collateral(&bank, &oracle, governance(), USDC),
            Err(DstableError::CollateralAlreadyAllowed { .. })
        ));
    }

    #[test]
    fn test_deposit_and_total_value() {
        let (mut bank, oracle, mut vault) = setup();

        vault
            .deposit(&mut bank, user(), USDC, 1_000 * ONE_USDC)
            .unwrap();
        assert_eq!(
            vault.total_value(&bank, &oracle).unwrap(),
            1_000 * BASE_CURRENCY_UNIT
        );

        // Add WETH as a second collateral
        vault
            .allow_collateral(&bank, &oracle, governance(), WETH)
            .unwrap();
        vault.deposit(&mut bank, user(), WETH, 2 * ONE_WETH).unwrap();
        assert_eq!(
            vault.total_value(&bank, &oracle).unwrap(),
            5_000 * BASE_CURRENCY_UNIT
        );
    }

    #[test]
    fn test_deposit_unsupported_asset() {
        let (mut bank, _oracle, mut vault) = setup();

        let result = vault.deposit(&mut bank, user(), WETH, ONE_WETH);
        assert!(matches!(
            result,
            Err(DstableError::UnsupportedCollateral { .. })
        ));
    }

    #[test]
    fn test_total_value_fails_closed_on_dead_price() {
        let (mut bank, mut oracle, mut vault) = setup();
        vault
            .deposit(&mut bank, user(), USDC, 1_000 * ONE_USDC)
            .unwrap();

        oracle.set_alive(USDC, false).unwrap();
        assert!(matches!(
            vault.total_value(&bank, &oracle),
            Err(DstableError::OraclePriceUnavailable { .. })
        ));
    }

    #[test]
    fn test_total_value_skips_zero_balance_assets() {
        let (bank, mut oracle, mut vault) = setup();
        vault
            .allow_collateral(&bank, &oracle, governance(), WETH)
            .unwrap();

        // WETH is allowed but unheld; killing its price must not
        // break valuation of what the vault actually holds
        oracle.set_alive(WETH, false).unwrap();
        assert_eq!(vault.total_value(&bank, &oracle).unwrap(), 0);
    }

    #[test]
    fn test_disallow_leaves_dust_uncounted() {
        let (mut bank, oracle, mut vault) = setup();
        vault
            .deposit(&mut bank, user(), USDC, 1_000 * ONE_USDC)
            .unwrap();

        vault.disallow_collateral(governance(), USDC).unwrap();

        // Balance remains but no longer counts toward value
        assert_eq!(bank.balance_of(USDC, vault_address()), 1_000 * ONE_USDC);
        assert_eq!(vault.total_value(&bank, &oracle).unwrap(), 0);

        // New deposits are refused
        assert!(vault
            .deposit(&mut bank, user(), USDC, ONE_USDC)
            .is_err());

        // Dust is recovered through the strategy role
        vault
            .grant_role(governance(), Role::CollateralStrategy, governance())
            .unwrap();
        vault
            .strategy_withdraw(&mut bank, governance(), USDC, user(), 1_000 * ONE_USDC)
            .unwrap();
        assert_eq!(bank.balance_of(USDC, vault_address()), 0);
    }

    #[test]
    fn test_withdraw_requires_role() {
        let (mut bank, _oracle, mut vault) = setup();
        vault
            .deposit(&mut bank, user(), USDC, 1_000 * ONE_USDC)
            .unwrap();

        let result = vault.withdraw(&mut bank, user(), USDC, user(), ONE_USDC);
        assert!(matches!(
            result,
            Err(DstableError::MissingRole {
                role: Role::CollateralWithdrawer,
                ..
            })
        ));

        vault
            .withdraw(&mut bank, redeemer(), USDC, user(), 400 * ONE_USDC)
            .unwrap();
        assert_eq!(bank.balance_of(USDC, user()), 9_400 * ONE_USDC);
    }
}
