//! AMO Debt Receipt Token Contract
//!
//! A second mintable/burnable token whose supply mirrors the
//! base-currency value of stablecoin currently deployed to AMO
//! strategies, expressed in 18-decimal debt units. It is priced 1:1
//! against the base currency by a hard-peg oracle entry, so the
//! collateral vault can carry it as riskless bookkeeping collateral.
//!
//! Holding is restricted to an allowlist (the vault and the AMO
//! manager); every mint and transfer target is checked, so the receipt
//! can never leak into general circulation. Only `AmoManager` role
//! holders may mint or burn.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use dstable_common::{
    constants::token,
    errors::{DstableError, DstableResult},
    events::{DstableEvent, EventLog},
    is_zero_address, Address, Bank, BTreeSet, Role, RoleTable,
};

/// The debt receipt contract state
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct DebtReceiptToken {
    asset: Address,
    roles: RoleTable,
    allowlist: BTreeSet<Address>,
    /// Events emitted by this contract
    pub events: EventLog,
}

impl DebtReceiptToken {
    /// Deploy the debt receipt token: registers the asset in the ledger
    /// and seeds the role table with an admin. The allowlist starts
    /// empty; the admin adds the vault and the manager before first use.
    pub fn new(bank: &mut Bank, asset: Address, admin: Address) -> DstableResult<Self> {
        if is_zero_address(&asset) {
            return Err(DstableError::ZeroAddress { param: "asset" });
        }

        let roles = RoleTable::new(admin)?;
        bank.register_asset(asset, token::DEBT_DECIMALS)?;

        Ok(Self {
            asset,
            roles,
            allowlist: BTreeSet::new(),
            events: EventLog::new(),
        })
    }

    /// Token name
    pub fn name() -> &'static str {
        token::DEBT_NAME
    }

    /// Token symbol
    pub fn symbol() -> &'static str {
        token::DEBT_SYMBOL
    }

    /// Token decimals
    pub fn decimals() -> u8 {
        token::DEBT_DECIMALS
    }

    /// The asset address this contract controls
    pub fn asset(&self) -> Address {
        self.asset
    }

    /// Current total supply: the recorded AMO debt in debt units
    pub fn total_supply(&self, bank: &Bank) -> u128 {
        bank.total_supply_of(self.asset).unwrap_or(0)
    }

    /// Balance of a holder
    pub fn balance_of(&self, bank: &Bank, holder: Address) -> u128 {
        bank.balance_of(self.asset, holder)
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

    // ============ Allowlist ============

    /// Check if an address may hold the receipt
    pub fn is_allowed_holder(&self, holder: Address) -> bool {
        self.allowlist.contains(&holder)
    }

    /// Toggle an address on the holder allowlist (caller must be
    /// admin). Removal does not move an existing balance; it only
    /// blocks the address as a future mint/transfer target.
    pub fn set_allowed_holder(
        &mut self,
        caller: Address,
        holder: Address,
        allowed: bool,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::Admin, caller)?;
        if is_zero_address(&holder) {
            return Err(DstableError::ZeroAddress { param: "holder" });
        }

        if allowed {
            self.allowlist.insert(holder);
        } else {
            self.allowlist.remove(&holder);
        }
        self.events
            .emit(DstableEvent::HolderAllowlistSet { holder, allowed });
        Ok(())
    }

    // ============ Supply Operations ============

    /// Mint debt units to an allowlisted holder. Caller must hold
    /// `AmoManager`.
    pub fn mint(
        &mut self,
        bank: &mut Bank,
        caller: Address,
        to: Address,
        amount: u128,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::AmoManager, caller)?;
        if !self.is_allowed_holder(to) {
            return Err(DstableError::HolderNotAllowed { holder: to });
        }
        if amount == 0 {
            return Err(DstableError::ZeroAmount);
        }

        let new_total_supply = bank.mint(self.asset, to, amount)?;
        self.events.emit(DstableEvent::TokenMinted {
            asset: self.asset,
            to,
            amount,
            new_total_supply,
        });
        Ok(())
    }

    /// Burn debt units from a holder. Caller must hold `AmoManager`;
    /// the role, not an allowance, is the burn authorization.
    pub fn burn(
        &mut self,
        bank: &mut Bank,
        caller: Address,
        from: Address,
        amount: u128,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::AmoManager, caller)?;
        if amount == 0 {
            return Err(DstableError::ZeroAmount);
        }

        let new_total_supply = bank.burn(self.asset, from, amount)?;
        self.events.emit(DstableEvent::TokenBurned {
            asset: self.asset,
            from,
            amount,
            new_total_supply,
        });
        Ok(())
    }

    /// Transfer debt units; the target must be allowlisted
    pub fn transfer(
        &mut self,
        bank: &mut Bank,
        caller: Address,
        to: Address,
        amount: u128,
    ) -> DstableResult<()> {
        if !self.is_allowed_holder(to) {
            return Err(DstableError::HolderNotAllowed { holder: to });
        }
        if amount == 0 {
            return Err(DstableError::ZeroAmount);
        }

        bank.transfer(self.asset, caller, to, amount)?;
        self.events.emit(DstableEvent::TokenTransferred {
            asset: self.asset,
            from: caller,
            to,
            amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBT: Address = [101u8; 32];
    const ONE: u128 = 1_000_000_000_000_000_000;

    fn admin() -> Address {
        [1u8; 32]
    }

    fn manager() -> Address {
        [2u8; 32]
    }

    fn vault() -> Address {
        [3u8; 32]
    }

    fn outsider() -> Address {
        [4u8; 32]
    }

    fn setup() -> (Bank, DebtReceiptToken) {
        let mut bank = Bank::new();
        let mut debt = DebtReceiptToken::new(&mut bank, DEBT, admin()).unwrap();
        debt.grant_role(admin(), Role::AmoManager, manager()).unwrap();
        debt.set_allowed_holder(admin(), vault(), true).unwrap();
        debt.set_allowed_holder(admin(), manager(), true).unwrap();
        (bank, debt)
    }

    #[test]
    fn test_mint_to_allowlisted_holder() {
        let (mut bank, mut debt) = setup();

        debt.mint(&mut bank, manager(), vault(), 100 * ONE).unwrap();
        assert_eq!(debt.balance_of(&bank, vault()), 100 * ONE);
        assert_eq!(debt.total_supply(&bank), 100 * ONE);
    }

    #[test]
    fn test_mint_to_outsider_rejected() {
        let (mut bank, mut debt) = setup();

        let result = debt.mint(&mut bank, manager(), outsider(), 100 * ONE);
        assert!(matches!(
            result,
            Err(DstableError::HolderNotAllowed { .. })
        ));
        assert_eq!(debt.total_supply(&bank), 0);
    }

    #[test]
    fn test_mint_requires_manager_role() {
        let (mut bank, mut debt) = setup();

        let result = debt.mint(&mut bank, outsider(), vault(), 100 * ONE);
        assert!(matches!(
            result,
            Err(DstableError::MissingRole {
                role: Role::AmoManager,
                ..
            })
        ));
    }

    #[test]
    fn test_burn_by_role_without_allowance() {
        let (mut bank, mut debt) = setup();
        debt.mint(&mut bank, manager(), vault(), 100 * ONE).unwrap();

        debt.burn(&mut bank, manager(), vault(), 40 * ONE).unwrap();
        assert_eq!(debt.balance_of(&bank, vault()), 60 * ONE);
        assert_eq!(debt.total_supply(&bank), 60 * ONE);
    }

    #[test]
    fn test_transfer_blocked_to_outsider() {
        let (mut bank, mut debt) = setup();
        debt.mint(&mut bank, manager(), vault(), 100 * ONE).unwrap();

        let result = debt.transfer(&mut bank, vault(), outsider(), 10 * ONE);
        assert!(matches!(
            result,
            Err(DstableError::HolderNotAllowed { .. })
        ));

        // Between allowlisted holders the transfer goes through
        debt.transfer(&mut bank, vault(), manager(), 10 * ONE).unwrap();
        assert_eq!(debt.balance_of(&bank, manager()), 10 * ONE);
    }

    #[test]
    fn test_allowlist_removal_blocks_future_targets() {
        let (mut bank, mut debt) = setup();
        debt.mint(&mut bank, manager(), vault(), 100 * ONE).unwrap();

        debt.set_allowed_holder(admin(), vault(), false).unwrap();

        // Existing balance stays; new mints to the vault are blocked
        assert_eq!(debt.balance_of(&bank, vault()), 100 * ONE);
        assert!(debt.mint(&mut bank, manager(), vault(), ONE).is_err());
    }

    #[test]
    fn test_allowlist_gated_by_admin() {
        let (_, mut debt) = setup();

        let result = debt.set_allowed_holder(outsider(), outsider(), true);
        assert!(matches!(result, Err(DstableError::MissingRole { .. })));
    }
}
