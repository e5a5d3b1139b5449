//! dUSD Stablecoin Token Contract
//!
//! Mintable/burnable fungible token with role-gated supply changes.
//! Only `Minter` role holders (the Issuer and the AMO manager) may
//! increase supply; supply decreases require either the holder itself
//! or a spender with sufficient allowance. Balances and total supply
//! live in the shared [`Bank`] ledger; this contract applies policy and
//! delegates the movement.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use dstable_common::{
    constants::token,
    errors::{DstableError, DstableResult},
    events::{DstableEvent, EventLog},
    is_zero_address, Address, Bank, BTreeMap, Role, RoleTable,
};

/// The stablecoin contract state
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct StableToken {
    asset: Address,
    roles: RoleTable,
    allowances: BTreeMap<(Address, Address), u128>,
    /// Events emitted by this contract
    pub events: EventLog,
}

impl StableToken {
    /// Deploy the stablecoin: registers the asset in the ledger and
    /// seeds the role table with an admin.
    pub fn new(bank: &mut Bank, asset: Address, admin: Address) -> DstableResult<Self> {
        if is_zero_address(&asset) {
            return Err(DstableError::ZeroAddress { param: "asset" });
        }

        let roles = RoleTable::new(admin)?;
        bank.register_asset(asset, token::STABLE_DECIMALS)?;

        Ok(Self {
            asset,
            roles,
            allowances: BTreeMap::new(),
            events: EventLog::new(),
        })
    }

    /// Token name
    pub fn name() -> &'static str {
        token::STABLE_NAME
    }

    /// Token symbol
    pub fn symbol() -> &'static str {
        token::STABLE_SYMBOL
    }

    /// Token decimals
    pub fn decimals() -> u8 {
        token::STABLE_DECIMALS
    }

    /// The asset address this contract controls
    pub fn asset(&self) -> Address {
        self.asset
    }

    /// Current total supply
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

    // ============ Supply Operations ============

    /// Mint new stablecoin to `to`. Caller must hold `Minter`.
    pub fn mint(
        &mut self,
        bank: &mut Bank,
        caller: Address,
        to: Address,
        amount: u128,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::Minter, caller)?;
        if is_zero_address(&to) {
            return Err(DstableError::ZeroAddress { param: "to" });
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

    /// Burn the caller's own stablecoin
    pub fn burn(&mut self, bank: &mut Bank, caller: Address, amount: u128) -> DstableResult<()> {
        if amount == 0 {
            return Err(DstableError::ZeroAmount);
        }

        let new_total_supply = bank.burn(self.asset, caller, amount)?;
        self.events.emit(DstableEvent::TokenBurned {
            asset: self.asset,
            from: caller,
            amount,
            new_total_supply,
        });
        Ok(())
    }

    /// Burn from another holder, consuming the caller's allowance
    pub fn burn_from(
        &mut self,
        bank: &mut Bank,
        caller: Address,
        from: Address,
        amount: u128,
    ) -> DstableResult<()> {
        if amount == 0 {
            return Err(DstableError::ZeroAmount);
        }

        let allowed = self.allowance(from, caller);
        if allowed < amount {
            return Err(DstableError::InsufficientAllowance {
                available: allowed,
                requested: amount,
            });
        }

        // Burn first; the allowance is only consumed once the balance
        // check inside the ledger has passed.
        let new_total_supply = bank.burn(self.asset, from, amount)?;
        self.set_allowance(from, caller, allowed - amount);

        self.events.emit(DstableEvent::TokenBurned {
            asset: self.asset,
            from,
            amount,
            new_total_supply,
        });
        Ok(())
    }

    /// Transfer stablecoin to another holder
    pub fn transfer(
        &mut self,
        bank: &mut Bank,
        caller: Address,
        to: Address,
        amount: u128,
    ) -> DstableResult<()> {
        if is_zero_address(&to) {
            return Err(DstableError::ZeroAddress { param: "to" });
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

    /// Set a spender's allowance (overwrite semantics)
    pub fn approve(
        &mut self,
        caller: Address,
        spender: Address,
        amount: u128,
    ) -> DstableResult<()> {
        if is_zero_address(&spender) {
            return Err(DstableError::ZeroAddress { param: "spender" });
        }

        self.set_allowance(caller, spender, amount);
        self.events.emit(DstableEvent::Approval {
            asset: self.asset,
            owner: caller,
            spender,
            amount,
        });
        Ok(())
    }

    /// Remaining allowance from `owner` to `spender`
    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: u128) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STABLE: Address = [100u8; 32];
    const ONE: u128 = 1_000_000_000_000_000_000;

    fn admin() -> Address {
        [1u8; 32]
    }

    fn issuer() -> Address {
        [2u8; 32]
    }

    fn user() -> Address {
        [3u8; 32]
    }

    fn spender() -> Address {
        [4u8; 32]
    }

    fn setup() -> (Bank, StableToken) {
        let mut bank = Bank::new();
        let mut stable = StableToken::new(&mut bank, STABLE, admin()).unwrap();
        stable.grant_role(admin(), Role::Minter, issuer()).unwrap();
        (bank, stable)
    }

    #[test]
    fn test_metadata() {
        assert_eq!(StableToken::name(), "dUSD");
        assert_eq!(StableToken::decimals(), 18);
    }

    #[test]
    fn test_mint_requires_role() {
        let (mut bank, mut stable) = setup();

        let result = stable.mint(&mut bank, user(), user(), 100 * ONE);
        assert!(matches!(
            result,
            Err(DstableError::MissingRole {
                role: Role::Minter,
                ..
            })
        ));

        stable.mint(&mut bank, issuer(), user(), 100 * ONE).unwrap();
        assert_eq!(stable.balance_of(&bank, user()), 100 * ONE);
        assert_eq!(stable.total_supply(&bank), 100 * ONE);
    }

    #[test]
    fn test_mint_zero_amount_rejected() {
        let (mut bank, mut stable) = setup();
        assert!(matches!(
            stable.mint(&mut bank, issuer(), user(), 0),
            Err(DstableError::ZeroAmount)
        ));
    }

    #[test]
    fn test_burn_own_balance() {
        let (mut bank, mut stable) = setup();
        stable.mint(&mut bank, issuer(), user(), 100 * ONE).unwrap();

        stable.burn(&mut bank, user(), 40 * ONE).unwrap();
        assert_eq!(stable.balance_of(&bank, user()), 60 * ONE);
        assert_eq!(stable.total_supply(&bank), 60 * ONE);
    }

    #[test]
    fn test_burn_from_consumes_allowance() {
        let (mut bank, mut stable) = setup();
        stable.mint(&mut bank, issuer(), user(), 100 * ONE).unwrap();
        stable.approve(user(), spender(), 50 * ONE).unwrap();

        stable
            .burn_from(&mut bank, spender(), user(), 30 * ONE)
            .unwrap();
        assert_eq!(stable.balance_of(&bank, user()), 70 * ONE);
        assert_eq!(stable.allowance(user(), spender()), 20 * ONE);
    }

    #[test]
    fn test_burn_from_without_allowance() {
        let (mut bank, mut stable) = setup();
        stable.mint(&mut bank, issuer(), user(), 100 * ONE).unwrap();

        let result = stable.burn_from(&mut bank, spender(), user(), 30 * ONE);
        assert!(matches!(
            result,
            Err(DstableError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn test_failed_burn_keeps_allowance() {
        let (mut bank, mut stable) = setup();
        stable.mint(&mut bank, issuer(), user(), 10 * ONE).unwrap();
        stable.approve(user(), spender(), 50 * ONE).unwrap();

        // Balance too small; allowance must stay untouched
        let result = stable.burn_from(&mut bank, spender(), user(), 30 * ONE);
        assert!(matches!(
            result,
            Err(DstableError::InsufficientBalance { .. })
        ));
        assert_eq!(stable.allowance(user(), spender()), 50 * ONE);
    }

    #[test]
    fn test_transfer() {
        let (mut bank, mut stable) = setup();
        stable.mint(&mut bank, issuer(), user(), 100 * ONE).unwrap();

        stable
            .transfer(&mut bank, user(), spender(), 25 * ONE)
            .unwrap();
        assert_eq!(stable.balance_of(&bank, spender()), 25 * ONE);
        assert_eq!(stable.balance_of(&bank, user()), 75 * ONE);
    }

    #[test]
    fn test_events_emitted() {
        let (mut bank, mut stable) = setup();
        stable.mint(&mut bank, issuer(), user(), 100 * ONE).unwrap();

        let minted = stable
            .events
            .filter_by_type(dstable_common::EventType::TokenMinted);
        assert_eq!(minted.len(), 1);
    }
}
