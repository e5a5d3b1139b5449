//! Access Control for the dSTABLE Protocol
//!
//! Role-based authorization as an explicit table: each contract owns a
//! `RoleTable` mapping capabilities to the principals holding them, and
//! every mutating entry point starts with a `require_role` check. Role
//! identifiers are content-addressed (SHA-256 of the role name), so the
//! set of distinct roles is stable across deployments.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{DstableError, DstableResult};
use crate::types::{is_zero_address, Address};
use crate::{BTreeMap, BTreeSet};

/// Protocol capabilities. One table per contract; a role only means
/// something within the table of the contract checking it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub enum Role {
    /// Grants and revokes the other roles; configures parameters
    Admin,
    /// May mint the stablecoin
    Minter,
    /// May mint and burn the debt receipt token
    AmoManager,
    /// May allow/disallow collateral assets in the vault
    CollateralManager,
    /// May withdraw collateral from the vault
    CollateralWithdrawer,
    /// May move residual dust out of the vault
    CollateralStrategy,
    /// May increase AMO supply
    AmoIncrease,
    /// May decrease AMO supply
    AmoDecrease,
    /// May issue against system-wide excess collateral
    IncentivesManager,
    /// May redeem on behalf of the protocol, fee-free
    RedemptionManager,
    /// May toggle pause flags
    Pauser,
}

impl Role {
    /// All roles, for enumeration in tooling and tests
    pub const ALL: [Role; 11] = [
        Role::Admin,
        Role::Minter,
        Role::AmoManager,
        Role::CollateralManager,
        Role::CollateralWithdrawer,
        Role::CollateralStrategy,
        Role::AmoIncrease,
        Role::AmoDecrease,
        Role::IncentivesManager,
        Role::RedemptionManager,
        Role::Pauser,
    ];

    /// The role's name string, the preimage of its identifier
    pub fn name(&self) -> &'static str {
        match self {
            Role::Admin => "DEFAULT_ADMIN_ROLE",
            Role::Minter => "MINTER_ROLE",
            Role::AmoManager => "AMO_MANAGER_ROLE",
            Role::CollateralManager => "COLLATERAL_MANAGER_ROLE",
            Role::CollateralWithdrawer => "COLLATERAL_WITHDRAWER_ROLE",
            Role::CollateralStrategy => "COLLATERAL_STRATEGY_ROLE",
            Role::AmoIncrease => "AMO_INCREASE_ROLE",
            Role::AmoDecrease => "AMO_DECREASE_ROLE",
            Role::IncentivesManager => "INCENTIVES_MANAGER_ROLE",
            Role::RedemptionManager => "REDEMPTION_MANAGER_ROLE",
            Role::Pauser => "PAUSER_ROLE",
        }
    }

    /// Content-addressed role identifier: SHA-256 of the name
    pub fn id(&self) -> [u8; 32] {
        let digest = Sha256::digest(self.name().as_bytes());
        let mut id = [0u8; 32];
        id.copy_from_slice(&digest);
        id
    }
}

/// Authorization table: capability -> set of principals
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct RoleTable {
    grants: BTreeMap<Role, BTreeSet<Address>>,
}

impl RoleTable {
    /// Create a table seeded with an initial admin
    pub fn new(admin: Address) -> DstableResult<Self> {
        if is_zero_address(&admin) {
            return Err(DstableError::ZeroAddress { param: "admin" });
        }

        let mut grants: BTreeMap<Role, BTreeSet<Address>> = BTreeMap::new();
        let mut admins = BTreeSet::new();
        admins.insert(admin);
        grants.insert(Role::Admin, admins);

        Ok(Self { grants })
    }

    /// Check if an account holds a role
    pub fn has_role(&self, role: Role, account: Address) -> bool {
        self.grants
            .get(&role)
            .map(|set| set.contains(&account))
            .unwrap_or(false)
    }

    /// Require that an account holds a role
    pub fn require_role(&self, role: Role, account: Address) -> DstableResult<()> {
        if self.has_role(role, account) {
            return Ok(());
        }
        Err(DstableError::MissingRole { role, account })
    }

    /// Grant a role. Caller must be an admin; granting twice is a no-op.
    pub fn grant_role(
        &mut self,
        caller: Address,
        role: Role,
        account: Address,
    ) -> DstableResult<()> {
        self.require_role(Role::Admin, caller)?;
        if is_zero_address(&account) {
            return Err(DstableError::ZeroAddress { param: "account" });
        }

        self.grants.entry(role).or_default().insert(account);
        Ok(())
    }

    /// Revoke a role. Caller must be an admin; revoking an absent grant
    /// is a no-op.
    pub fn revoke_role(
        &mut self,
        caller: Address,
        role: Role,
        account: Address,
    ) -> DstableResult<()> {
        self.require_role(Role::Admin, caller)?;

        if let Some(set) = self.grants.get_mut(&role) {
            set.remove(&account);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec;

    fn admin() -> Address {
        [1u8; 32]
    }

    fn operator() -> Address {
        [2u8; 32]
    }

    #[test]
    fn test_new_seeds_admin() {
        let table = RoleTable::new(admin()).unwrap();
        assert!(table.has_role(Role::Admin, admin()));
        assert!(!table.has_role(Role::Minter, admin()));
    }

    #[test]
    fn test_new_rejects_zero_admin() {
        assert!(matches!(
            RoleTable::new([0u8; 32]),
            Err(DstableError::ZeroAddress { .. })
        ));
    }

    #[test]
    fn test_grant_and_revoke() {
        let mut table = RoleTable::new(admin()).unwrap();

        table.grant_role(admin(), Role::Minter, operator()).unwrap();
        assert!(table.has_role(Role::Minter, operator()));

        table.revoke_role(admin(), Role::Minter, operator()).unwrap();
        assert!(!table.has_role(Role::Minter, operator()));
    }

    #[test]
    fn test_grant_requires_admin() {
        let mut table = RoleTable::new(admin()).unwrap();

        let result = table.grant_role(operator(), Role::Minter, operator());
        assert!(matches!(
            result,
            Err(DstableError::MissingRole {
                role: Role::Admin,
                ..
            })
        ));
    }

    #[test]
    fn test_require_role_names_caller() {
        let table = RoleTable::new(admin()).unwrap();

        let err = table.require_role(Role::Pauser, operator()).unwrap_err();
        assert_eq!(
            err,
            DstableError::MissingRole {
                role: Role::Pauser,
                account: operator(),
            }
        );
    }

    #[test]
    fn test_role_ids_distinct() {
        let ids: Vec<_> = Role::ALL.iter().map(|r| r.id()).collect();
        for (i, a) in ids.iter().enumerate() {
            for b in ids.iter().skip(i + 1) {
                assert_ne!(a, b, "role ids must be distinct");
            }
        }
    }

    #[test]
    fn test_role_id_is_content_addressed() {
        // Same name always hashes to the same identifier
        assert_eq!(Role::Minter.id(), Role::Minter.id());
        assert_ne!(Role::Minter.id(), [0u8; 32]);
    }
}
