//! Redeemer Contract
//!
//! Burns stablecoin for collateral, net of a redemption fee. The burn
//! strictly precedes the withdrawal, so a caller can never pull
//! collateral against stablecoin it has not verifiably surrendered.
//! Fees are charged in collateral units: a per-asset override when
//! configured, the default otherwise, and never above the hard cap.
//!
//! Redemption pauses are tracked independently of the issuer's mint
//! pauses; an asset can be mint-paused and redemption-enabled, or the
//! reverse, to manage one-directional incidents.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use dstable_collateral_vault::CollateralVault;
use dstable_common::{
    constants::fees,
    errors::{DstableError, DstableResult},
    events::{DstableEvent, EventLog},
    is_zero_address,
    math::{amount_from_base_value, base_value_of, bps_of, safe_sub},
    oracle::PriceOracle,
    reentrancy::ReentrancyGuard,
    Address, Bank, BTreeMap, BTreeSet, Role, RoleTable,
};
use dstable_token::StableToken;

/// The redeemer contract state
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Redeemer {
    address: Address,
    roles: RoleTable,
    fee_receiver: Address,
    default_fee_bps: u128,
    collateral_fee_bps: BTreeMap<Address, u128>,
    redemption_paused: bool,
    asset_redemption_paused: BTreeSet<Address>,
    base_currency_unit: u128,
    guard: ReentrancyGuard,
    /// Events emitted by this contract
    pub events: EventLog,
}

impl Redeemer {
    /// Deploy the redeemer with the default fee and a fee receiver.
    /// The oracle's base currency unit is captured once here.
    pub fn new(
        address: Address,
        admin: Address,
        fee_receiver: Address,
        oracle: &impl PriceOracle,
    ) -> DstableResult<Self> {
        if is_zero_address(&address) {
            return Err(DstableError::ZeroAddress { param: "address" });
        }
        if is_zero_address(&fee_receiver) {
            return Err(DstableError::ZeroAddress { param: "fee_receiver" });
        }

        Ok(Self {
            address,
            roles: RoleTable::new(admin)?,
            fee_receiver,
            default_fee_bps: fees::DEFAULT_REDEMPTION_FEE_BPS,
            collateral_fee_bps: BTreeMap::new(),
            redemption_paused: false,
            asset_redemption_paused: BTreeSet::new(),
            base_currency_unit: oracle.base_currency_unit(),
            guard: ReentrancyGuard::new(),
            events: EventLog::new(),
        })
    }

    /// The redeemer's own address; it holds the vault's withdrawer
    /// grant and receives the caller's burn allowance
    pub fn address(&self) -> Address {
        self.address
    }

    /// The base currency unit captured at construction
    pub fn base_currency_unit(&self) -> u128 {
        self.base_currency_unit
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

    // ============ Redemption ============

    /// Redeem stablecoin for collateral. Burns `stable_amount` from the
    /// caller (who must have approved this contract), withdraws the
    /// gross collateral equivalent from the vault, sends the fee to the
    /// fee receiver and the remainder to the caller. Returns the net
    /// collateral paid out.
    #[allow(clippy::too_many_arguments)]
    pub fn redeem(
        &mut self,
        bank: &mut Bank,
        stable: &mut StableToken,
        vault: &mut CollateralVault,
        oracle: &impl PriceOracle,
        caller: Address,
        collateral_asset: Address,
        stable_amount: u128,
        min_collateral_out: u128,
    ) -> DstableResult<u128> {
        self.guard.enter()?;
        let fee_bps = self.collateral_redemption_fee(collateral_asset);
        let result = self.redeem_inner(
            bank,
            stable,
            vault,
            oracle,
            caller,
            collateral_asset,
            stable_amount,
            min_collateral_out,
            fee_bps,
            false,
        );
        self.guard.exit();
        result
    }

    /// Privileged zero-fee redemption for governance rebalancing.
    /// Requires `RedemptionManager`; otherwise identical mechanics.
    #[allow(clippy::too_many_arguments)]
    pub fn redeem_as_protocol(
        &mut self,
        bank: &mut Bank,
        stable: &mut StableToken,
        vault: &mut CollateralVault,
        oracle: &impl PriceOracle,
        caller: Address,
        collateral_asset: Address,
        stable_amount: u128,
        min_collateral_out: u128,
    ) -> DstableResult<u128> {
        self.guard.enter()?;
        let result = match self.roles.require_role(Role::RedemptionManager, caller) {
            Ok(()) => self.redeem_inner(
                bank,
                stable,
                vault,
                oracle,
                caller,
                collateral_asset,
                stable_amount,
                min_collateral_out,
                0,
                true,
            ),
            Err(err) => Err(err),
        };
        self.guard.exit();
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn redeem_inner(
        &mut self,
        bank: &mut Bank,
        stable: &mut StableToken,
        vault: &mut CollateralVault,
        oracle: &impl PriceOracle,
        caller: Address,
        collateral_asset: Address,
        stable_amount: u128,
        min_collateral_out: u128,
        fee_bps: u128,
        protocol: bool,
    ) -> DstableResult<u128> {
        if self.redemption_paused {
            return Err(DstableError::RedemptionPaused);
        }
        if self.asset_redemption_paused.contains(&collateral_asset) {
            return Err(DstableError::AssetRedemptionPaused {
                asset: collateral_asset,
            });
        }
        if !vault.is_collateral_supported(collateral_asset) {
            return Err(DstableError::UnsupportedCollateral {
                asset: collateral_asset,
            });
        }
        if stable_amount == 0 {
            return Err(DstableError::ZeroAmount);
        }

        let stable_price = oracle.get_asset_price(stable.asset())?;
        let base_value = base_value_of(stable_amount, stable_price, StableToken::decimals())?;

        let collateral_price = oracle.get_asset_price(collateral_asset)?;
        let collateral_decimals = bank.decimals_of(collateral_asset)?;
        let gross = amount_from_base_value(base_value, collateral_price, collateral_decimals)?;
        if gross == 0 {
            return Err(DstableError::ZeroAmount);
        }

        let fee = bps_of(gross, fee_bps)?;
        let net = safe_sub(gross, fee)?;
        if net < min_collateral_out {
            return Err(DstableError::SlippageExceeded {
                actual: net,
                min: min_collateral_out,
            });
        }

        // Nothing after the burn may fail: verify the vault holds the
        // gross payout and that this contract may withdraw it
        vault.require_role(Role::CollateralWithdrawer, self.address)?;
        let vault_balance = bank.balance_of(collateral_asset, vault.address());
        if vault_balance < gross {
            return Err(DstableError::InsufficientBalance {
                available: vault_balance,
                requested: gross,
            });
        }

        // Burn before withdrawal
        stable.burn_from(bank, self.address, caller, stable_amount)?;
        vault.withdraw(bank, self.address, collateral_asset, caller, net)?;
        if fee > 0 {
            vault.withdraw(bank, self.address, collateral_asset, self.fee_receiver, fee)?;
        }

        if protocol {
            self.events.emit(DstableEvent::ProtocolRedemption {
                caller,
                collateral_asset,
                stable_burned: stable_amount,
                collateral_out: net,
            });
        } else {
            self.events.emit(DstableEvent::StableRedeemed {
                caller,
                collateral_asset,
                stable_burned: stable_amount,
                collateral_out: net,
                fee_paid: fee,
            });
        }
        Ok(net)
    }

    // ============ Fee Configuration ============

    /// Fee applied to an asset: the override when set, else the default
    pub fn collateral_redemption_fee(&self, asset: Address) -> u128 {
        self.collateral_fee_bps
            .get(&asset)
            .copied()
            .unwrap_or(self.default_fee_bps)
    }

    /// Set the default redemption fee (caller must be admin; capped)
    pub fn set_default_redemption_fee(&mut self, caller: Address, fee_bps: u128) -> DstableResult<()> {
        self.roles.require_role(Role::Admin, caller)?;
        Self::check_fee(fee_bps)?;

        self.default_fee_bps = fee_bps;
        self.events
            .emit(DstableEvent::DefaultRedemptionFeeSet { fee_bps });
        Ok(())
    }

    /// Set a per-asset fee override (caller must be admin; capped)
    pub fn set_collateral_redemption_fee(
        &mut self,
        caller: Address,
        asset: Address,
        fee_bps: u128,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::Admin, caller)?;
        Self::check_fee(fee_bps)?;

        self.collateral_fee_bps.insert(asset, fee_bps);
        self.events
            .emit(DstableEvent::CollateralRedemptionFeeSet { asset, fee_bps });
        Ok(())
    }

    /// Clear a per-asset fee override, falling back to the default
    pub fn clear_collateral_redemption_fee(
        &mut self,
        caller: Address,
        asset: Address,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::Admin, caller)?;

        self.collateral_fee_bps.remove(&asset);
        self.events
            .emit(DstableEvent::CollateralRedemptionFeeCleared { asset });
        Ok(())
    }

    /// Change the fee receiver (caller must be admin)
    pub fn set_fee_receiver(&mut self, caller: Address, receiver: Address) -> DstableResult<()> {
        self.roles.require_role(Role::Admin, caller)?;
        if is_zero_address(&receiver) {
            return Err(DstableError::ZeroAddress { param: "receiver" });
        }

        self.fee_receiver = receiver;
        self.events.emit(DstableEvent::FeeReceiverSet { receiver });
        Ok(())
    }

    fn check_fee(fee_bps: u128) -> DstableResult<()> {
        if fee_bps > fees::MAX_REDEMPTION_FEE_BPS {
            return Err(DstableError::FeeTooHigh {
                fee_bps,
                max_bps: fees::MAX_REDEMPTION_FEE_BPS,
            });
        }
        Ok(())
    }

    // ============ Pauses ============

    /// Asset-level redemption switch; independent of the mint pause
    pub fn is_asset_redemption_enabled(&self, asset: Address) -> bool {
        !self.asset_redemption_paused.contains(&asset)
    }

    /// Whether the contract-wide pause is active
    pub fn is_redemption_paused(&self) -> bool {
        self.redemption_paused
    }

    /// Toggle the per-asset redemption pause (caller must hold `Pauser`)
    pub fn set_asset_redemption_pause(
        &mut self,
        caller: Address,
        asset: Address,
        paused: bool,
    ) -> DstableResult<()> {
        self.roles.require_role(Role::Pauser, caller)?;

        if paused {
            self.asset_redemption_paused.insert(asset);
        } else {
            self.asset_redemption_paused.remove(&asset);
        }
        self.events
            .emit(DstableEvent::AssetRedemptionPauseSet { asset, paused });
        Ok(())
    }

    /// Toggle the contract-wide redemption pause (caller must hold
    /// `Pauser`)
    pub fn set_redemption_pause(&mut self, caller: Address, paused: bool) -> DstableResult<()> {
        self.roles.require_role(Role::Pauser, caller)?;
        self.redemption_paused = paused;
        self.events
            .emit(DstableEvent::RedemptionPauseSet { paused });
        Ok(())
    }
}
