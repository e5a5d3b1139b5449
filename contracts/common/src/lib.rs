//! dSTABLE Common Library
//!
//! Shared types, constants, and utilities for all dSTABLE contracts.
//! This crate is the foundation for the stablecoin issuance/redemption
//! system and the AMO debt-accounting engine built on top of it.
//!
//! ## Contents
//!
//! - **Types**: addresses and shared aliases
//! - **Errors**: the protocol-wide error taxonomy with stable codes
//! - **Math**: wide-intermediate fixed-point conversions (floor rounding)
//! - **Events**: typed protocol events with an in-memory log
//! - **Access Control**: role table with content-addressed role ids
//! - **Ledger**: the multi-asset balance bank shared by every contract
//! - **Oracle**: the price-oracle boundary and a static price book
//! - **Reentrancy**: per-contract entry locks
//! - **Invariants**: solvency and debt-parity assertions
//!
//! This crate is `no_std` compatible when built without the default
//! `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collection types for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::collections::{BTreeMap, BTreeSet};
#[cfg(not(feature = "std"))]
pub use alloc::vec::Vec;
#[cfg(feature = "std")]
pub use std::collections::{BTreeMap, BTreeSet};
#[cfg(feature = "std")]
pub use std::vec::Vec;

pub mod access_control;
pub mod constants;
pub mod errors;
pub mod events;
pub mod invariants;
pub mod ledger;
pub mod math;
pub mod oracle;
pub mod reentrancy;
pub mod types;

// Re-exports for convenience
pub use access_control::*;
pub use errors::*;
pub use events::*;
pub use invariants::*;
pub use ledger::*;
pub use math::*;
pub use oracle::*;
pub use reentrancy::*;
pub use types::*;
