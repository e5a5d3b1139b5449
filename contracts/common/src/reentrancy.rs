//! Reentrancy Guard
//!
//! A per-contract lock flag. Every state-mutating entry point that moves
//! value externally acquires the lock for its full duration; a nested
//! call observing the held lock fails instead of re-entering. The flag
//! is local to the owning contract, never a global lock.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{DstableError, DstableResult};

/// Per-contract entry lock
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ReentrancyGuard {
    entered: bool,
}

impl ReentrancyGuard {
    /// Create a released guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock. Fails if it is already held.
    pub fn enter(&mut self) -> DstableResult<()> {
        if self.entered {
            return Err(DstableError::ReentrancyDetected);
        }
        self.entered = true;
        Ok(())
    }

    /// Release the lock. Callers release on both success and error
    /// paths; a reverted operation leaves no lock behind.
    pub fn exit(&mut self) {
        self.entered = false;
    }

    /// Whether the lock is currently held
    pub fn is_entered(&self) -> bool {
        self.entered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_exit_cycle() {
        let mut guard = ReentrancyGuard::new();
        assert!(!guard.is_entered());

        guard.enter().unwrap();
        assert!(guard.is_entered());

        guard.exit();
        assert!(!guard.is_entered());
        guard.enter().unwrap();
    }

    #[test]
    fn test_nested_enter_fails() {
        let mut guard = ReentrancyGuard::new();
        guard.enter().unwrap();

        assert!(matches!(
            guard.enter(),
            Err(DstableError::ReentrancyDetected)
        ));
    }
}
