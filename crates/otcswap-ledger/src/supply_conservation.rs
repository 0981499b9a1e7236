//! Supply conservation invariant checker.
//!
//! Mathematical invariant enforced by the reference ledger:
//! ```text
//! ∀ token: Σ(party balances) + custody + skimmed == Σ(minted)
//! ```
//!
//! Debits, credits and fee-on-transfer skims only move supply around. If
//! the sum ever drifts from what was minted, value was created or destroyed.

use std::collections::HashMap;

use otcswap_types::{Amount, Result, SwapError, TokenAddress};

/// Tracks per-token minted totals and validates conservation on demand.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    /// Total minted per token since genesis.
    minted: HashMap<TokenAddress, Amount>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record newly created supply.
    pub fn record_mint(&mut self, token: TokenAddress, amount: Amount) {
        *self.minted.entry(token).or_insert(0) += amount;
    }

    /// Expected total supply for a token.
    #[must_use]
    pub fn expected_supply(&self, token: TokenAddress) -> Amount {
        self.minted.get(&token).copied().unwrap_or(0)
    }

    /// Verify that the observed supply matches what was minted.
    ///
    /// # Errors
    /// Returns [`SwapError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, token: TokenAddress, actual_supply: Amount) -> Result<()> {
        let expected = self.expected_supply(token);
        if actual_supply != expected {
            return Err(SwapError::SupplyInvariantViolation {
                reason: format!(
                    "Token {token}: actual supply {actual_supply} != minted {expected}"
                ),
            });
        }
        Ok(())
    }

    /// All tokens with recorded supply.
    #[must_use]
    pub fn tracked_tokens(&self) -> Vec<TokenAddress> {
        let mut tokens: Vec<_> = self.minted.keys().copied().collect();
        tokens.sort_unstable();
        tokens
    }
}
