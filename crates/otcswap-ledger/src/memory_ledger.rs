//! In-memory reference ledger.
//!
//! Tracks per-(party, token) balances plus a single custody account that
//! holds everything the engine has pulled in. Tokens can be configured to
//! skim a fee on every debit, which is how fee-on-transfer tokens behave:
//! custody receives less than the debited party lost. All mutations are
//! atomic: either the full transfer happens or nothing changes.

use std::{collections::HashMap, sync::Mutex};

use otcswap_types::{Amount, LedgerFault, PartyId, Result, SwapError, TokenAddress, constants};

use crate::{supply_conservation::SupplyConservation, token_ledger::TokenLedger};

#[derive(Debug, Default)]
struct LedgerState {
    /// Per-(party, token) balances.
    balances: HashMap<(PartyId, TokenAddress), Amount>,
    /// Tokens held on the engine's behalf.
    custody: HashMap<TokenAddress, Amount>,
    /// Amounts skimmed by fee-on-transfer tokens.
    skimmed: HashMap<TokenAddress, Amount>,
    /// Per-token transfer fee, in basis points.
    transfer_fee_bps: HashMap<TokenAddress, u32>,
    /// Credits allowed before injected failures start; `None` disables.
    credits_before_failure: Option<usize>,
    supply: SupplyConservation,
}

/// Thread-safe in-memory [`TokenLedger`].
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        // Mutations are applied whole, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Create new supply in a party's account.
    pub fn mint(&self, party: PartyId, token: TokenAddress, amount: Amount) {
        let mut state = self.state();
        *state.balances.entry((party, token)).or_insert(0) += amount;
        state.supply.record_mint(token, amount);
    }

    /// Make `token` skim `bps` basis points off every debit.
    pub fn set_transfer_fee_bps(&self, token: TokenAddress, bps: u32) {
        self.state().transfer_fee_bps.insert(token, bps);
    }

    /// Let `allowed` more credits succeed, then reject every credit until
    /// [`clear_credit_failures`](Self::clear_credit_failures) is called.
    pub fn fail_credits_after(&self, allowed: usize) {
        self.state().credits_before_failure = Some(allowed);
    }

    pub fn clear_credit_failures(&self) {
        self.state().credits_before_failure = None;
    }

    /// Balance of a party.
    #[must_use]
    pub fn balance(&self, party: PartyId, token: TokenAddress) -> Amount {
        self.state().balances.get(&(party, token)).copied().unwrap_or(0)
    }

    /// Tokens currently held in custody.
    #[must_use]
    pub fn custody_balance(&self, token: TokenAddress) -> Amount {
        self.state().custody.get(&token).copied().unwrap_or(0)
    }

    /// Tokens lost to fee-on-transfer skims.
    #[must_use]
    pub fn skimmed(&self, token: TokenAddress) -> Amount {
        self.state().skimmed.get(&token).copied().unwrap_or(0)
    }

    /// Verify supply conservation for a token.
    pub fn verify_supply(&self, token: TokenAddress) -> Result<()> {
        let state = self.state();
        let held: Amount = state
            .balances
            .iter()
            .filter(|((_, t), _)| *t == token)
            .map(|(_, amount)| *amount)
            .sum();
        let actual = held
            .checked_add(state.custody.get(&token).copied().unwrap_or(0))
            .and_then(|v| v.checked_add(state.skimmed.get(&token).copied().unwrap_or(0)))
            .ok_or_else(|| SwapError::Overflow(format!("supply of {token}")))?;
        state.supply.verify(token, actual)
    }

    /// Verify supply conservation for every token ever minted.
    pub fn verify_all_supply(&self) -> Result<()> {
        let tokens = self.state().supply.tracked_tokens();
        tokens.into_iter().try_for_each(|t| self.verify_supply(t))
    }
}

impl TokenLedger for InMemoryLedger {
    fn debit(
        &self,
        token: TokenAddress,
        from: PartyId,
        amount: Amount,
    ) -> std::result::Result<Amount, LedgerFault> {
        let mut state = self.state();
        let available = state.balances.get(&(from, token)).copied().unwrap_or(0);
        if available < amount {
            return Err(LedgerFault::InsufficientBalance {
                needed: amount,
                available,
            });
        }

        let bps = Amount::from(state.transfer_fee_bps.get(&token).copied().unwrap_or(0));
        let skim = amount
            .checked_mul(bps)
            .map(|v| v / constants::BPS_DENOMINATOR)
            .ok_or_else(|| LedgerFault::Rejected("transfer fee overflow".into()))?
            .min(amount);
        let received = amount - skim;

        state.balances.insert((from, token), available - amount);
        *state.custody.entry(token).or_insert(0) += received;
        *state.skimmed.entry(token).or_insert(0) += skim;
        Ok(received)
    }

    fn credit(
        &self,
        token: TokenAddress,
        to: PartyId,
        amount: Amount,
    ) -> std::result::Result<(), LedgerFault> {
        let mut state = self.state();
        match state.credits_before_failure {
            Some(0) => return Err(LedgerFault::Rejected("credit failure injected".into())),
            Some(n) => state.credits_before_failure = Some(n - 1),
            None => {}
        }

        let custody = state.custody.get(&token).copied().unwrap_or(0);
        if custody < amount {
            return Err(LedgerFault::InsufficientBalance {
                needed: amount,
                available: custody,
            });
        }
        state.custody.insert(token, custody - amount);
        *state.balances.entry((to, token)).or_insert(0) += amount;
        Ok(())
    }
}
