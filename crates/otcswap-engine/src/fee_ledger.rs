//! Per-token accrued fee balances.
//!
//! Credited by settlement, cancellation and back-out; drained in full by the
//! owner. No per-offer attribution survives accrual.

use std::{collections::HashMap, sync::Mutex};

use otcswap_types::{Amount, Result, SwapError, TokenAddress};

#[derive(Debug, Default)]
pub struct FeeLedger {
    balances: Mutex<HashMap<TokenAddress, Amount>>,
}

impl FeeLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<TokenAddress, Amount>>> {
        self.balances
            .lock()
            .map_err(|_| SwapError::Internal("fee ledger poisoned".into()))
    }

    /// Add `amount` to the token's accrued balance.
    pub fn accrue(&self, token: TokenAddress, amount: Amount) -> Result<()> {
        let mut balances = self.lock()?;
        let entry = balances.entry(token).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| SwapError::AccountingOverflow(format!("fees accrued in {token}")))?;
        Ok(())
    }

    /// Undo an earlier [`accrue`](Self::accrue).
    pub fn reverse(&self, token: TokenAddress, amount: Amount) -> Result<()> {
        let mut balances = self.lock()?;
        let entry = balances.entry(token).or_insert(0);
        *entry = entry.checked_sub(amount).ok_or_else(|| {
            SwapError::Internal(format!("fee reversal of {amount} exceeds accrued {token}"))
        })?;
        Ok(())
    }

    /// Zero the token's balance and return what it held.
    pub fn take_all(&self, token: TokenAddress) -> Result<Amount> {
        Ok(self.lock()?.remove(&token).unwrap_or(0))
    }

    #[must_use]
    pub fn balance(&self, token: TokenAddress) -> Amount {
        self.lock()
            .map(|b| b.get(&token).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}
