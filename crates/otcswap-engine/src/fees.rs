//! Fee arithmetic and payout plans.
//!
//! Every terminal transition is described by a [`Payout`]: the credits to
//! make out of custody plus the fee kept back. Plans are pure and computed
//! from the offer before it is reset, so they can be checked without a
//! ledger.

use otcswap_types::{Amount, EngineConfig, PartyId, Result, SwapError, TokenAddress, constants};

/// `fee = floor(amount * multiplier / divisor)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub divisor: Amount,
    pub dispute_multiplier: Amount,
}

impl FeeSchedule {
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            divisor: config.fee_divisor,
            dispute_multiplier: config.dispute_multiplier,
        }
    }

    /// The fee on `amount` at `multiplier` times the base rate.
    ///
    /// # Errors
    /// Returns [`SwapError::AccountingOverflow`] if `amount * multiplier` overflows.
    pub fn fee(&self, amount: Amount, multiplier: Amount) -> Result<Amount> {
        amount
            .checked_mul(multiplier)
            .map(|v| v / self.divisor)
            .ok_or_else(|| {
                SwapError::AccountingOverflow(format!("fee on {amount} x{multiplier}"))
            })
    }

    /// The undisputed fee.
    pub fn base_fee(&self, amount: Amount) -> Result<Amount> {
        self.fee(amount, constants::BASE_FEE_MULTIPLIER)
    }
}

/// One transfer out of custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credit {
    pub token: TokenAddress,
    pub to: PartyId,
    pub amount: Amount,
}

/// The full distribution of a terminal transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payout {
    pub credits: Vec<Credit>,
    pub fee_token: TokenAddress,
    pub fee: Amount,
}

impl Payout {
    #[must_use]
    pub fn new(fee_token: TokenAddress, fee: Amount) -> Self {
        Self {
            credits: Vec::new(),
            fee_token,
            fee,
        }
    }

    /// Queue a credit; zero amounts are dropped.
    #[must_use]
    pub fn pay(mut self, token: TokenAddress, to: PartyId, amount: Amount) -> Self {
        if amount > 0 {
            self.credits.push(Credit { token, to, amount });
        }
        self
    }

    /// Total credited to `to` in `token`.
    #[must_use]
    pub fn paid_to(&self, to: PartyId, token: TokenAddress) -> Amount {
        self.credits
            .iter()
            .filter(|c| c.to == to && c.token == token)
            .map(|c| c.amount)
            .sum()
    }

    /// Total leaving custody in `token`, fee included.
    #[must_use]
    pub fn total_out(&self, token: TokenAddress) -> Amount {
        let credited: Amount = self
            .credits
            .iter()
            .filter(|c| c.token == token)
            .map(|c| c.amount)
            .sum();
        if token == self.fee_token {
            credited + self.fee
        } else {
            credited
        }
    }
}

/// Checked `a + b` for value sums.
pub(crate) fn add(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_add(b)
        .ok_or_else(|| SwapError::AccountingOverflow(format!("{a} + {b}")))
}
