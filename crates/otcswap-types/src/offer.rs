//! Offer model for the OTCSwap conditional exchange.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐ claim  ┌────────────────┐ agree ┌─────────────────┐ deposit ┌────────┐
//!   │ CREATED ├───────▶│ ADDRESS_PENDING├──────▶│ ADDRESS_VERIFIED├────────▶│ FUNDED │
//!   └─────────┘        └────────────────┘       └─────────────────┘         └───┬────┘
//!        accept (any phase while open)                                          │
//!        ───────────────────────────────────────────────▶ ┌─────────┐ ◀─────────┘
//!                                                         │ MATCHED │
//!                                                         └────┬────┘
//!                                settle / cancel / back out    ▼
//!                                          ┌───────────────────────────────────┐
//!                                          │ SETTLED │ CANCELLED │ BACKED_OUT  │
//!                                          └───────────────────────────────────┘
//! ```
//!
//! Status transitions are **monotonic**: `Open → Matched → terminal`, or
//! `Open → Cancelled`. A terminal offer never reopens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{OfferId, PartyId, Result, SwapError, TokenAddress};

/// Base-unit integer amount. No implicit decimal scaling.
pub type Amount = u128;

/// Coarse lifecycle status stored on the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferStatus {
    /// Awaiting a buyer.
    Open,
    /// A buyer has deposited a bid.
    Matched,
    /// Exchange completed.
    Settled,
    /// Seller withdrew after the deadline with no full bid.
    Cancelled,
    /// A party backed out of a matched offer after the deadline.
    BackedOut,
}

impl OfferStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Settled | Self::Cancelled | Self::BackedOut)
    }

    /// Can the offer move from this status to `target`?
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Matched | Self::Cancelled)
                | (Self::Matched, Self::Settled | Self::Cancelled | Self::BackedOut)
        )
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Matched => write!(f, "MATCHED"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::BackedOut => write!(f, "BACKED_OUT"),
        }
    }
}

/// Fine-grained phase derived from the offer's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferPhase {
    /// Open, sale-token address not yet known.
    Created,
    /// Open, sale-token address set but not agreed by both parties.
    AddressPending,
    /// Open, both parties agree on the sale-token address.
    AddressVerified,
    /// Open, seller has deposited the full token amount.
    Funded,
    /// A buyer has accepted.
    Matched,
    /// Settled, cancelled or backed out.
    Terminal(OfferStatus),
}

/// The terms a seller proposes when opening an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTerms {
    /// Token the buyer pays in (and the seller's collateral is held in).
    pub base_token: TokenAddress,
    /// Token being sold, if its address is already public.
    pub sale_token: Option<TokenAddress>,
    /// Number of sale tokens on offer.
    pub amount_to_sell: Amount,
    /// Price of the whole lot, in base-token units.
    pub total_sale_value: Amount,
    /// Seconds after creation during which the offer may progress.
    pub deadline_seconds: u64,
}

impl OfferTerms {
    /// Reject malformed terms.
    ///
    /// # Errors
    /// Returns [`SwapError::InvalidTerms`] naming the first violation.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(SwapError::InvalidTerms {
                reason: reason.to_string(),
            })
        };
        if self.base_token.is_zero() {
            return invalid("base token must be set");
        }
        if self.sale_token.is_some_and(|t| t.is_zero()) {
            return invalid("sale token, when given, must be non-null");
        }
        if self.sale_token == Some(self.base_token) {
            return invalid("sale token must differ from base token");
        }
        if self.amount_to_sell == 0 {
            return invalid("amount to sell must be positive");
        }
        if self.total_sale_value == 0 {
            return invalid("total sale value must be positive");
        }
        if self.deadline_seconds == 0 {
            return invalid("deadline must be positive");
        }
        if i64::try_from(self.deadline_seconds).is_err() {
            return invalid("deadline out of range");
        }
        Ok(())
    }
}

/// The sale-token address each party has asserted. Each slot is written at
/// most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressClaims {
    pub seller: Option<TokenAddress>,
    pub buyer: Option<TokenAddress>,
}

impl AddressClaims {
    /// `Some(true)` if both claims exist and agree, `Some(false)` if both
    /// exist and differ, `None` while either is missing.
    #[must_use]
    pub fn agreement(&self) -> Option<bool> {
        match (self.seller, self.buyer) {
            (Some(s), Some(b)) => Some(s == b),
            _ => None,
        }
    }
}

/// One sale: a seller's lot of sale tokens for a base-token price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub seller: PartyId,
    /// Unset until a buyer accepts; cleared again on termination.
    pub buyer: Option<PartyId>,
    pub base_token: TokenAddress,
    pub sale_token: Option<TokenAddress>,
    /// True only once both parties' claims about `sale_token` agree.
    pub sale_token_verified: bool,
    pub number_of_tokens_for_sale: Amount,
    pub total_sale_value: Amount,
    pub deadline_seconds: u64,
    pub created_at: DateTime<Utc>,
    /// Seller's base-token deposit. Fixed at creation.
    pub collateral_value: Amount,
    pub is_open: bool,
    /// Base tokens actually received from the buyer (ledger-measured).
    pub bid_value: Amount,
    /// Sale tokens actually received from the seller (ledger-measured).
    pub tokens_deposited: Amount,
    pub status: OfferStatus,
    /// Sticky: set when the parties submit conflicting address claims.
    pub disputed: bool,
    /// Sticky: set the first time an operation observes the deadline passed.
    pub deadline_observed: bool,
}

impl Offer {
    /// A freshly opened offer. Deposits start at zero; the caller records
    /// measured deltas afterwards.
    #[must_use]
    pub fn open(
        id: OfferId,
        seller: PartyId,
        terms: &OfferTerms,
        collateral_value: Amount,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            seller,
            buyer: None,
            base_token: terms.base_token,
            sale_token: terms.sale_token,
            sale_token_verified: false,
            number_of_tokens_for_sale: terms.amount_to_sell,
            total_sale_value: terms.total_sale_value,
            deadline_seconds: terms.deadline_seconds,
            created_at,
            collateral_value,
            is_open: true,
            bid_value: 0,
            tokens_deposited: 0,
            status: OfferStatus::Open,
            disputed: false,
            deadline_observed: false,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Derive the fine-grained lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> OfferPhase {
        if self.is_terminal() {
            OfferPhase::Terminal(self.status)
        } else if !self.is_open {
            OfferPhase::Matched
        } else if self.sale_token.is_some() && self.is_fully_deposited() {
            OfferPhase::Funded
        } else if self.sale_token_verified {
            OfferPhase::AddressVerified
        } else if self.sale_token.is_some() {
            OfferPhase::AddressPending
        } else {
            OfferPhase::Created
        }
    }

    /// The instant after which the offer counts as expired.
    #[must_use]
    pub fn deadline_at(&self) -> DateTime<Utc> {
        let secs = i64::try_from(self.deadline_seconds).unwrap_or(i64::MAX);
        self.created_at
            .checked_add_signed(Duration::seconds(secs))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    #[must_use]
    pub fn is_fully_deposited(&self) -> bool {
        self.tokens_deposited >= self.number_of_tokens_for_sale
    }

    #[must_use]
    pub fn is_fully_bid(&self) -> bool {
        self.bid_value >= self.total_sale_value
    }

    /// Sale tokens still owed by the seller.
    #[must_use]
    pub fn tokens_outstanding(&self) -> Amount {
        self.number_of_tokens_for_sale.saturating_sub(self.tokens_deposited)
    }

    #[must_use]
    pub fn is_party(&self, who: PartyId) -> bool {
        who == self.seller || self.buyer == Some(who)
    }

    /// Move to a terminal status and clear the transient fields.
    ///
    /// # Errors
    /// Returns [`SwapError::Internal`] if the transition is not allowed.
    pub fn enter_terminal(&mut self, status: OfferStatus) -> Result<()> {
        if !status.is_terminal() || !self.status.can_transition_to(status) {
            return Err(SwapError::Internal(format!(
                "{}: illegal transition {} -> {status}",
                self.id, self.status
            )));
        }
        self.status = status;
        self.is_open = false;
        self.buyer = None;
        self.bid_value = 0;
        self.tokens_deposited = 0;
        self.sale_token_verified = false;
        Ok(())
    }
}

/// Fixtures for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl OfferTerms {
    /// 1000 sale tokens for 10 000 base tokens, one-day deadline.
    pub fn dummy(base_token: TokenAddress, sale_token: Option<TokenAddress>) -> Self {
        Self {
            base_token,
            sale_token,
            amount_to_sell: 1_000,
            total_sale_value: 10_000,
            deadline_seconds: 86_400,
        }
    }
}
