//! Error types for the OTCSwap engine.
//!
//! All errors use the `SW_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by failure class:
//! - 1xx: Authorization (caller is not the required party/owner)
//! - 2xx: Lifecycle (operation invoked in the wrong state)
//! - 3xx: Timing (deadline passed, or not yet passed)
//! - 4xx: Value (malformed terms, insufficient deposit or bid)
//! - 5xx: Ledger (external transfer failed or returned a bad delta)
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{Amount, OfferId, OfferStatus, PartyId, TokenAddress};

/// The failure class of a [`SwapError`]. Every abort maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authorization,
    Lifecycle,
    Timing,
    Value,
    Ledger,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Lifecycle => write!(f, "LIFECYCLE"),
            Self::Timing => write!(f, "TIMING"),
            Self::Value => write!(f, "VALUE"),
            Self::Ledger => write!(f, "LEDGER"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Central error enum for all OTCSwap operations.
#[derive(Debug, Error)]
pub enum SwapError {
    // =================================================================
    // Authorization Errors (1xx)
    // =================================================================
    /// Only the seller may perform this operation.
    #[error("SW_ERR_100: {caller} is not the seller of {offer}")]
    NotSeller { offer: OfferId, caller: PartyId },

    /// Only the buyer or the seller may perform this operation.
    #[error("SW_ERR_101: {caller} is not a party to {offer}")]
    NotParty { offer: OfferId, caller: PartyId },

    /// Only the fee owner may withdraw fees.
    #[error("SW_ERR_102: {0} is not the fee owner")]
    NotOwner(PartyId),

    /// The seller tried to accept their own offer.
    #[error("SW_ERR_103: Seller cannot accept own offer {0}")]
    SelfAcceptance(OfferId),

    // =================================================================
    // Lifecycle Errors (2xx)
    // =================================================================
    /// No offer exists with this id.
    #[error("SW_ERR_200: Offer not found: {0}")]
    OfferNotFound(OfferId),

    /// The offer is settled, cancelled or backed out.
    #[error("SW_ERR_201: {offer} is terminal ({status})")]
    OfferTerminal { offer: OfferId, status: OfferStatus },

    /// The offer has already been matched by a buyer.
    #[error("SW_ERR_202: {0} is no longer open")]
    OfferNotOpen(OfferId),

    /// The offer has not been matched yet.
    #[error("SW_ERR_203: {0} is still open (no buyer)")]
    OfferStillOpen(OfferId),

    /// The sale-token address has not been set.
    #[error("SW_ERR_204: Sale token address unset for {0}")]
    SaleTokenUnset(OfferId),

    /// Both parties have not agreed on the sale-token address.
    #[error("SW_ERR_205: Sale token address not verified for {0}")]
    SaleTokenNotVerified(OfferId),

    /// A party tried to submit a second address claim.
    #[error("SW_ERR_206: {party} already submitted an address claim for {offer}")]
    ClaimAlreadySubmitted { offer: OfferId, party: PartyId },

    /// The offer is locked by another in-flight call (re-entry or contention).
    #[error("SW_ERR_207: {0} is busy; resubmit")]
    OfferBusy(OfferId),

    /// The seller has already deposited the full token amount.
    #[error("SW_ERR_208: Sale tokens already fully deposited for {0}")]
    TokensAlreadyDeposited(OfferId),

    /// A valid matching bid exists; cancellation is not the right exit.
    #[error("SW_ERR_209: {0} holds a full bid; use back-out")]
    ValidBidExists(OfferId),

    // =================================================================
    // Timing Errors (3xx)
    // =================================================================
    /// The deadline has passed; the operation required a fresh offer.
    #[error("SW_ERR_300: Deadline passed for {0}")]
    DeadlinePassed(OfferId),

    /// The deadline has not passed; the operation requires expiry.
    #[error("SW_ERR_301: Deadline not yet reached for {0}")]
    DeadlineNotReached(OfferId),

    // =================================================================
    // Value Errors (4xx)
    // =================================================================
    /// Offer terms failed validation at creation.
    #[error("SW_ERR_400: Invalid offer terms: {reason}")]
    InvalidTerms { reason: String },

    /// Sale tokens deposited fall short of the offered amount.
    #[error("SW_ERR_401: Insufficient deposit: need {needed}, have {deposited}")]
    InsufficientDeposit { needed: Amount, deposited: Amount },

    /// The buyer's bid falls short of the total sale value.
    #[error("SW_ERR_402: Insufficient bid: need {needed}, have {bid}")]
    InsufficientBid { needed: Amount, bid: Amount },

    /// A token address could not be parsed.
    #[error("SW_ERR_403: Invalid token address: {0}")]
    InvalidAddress(String),

    /// A required party identity was the null identity.
    #[error("SW_ERR_404: Null party identity")]
    NullParty,

    /// Checked arithmetic on caller-supplied values overflowed.
    #[error("SW_ERR_405: Arithmetic overflow: {0}")]
    Overflow(String),

    // =================================================================
    // Ledger Errors (5xx)
    // =================================================================
    /// The external ledger rejected a transfer.
    #[error("SW_ERR_500: Ledger transfer of {token} failed: {reason}")]
    LedgerTransferFailed { token: TokenAddress, reason: String },

    /// A debit reported that nothing was received.
    #[error("SW_ERR_501: Ledger debit of {token} returned zero delta")]
    ZeroDelta { token: TokenAddress },

    /// The collateral debit delivered less than the fixed collateral value.
    #[error("SW_ERR_502: Collateral short: expected {expected}, received {received}")]
    ShortCollateral { expected: Amount, received: Amount },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SW_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SW_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad parameters, etc.).
    #[error("SW_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// Supply conservation invariant violated. Critical safety alert.
    #[error("SW_ERR_903: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    /// Fee, payout or custody bookkeeping overflowed on a live offer.
    #[error("SW_ERR_904: Accounting overflow: {0}")]
    AccountingOverflow(String),
}

impl SwapError {
    /// The failure class this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotSeller { .. }
            | Self::NotParty { .. }
            | Self::NotOwner(_)
            | Self::SelfAcceptance(_) => ErrorKind::Authorization,
            Self::OfferNotFound(_)
            | Self::OfferTerminal { .. }
            | Self::OfferNotOpen(_)
            | Self::OfferStillOpen(_)
            | Self::SaleTokenUnset(_)
            | Self::SaleTokenNotVerified(_)
            | Self::ClaimAlreadySubmitted { .. }
            | Self::OfferBusy(_)
            | Self::TokensAlreadyDeposited(_)
            | Self::ValidBidExists(_) => ErrorKind::Lifecycle,
            Self::DeadlinePassed(_) | Self::DeadlineNotReached(_) => ErrorKind::Timing,
            Self::InvalidTerms { .. }
            | Self::InsufficientDeposit { .. }
            | Self::InsufficientBid { .. }
            | Self::InvalidAddress(_)
            | Self::NullParty
            | Self::Overflow(_) => ErrorKind::Value,
            Self::LedgerTransferFailed { .. }
            | Self::ZeroDelta { .. }
            | Self::ShortCollateral { .. } => ErrorKind::Ledger,
            Self::Internal(_)
            | Self::Serialization(_)
            | Self::Configuration(_)
            | Self::SupplyInvariantViolation { .. }
            | Self::AccountingOverflow(_) => ErrorKind::Internal,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SwapError>;

impl From<serde_json::Error> for SwapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Failure reported by a token ledger implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerFault {
    /// The debited account does not hold enough of the token.
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    /// The ledger refused the transfer.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

impl LedgerFault {
    /// Attach the token being moved and lift into a [`SwapError`].
    #[must_use]
    pub fn into_swap_error(self, token: TokenAddress) -> SwapError {
        SwapError::LedgerTransferFailed {
            token,
            reason: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = SwapError::OfferNotFound(OfferId(3));
        let msg = format!("{err}");
        assert!(msg.starts_with("SW_ERR_200"), "Got: {msg}");
        assert!(msg.contains("offer:3"));
    }

    #[test]
    fn insufficient_bid_display() {
        let err = SwapError::InsufficientBid { needed: 10_000, bid: 9_000 };
        let msg = format!("{err}");
        assert!(msg.contains("SW_ERR_402"));
        assert!(msg.contains("10000"));
        assert!(msg.contains("9000"));
    }

    #[test]
    fn kinds_follow_code_groups() {
        let cases: Vec<(SwapError, ErrorKind)> = vec![
            (SwapError::NotOwner(PartyId::new()), ErrorKind::Authorization),
            (SwapError::OfferBusy(OfferId(1)), ErrorKind::Lifecycle),
            (SwapError::DeadlineNotReached(OfferId(1)), ErrorKind::Timing),
            (SwapError::NullParty, ErrorKind::Value),
            (SwapError::ZeroDelta { token: TokenAddress::ZERO }, ErrorKind::Ledger),
            (SwapError::Internal("x".into()), ErrorKind::Internal),
            (SwapError::Overflow("collateral".into()), ErrorKind::Value),
            (SwapError::AccountingOverflow("fee".into()), ErrorKind::Internal),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn all_errors_have_sw_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(SwapError::SaleTokenUnset(OfferId(1))),
            Box::new(SwapError::DeadlinePassed(OfferId(1))),
            Box::new(SwapError::ShortCollateral { expected: 2_500, received: 2_475 }),
            Box::new(SwapError::OfferTerminal {
                offer: OfferId(1),
                status: OfferStatus::Settled,
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(msg.starts_with("SW_ERR_"), "Error missing SW_ERR_ prefix: {msg}");
        }
    }

    #[test]
    fn ledger_fault_lifts_to_ledger_kind() {
        let token = TokenAddress::random();
        let err = LedgerFault::Rejected("paused".into()).into_swap_error(token);
        assert_eq!(err.kind(), ErrorKind::Ledger);
        assert!(format!("{err}").contains("paused"));
    }
}
