//! # otcswap-engine
//!
//! **Offer lifecycle**: collateralised creation, mutual address
//! reconciliation, deposit accounting, matching, settlement, cancellation
//! and dispute-weighted back-out.
//!
//! ## Architecture
//!
//! Every state-mutating call on an offer runs as one transaction:
//! 1. Takes the offer's own lock (re-entrant or concurrent calls get `OfferBusy`)
//! 2. Latches the deadline if it has passed
//! 3. Checks every guard before touching anything
//! 4. Commits the offer's new state, then calls the ledger through a journal
//! 5. On any failure, reverses the journal and restores the offer
//! 6. On success, emits the queued notifications
//!
//! ## Fees
//!
//! `fee = floor(amount * multiplier / divisor)`: 1% on settlement and
//! cancellation, 5% on back-outs of disputed offers at canonical settings.
//! Fees accrue per token and are drained by the owner.

pub mod dispute;
pub mod engine;
pub mod fee_ledger;
pub mod fees;
pub mod journal;
pub mod lifecycle;
pub mod offer_store;
pub mod reconciler;
pub mod settlement;

pub use dispute::{BackOutKind, DisputeResolver};
pub use engine::OfferEngine;
pub use fee_ledger::FeeLedger;
pub use fees::{Credit, FeeSchedule, Payout};
pub use lifecycle::{AcceptOutcome, DepositOutcome};
pub use offer_store::{OfferSlot, OfferStore};
pub use reconciler::{ClaimOutcome, ClaimRole};
pub use settlement::settlement_payout;
