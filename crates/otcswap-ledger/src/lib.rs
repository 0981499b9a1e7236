//! # otcswap-ledger
//!
//! **External collaborators** of the OTCSwap engine, specified at their
//! interface boundary.
//!
//! ## Architecture
//!
//! The engine never moves balances itself; it talks to:
//! 1. **TokenLedger**: atomic debit/credit primitive. Debits report the
//!    balance delta actually received, so fee-on-transfer tokens are
//!    measured rather than trusted.
//! 2. **EventSink**: receives one notification per committed transition.
//!
//! An [`InMemoryLedger`] reference implementation (custody account,
//! fee-on-transfer model, failure injection, supply conservation) and two
//! sinks ([`RecordingSink`], [`TracingSink`]) are provided.
//!
//! ```text
//! Engine ──debit──▶ TokenLedger ──▶ custody
//!        ◀─delta──
//! Engine ──credit─▶ TokenLedger ──▶ party
//! Engine ──emit───▶ EventSink
//! ```

pub mod event_sink;
pub mod memory_ledger;
pub mod supply_conservation;
pub mod token_ledger;

pub use event_sink::{EventSink, RecordingSink, TracingSink};
pub use memory_ledger::InMemoryLedger;
pub use supply_conservation::SupplyConservation;
pub use token_ledger::TokenLedger;
