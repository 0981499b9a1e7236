//! # otcswap-types
//!
//! Shared types, errors, and configuration for the **OTCSwap** conditional
//! exchange engine.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OfferId`], [`PartyId`], [`TokenAddress`]
//! - **Offer model**: [`Offer`], [`OfferStatus`], [`OfferPhase`], [`AddressClaims`]
//! - **Notifications**: [`Notification`], [`EventRecord`]
//! - **Deadline clock**: [`Clock`], [`SystemClock`], [`has_deadline_passed`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`SwapError`] with `SW_ERR_` prefix codes, [`ErrorKind`], [`LedgerFault`]
//! - **Constants**: canonical collateral, fee and penalty parameters

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod offer;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use offer::*;

// Constants are accessed via `otcswap_types::constants::FOO`
// (not re-exported to avoid name collisions).
