//! System-wide constants for the OTCSwap engine.

/// Seller collateral as a percentage of `total_sale_value`.
pub const DEFAULT_COLLATERAL_PERCENT: u8 = 25;

/// Fee denominator: `fee = amount * multiplier / FEE_DIVISOR` (1%).
pub const DEFAULT_FEE_DIVISOR: u128 = 100;

/// Fee multiplier applied to back-outs of disputed offers (5% instead of 1%).
pub const DEFAULT_DISPUTE_MULTIPLIER: u128 = 5;

/// Fee multiplier for undisputed paths.
pub const BASE_FEE_MULTIPLIER: u128 = 1;

/// The first offer id handed out by a fresh store.
pub const FIRST_OFFER_ID: u64 = 1;

/// Basis-point denominator used by fee-on-transfer token models.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Length of a token contract address in bytes.
pub const TOKEN_ADDRESS_LEN: usize = 20;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OTCSwap";
