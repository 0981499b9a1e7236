//! The token-transfer primitive the engine consumes.

use otcswap_types::{Amount, LedgerFault, PartyId, TokenAddress};

/// Moves tokens between parties and the engine's custody account.
///
/// Implementations may call back into arbitrary code during a transfer
/// (token hooks); the engine assumes any call can re-enter it.
pub trait TokenLedger: Send + Sync {
    /// Pull `amount` of `token` from `from` into custody.
    ///
    /// Returns the amount custody actually gained, which may be less than
    /// `amount` for tokens that skim a fee on transfer.
    fn debit(
        &self,
        token: TokenAddress,
        from: PartyId,
        amount: Amount,
    ) -> Result<Amount, LedgerFault>;

    /// Pay `amount` of `token` out of custody to `to`.
    fn credit(&self, token: TokenAddress, to: PartyId, amount: Amount) -> Result<(), LedgerFault>;
}
