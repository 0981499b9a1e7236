//! Settlement: the successful exit of a matched offer.
//!
//! `fee = floor((bid + collateral) / 100)` at canonical parameters, charged
//! once on the combined base-token value. The seller receives the rest of
//! that value, the buyer receives the lot, and any sale tokens deposited
//! beyond the lot go back to the seller.

use otcswap_types::{Notification, Offer, OfferId, OfferStatus, PartyId, Result, SwapError};

use crate::{
    engine::OfferEngine,
    fees::{FeeSchedule, Payout, add},
    journal::Journal,
    offer_store::OfferSlot,
};

/// Distribution for settling `offer` as it stands.
///
/// # Errors
/// - `SaleTokenUnset` if there is no sale token
/// - `Internal` if no buyer is bound
/// - `AccountingOverflow` on arithmetic overflow
pub fn settlement_payout(schedule: &FeeSchedule, offer: &Offer) -> Result<Payout> {
    let sale_token = offer.sale_token.ok_or(SwapError::SaleTokenUnset(offer.id))?;
    let buyer = offer
        .buyer
        .ok_or_else(|| SwapError::Internal(format!("{} matched without a buyer", offer.id)))?;

    let total_value = add(offer.bid_value, offer.collateral_value)?;
    let fee = schedule.base_fee(total_value)?;
    let surplus = offer.tokens_deposited.saturating_sub(offer.number_of_tokens_for_sale);

    Ok(Payout::new(offer.base_token, fee)
        .pay(offer.base_token, offer.seller, total_value - fee)
        .pay(sale_token, buyer, offer.number_of_tokens_for_sale)
        .pay(sale_token, offer.seller, surplus))
}

/// All settlement preconditions except the caller check.
fn check_ready(offer: &Offer, expired: bool) -> Result<()> {
    if offer.is_terminal() {
        return Err(SwapError::OfferTerminal {
            offer: offer.id,
            status: offer.status,
        });
    }
    if offer.is_open {
        return Err(SwapError::OfferStillOpen(offer.id));
    }
    if expired {
        return Err(SwapError::DeadlinePassed(offer.id));
    }
    Ok(())
}

fn check_funded(offer: &Offer) -> Result<()> {
    if !offer.is_fully_deposited() {
        return Err(SwapError::InsufficientDeposit {
            needed: offer.number_of_tokens_for_sale,
            deposited: offer.tokens_deposited,
        });
    }
    if !offer.is_fully_bid() {
        return Err(SwapError::InsufficientBid {
            needed: offer.total_sale_value,
            bid: offer.bid_value,
        });
    }
    if !offer.sale_token_verified {
        return Err(SwapError::SaleTokenNotVerified(offer.id));
    }
    Ok(())
}

/// `true` when a matched, live offer could settle right now.
pub(crate) fn is_settleable(offer: &Offer, expired: bool) -> bool {
    check_ready(offer, expired).is_ok() && check_funded(offer).is_ok()
}

impl OfferEngine {
    /// Settle a matched, fully funded, verified offer.
    ///
    /// # Errors
    /// - `OfferTerminal` / `OfferStillOpen` in the wrong state
    /// - `DeadlinePassed` after the deadline
    /// - `NotParty` if `caller` is neither buyer nor seller
    /// - `InsufficientDeposit` / `InsufficientBid` if either leg is short
    /// - `SaleTokenNotVerified` without address agreement
    /// - `LedgerTransferFailed` if a payout fails (everything is reversed)
    pub fn settle_offer(&self, id: OfferId, caller: PartyId) -> Result<()> {
        self.transact(id, "settle", |slot, journal, expired| {
            check_ready(&slot.offer, expired)?;
            if !slot.offer.is_party(caller) {
                return Err(SwapError::NotParty { offer: id, caller });
            }
            check_funded(&slot.offer)?;
            self.settle_locked(slot, journal)
        })
    }

    /// Settle an offer whose preconditions the caller has already checked.
    /// Shared by explicit settlement and the deposit/accept auto-chain.
    pub(crate) fn settle_locked(
        &self,
        slot: &mut OfferSlot,
        journal: &mut Journal<'_>,
    ) -> Result<()> {
        let offer = &mut slot.offer;
        let payout = settlement_payout(&self.schedule, offer)?;

        // Effects before interactions: the offer is terminal before any credit.
        offer.enter_terminal(OfferStatus::Settled)?;
        journal.execute(&payout)?;
        journal.notify(Notification::OfferSettled { id: offer.id });

        tracing::info!(
            offer = %offer.id,
            seller_received = %payout.paid_to(offer.seller, offer.base_token),
            fee = %payout.fee,
            "Offer settled"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use otcswap_types::{EngineConfig, OfferTerms, TokenAddress};

    use super::*;

    fn matched_offer() -> Offer {
        let sale = TokenAddress::random();
        let terms = OfferTerms::dummy(TokenAddress::random(), Some(sale));
        let mut offer = Offer::open(OfferId(7), PartyId::new(), &terms, 2_500, Utc::now());
        offer.is_open = false;
        offer.status = OfferStatus::Matched;
        offer.buyer = Some(PartyId::new());
        offer.bid_value = 10_000;
        offer.tokens_deposited = 1_000;
        offer.sale_token_verified = true;
        offer
    }

    fn schedule() -> FeeSchedule {
        FeeSchedule::from_config(&EngineConfig::with_owner(PartyId::new()))
    }

    #[test]
    fn canonical_settlement_split() {
        let offer = matched_offer();
        let payout = settlement_payout(&schedule(), &offer).unwrap();
        let sale = offer.sale_token.unwrap();
        let buyer = offer.buyer.unwrap();

        assert_eq!(payout.fee, 125);
        assert_eq!(payout.paid_to(offer.seller, offer.base_token), 12_375);
        assert_eq!(payout.paid_to(buyer, sale), 1_000);
        assert_eq!(payout.paid_to(offer.seller, sale), 0);
        assert_eq!(payout.total_out(offer.base_token), 12_500);
    }

    #[test]
    fn surplus_tokens_return_to_seller() {
        let mut offer = matched_offer();
        offer.tokens_deposited = 1_040;
        let payout = settlement_payout(&schedule(), &offer).unwrap();
        let sale = offer.sale_token.unwrap();
        assert_eq!(payout.paid_to(offer.seller, sale), 40);
        assert_eq!(payout.total_out(sale), 1_040);
    }

    #[test]
    fn readiness_checks() {
        let offer = matched_offer();
        assert!(is_settleable(&offer, false));
        assert!(!is_settleable(&offer, true));

        let mut short = matched_offer();
        short.tokens_deposited = 999;
        assert!(matches!(check_funded(&short), Err(SwapError::InsufficientDeposit { .. })));

        let mut underbid = matched_offer();
        underbid.bid_value = 9_900;
        assert!(matches!(check_funded(&underbid), Err(SwapError::InsufficientBid { .. })));

        let mut unverified = matched_offer();
        unverified.sale_token_verified = false;
        assert!(matches!(check_funded(&unverified), Err(SwapError::SaleTokenNotVerified(_))));

        let mut open = matched_offer();
        open.is_open = true;
        open.status = OfferStatus::Open;
        assert!(matches!(check_ready(&open, false), Err(SwapError::OfferStillOpen(_))));
    }
}
