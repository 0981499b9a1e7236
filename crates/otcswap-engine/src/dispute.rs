//! Expiry exits: cancellation and dispute-weighted back-out.
//!
//! Both require the deadline to have passed. Cancellation is the seller's
//! exit when no full bid arrived. Back-out is either party's exit from a
//! matched offer that never settled; a disputed offer pays its fee at the
//! dispute multiplier.

use otcswap_types::{
    Amount, Notification, Offer, OfferId, OfferStatus, PartyId, Result, SwapError, constants,
};

use crate::{
    engine::OfferEngine,
    fees::{FeeSchedule, Payout, add},
};

/// Which side failed to deliver, as judged at back-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutKind {
    /// Sale tokens short while the bid was full: the buyer takes the
    /// collateral, less the fee.
    SellerDefault,
    /// Anything else: every deposit goes back to whoever made it. The fee
    /// comes out of the collateral, or on a disputed offer is split between
    /// the buyer's bid and the collateral.
    Unwind,
}

/// Computes the penalty-weighted payouts for expiry exits.
#[derive(Debug, Clone, Copy)]
pub struct DisputeResolver {
    schedule: FeeSchedule,
}

impl DisputeResolver {
    #[must_use]
    pub fn new(schedule: FeeSchedule) -> Self {
        Self { schedule }
    }

    /// Fee multiplier for back-outs of `offer`.
    #[must_use]
    pub fn multiplier(&self, offer: &Offer) -> Amount {
        if offer.disputed {
            self.schedule.dispute_multiplier
        } else {
            constants::BASE_FEE_MULTIPLIER
        }
    }

    /// Distribution for cancelling `offer`.
    ///
    /// The fee is `fee(collateral + bid, 1)`, capped at the collateral it is
    /// taken from.
    pub fn cancel_payout(&self, offer: &Offer) -> Result<Payout> {
        let fee = self
            .schedule
            .base_fee(add(offer.collateral_value, offer.bid_value)?)?
            .min(offer.collateral_value);
        let payout = Payout::new(offer.base_token, fee)
            .pay(offer.base_token, offer.seller, offer.collateral_value - fee);
        Ok(Self::return_deposits(offer, payout, 0))
    }

    /// Classify and distribute a back-out of `offer`.
    pub fn back_out_payout(&self, offer: &Offer) -> Result<(BackOutKind, Payout)> {
        let multiplier = self.multiplier(offer);
        let pot = add(offer.bid_value, offer.collateral_value)?;
        let fee = self.schedule.fee(pot, multiplier)?;

        if !offer.is_fully_deposited() && offer.is_fully_bid() {
            let buyer = offer
                .buyer
                .ok_or_else(|| {
                    SwapError::Internal(format!("{} matched without a buyer", offer.id))
                })?;
            let fee = fee.min(pot);
            let mut payout =
                Payout::new(offer.base_token, fee).pay(offer.base_token, buyer, pot - fee);
            if let Some(sale_token) = offer.sale_token {
                payout = payout.pay(sale_token, offer.seller, offer.tokens_deposited);
            }
            return Ok((BackOutKind::SellerDefault, payout));
        }

        // A disputed unwind charges the bid its own share of the penalty.
        let bid_fee = if offer.disputed {
            self.schedule.fee(offer.bid_value, multiplier)?.min(offer.bid_value)
        } else {
            0
        };
        let collateral_fee = (fee - bid_fee).min(offer.collateral_value);
        let payout = Payout::new(offer.base_token, bid_fee + collateral_fee).pay(
            offer.base_token,
            offer.seller,
            offer.collateral_value - collateral_fee,
        );
        Ok((BackOutKind::Unwind, Self::return_deposits(offer, payout, bid_fee)))
    }

    /// Refund the buyer's bid less `bid_fee` and the seller's sale tokens as
    /// received.
    fn return_deposits(offer: &Offer, mut payout: Payout, bid_fee: Amount) -> Payout {
        if let Some(buyer) = offer.buyer {
            payout = payout.pay(offer.base_token, buyer, offer.bid_value - bid_fee);
        }
        if let Some(sale_token) = offer.sale_token {
            payout = payout.pay(sale_token, offer.seller, offer.tokens_deposited);
        }
        payout
    }
}

impl OfferEngine {
    pub(crate) fn resolver(&self) -> DisputeResolver {
        DisputeResolver::new(self.schedule)
    }

    /// Seller's exit after the deadline when no full bid exists.
    ///
    /// # Errors
    /// - `OfferTerminal` if already terminal
    /// - `NotSeller` if `caller` is not the seller
    /// - `DeadlineNotReached` before the deadline
    /// - `ValidBidExists` if the buyer's bid covers the sale value
    /// - `LedgerTransferFailed` if a refund fails (everything is reversed)
    pub fn cancel_offer(&self, id: OfferId, caller: PartyId) -> Result<()> {
        self.transact(id, "cancel", |slot, journal, expired| {
            let offer = &mut slot.offer;
            if offer.is_terminal() {
                return Err(SwapError::OfferTerminal {
                    offer: id,
                    status: offer.status,
                });
            }
            if caller != offer.seller {
                return Err(SwapError::NotSeller { offer: id, caller });
            }
            if !expired {
                return Err(SwapError::DeadlineNotReached(id));
            }
            if offer.is_fully_bid() {
                return Err(SwapError::ValidBidExists(id));
            }

            let payout = self.resolver().cancel_payout(offer)?;
            offer.enter_terminal(OfferStatus::Cancelled)?;
            journal.execute(&payout)?;
            journal.notify(Notification::OfferCancelled { id });

            tracing::info!(offer = %id, fee = %payout.fee, "Offer cancelled");
            Ok(())
        })
    }

    /// Either party's exit from a matched offer after the deadline.
    ///
    /// # Errors
    /// - `OfferTerminal` if already terminal
    /// - `NotParty` if `caller` is neither buyer nor seller
    /// - `OfferStillOpen` if no buyer ever matched
    /// - `DeadlineNotReached` before the deadline
    /// - `LedgerTransferFailed` if a refund fails (everything is reversed)
    pub fn back_out(&self, id: OfferId, caller: PartyId) -> Result<BackOutKind> {
        self.transact(id, "back_out", |slot, journal, expired| {
            let offer = &mut slot.offer;
            if offer.is_terminal() {
                return Err(SwapError::OfferTerminal {
                    offer: id,
                    status: offer.status,
                });
            }
            if !offer.is_party(caller) {
                return Err(SwapError::NotParty { offer: id, caller });
            }
            if offer.is_open {
                return Err(SwapError::OfferStillOpen(id));
            }
            if !expired {
                return Err(SwapError::DeadlineNotReached(id));
            }

            let (kind, payout) = self.resolver().back_out_payout(offer)?;
            if offer.disputed {
                tracing::warn!(
                    offer = %id,
                    fee = %payout.fee,
                    "Disputed offer backed out at penalty rate"
                );
            }
            offer.enter_terminal(OfferStatus::BackedOut)?;
            journal.execute(&payout)?;
            journal.notify(Notification::OfferBackedOut { id });

            tracing::info!(offer = %id, ?kind, fee = %payout.fee, "Offer backed out");
            Ok(kind)
        })
    }
}
