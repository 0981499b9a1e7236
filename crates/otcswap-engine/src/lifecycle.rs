//! Forward transitions: create, claim, deposit, accept.
//!
//! Deposits and bids are recorded as the ledger-measured delta, never the
//! requested amount. Deposit and acceptance chain straight into settlement
//! when they leave the offer settleable, inside the same transaction.

use otcswap_types::{
    AddressClaims, Amount, Notification, Offer, OfferId, OfferStatus, OfferTerms, PartyId,
    Result, SwapError, TokenAddress,
};

use crate::{
    engine::OfferEngine,
    journal::Journal,
    offer_store::OfferSlot,
    reconciler::{self, ClaimOutcome, ClaimRole},
    settlement::is_settleable,
};

/// Result of [`OfferEngine::deposit_tokens`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositOutcome {
    /// Sale tokens that actually arrived.
    pub received: Amount,
    /// Whether the deposit completed the offer and settled it.
    pub settled: bool,
}

/// Result of [`OfferEngine::accept_offer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptOutcome {
    /// Base tokens that actually arrived.
    pub bid_value: Amount,
    /// Whether acceptance settled the offer immediately.
    pub settled: bool,
}

impl OfferEngine {
    /// Open a new offer, debiting the seller's collateral and, when the sale
    /// token is named, the full lot.
    ///
    /// 1. Validate the terms and compute the collateral
    /// 2. Debit the collateral; a short delta is refunded and rejected
    /// 3. Debit the lot if a sale token is given (short deltas accepted)
    /// 4. Allocate the id and store the offer
    ///
    /// Any failure reverses the debits already made.
    ///
    /// # Errors
    /// - `NullParty` for the null caller
    /// - `InvalidTerms` for malformed terms or a zero collateral
    /// - `ShortCollateral` if the collateral debit came back short
    /// - `LedgerTransferFailed` / `ZeroDelta` from the ledger
    pub fn create_offer(&self, caller: PartyId, terms: &OfferTerms) -> Result<OfferId> {
        if caller.is_nil() {
            return Err(SwapError::NullParty);
        }
        terms.validate()?;
        let collateral = self.config.collateral_for(terms.total_sale_value)?;
        if collateral == 0 {
            return Err(SwapError::InvalidTerms {
                reason: "total sale value too small for collateral".into(),
            });
        }

        let mut journal = Journal::new(self.ledger.as_ref(), &self.fee_ledger);
        match Self::collect_creation_deposits(&mut journal, caller, terms, collateral) {
            Ok(tokens_deposited) => {
                let id = self.store.allocate_id();
                let mut offer = Offer::open(id, caller, terms, collateral, self.clock.now());
                offer.tokens_deposited = tokens_deposited;
                let claims = AddressClaims {
                    seller: terms.sale_token,
                    buyer: None,
                };
                if let Err(err) = self.store.insert(OfferSlot { offer, claims }) {
                    journal.rollback();
                    return Err(err);
                }

                journal.notify(Notification::OfferCreated {
                    id,
                    sale_token: terms.sale_token,
                    base_token: terms.base_token,
                    amount: terms.amount_to_sell,
                    total_value: terms.total_sale_value,
                });
                if let Some(address) = terms.sale_token {
                    journal.notify(Notification::TokenAddressUpdated { id, address });
                }
                journal.commit(self.sink.as_ref());

                tracing::info!(
                    offer = %id,
                    seller = %caller,
                    collateral = %collateral,
                    tokens_deposited = %tokens_deposited,
                    deadline_seconds = terms.deadline_seconds,
                    "Offer created"
                );
                Ok(id)
            }
            Err(err) => {
                journal.rollback();
                tracing::debug!(seller = %caller, %err, "Offer creation aborted");
                Err(err)
            }
        }
    }

    fn collect_creation_deposits(
        journal: &mut Journal<'_>,
        caller: PartyId,
        terms: &OfferTerms,
        collateral: Amount,
    ) -> Result<Amount> {
        let received = journal.debit(terms.base_token, caller, collateral)?;
        if received < collateral {
            tracing::warn!(
                seller = %caller,
                expected = %collateral,
                received = %received,
                "Collateral arrived short"
            );
            return Err(SwapError::ShortCollateral {
                expected: collateral,
                received,
            });
        }
        match terms.sale_token {
            Some(sale_token) => journal.debit(sale_token, caller, terms.amount_to_sell),
            None => Ok(0),
        }
    }

    /// Submit `caller`'s claim about the sale-token address.
    ///
    /// The seller may claim any time before the deadline; the buyer only
    /// once bound by acceptance.
    ///
    /// # Errors
    /// - `OfferTerminal` if already terminal
    /// - `DeadlinePassed` after the deadline
    /// - `NotParty` if `caller` is neither seller nor bound buyer
    /// - `ClaimAlreadySubmitted` / `InvalidAddress` from reconciliation
    pub fn submit_claim(
        &self,
        id: OfferId,
        caller: PartyId,
        address: TokenAddress,
    ) -> Result<ClaimOutcome> {
        self.transact(id, "claim", |slot, journal, expired| {
            let OfferSlot { offer, claims } = slot;
            if offer.is_terminal() {
                return Err(SwapError::OfferTerminal {
                    offer: id,
                    status: offer.status,
                });
            }
            if expired {
                return Err(SwapError::DeadlinePassed(id));
            }
            let role = if caller == offer.seller {
                ClaimRole::Seller
            } else if offer.buyer == Some(caller) {
                ClaimRole::Buyer
            } else {
                return Err(SwapError::NotParty { offer: id, caller });
            };

            let outcome = reconciler::submit(offer, claims, role, address)?;
            if let Some(address) = outcome.written() {
                journal.notify(Notification::TokenAddressUpdated { id, address });
                tracing::info!(
                    offer = %id,
                    address = %address,
                    ?outcome,
                    "Sale token address updated"
                );
            }
            Ok(outcome)
        })
    }

    /// Deposit the seller's outstanding sale tokens.
    ///
    /// # Errors
    /// - `OfferTerminal` if already terminal
    /// - `NotSeller` if `caller` is not the seller
    /// - `DeadlinePassed` after the deadline
    /// - `SaleTokenUnset` before any sale-token address is known
    /// - `TokensAlreadyDeposited` once the lot is complete
    /// - `LedgerTransferFailed` / `ZeroDelta` from the ledger
    pub fn deposit_tokens(&self, id: OfferId, caller: PartyId) -> Result<DepositOutcome> {
        self.transact(id, "deposit", |slot, journal, expired| {
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
            if expired {
                return Err(SwapError::DeadlinePassed(id));
            }
            let sale_token = offer.sale_token.ok_or(SwapError::SaleTokenUnset(id))?;
            if offer.is_fully_deposited() {
                return Err(SwapError::TokensAlreadyDeposited(id));
            }

            let received = journal.debit(sale_token, caller, offer.tokens_outstanding())?;
            offer.tokens_deposited = offer
                .tokens_deposited
                .checked_add(received)
                .ok_or_else(|| {
                    SwapError::AccountingOverflow(format!("tokens deposited on {id}"))
                })?;
            tracing::info!(
                offer = %id,
                received = %received,
                total = %offer.tokens_deposited,
                "Sale tokens deposited"
            );

            let settled = is_settleable(offer, expired);
            if settled {
                self.settle_locked(slot, journal)?;
            }
            Ok(DepositOutcome { received, settled })
        })
    }

    /// Accept an open offer, paying the full sale value in base tokens.
    ///
    /// With `buyer_asserts_verified`, a buyer who already trusts the sale
    /// token out of band marks it verified; if the lot and the bid are both
    /// complete the offer settles at once. This bypasses address
    /// reconciliation entirely.
    ///
    /// # Errors
    /// - `NullParty` for the null caller
    /// - `OfferTerminal` / `OfferNotOpen` if the offer is no longer open
    /// - `DeadlinePassed` after the deadline
    /// - `SelfAcceptance` if the seller accepts their own offer
    /// - `LedgerTransferFailed` / `ZeroDelta` from the ledger
    pub fn accept_offer(
        &self,
        id: OfferId,
        caller: PartyId,
        buyer_asserts_verified: bool,
    ) -> Result<AcceptOutcome> {
        if caller.is_nil() {
            return Err(SwapError::NullParty);
        }
        self.transact(id, "accept", |slot, journal, expired| {
            let offer = &mut slot.offer;
            if offer.is_terminal() {
                return Err(SwapError::OfferTerminal {
                    offer: id,
                    status: offer.status,
                });
            }
            if !offer.is_open {
                return Err(SwapError::OfferNotOpen(id));
            }
            if expired {
                return Err(SwapError::DeadlinePassed(id));
            }
            if caller == offer.seller {
                return Err(SwapError::SelfAcceptance(id));
            }

            // Bind the buyer before the debit so a re-entrant accept sees a closed offer.
            offer.is_open = false;
            offer.status = OfferStatus::Matched;
            offer.buyer = Some(caller);

            let bid_value = journal.debit(offer.base_token, caller, offer.total_sale_value)?;
            offer.bid_value = bid_value;
            journal.notify(Notification::OfferAccepted { id, buyer: caller });
            tracing::info!(offer = %id, buyer = %caller, bid_value = %bid_value, "Offer accepted");

            let shortcut = buyer_asserts_verified
                && offer.sale_token.is_some()
                && offer.is_fully_deposited()
                && offer.is_fully_bid();
            if shortcut {
                offer.sale_token_verified = true;
                tracing::debug!(offer = %id, "Buyer asserted sale token verified");
            }

            let settled = is_settleable(offer, expired);
            if settled {
                self.settle_locked(slot, journal)?;
            }
            Ok(AcceptOutcome { bid_value, settled })
        })
    }
}
