//! The offer engine: shared state and the transaction wrapper every
//! state-mutating operation runs inside.
//!
//! Operations themselves live next to the logic they drive:
//! [`lifecycle`](crate::lifecycle) (create, claim, deposit, accept),
//! [`settlement`](crate::settlement) and [`dispute`](crate::dispute)
//! (cancel, back out).

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use otcswap_ledger::{EventSink, TokenLedger, TracingSink};
use otcswap_types::{
    AddressClaims, Amount, Clock, EngineConfig, Offer, OfferId, PartyId, Result, SwapError,
    SystemClock, TokenAddress, constants, has_deadline_passed,
};

use crate::{
    fee_ledger::FeeLedger,
    fees::FeeSchedule,
    journal::Journal,
    offer_store::{OfferSlot, OfferStore},
};

/// Conditional-exchange engine over an external [`TokenLedger`].
pub struct OfferEngine {
    pub(crate) config: EngineConfig,
    pub(crate) schedule: FeeSchedule,
    pub(crate) store: OfferStore,
    pub(crate) fee_ledger: FeeLedger,
    pub(crate) ledger: Arc<dyn TokenLedger>,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl OfferEngine {
    /// Create an engine with the wall clock and a tracing-only sink.
    ///
    /// # Errors
    /// Returns [`SwapError::Configuration`] if `config` is invalid.
    pub fn new(config: EngineConfig, ledger: Arc<dyn TokenLedger>) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            owner = %config.owner,
            collateral_percent = config.collateral_percent,
            fee_divisor = %config.fee_divisor,
            dispute_multiplier = %config.dispute_multiplier,
            "Offer engine initialised"
        );
        Ok(Self {
            schedule: FeeSchedule::from_config(&config),
            config,
            store: OfferStore::new(),
            fee_ledger: FeeLedger::new(),
            ledger,
            sink: Arc::new(TracingSink),
            clock: Arc::new(SystemClock),
        })
    }

    /// Route notifications to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Read deadlines from `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `op` as one all-or-nothing step on offer `id`.
    ///
    /// 1. Take the offer's lock (busy offers fail fast)
    /// 2. Latch the deadline if it has passed
    /// 3. Snapshot the slot
    /// 4. Run `op`, which commits field changes before its ledger calls
    /// 5. On error: reverse the journal and restore the snapshot
    /// 6. On success: release the queued notifications
    ///
    /// A panic inside `op` (typically from the ledger) is rolled back the
    /// same way before it resumes, with the lock released first so the slot
    /// is not poisoned.
    ///
    /// `op` receives `true` once the deadline has been observed passed.
    pub(crate) fn transact<T>(
        &self,
        id: OfferId,
        action: &'static str,
        op: impl FnOnce(&mut OfferSlot, &mut Journal<'_>, bool) -> Result<T>,
    ) -> Result<T> {
        let handle = self.store.handle(id)?;
        let mut slot = OfferStore::try_lock(&handle, id)?;

        let expired = self.observe_deadline(&mut slot.offer);
        let snapshot = slot.clone();
        let mut journal = Journal::new(self.ledger.as_ref(), &self.fee_ledger);

        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| op(&mut *slot, &mut journal, expired)));
        match outcome {
            Ok(Ok(value)) => {
                drop(slot);
                journal.commit(self.sink.as_ref());
                Ok(value)
            }
            Ok(Err(err)) => {
                journal.rollback();
                *slot = snapshot;
                tracing::debug!(offer = %id, action, %err, kind = %err.kind(), "Operation aborted");
                Err(err)
            }
            Err(payload) => {
                journal.rollback();
                *slot = snapshot;
                drop(slot);
                tracing::error!(offer = %id, action, "Operation panicked, state rolled back");
                panic::resume_unwind(payload)
            }
        }
    }

    /// Set the sticky latch if the deadline has passed and return it.
    pub(crate) fn observe_deadline(&self, offer: &mut Offer) -> bool {
        if !offer.deadline_observed
            && has_deadline_passed(offer.created_at, offer.deadline_seconds, self.clock.now())
        {
            offer.deadline_observed = true;
            tracing::debug!(
                offer = %offer.id,
                deadline = %offer.deadline_at(),
                "Deadline observed"
            );
        }
        offer.deadline_observed
    }

    /// Drain the accrued fees for `token` to the owner.
    ///
    /// Returns the amount paid out; zero balances make no ledger call.
    ///
    /// # Errors
    /// - `NotOwner` if `caller` is not the configured owner
    /// - `LedgerTransferFailed` if the credit fails (the balance is kept)
    pub fn withdraw_fees(&self, caller: PartyId, token: TokenAddress) -> Result<Amount> {
        if caller != self.config.owner {
            return Err(SwapError::NotOwner(caller));
        }
        let amount = self.fee_ledger.take_all(token)?;
        if amount == 0 {
            return Ok(0);
        }
        if let Err(fault) = self.ledger.credit(token, caller, amount) {
            self.fee_ledger.accrue(token, amount)?;
            return Err(fault.into_swap_error(token));
        }
        tracing::info!(token = %token, amount = %amount, "Fees withdrawn");
        Ok(amount)
    }

    // ── Read API ──────────────────────────────────────────────────────

    /// Snapshot of an offer.
    ///
    /// # Errors
    /// `OfferNotFound` for unknown ids, `OfferBusy` while the offer is held.
    pub fn offer(&self, id: OfferId) -> Result<Offer> {
        Ok(self.store.snapshot(id)?.offer)
    }

    pub fn claims(&self, id: OfferId) -> Result<AddressClaims> {
        Ok(self.store.snapshot(id)?.claims)
    }

    pub fn is_disputed(&self, id: OfferId) -> Result<bool> {
        Ok(self.store.snapshot(id)?.offer.disputed)
    }

    /// Whether the offer's deadline has passed. Once `true`, stays `true`.
    ///
    /// This read takes the offer's lock and sets the sticky latch when it
    /// observes expiry, so a later clock rewind cannot reopen the offer.
    ///
    /// # Errors
    /// - `OfferNotFound` for unknown ids
    /// - `OfferBusy` while another operation holds the offer, like every
    ///   per-offer read
    pub fn has_deadline_passed(&self, id: OfferId) -> Result<bool> {
        let handle = self.store.handle(id)?;
        let mut slot = OfferStore::try_lock(&handle, id)?;
        Ok(self.observe_deadline(&mut slot.offer))
    }

    #[must_use]
    pub fn accrued_fees(&self, token: TokenAddress) -> Amount {
        self.fee_ledger.balance(token)
    }

    #[must_use]
    pub fn offer_count(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn owner(&self) -> PartyId {
        self.config.owner
    }
}

#[cfg(test)]
mod tests {
    use otcswap_ledger::InMemoryLedger;
    use otcswap_types::ErrorKind;

    use super::*;

    fn ledger() -> Arc<dyn TokenLedger> {
        Arc::new(InMemoryLedger::new())
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = EngineConfig::with_owner(PartyId::new());
        config.fee_divisor = 0;
        let err = OfferEngine::new(config, ledger()).err().unwrap();
        assert!(matches!(err, SwapError::Configuration(_)));
    }

    #[test]
    fn config_from_json() {
        let owner = PartyId::new();
        let json = serde_json::json!({ "owner": owner, "dispute_multiplier": 3 }).to_string();
        let engine = OfferEngine::new(EngineConfig::from_json(&json).unwrap(), ledger()).unwrap();
        assert_eq!(engine.owner(), owner);
        assert_eq!(engine.config().collateral_percent, 25);
        assert_eq!(engine.schedule.dispute_multiplier, 3);
    }

    #[test]
    fn unknown_offer_not_found() {
        let engine = OfferEngine::new(EngineConfig::with_owner(PartyId::new()), ledger()).unwrap();
        let id = OfferId(9);
        for err in [
            engine.offer(id).unwrap_err(),
            engine.has_deadline_passed(id).unwrap_err(),
            engine.settle_offer(id, PartyId::new()).unwrap_err(),
        ] {
            assert!(matches!(err, SwapError::OfferNotFound(_)));
            assert_eq!(err.kind(), ErrorKind::Lifecycle);
        }
        assert_eq!(engine.offer_count(), 0);
    }

    #[test]
    fn deadline_read_reports_busy_while_held() {
        let engine = OfferEngine::new(EngineConfig::with_owner(PartyId::new()), ledger()).unwrap();
        let terms = otcswap_types::OfferTerms::dummy(TokenAddress::random(), None);
        let id = engine.store.allocate_id();
        let offer = Offer::open(id, PartyId::new(), &terms, 2_500, chrono::Utc::now());
        engine
            .store
            .insert(OfferSlot { offer, claims: AddressClaims::default() })
            .unwrap();

        let handle = engine.store.handle(id).unwrap();
        let held = OfferStore::try_lock(&handle, id).unwrap();
        assert!(matches!(engine.has_deadline_passed(id), Err(SwapError::OfferBusy(_))));
        drop(held);
        assert!(!engine.has_deadline_passed(id).unwrap());
    }
}
