//! Shared fixtures for engine scenario tests.

#![allow(dead_code)]

use std::sync::Arc;

use otcswap_engine::OfferEngine;
use otcswap_ledger::{InMemoryLedger, RecordingSink, TokenLedger};
use otcswap_types::{Amount, EngineConfig, ManualClock, OfferId, OfferTerms, PartyId, TokenAddress};
use tracing_subscriber::EnvFilter;

/// Route engine logs to the test writer; `RUST_LOG=otcswap_engine=debug`
/// shows every transition.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Default lot: 1000 sale tokens for 10 000 base tokens, one-day deadline.
pub const AMOUNT: Amount = 1_000;
pub const TOTAL_VALUE: Amount = 10_000;
pub const COLLATERAL: Amount = 2_500;
pub const DEADLINE_SECS: i64 = 86_400;

/// Starting balance of every funded party in every token.
pub const FUNDING: Amount = 1_000_000;

/// An engine wired to an in-memory ledger, a recording sink and a manual
/// clock, with a funded seller and buyer.
pub struct Harness {
    pub engine: Arc<OfferEngine>,
    pub ledger: Arc<InMemoryLedger>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
    pub owner: PartyId,
    pub seller: PartyId,
    pub buyer: PartyId,
    pub base: TokenAddress,
    pub sale: TokenAddress,
}

impl Harness {
    pub fn new() -> Self {
        let ledger = Arc::new(InMemoryLedger::new());
        Self::with_ledger(Arc::clone(&ledger) as Arc<dyn TokenLedger>, ledger)
    }

    /// Build over `engine_ledger`, funding parties through `ledger`. The two
    /// differ when a test wraps the in-memory ledger.
    pub fn with_ledger(engine_ledger: Arc<dyn TokenLedger>, ledger: Arc<InMemoryLedger>) -> Self {
        init_tracing();
        let owner = PartyId::new();
        let seller = PartyId::new();
        let buyer = PartyId::new();
        let base = TokenAddress::random();
        let sale = TokenAddress::random();
        for party in [seller, buyer] {
            ledger.mint(party, base, FUNDING);
            ledger.mint(party, sale, FUNDING);
        }

        let sink = Arc::new(RecordingSink::new());
        let clock = Arc::new(ManualClock::default());
        let engine = OfferEngine::new(EngineConfig::with_owner(owner), engine_ledger)
            .expect("valid config")
            .with_sink(Arc::clone(&sink) as _)
            .with_clock(Arc::clone(&clock) as _);

        Self {
            engine: Arc::new(engine),
            ledger,
            sink,
            clock,
            owner,
            seller,
            buyer,
            base,
            sale,
        }
    }

    pub fn terms(&self, sale_token: Option<TokenAddress>) -> OfferTerms {
        OfferTerms::dummy(self.base, sale_token)
    }

    /// Seller opens the default lot, naming the sale token and depositing it.
    pub fn create_funded(&self) -> OfferId {
        self.engine
            .create_offer(self.seller, &self.terms(Some(self.sale)))
            .expect("create offer")
    }

    /// Seller opens the default lot without naming the sale token.
    pub fn create_unnamed(&self) -> OfferId {
        self.engine
            .create_offer(self.seller, &self.terms(None))
            .expect("create offer")
    }

    /// Move the clock one second past the default deadline.
    pub fn expire(&self) {
        self.clock.advance_secs(DEADLINE_SECS + 1);
    }

    pub fn base_balance(&self, party: PartyId) -> Amount {
        self.ledger.balance(party, self.base)
    }

    pub fn sale_balance(&self, party: PartyId) -> Amount {
        self.ledger.balance(party, self.sale)
    }

    /// No supply was created or destroyed and the event log is intact.
    pub fn assert_conserved(&self) {
        self.ledger.verify_all_supply().expect("supply conserved");
        assert!(self.sink.verify(), "event log intact");
    }
}
