//! Keyed offer storage with per-offer locks.
//!
//! Each offer lives in its own `Mutex`, so operations on distinct ids never
//! contend. Locks are taken with `try_lock`: a call that finds its offer
//! already held (a ledger callback re-entering the engine, or a concurrent
//! caller) gets [`SwapError::OfferBusy`] and must resubmit.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, RwLock, TryLockError,
        atomic::{AtomicU64, Ordering},
    },
};

use otcswap_types::{AddressClaims, Offer, OfferId, Result, SwapError, constants};

/// An offer together with the address claims made about it.
#[derive(Debug, Clone)]
pub struct OfferSlot {
    pub offer: Offer,
    pub claims: AddressClaims,
}

/// Shared handle to one offer's slot.
pub type SlotHandle = Arc<Mutex<OfferSlot>>;

/// All offers, indexed by id, plus the monotonic id allocator.
pub struct OfferStore {
    next_id: AtomicU64,
    offers: RwLock<HashMap<OfferId, SlotHandle>>,
}

impl OfferStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(constants::FIRST_OFFER_ID),
            offers: RwLock::new(HashMap::new()),
        }
    }

    /// Hand out the next id. Ids are never reused.
    pub fn allocate_id(&self) -> OfferId {
        OfferId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Store a new slot under its offer's id.
    ///
    /// # Errors
    /// Returns [`SwapError::Internal`] if the id is already taken.
    pub fn insert(&self, slot: OfferSlot) -> Result<()> {
        let id = slot.offer.id;
        let mut offers = self
            .offers
            .write()
            .map_err(|_| SwapError::Internal("offer index poisoned".into()))?;
        if offers.contains_key(&id) {
            return Err(SwapError::Internal(format!("{id} already stored")));
        }
        offers.insert(id, Arc::new(Mutex::new(slot)));
        Ok(())
    }

    /// Look up the slot handle for an id.
    ///
    /// # Errors
    /// Returns [`SwapError::OfferNotFound`] for unknown ids.
    pub fn handle(&self, id: OfferId) -> Result<SlotHandle> {
        self.offers
            .read()
            .map_err(|_| SwapError::Internal("offer index poisoned".into()))?
            .get(&id)
            .cloned()
            .ok_or(SwapError::OfferNotFound(id))
    }

    /// Take the exclusive lock on a slot without blocking.
    ///
    /// # Errors
    /// Returns [`SwapError::OfferBusy`] if another call holds the lock, or
    /// [`SwapError::Internal`] if the slot was poisoned.
    pub fn try_lock(handle: &SlotHandle, id: OfferId) -> Result<MutexGuard<'_, OfferSlot>> {
        match handle.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => {
                tracing::warn!(offer = %id, "Offer busy: re-entrant or concurrent call rejected");
                Err(SwapError::OfferBusy(id))
            }
            // Only a panic during rollback itself leaves the lock poisoned;
            // the slot may then be half restored.
            Err(TryLockError::Poisoned(_)) => {
                tracing::error!(offer = %id, "Offer slot poisoned");
                Err(SwapError::Internal(format!("offer {id} slot poisoned")))
            }
        }
    }

    /// Copy of a slot's current contents.
    pub fn snapshot(&self, id: OfferId) -> Result<OfferSlot> {
        let handle = self.handle(id)?;
        let slot = Self::try_lock(&handle, id)?;
        Ok(slot.clone())
    }

    /// Number of offers ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offers.read().map_or(0, |offers| offers.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OfferStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use otcswap_types::{OfferTerms, PartyId, TokenAddress};

    use super::*;

    fn make_slot(store: &OfferStore) -> OfferSlot {
        let terms = OfferTerms::dummy(TokenAddress::random(), None);
        OfferSlot {
            offer: Offer::open(store.allocate_id(), PartyId::new(), &terms, 2_500, Utc::now()),
            claims: AddressClaims::default(),
        }
    }

    #[test]
    fn ids_are_monotonic_from_one() {
        let store = OfferStore::new();
        assert_eq!(store.allocate_id(), OfferId(1));
        assert_eq!(store.allocate_id(), OfferId(2));
        assert_eq!(store.allocate_id(), OfferId(3));
    }

    #[test]
    fn insert_and_snapshot() {
        let store = OfferStore::new();
        let slot = make_slot(&store);
        let id = slot.offer.id;
        store.insert(slot).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot(id).unwrap().offer.id, id);
    }

    #[test]
    fn duplicate_insert_rejected() {
        let store = OfferStore::new();
        let slot = make_slot(&store);
        store.insert(slot.clone()).unwrap();
        assert!(matches!(store.insert(slot), Err(SwapError::Internal(_))));
    }

    #[test]
    fn unknown_id_not_found() {
        let store = OfferStore::new();
        assert!(store.is_empty());
        let err = store.handle(OfferId(42)).unwrap_err();
        assert!(matches!(err, SwapError::OfferNotFound(OfferId(42))));
    }

    #[test]
    fn held_lock_reports_busy() {
        let store = OfferStore::new();
        let slot = make_slot(&store);
        let id = slot.offer.id;
        store.insert(slot).unwrap();

        let handle = store.handle(id).unwrap();
        let _held = OfferStore::try_lock(&handle, id).unwrap();
        let err = store.snapshot(id).unwrap_err();
        assert!(matches!(err, SwapError::OfferBusy(busy) if busy == id));
    }

    #[test]
    fn distinct_offers_lock_independently() {
        let store = OfferStore::new();
        let a = make_slot(&store);
        let b = make_slot(&store);
        let (ida, idb) = (a.offer.id, b.offer.id);
        store.insert(a).unwrap();
        store.insert(b).unwrap();

        let ha = store.handle(ida).unwrap();
        let _held = OfferStore::try_lock(&ha, ida).unwrap();
        assert!(store.snapshot(idb).is_ok());
    }

    #[test]
    fn poisoned_slot_is_internal_error() {
        let store = OfferStore::new();
        let slot = make_slot(&store);
        let id = slot.offer.id;
        store.insert(slot).unwrap();

        let handle = store.handle(id).unwrap();
        let poisoner = Arc::clone(&handle);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the slot");
        })
        .join();

        let err = OfferStore::try_lock(&handle, id).unwrap_err();
        assert_eq!(err.kind(), otcswap_types::ErrorKind::Internal);
    }
}
