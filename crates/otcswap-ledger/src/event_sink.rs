//! Notification sinks.
//!
//! The engine calls [`EventSink::emit`] once per committed transition, after
//! every ledger transfer of that transition has succeeded.

use std::sync::Mutex;

use otcswap_types::{EventRecord, Notification, OfferId};

/// Receives notifications for off-chain observers.
pub trait EventSink: Send + Sync {
    fn emit(&self, notification: Notification);
}

/// Writes every notification to the `tracing` log and keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, notification: Notification) {
        tracing::info!(offer = %notification.offer_id(), event = %notification, "Notification");
    }
}

/// Append-only in-memory audit log of [`EventRecord`]s.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<EventRecord>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EventRecord>> {
        self.records.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Snapshot of all records, in emission order.
    #[must_use]
    pub fn records(&self) -> Vec<EventRecord> {
        self.lock().clone()
    }

    /// Notifications only, in emission order.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().iter().map(|r| r.notification.clone()).collect()
    }

    /// Notifications concerning one offer.
    #[must_use]
    pub fn for_offer(&self, id: OfferId) -> Vec<Notification> {
        self.lock()
            .iter()
            .filter(|r| r.notification.offer_id() == id)
            .map(|r| r.notification.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// `true` if every record's hash matches its payload and sequence
    /// numbers are contiguous from zero.
    #[must_use]
    pub fn verify(&self) -> bool {
        self.lock()
            .iter()
            .enumerate()
            .all(|(i, r)| r.sequence == i as u64 && r.verify())
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, notification: Notification) {
        let mut records = self.lock();
        let sequence = records.len() as u64;
        match EventRecord::new(sequence, notification) {
            Ok(record) => {
                tracing::debug!(
                    sequence,
                    event = %record.notification,
                    hash = %record.hash_hex(),
                    "Notification recorded"
                );
                records.push(record);
            }
            Err(err) => tracing::error!(%err, "Failed to record notification"),
        }
    }
}

#[cfg(test)]
mod tests {
    use otcswap_types::{PartyId, TokenAddress};

    use super::*;

    #[test]
    fn recording_sink_appends_in_order() {
        let sink = RecordingSink::new();
        assert!(sink.is_empty());

        sink.emit(Notification::OfferCreated {
            id: OfferId(1),
            sale_token: None,
            base_token: TokenAddress::random(),
            amount: 1_000,
            total_value: 10_000,
        });
        sink.emit(Notification::OfferAccepted {
            id: OfferId(1),
            buyer: PartyId::new(),
        });
        sink.emit(Notification::OfferSettled { id: OfferId(2) });

        assert_eq!(sink.len(), 3);
        let records = sink.records();
        assert_eq!(records[0].sequence, 0);
        assert_eq!(records[2].sequence, 2);
        assert!(sink.verify());
        assert_eq!(sink.for_offer(OfferId(1)).len(), 2);
        assert_eq!(
            sink.for_offer(OfferId(2)),
            vec![Notification::OfferSettled { id: OfferId(2) }]
        );
    }

    #[test]
    fn tracing_sink_accepts_notifications() {
        TracingSink.emit(Notification::OfferCancelled { id: OfferId(3) });
    }
}
