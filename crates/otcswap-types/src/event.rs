//! Notifications emitted for off-chain observers.
//!
//! Every committed transition produces exactly one [`Notification`]. Sinks
//! that keep an audit trail wrap them in an [`EventRecord`] carrying a
//! SHA-256 hash of the canonical JSON payload, so an indexer can check that
//! the log it replays is the log the engine produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Amount, OfferId, PartyId, Result, TokenAddress};

/// A committed state change, as seen from outside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    OfferCreated {
        id: OfferId,
        sale_token: Option<TokenAddress>,
        base_token: TokenAddress,
        amount: Amount,
        total_value: Amount,
    },
    OfferAccepted {
        id: OfferId,
        buyer: PartyId,
    },
    OfferSettled {
        id: OfferId,
    },
    OfferCancelled {
        id: OfferId,
    },
    TokenAddressUpdated {
        id: OfferId,
        address: TokenAddress,
    },
    OfferBackedOut {
        id: OfferId,
    },
}

impl Notification {
    /// The offer this notification concerns.
    #[must_use]
    pub fn offer_id(&self) -> OfferId {
        match self {
            Self::OfferCreated { id, .. }
            | Self::OfferAccepted { id, .. }
            | Self::OfferSettled { id }
            | Self::OfferCancelled { id }
            | Self::TokenAddressUpdated { id, .. }
            | Self::OfferBackedOut { id } => *id,
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::OfferCreated { .. } => "OFFER_CREATED",
            Self::OfferAccepted { .. } => "OFFER_ACCEPTED",
            Self::OfferSettled { .. } => "OFFER_SETTLED",
            Self::OfferCancelled { .. } => "OFFER_CANCELLED",
            Self::TokenAddressUpdated { .. } => "TOKEN_ADDRESS_UPDATED",
            Self::OfferBackedOut { .. } => "OFFER_BACKED_OUT",
        };
        write!(f, "{name}[{}]", self.offer_id())
    }
}

/// An entry in the notification audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at zero.
    pub sequence: u64,
    pub notification: Notification,
    /// SHA-256 of the canonical JSON encoding of `notification`.
    pub payload_hash: [u8; 32],
    pub recorded_at: DateTime<Utc>,
}

impl EventRecord {
    /// Wrap a notification, hashing its payload.
    ///
    /// # Errors
    /// Returns [`crate::SwapError::Serialization`] if the payload cannot be encoded.
    pub fn new(sequence: u64, notification: Notification) -> Result<Self> {
        let payload_hash = Self::hash_payload(&notification)?;
        Ok(Self {
            sequence,
            notification,
            payload_hash,
            recorded_at: Utc::now(),
        })
    }

    fn hash_payload(notification: &Notification) -> Result<[u8; 32]> {
        let payload = serde_json::to_vec(notification)?;
        Ok(Sha256::digest(&payload).into())
    }

    /// Recompute the payload hash and compare.
    #[must_use]
    pub fn verify(&self) -> bool {
        Self::hash_payload(&self.notification).is_ok_and(|h| h == self.payload_hash)
    }

    /// Payload hash as lowercase hex.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.payload_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_display() {
        let n = Notification::OfferSettled { id: OfferId(4) };
        assert_eq!(format!("{n}"), "OFFER_SETTLED[offer:4]");
    }

    #[test]
    fn notification_offer_id() {
        let n = Notification::TokenAddressUpdated {
            id: OfferId(9),
            address: TokenAddress::random(),
        };
        assert_eq!(n.offer_id(), OfferId(9));
    }

    #[test]
    fn record_hash_verifies() {
        let n = Notification::OfferAccepted {
            id: OfferId(1),
            buyer: PartyId::new(),
        };
        let mut rec = EventRecord::new(0, n).unwrap();
        assert!(rec.verify());
        assert_eq!(rec.hash_hex().len(), 64);

        rec.notification = Notification::OfferSettled { id: OfferId(1) };
        assert!(!rec.verify(), "tampered payload must fail verification");
    }

    #[test]
    fn notification_json_names_variant() {
        let n = Notification::OfferBackedOut { id: OfferId(2) };
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("OfferBackedOut"), "{json}");
        let back: Notification = serde_json::from_str(&json).unwrap();
        assert_eq!(n, back);
    }
}
