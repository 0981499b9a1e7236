//! Identifiers used throughout OTCSwap.
//!
//! Offers are numbered by a monotonic counter, parties carry UUIDv7
//! identities, and tokens are identified by their 20-byte contract address.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::{SwapError, constants::TOKEN_ADDRESS_LEN};

// ---------------------------------------------------------------------------
// OfferId
// ---------------------------------------------------------------------------

/// Monotonically increasing offer identifier. Never reused, even after the
/// offer reaches a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OfferId(pub u64);

impl OfferId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offer:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PartyId
// ---------------------------------------------------------------------------

/// Identity of a seller, buyer, or the fee owner.
///
/// The nil UUID is the null identity and is rejected wherever a real party
/// is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PartyId(pub Uuid);

impl PartyId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The null identity.
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for PartyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TokenAddress
// ---------------------------------------------------------------------------

/// Contract address of a token. Displayed and serialized as `0x`-prefixed hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct TokenAddress(pub [u8; TOKEN_ADDRESS_LEN]);

impl TokenAddress {
    /// The null address.
    pub const ZERO: Self = Self([0u8; TOKEN_ADDRESS_LEN]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; TOKEN_ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; TOKEN_ADDRESS_LEN] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; TOKEN_ADDRESS_LEN]
    }

    /// First four bytes as hex, for compact log fields.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenAddress({self})")
    }
}

impl FromStr for TokenAddress {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes =
            hex::decode(digits).map_err(|e| SwapError::InvalidAddress(format!("{s}: {e}")))?;
        let bytes: [u8; TOKEN_ADDRESS_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            SwapError::InvalidAddress(format!(
                "{s}: expected {TOKEN_ADDRESS_LEN} bytes, got {}",
                v.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for TokenAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TokenAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Random addresses for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl TokenAddress {
    pub fn random() -> Self {
        let mut bytes = [0u8; TOKEN_ADDRESS_LEN];
        while bytes == [0u8; TOKEN_ADDRESS_LEN] {
            bytes = rand::random();
        }
        Self(bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offer_id_next() {
        assert_eq!(OfferId(5).next(), OfferId(6));
        assert_eq!(format!("{}", OfferId(7)), "offer:7");
    }

    #[test]
    fn party_id_uniqueness_and_nil() {
        let a = PartyId::new();
        let b = PartyId::new();
        assert_ne!(a, b);
        assert!(!a.is_nil());
        assert!(PartyId::nil().is_nil());
    }

    #[test]
    fn token_address_parse_and_display() {
        let text = "0x00112233445566778899aabbccddeeff00112233";
        let addr: TokenAddress = text.parse().unwrap();
        assert_eq!(addr.to_string(), text);
        assert_eq!(addr.short(), "00112233");

        let bare: TokenAddress = "00112233445566778899aabbccddeeff00112233".parse().unwrap();
        assert_eq!(addr, bare);
    }

    #[test]
    fn token_address_rejects_bad_input() {
        let err = "0x1234".parse::<TokenAddress>().unwrap_err();
        assert!(matches!(err, SwapError::InvalidAddress(_)));
        let err = "0xzz".parse::<TokenAddress>().unwrap_err();
        assert!(matches!(err, SwapError::InvalidAddress(_)));
    }

    #[test]
    fn token_address_zero() {
        assert!(TokenAddress::ZERO.is_zero());
        assert!(!TokenAddress::random().is_zero());
    }

    #[test]
    fn token_address_serializes_as_hex_string() {
        let addr = TokenAddress::from_bytes([0xab; TOKEN_ADDRESS_LEN]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let back: TokenAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }
}
