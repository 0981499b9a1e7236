//! Mutual-claim reconciliation of the sale-token address.
//!
//! Each party may assert the sale-token address once. The seller's claim is
//! adopted tentatively while the buyer has not spoken, so the seller can
//! deposit before a buyer appears. Only two matching claims mark the address
//! verified; two differing claims flag the offer as disputed for good.

use otcswap_types::{AddressClaims, Offer, Result, SwapError, TokenAddress};

/// Which side of the offer is making a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimRole {
    Seller,
    Buyer,
}

/// What a claim did to the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Stored; the offer's address is unchanged.
    Recorded,
    /// The seller's claim was written to `sale_token`, unverified.
    Tentative(TokenAddress),
    /// Both claims agree; `sale_token` is verified.
    Verified(TokenAddress),
    /// The claims disagree; the offer is flagged.
    Disputed,
}

impl ClaimOutcome {
    /// The address written to `sale_token`, if any.
    #[must_use]
    pub fn written(self) -> Option<TokenAddress> {
        match self {
            Self::Tentative(addr) | Self::Verified(addr) => Some(addr),
            Self::Recorded | Self::Disputed => None,
        }
    }
}

/// Record `role`'s claim and reconcile it against the counterparty's.
///
/// Authorization and timing are the caller's concern; this only enforces
/// the once-per-party rule and the address rules.
///
/// # Errors
/// - `InvalidAddress` for the null address or the base token
/// - `ClaimAlreadySubmitted` if `role` has already claimed
pub fn submit(
    offer: &mut Offer,
    claims: &mut AddressClaims,
    role: ClaimRole,
    address: TokenAddress,
) -> Result<ClaimOutcome> {
    if address.is_zero() {
        return Err(SwapError::InvalidAddress("null sale-token address".into()));
    }
    if address == offer.base_token {
        return Err(SwapError::InvalidAddress(format!(
            "{address} is the base token of {}",
            offer.id
        )));
    }

    let slot = match role {
        ClaimRole::Seller => &mut claims.seller,
        ClaimRole::Buyer => &mut claims.buyer,
    };
    if slot.is_some() {
        let party = match role {
            ClaimRole::Seller => offer.seller,
            ClaimRole::Buyer => offer.buyer.ok_or(SwapError::NullParty)?,
        };
        return Err(SwapError::ClaimAlreadySubmitted {
            offer: offer.id,
            party,
        });
    }
    *slot = Some(address);

    let outcome = match (claims.agreement(), role) {
        (Some(true), _) => {
            offer.sale_token = Some(address);
            offer.sale_token_verified = true;
            ClaimOutcome::Verified(address)
        }
        (Some(false), _) => {
            offer.disputed = true;
            offer.sale_token_verified = false;
            tracing::warn!(
                offer = %offer.id,
                seller_claim = ?claims.seller,
                buyer_claim = ?claims.buyer,
                "Conflicting sale-token claims, offer disputed"
            );
            ClaimOutcome::Disputed
        }
        (None, ClaimRole::Seller) => {
            offer.sale_token = Some(address);
            ClaimOutcome::Tentative(address)
        }
        (None, ClaimRole::Buyer) => ClaimOutcome::Recorded,
    };
    tracing::debug!(offer = %offer.id, ?role, ?outcome, "Address claim reconciled");
    Ok(outcome)
}
