//! Deadline gating and the sticky expiry latch.

mod common;

use common::{DEADLINE_SECS, Harness};
use otcswap_types::{ErrorKind, SwapError, TokenAddress};

#[test]
fn deadline_is_exclusive_and_sticky() {
    let h = Harness::new();
    let id = h.create_unnamed();
    assert!(!h.engine.has_deadline_passed(id).unwrap());

    h.clock.advance_secs(DEADLINE_SECS);
    assert!(!h.engine.has_deadline_passed(id).unwrap());

    h.clock.advance_secs(1);
    assert!(h.engine.has_deadline_passed(id).unwrap());

    // Winding the clock back does not revive the offer.
    h.clock.advance_secs(-10 * DEADLINE_SECS);
    assert!(h.engine.has_deadline_passed(id).unwrap());
    let err = h.engine.accept_offer(id, h.buyer, false).unwrap_err();
    assert!(matches!(err, SwapError::DeadlinePassed(_)));
}

#[test]
fn latch_survives_a_failed_operation() {
    let h = Harness::new();
    let id = h.create_funded();
    h.expire();

    // Observed by a call that aborts.
    assert_eq!(h.engine.accept_offer(id, h.buyer, false).unwrap_err().kind(), ErrorKind::Timing);
    h.clock.advance_secs(-2 * DEADLINE_SECS);

    assert!(h.engine.offer(id).unwrap().deadline_observed);
    h.engine.cancel_offer(id, h.seller).unwrap();
}

#[test]
fn forward_transitions_stop_at_the_deadline() {
    let h = Harness::new();
    let unnamed = h.create_unnamed();
    let matched = h.create_funded();
    h.engine.accept_offer(matched, h.buyer, false).unwrap();
    h.expire();

    let errors = [
        h.engine.accept_offer(unnamed, h.buyer, false).unwrap_err(),
        h.engine.submit_claim(unnamed, h.seller, h.sale).unwrap_err(),
        h.engine.submit_claim(matched, h.buyer, TokenAddress::random()).unwrap_err(),
        h.engine.settle_offer(matched, h.buyer).unwrap_err(),
    ];
    for err in errors {
        assert!(matches!(err, SwapError::DeadlinePassed(_)), "{err}");
    }

    let err = h.engine.deposit_tokens(unnamed, h.seller).unwrap_err();
    assert!(matches!(err, SwapError::DeadlinePassed(_)));
}

#[test]
fn expiry_exits_wait_for_the_deadline() {
    let h = Harness::new();
    let open = h.create_funded();
    let matched = h.create_funded();
    h.engine.accept_offer(matched, h.buyer, false).unwrap();

    h.clock.advance_secs(DEADLINE_SECS);
    assert!(matches!(
        h.engine.cancel_offer(open, h.seller),
        Err(SwapError::DeadlineNotReached(_))
    ));
    assert!(matches!(
        h.engine.back_out(matched, h.buyer),
        Err(SwapError::DeadlineNotReached(_))
    ));
    assert!(matches!(
        h.engine.back_out(open, h.seller),
        Err(SwapError::OfferStillOpen(_))
    ));

    h.clock.advance_secs(1);
    h.engine.cancel_offer(open, h.seller).unwrap();
    h.engine.back_out(matched, h.buyer).unwrap();
    h.assert_conserved();
}
