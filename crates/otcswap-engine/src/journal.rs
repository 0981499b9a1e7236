//! Unit of work for one engine call.
//!
//! Every ledger transfer, fee accrual and notification a call produces goes
//! through its [`Journal`]. On success the notifications are released to the
//! sink; on failure the journal undoes what already happened, newest first:
//! credits are pulled back, debits are refunded, accruals are reversed and
//! the notifications are discarded.

use otcswap_ledger::{EventSink, TokenLedger};
use otcswap_types::{Amount, Notification, PartyId, Result, SwapError, TokenAddress};

use crate::{fee_ledger::FeeLedger, fees::Payout};

#[derive(Debug, Clone, Copy)]
enum Applied {
    Debit {
        token: TokenAddress,
        from: PartyId,
        received: Amount,
    },
    Credit {
        token: TokenAddress,
        to: PartyId,
        amount: Amount,
    },
    Fee {
        token: TokenAddress,
        amount: Amount,
    },
}

pub struct Journal<'a> {
    ledger: &'a dyn TokenLedger,
    fees: &'a FeeLedger,
    applied: Vec<Applied>,
    notifications: Vec<Notification>,
}

impl<'a> Journal<'a> {
    pub fn new(ledger: &'a dyn TokenLedger, fees: &'a FeeLedger) -> Self {
        Self {
            ledger,
            fees,
            applied: Vec::new(),
            notifications: Vec::new(),
        }
    }

    /// Pull tokens into custody and return the measured delta.
    ///
    /// # Errors
    /// - `LedgerTransferFailed` if the ledger rejects the debit
    /// - `ZeroDelta` if nothing arrived
    pub fn debit(&mut self, token: TokenAddress, from: PartyId, amount: Amount) -> Result<Amount> {
        let received = self
            .ledger
            .debit(token, from, amount)
            .map_err(|fault| fault.into_swap_error(token))?;
        if received > 0 {
            self.applied.push(Applied::Debit { token, from, received });
        }
        if received == 0 {
            return Err(SwapError::ZeroDelta { token });
        }
        if received < amount {
            tracing::debug!(
                token = %token,
                requested = %amount,
                received = %received,
                "Short debit delta"
            );
        }
        Ok(received)
    }

    /// Pay out of custody.
    pub fn credit(&mut self, token: TokenAddress, to: PartyId, amount: Amount) -> Result<()> {
        self.ledger
            .credit(token, to, amount)
            .map_err(|fault| fault.into_swap_error(token))?;
        self.applied.push(Applied::Credit { token, to, amount });
        Ok(())
    }

    /// Add to the fee ledger.
    pub fn accrue_fee(&mut self, token: TokenAddress, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.fees.accrue(token, amount)?;
        self.applied.push(Applied::Fee { token, amount });
        Ok(())
    }

    /// Accrue the payout's fee and make every credit.
    pub fn execute(&mut self, payout: &Payout) -> Result<()> {
        self.accrue_fee(payout.fee_token, payout.fee)?;
        for credit in &payout.credits {
            self.credit(credit.token, credit.to, credit.amount)?;
        }
        Ok(())
    }

    /// Queue a notification for release on commit.
    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    /// Release queued notifications.
    pub fn commit(self, sink: &dyn EventSink) {
        for notification in self.notifications {
            sink.emit(notification);
        }
    }

    /// Undo everything applied so far, newest first.
    ///
    /// Compensation is best effort: a compensating transfer that fails is
    /// logged and the remaining steps still run.
    pub fn rollback(self) {
        for step in self.applied.into_iter().rev() {
            let outcome = match step {
                Applied::Debit { token, from, received } => self
                    .ledger
                    .credit(token, from, received)
                    .map_err(|fault| fault.into_swap_error(token)),
                Applied::Credit { token, to, amount } => {
                    match self.ledger.debit(token, to, amount) {
                        Ok(back) if back < amount => {
                            tracing::warn!(
                                token = %token,
                                party = %to,
                                owed = %amount,
                                recovered = %back,
                                "Compensating debit came back short"
                            );
                            Ok(())
                        }
                        Ok(_) => Ok(()),
                        Err(fault) => Err(fault.into_swap_error(token)),
                    }
                }
                Applied::Fee { token, amount } => self.fees.reverse(token, amount),
            };
            if let Err(err) = outcome {
                tracing::error!(?step, %err, "Rollback step failed");
            }
        }
    }
}
