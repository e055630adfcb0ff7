//! Invariant checks applied before any booking or entry write is persisted.
//!
//! These are pure functions over already-loaded records. The service runs
//! them inside the store transaction that performs the write, so the values
//! they inspect are the persisted ones.

use tally_shared::types::{BookingId, Currency, Money, MoneyError};

use super::booking::{Booking, BookingTotals};
use super::error::{LedgerError, LedgerResult};

/// What a booking write amounts to, given persisted and proposed `done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingWrite {
    /// Ordinary edit of an open booking.
    Edit,
    /// The irreversible open → closed transition.
    Close,
}

/// Checks that exactly one of debit/credit is populated.
pub fn check_entry_shape(debit: Option<&Money>, credit: Option<&Money>) -> LedgerResult<()> {
    match (debit.is_some(), credit.is_some()) {
        (true, false) | (false, true) => Ok(()),
        (debit_set, credit_set) => Err(LedgerError::malformed(debit_set, credit_set)),
    }
}

/// Checks that the populated amount is in the ledger's working currency.
pub fn check_entry_currency(
    debit: Option<&Money>,
    credit: Option<&Money>,
    currency: Currency,
) -> LedgerResult<()> {
    match debit.or(credit) {
        Some(money) if money.currency != currency => Err(MoneyError::CurrencyMismatch {
            expected: currency,
            found: money.currency,
        }
        .into()),
        _ => Ok(()),
    }
}

/// Checks that a booking still accepts entry writes.
pub fn check_booking_open(booking: &Booking) -> LedgerResult<()> {
    if booking.done {
        return Err(LedgerError::ClosedBooking(booking.id));
    }
    Ok(())
}

/// Applies the booking transition table.
///
/// | persisted | proposed | result |
/// |---|---|---|
/// | open | open | `Edit` |
/// | open | closed | `Close` (caller must still check balance) |
/// | closed | closed | `ClosedBooking` |
/// | closed | open | `ClosedBooking` |
pub fn classify_booking_write(
    id: BookingId,
    persisted_done: bool,
    proposed_done: bool,
) -> LedgerResult<BookingWrite> {
    match (persisted_done, proposed_done) {
        (false, false) => Ok(BookingWrite::Edit),
        (false, true) => Ok(BookingWrite::Close),
        (true, _) => Err(LedgerError::ClosedBooking(id)),
    }
}

/// Checks that a booking's non-virtual sums match.
pub fn check_balanced(totals: &BookingTotals) -> LedgerResult<()> {
    if totals.is_balanced() {
        return Ok(());
    }
    Err(LedgerError::Unbalanced {
        debit: totals.debit.amount,
        credit: totals.credit.amount,
    })
}
