//! Property-based tests for the write-path invariants.
//!
//! - An entry is accepted iff exactly one of debit/credit is set.
//! - A closed booking rejects every write.
//! - Closing is allowed iff non-virtual debit and credit sums match.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{BookingId, Currency, Money};

use super::aggregation::booking_totals;
use super::entry::EntrySide;
use super::error::LedgerError;
use super::test_support::Fixture;
use super::validation::{BookingWrite, check_balanced, check_entry_shape, classify_booking_write};

/// Strategy to generate a positive amount with two decimal places.
fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn money() -> impl Strategy<Value = Money> {
    amount().prop_map(|amount| Money::new(amount, Currency::Eur))
}

fn side() -> impl Strategy<Value = EntrySide> {
    prop_oneof![Just(EntrySide::Debit), Just(EntrySide::Credit)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// `(debit is set) XOR (credit is set)` is exactly the accepted shape.
    #[test]
    fn prop_entry_shape_is_xor(
        debit in proptest::option::of(money()),
        credit in proptest::option::of(money()),
    ) {
        let result = check_entry_shape(debit.as_ref(), credit.as_ref());
        prop_assert_eq!(result.is_ok(), debit.is_some() != credit.is_some());
        if let Err(err) = result {
            let is_malformed = matches!(err, LedgerError::MalformedEntry { .. });
            prop_assert!(is_malformed);
        }
    }

    /// Once persisted as done, no proposed value is accepted.
    #[test]
    fn prop_closed_booking_rejects_every_write(proposed in any::<bool>()) {
        let id = BookingId::new();
        let result = classify_booking_write(id, true, proposed);
        let is_closed = matches!(result, Err(LedgerError::ClosedBooking(b)) if b == id);
        prop_assert!(is_closed);
    }

    /// An open booking can always be edited while staying open.
    #[test]
    fn prop_open_booking_edit_allowed(_seed in 0u8..8) {
        let result = classify_booking_write(BookingId::new(), false, false);
        prop_assert_eq!(result.unwrap(), BookingWrite::Edit);
    }

    /// Closing passes the balance check iff non-virtual sums match.
    #[test]
    fn prop_close_requires_balanced_non_virtual_sums(
        lines in prop::collection::vec((side(), amount(), any::<bool>()), 0..12),
    ) {
        let mut fx = Fixture::default();
        let parent = fx.parent("P", None);
        let account = fx.account("A", parent, false);
        let booking = fx.booking();

        let mut debit = Decimal::ZERO;
        let mut credit = Decimal::ZERO;
        for (side, amount, is_virtual) in &lines {
            fx.post_to(booking, account, *side, *amount, *is_virtual);
            if !is_virtual {
                match side {
                    EntrySide::Debit => debit += amount,
                    EntrySide::Credit => credit += amount,
                }
            }
        }

        let totals = booking_totals(&fx, booking, Currency::Eur).unwrap();
        prop_assert_eq!(totals.debit.amount, debit);
        prop_assert_eq!(totals.credit.amount, credit);
        prop_assert_eq!(check_balanced(&totals).is_ok(), debit == credit);
    }

    /// Mirrored lines always balance, whatever virtual noise is added.
    #[test]
    fn prop_mirrored_lines_balance(
        amounts in prop::collection::vec(amount(), 1..8),
        noise in prop::collection::vec((side(), amount()), 0..5),
    ) {
        let mut fx = Fixture::default();
        let parent = fx.parent("P", None);
        let left = fx.account("Left", parent, false);
        let right = fx.account("Right", parent, false);
        let booking = fx.booking();

        for amount in &amounts {
            fx.post_to(booking, left, EntrySide::Debit, *amount, false);
            fx.post_to(booking, right, EntrySide::Credit, *amount, false);
        }
        for (side, amount) in &noise {
            fx.post_to(booking, left, *side, *amount, true);
        }

        let totals = booking_totals(&fx, booking, Currency::Eur).unwrap();
        prop_assert!(check_balanced(&totals).is_ok());
    }
}
