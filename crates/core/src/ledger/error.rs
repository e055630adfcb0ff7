//! Ledger error types for validation, state and storage errors.
//!
//! Every failure here reflects either a programming error, a data-integrity
//! violation or an unavailable store. Nothing is retried inside the core;
//! callers decide.

use rust_decimal::Decimal;
use tally_shared::types::{AccountId, BookingId, EntryId, MoneyError, ParentId};
use thiserror::Error;

/// Result type alias using `LedgerError`.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Invariant Errors ==========
    /// Entry has zero or two of {debit, credit} populated.
    #[error("Entry must specify exactly one of debit or credit (debit set: {debit_set}, credit set: {credit_set})")]
    MalformedEntry {
        /// Whether a debit amount was given.
        debit_set: bool,
        /// Whether a credit amount was given.
        credit_set: bool,
    },

    /// Write attempted against a closed booking or one of its entries.
    #[error("Booking {0} is done and can not be edited anymore")]
    ClosedBooking(BookingId),

    /// Closing attempted while the non-virtual entry sums differ.
    #[error("Entry sums do not match up. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Sum of non-virtual debit amounts.
        debit: Decimal,
        /// Sum of non-virtual credit amounts.
        credit: Decimal,
    },

    /// The parent graph contains a cycle through this node.
    #[error("Cycle detected in parent tree at {0}")]
    CycleDetected(ParentId),

    /// Amounts in different currencies met, or a sum left `Decimal` range.
    #[error(transparent)]
    Money(#[from] MoneyError),

    // ========== Referential Errors ==========
    /// Parent not found.
    #[error("Parent not found: {0}")]
    ParentNotFound(ParentId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Booking not found.
    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    /// Entry not found.
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    // ========== Constraint Errors ==========
    /// An account with this name already exists under the same parent.
    #[error("Account '{name}' already exists under parent {}", parent.map_or_else(|| "<none>".to_string(), |p| p.to_string()))]
    DuplicateAccount {
        /// The conflicting name.
        name: String,
        /// The shared parent.
        parent: Option<ParentId>,
    },

    /// Parent is still referenced by accounts or child parents.
    #[error("Cannot delete parent {0}: it is still referenced")]
    ParentInUse(ParentId),

    /// Account is still referenced by entries.
    #[error("Cannot delete account {0}: it has entries")]
    AccountHasEntries(AccountId),

    /// Booking still owns entries.
    #[error("Cannot delete booking {0}: it has entries")]
    BookingHasEntries(BookingId),

    // ========== Storage Errors ==========
    /// Underlying persistence failure (timeout, poisoned lock, unmapped constraint).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl LedgerError {
    /// Builds a `MalformedEntry` error from the presence of both sides.
    #[must_use]
    pub const fn malformed(debit_set: bool, credit_set: bool) -> Self {
        Self::MalformedEntry {
            debit_set,
            credit_set,
        }
    }

    /// Returns the stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedEntry { .. } => "MALFORMED_ENTRY",
            Self::ClosedBooking(_) => "CLOSED_BOOKING",
            Self::Unbalanced { .. } => "UNBALANCED_BOOKING",
            Self::CycleDetected(_) => "CYCLE_DETECTED",
            Self::Money(MoneyError::CurrencyMismatch { .. }) => "CURRENCY_MISMATCH",
            Self::Money(MoneyError::Overflow { .. }) => "AMOUNT_OVERFLOW",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::DuplicateAccount { .. } => "DUPLICATE_ACCOUNT",
            Self::ParentInUse(_) => "PARENT_IN_USE",
            Self::AccountHasEntries(_) => "ACCOUNT_HAS_ENTRIES",
            Self::BookingHasEntries(_) => "BOOKING_HAS_ENTRIES",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Returns true if a caller may reasonably retry the operation.
    ///
    /// Only store failures qualify; every other error is permanent for the
    /// given input.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_shared::types::Currency;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::malformed(true, true).error_code(), "MALFORMED_ENTRY");
        assert_eq!(
            LedgerError::ClosedBooking(BookingId::new()).error_code(),
            "CLOSED_BOOKING"
        );
        assert_eq!(
            LedgerError::Unbalanced {
                debit: dec!(100),
                credit: dec!(0),
            }
            .error_code(),
            "UNBALANCED_BOOKING"
        );
        assert_eq!(
            LedgerError::CycleDetected(ParentId::new()).error_code(),
            "CYCLE_DETECTED"
        );
        assert_eq!(
            LedgerError::StoreUnavailable("timeout".into()).error_code(),
            "STORE_UNAVAILABLE"
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::StoreUnavailable("lock timeout".into()).is_retryable());
        assert!(!LedgerError::ClosedBooking(BookingId::new()).is_retryable());
        assert!(!LedgerError::malformed(false, false).is_retryable());
        assert!(!LedgerError::CycleDetected(ParentId::new()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Unbalanced {
            debit: dec!(100.00),
            credit: dec!(50.00),
        };
        assert_eq!(
            err.to_string(),
            "Entry sums do not match up. Debit: 100.00, Credit: 50.00"
        );

        let err = LedgerError::DuplicateAccount {
            name: "Bank".into(),
            parent: None,
        };
        assert_eq!(err.to_string(), "Account 'Bank' already exists under parent <none>");

        let err: LedgerError = MoneyError::CurrencyMismatch {
            expected: Currency::Eur,
            found: Currency::Usd,
        }
        .into();
        assert_eq!(err.to_string(), "Currency mismatch: expected EUR, found USD");
        assert_eq!(err.error_code(), "CURRENCY_MISMATCH");

        let err: LedgerError = MoneyError::Overflow {
            left: Decimal::MAX,
            right: dec!(1),
        }
        .into();
        assert_eq!(err.error_code(), "AMOUNT_OVERFLOW");
        assert!(!err.is_retryable());
    }
}
