//! Entry domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, BookingId, EntryId, Money};

/// Side of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    /// Debit column.
    Debit,
    /// Credit column.
    Credit,
}

impl EntrySide {
    /// Column name as used by the sum query.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl std::fmt::Display for EntrySide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single debit or credit line against one account within one booking.
///
/// Exactly one of `debit`/`credit` is set on every persisted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier.
    pub id: EntryId,
    /// Account the entry posts against.
    pub account: AccountId,
    /// Owning booking.
    pub booking: BookingId,
    /// Booking text for this line.
    pub text: String,
    /// Debit amount.
    pub debit: Option<Money>,
    /// Credit amount.
    pub credit: Option<Money>,
    /// Virtual entries never contribute to any total.
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the entry was last written.
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Returns the populated side and its amount, if the entry is well-formed.
    #[must_use]
    pub fn side(&self) -> Option<(EntrySide, Money)> {
        match (self.debit, self.credit) {
            (Some(amount), None) => Some((EntrySide::Debit, amount)),
            (None, Some(amount)) => Some((EntrySide::Credit, amount)),
            _ => None,
        }
    }

    /// Amount in the given column, if populated.
    #[must_use]
    pub fn amount(&self, side: EntrySide) -> Option<Money> {
        match side {
            EntrySide::Debit => self.debit,
            EntrySide::Credit => self.credit,
        }
    }
}

/// Input for creating an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    /// Account to post against.
    pub account: AccountId,
    /// Booking to attach to.
    pub booking: BookingId,
    /// Line text.
    #[serde(default)]
    pub text: String,
    /// Debit amount.
    #[serde(default)]
    pub debit: Option<Money>,
    /// Credit amount.
    #[serde(default)]
    pub credit: Option<Money>,
    /// Whether the entry is virtual.
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
}

impl NewEntry {
    /// Debit line.
    #[must_use]
    pub fn debit(
        account: AccountId,
        booking: BookingId,
        text: impl Into<String>,
        amount: Money,
    ) -> Self {
        Self {
            account,
            booking,
            text: text.into(),
            debit: Some(amount),
            credit: None,
            is_virtual: false,
        }
    }

    /// Credit line.
    #[must_use]
    pub fn credit(
        account: AccountId,
        booking: BookingId,
        text: impl Into<String>,
        amount: Money,
    ) -> Self {
        Self {
            account,
            booking,
            text: text.into(),
            debit: None,
            credit: Some(amount),
            is_virtual: false,
        }
    }

    /// Marks the line as virtual.
    #[must_use]
    pub fn into_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Materializes the input into a new entry record.
    #[must_use]
    pub fn into_entry(self) -> Entry {
        let now = Utc::now();
        Entry {
            id: EntryId::new(),
            account: self.account,
            booking: self.booking,
            text: self.text,
            debit: self.debit,
            credit: self.credit,
            is_virtual: self.is_virtual,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_shared::types::Currency;

    fn eur(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::Eur)
    }

    #[test]
    fn test_side_of_debit_entry() {
        let entry = NewEntry::debit(AccountId::new(), BookingId::new(), "Rent", eur(dec!(100)))
            .into_entry();
        assert_eq!(entry.side(), Some((EntrySide::Debit, eur(dec!(100)))));
        assert_eq!(entry.amount(EntrySide::Credit), None);
    }

    #[test]
    fn test_side_of_malformed_entry() {
        let mut entry =
            NewEntry::credit(AccountId::new(), BookingId::new(), "Rent", eur(dec!(10)))
                .into_entry();
        entry.debit = Some(eur(dec!(10)));
        assert_eq!(entry.side(), None);

        entry.debit = None;
        entry.credit = None;
        assert_eq!(entry.side(), None);
    }

    #[test]
    fn test_into_virtual() {
        let input = NewEntry::debit(AccountId::new(), BookingId::new(), "", eur(dec!(1)))
            .into_virtual();
        assert!(input.is_virtual);
        assert!(input.into_entry().is_virtual);
    }

    #[test]
    fn test_new_entry_deserializes_with_defaults() {
        let account = AccountId::new();
        let booking = BookingId::new();
        let json = format!(
            r#"{{"account":"{account}","booking":"{booking}","credit":{{"amount":"12.50","currency":"EUR"}}}}"#
        );
        let input: NewEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(input.credit, Some(eur(dec!(12.50))));
        assert_eq!(input.debit, None);
        assert!(!input.is_virtual);
        assert!(input.text.is_empty());
    }
}
