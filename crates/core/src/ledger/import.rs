//! Bulk import input records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, BookingId, Currency, Money};

use super::entry::NewEntry;

/// One line of a bulk import: becomes one booking with one entry.
///
/// Amounts are in the ledger's working currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// Entry text, also used as the booking text.
    pub text: String,
    /// Debit amount.
    #[serde(default)]
    pub debit: Option<Decimal>,
    /// Credit amount.
    #[serde(default)]
    pub credit: Option<Decimal>,
}

impl ImportRecord {
    /// Parses a JSON array of records.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the input is not an array of records.
    pub fn from_json(input: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Builds the entry input for `booking`, without validating its shape.
    #[must_use]
    pub fn to_entry(&self, account: AccountId, booking: BookingId, currency: Currency) -> NewEntry {
        NewEntry {
            account,
            booking,
            text: self.text.clone(),
            debit: self.debit.map(|amount| Money::new(amount, currency)),
            credit: self.credit.map(|amount| Money::new(amount, currency)),
            is_virtual: false,
        }
    }
}
