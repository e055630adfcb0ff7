//! Booking aggregate: a group of entries that is closed once balanced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{BookingId, DocumentId, Money};

/// Lifecycle state of a booking.
///
/// `Open` is initial, `Closed` is terminal. The only transition is
/// `Open → Closed`, gated on balanced entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingState {
    /// Entries may be added, changed and removed.
    Open,
    /// Frozen; no further writes are accepted.
    Closed,
}

impl BookingState {
    /// Maps the persisted `done` flag to a state.
    #[must_use]
    pub const fn from_done(done: bool) -> Self {
        if done { Self::Closed } else { Self::Open }
    }

    /// Returns true for the terminal state.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl std::fmt::Display for BookingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// A booking groups one or more entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier.
    pub id: BookingId,
    /// Free description of the booking.
    pub text: String,
    /// Optional supporting document.
    pub document: Option<DocumentId>,
    /// Whether the booking has been closed.
    pub done: bool,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
    /// When the booking was last written.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a new open booking.
    #[must_use]
    pub fn new(text: impl Into<String>, document: Option<DocumentId>) -> Self {
        let now = Utc::now();
        Self {
            id: BookingId::new(),
            text: text.into(),
            document,
            done: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> BookingState {
        BookingState::from_done(self.done)
    }
}

/// Non-virtual entry sums of one booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingTotals {
    /// Sum of debit amounts.
    pub debit: Money,
    /// Sum of credit amounts.
    pub credit: Money,
}

impl BookingTotals {
    /// Returns true when debit and credit sums match.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }
}
