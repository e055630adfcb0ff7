//! Storage collaborator traits.
//!
//! The core never talks to a database directly. A store crate implements
//! these traits; the service runs all of its writes through
//! [`LedgerRepository::transaction`] and all of its reads through
//! [`LedgerRepository::snapshot`].

use tally_shared::types::{AccountId, BookingId, EntryId, Money, ParentId};

use super::booking::Booking;
use super::entry::{Entry, EntrySide};
use super::error::LedgerResult;
use super::tree::{Account, Parent};

/// Which entries a sum query covers. Virtual entries are always excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SumScope {
    /// Entries posted against one account.
    Account(AccountId),
    /// Entries owned by one booking.
    Booking(BookingId),
}

/// Read access to persisted ledger records.
pub trait LedgerRead {
    /// Find a parent by ID.
    fn find_parent(&self, id: ParentId) -> LedgerResult<Option<Parent>>;

    /// All parents whose `parent` reference is `id`.
    fn child_parents(&self, id: ParentId) -> LedgerResult<Vec<Parent>>;

    /// All parents without a `parent` reference, in no particular order.
    fn root_parents(&self) -> LedgerResult<Vec<Parent>>;

    /// All parents, in no particular order.
    fn all_parents(&self) -> LedgerResult<Vec<Parent>>;

    /// Find an account by ID.
    fn find_account(&self, id: AccountId) -> LedgerResult<Option<Account>>;

    /// Accounts attached directly to `parent`.
    fn accounts_of(&self, parent: ParentId) -> LedgerResult<Vec<Account>>;

    /// Find a booking by ID.
    fn find_booking(&self, id: BookingId) -> LedgerResult<Option<Booking>>;

    /// All bookings, in no particular order.
    fn all_bookings(&self) -> LedgerResult<Vec<Booking>>;

    /// Find an entry by ID.
    fn find_entry(&self, id: EntryId) -> LedgerResult<Option<Entry>>;

    /// Entries owned by a booking, in creation order.
    fn entries_of_booking(&self, booking: BookingId) -> LedgerResult<Vec<Entry>>;

    /// `SUM(side) WHERE scope AND virtual = false`, one amount per currency.
    ///
    /// Returns an empty vector when no entry matches.
    fn sum_entries(&self, scope: SumScope, side: EntrySide) -> LedgerResult<Vec<Money>>;
}

/// Write access inside one store transaction.
///
/// Implementations enforce the storage-level constraints: unique
/// `(account.name, account.parent)`, and protect-on-delete for
/// parent ← account, parent ← child parent, account ← entry and
/// booking ← entry.
pub trait LedgerTx: LedgerRead {
    /// Insert a new parent.
    fn insert_parent(&mut self, parent: Parent) -> LedgerResult<()>;

    /// Overwrite an existing parent.
    fn update_parent(&mut self, parent: Parent) -> LedgerResult<()>;

    /// Delete a parent; fails with `ParentInUse` while referenced.
    fn delete_parent(&mut self, id: ParentId) -> LedgerResult<()>;

    /// Insert a new account; fails with `DuplicateAccount` on a name clash.
    fn insert_account(&mut self, account: Account) -> LedgerResult<()>;

    /// Overwrite an existing account; fails with `DuplicateAccount` on a name clash.
    fn update_account(&mut self, account: Account) -> LedgerResult<()>;

    /// Delete an account; fails with `AccountHasEntries` while referenced.
    fn delete_account(&mut self, id: AccountId) -> LedgerResult<()>;

    /// Insert a new booking.
    fn insert_booking(&mut self, booking: Booking) -> LedgerResult<()>;

    /// Overwrite an existing booking.
    fn update_booking(&mut self, booking: Booking) -> LedgerResult<()>;

    /// Delete a booking; fails with `BookingHasEntries` while it owns entries.
    fn delete_booking(&mut self, id: BookingId) -> LedgerResult<()>;

    /// Insert a new entry.
    fn insert_entry(&mut self, entry: Entry) -> LedgerResult<()>;

    /// Overwrite an existing entry.
    fn update_entry(&mut self, entry: Entry) -> LedgerResult<()>;

    /// Delete an entry.
    fn delete_entry(&mut self, id: EntryId) -> LedgerResult<()>;
}

/// A store that can run atomic units of work and consistent reads.
pub trait LedgerRepository: Send + Sync {
    /// Runs `f` inside one transaction.
    ///
    /// Writes are serialized: no other transaction observes or interleaves
    /// with the state `f` sees. If `f` returns an error, every write it made
    /// is rolled back and the error is returned unchanged.
    fn transaction<T, F>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut dyn LedgerTx) -> LedgerResult<T>;

    /// Runs `f` against a read view that stays consistent for its duration.
    fn snapshot<T, F>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&dyn LedgerRead) -> LedgerResult<T>;
}
