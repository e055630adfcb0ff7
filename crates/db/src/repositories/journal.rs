//! Undo journal for in-place transactions.
//!
//! A [`Journal`] wraps the committed tables for the duration of one unit of
//! work. Every successful write records the row it replaced; unless the
//! journal is committed, dropping it restores those rows in reverse order.
//! Rollback cost is proportional to the writes made, not to the table sizes.

use tally_core::ledger::{
    Account, Booking, Entry, EntrySide, LedgerRead, LedgerResult, LedgerTx, Parent, SumScope,
};
use tally_shared::types::{AccountId, BookingId, EntryId, Money, ParentId};

use super::tables::{EntryRow, LedgerTables};

/// Prior state of one row.
#[derive(Debug)]
enum Undo {
    Parent(ParentId, Option<Parent>),
    Account(AccountId, Option<Account>),
    Booking(BookingId, Option<Booking>),
    Entry(EntryId, Option<EntryRow>),
}

/// Write access to the tables that rolls back on drop.
#[derive(Debug)]
pub(super) struct Journal<'a> {
    tables: &'a mut LedgerTables,
    undo: Vec<Undo>,
    next_seq: u64,
    committed: bool,
}

impl<'a> Journal<'a> {
    pub(super) fn new(tables: &'a mut LedgerTables) -> Self {
        let next_seq = tables.next_seq;
        Self {
            tables,
            undo: Vec::new(),
            next_seq,
            committed: false,
        }
    }

    /// Keeps every write made through the journal.
    pub(super) fn commit(mut self) {
        self.committed = true;
    }

    fn record(&mut self, undo: Undo, result: LedgerResult<()>) -> LedgerResult<()> {
        if result.is_ok() {
            self.undo.push(undo);
        }
        result
    }

    fn rollback(&mut self) {
        while let Some(undo) = self.undo.pop() {
            match undo {
                Undo::Parent(id, Some(row)) => {
                    self.tables.parents.insert(id, row);
                }
                Undo::Parent(id, None) => {
                    self.tables.parents.remove(&id);
                }
                Undo::Account(id, Some(row)) => {
                    self.tables.accounts.insert(id, row);
                }
                Undo::Account(id, None) => {
                    self.tables.accounts.remove(&id);
                }
                Undo::Booking(id, Some(row)) => {
                    self.tables.bookings.insert(id, row);
                }
                Undo::Booking(id, None) => {
                    self.tables.bookings.remove(&id);
                }
                Undo::Entry(id, Some(row)) => {
                    self.tables.entries.insert(id, row);
                }
                Undo::Entry(id, None) => {
                    self.tables.entries.remove(&id);
                }
            }
        }
        self.tables.next_seq = self.next_seq;
    }

    fn parent_row(&self, id: ParentId) -> Undo {
        Undo::Parent(id, self.tables.parents.get(&id).cloned())
    }

    fn account_row(&self, id: AccountId) -> Undo {
        Undo::Account(id, self.tables.accounts.get(&id).cloned())
    }

    fn booking_row(&self, id: BookingId) -> Undo {
        Undo::Booking(id, self.tables.bookings.get(&id).cloned())
    }

    fn entry_row(&self, id: EntryId) -> Undo {
        Undo::Entry(id, self.tables.entries.get(&id).cloned())
    }
}

impl Drop for Journal<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

impl LedgerRead for Journal<'_> {
    fn find_parent(&self, id: ParentId) -> LedgerResult<Option<Parent>> {
        self.tables.find_parent(id)
    }

    fn child_parents(&self, id: ParentId) -> LedgerResult<Vec<Parent>> {
        self.tables.child_parents(id)
    }

    fn root_parents(&self) -> LedgerResult<Vec<Parent>> {
        self.tables.root_parents()
    }

    fn all_parents(&self) -> LedgerResult<Vec<Parent>> {
        self.tables.all_parents()
    }

    fn find_account(&self, id: AccountId) -> LedgerResult<Option<Account>> {
        self.tables.find_account(id)
    }

    fn accounts_of(&self, parent: ParentId) -> LedgerResult<Vec<Account>> {
        self.tables.accounts_of(parent)
    }

    fn find_booking(&self, id: BookingId) -> LedgerResult<Option<Booking>> {
        self.tables.find_booking(id)
    }

    fn all_bookings(&self) -> LedgerResult<Vec<Booking>> {
        self.tables.all_bookings()
    }

    fn find_entry(&self, id: EntryId) -> LedgerResult<Option<Entry>> {
        self.tables.find_entry(id)
    }

    fn entries_of_booking(&self, booking: BookingId) -> LedgerResult<Vec<Entry>> {
        self.tables.entries_of_booking(booking)
    }

    fn sum_entries(&self, scope: SumScope, side: EntrySide) -> LedgerResult<Vec<Money>> {
        self.tables.sum_entries(scope, side)
    }
}

impl LedgerTx for Journal<'_> {
    fn insert_parent(&mut self, parent: Parent) -> LedgerResult<()> {
        let undo = self.parent_row(parent.id);
        let result = self.tables.insert_parent(parent);
        self.record(undo, result)
    }

    fn update_parent(&mut self, parent: Parent) -> LedgerResult<()> {
        let undo = self.parent_row(parent.id);
        let result = self.tables.update_parent(parent);
        self.record(undo, result)
    }

    fn delete_parent(&mut self, id: ParentId) -> LedgerResult<()> {
        let undo = self.parent_row(id);
        let result = self.tables.delete_parent(id);
        self.record(undo, result)
    }

    fn insert_account(&mut self, account: Account) -> LedgerResult<()> {
        let undo = self.account_row(account.id);
        let result = self.tables.insert_account(account);
        self.record(undo, result)
    }

    fn update_account(&mut self, account: Account) -> LedgerResult<()> {
        let undo = self.account_row(account.id);
        let result = self.tables.update_account(account);
        self.record(undo, result)
    }

    fn delete_account(&mut self, id: AccountId) -> LedgerResult<()> {
        let undo = self.account_row(id);
        let result = self.tables.delete_account(id);
        self.record(undo, result)
    }

    fn insert_booking(&mut self, booking: Booking) -> LedgerResult<()> {
        let undo = self.booking_row(booking.id);
        let result = self.tables.insert_booking(booking);
        self.record(undo, result)
    }

    fn update_booking(&mut self, booking: Booking) -> LedgerResult<()> {
        let undo = self.booking_row(booking.id);
        let result = self.tables.update_booking(booking);
        self.record(undo, result)
    }

    fn delete_booking(&mut self, id: BookingId) -> LedgerResult<()> {
        let undo = self.booking_row(id);
        let result = self.tables.delete_booking(id);
        self.record(undo, result)
    }

    fn insert_entry(&mut self, entry: Entry) -> LedgerResult<()> {
        let undo = self.entry_row(entry.id);
        let result = self.tables.insert_entry(entry);
        self.record(undo, result)
    }

    fn update_entry(&mut self, entry: Entry) -> LedgerResult<()> {
        let undo = self.entry_row(entry.id);
        let result = self.tables.update_entry(entry);
        self.record(undo, result)
    }

    fn delete_entry(&mut self, id: EntryId) -> LedgerResult<()> {
        let undo = self.entry_row(id);
        let result = self.tables.delete_entry(id);
        self.record(undo, result)
    }
}
