//! Ledger tables with referential constraints.
//!
//! [`LedgerTables`] is the committed state of the in-memory store. Transactions
//! mutate it in place through an undo journal. Constraint checks mirror what a
//! relational schema would enforce with foreign keys, a unique index on
//! `(account.name, account.parent)` and `ON DELETE PROTECT`.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use tally_core::ledger::{
    Account, Booking, Entry, EntrySide, LedgerError, LedgerRead, LedgerResult, LedgerTx, Parent,
    SumScope,
};
use tally_shared::types::{AccountId, BookingId, Currency, EntryId, Money, MoneyError, ParentId};

/// Entry row plus its insertion sequence.
#[derive(Debug, Clone)]
pub(super) struct EntryRow {
    pub(super) seq: u64,
    pub(super) entry: Entry,
}

/// All ledger records.
#[derive(Debug, Default)]
pub struct LedgerTables {
    pub(super) parents: HashMap<ParentId, Parent>,
    pub(super) accounts: HashMap<AccountId, Account>,
    pub(super) bookings: HashMap<BookingId, Booking>,
    pub(super) entries: HashMap<EntryId, EntryRow>,
    pub(super) next_seq: u64,
}

impl LedgerTables {
    /// Creates empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn check_parent_ref(&self, parent: Option<ParentId>) -> LedgerResult<()> {
        match parent {
            Some(id) if !self.parents.contains_key(&id) => Err(LedgerError::ParentNotFound(id)),
            _ => Ok(()),
        }
    }

    fn check_unique_account(&self, account: &Account) -> LedgerResult<()> {
        let clash = self
            .accounts
            .values()
            .any(|a| a.id != account.id && a.parent == account.parent && a.name == account.name);
        if clash {
            return Err(LedgerError::DuplicateAccount {
                name: account.name.clone(),
                parent: account.parent,
            });
        }
        Ok(())
    }

    fn check_entry_refs(&self, entry: &Entry) -> LedgerResult<()> {
        if !self.accounts.contains_key(&entry.account) {
            return Err(LedgerError::AccountNotFound(entry.account));
        }
        if !self.bookings.contains_key(&entry.booking) {
            return Err(LedgerError::BookingNotFound(entry.booking));
        }
        Ok(())
    }

    fn sorted_entries<P>(&self, predicate: P) -> Vec<Entry>
    where
        P: Fn(&Entry) -> bool,
    {
        let mut rows: Vec<&EntryRow> = self.entries.values().filter(|r| predicate(&r.entry)).collect();
        rows.sort_by_key(|r| r.seq);
        rows.into_iter().map(|r| r.entry.clone()).collect()
    }
}

impl LedgerRead for LedgerTables {
    fn find_parent(&self, id: ParentId) -> LedgerResult<Option<Parent>> {
        Ok(self.parents.get(&id).cloned())
    }

    fn child_parents(&self, id: ParentId) -> LedgerResult<Vec<Parent>> {
        Ok(self
            .parents
            .values()
            .filter(|p| p.parent == Some(id))
            .cloned()
            .collect())
    }

    fn root_parents(&self) -> LedgerResult<Vec<Parent>> {
        Ok(self.parents.values().filter(|p| p.is_root()).cloned().collect())
    }

    fn all_parents(&self) -> LedgerResult<Vec<Parent>> {
        Ok(self.parents.values().cloned().collect())
    }

    fn find_account(&self, id: AccountId) -> LedgerResult<Option<Account>> {
        Ok(self.accounts.get(&id).cloned())
    }

    fn accounts_of(&self, parent: ParentId) -> LedgerResult<Vec<Account>> {
        Ok(self
            .accounts
            .values()
            .filter(|a| a.parent == Some(parent))
            .cloned()
            .collect())
    }

    fn find_booking(&self, id: BookingId) -> LedgerResult<Option<Booking>> {
        Ok(self.bookings.get(&id).cloned())
    }

    fn all_bookings(&self) -> LedgerResult<Vec<Booking>> {
        Ok(self.bookings.values().cloned().collect())
    }

    fn find_entry(&self, id: EntryId) -> LedgerResult<Option<Entry>> {
        Ok(self.entries.get(&id).map(|r| r.entry.clone()))
    }

    fn entries_of_booking(&self, booking: BookingId) -> LedgerResult<Vec<Entry>> {
        Ok(self.sorted_entries(|e| e.booking == booking))
    }

    fn sum_entries(&self, scope: SumScope, side: EntrySide) -> LedgerResult<Vec<Money>> {
        let mut sums: BTreeMap<Currency, Decimal> = BTreeMap::new();
        let matching = self.entries.values().map(|r| &r.entry).filter(|e| {
            !e.is_virtual
                && match scope {
                    SumScope::Account(id) => e.account == id,
                    SumScope::Booking(id) => e.booking == id,
                }
        });
        for money in matching.filter_map(|e| e.amount(side)) {
            let total = sums.entry(money.currency).or_default();
            *total = total.checked_add(money.amount).ok_or(MoneyError::Overflow {
                left: *total,
                right: money.amount,
            })?;
        }
        Ok(sums
            .into_iter()
            .map(|(currency, amount)| Money::new(amount, currency))
            .collect())
    }
}

impl LedgerTx for LedgerTables {
    fn insert_parent(&mut self, parent: Parent) -> LedgerResult<()> {
        self.check_parent_ref(parent.parent)?;
        self.parents.insert(parent.id, parent);
        Ok(())
    }

    fn update_parent(&mut self, parent: Parent) -> LedgerResult<()> {
        if !self.parents.contains_key(&parent.id) {
            return Err(LedgerError::ParentNotFound(parent.id));
        }
        self.check_parent_ref(parent.parent)?;
        self.parents.insert(parent.id, parent);
        Ok(())
    }

    fn delete_parent(&mut self, id: ParentId) -> LedgerResult<()> {
        if !self.parents.contains_key(&id) {
            return Err(LedgerError::ParentNotFound(id));
        }
        let referenced = self.accounts.values().any(|a| a.parent == Some(id))
            || self.parents.values().any(|p| p.parent == Some(id));
        if referenced {
            return Err(LedgerError::ParentInUse(id));
        }
        self.parents.remove(&id);
        Ok(())
    }

    fn insert_account(&mut self, account: Account) -> LedgerResult<()> {
        self.check_parent_ref(account.parent)?;
        self.check_unique_account(&account)?;
        self.accounts.insert(account.id, account);
        Ok(())
    }

    fn update_account(&mut self, account: Account) -> LedgerResult<()> {
        if !self.accounts.contains_key(&account.id) {
            return Err(LedgerError::AccountNotFound(account.id));
        }
        self.check_parent_ref(account.parent)?;
        self.check_unique_account(&account)?;
        self.accounts.insert(account.id, account);
        Ok(())
    }

    fn delete_account(&mut self, id: AccountId) -> LedgerResult<()> {
        if !self.accounts.contains_key(&id) {
            return Err(LedgerError::AccountNotFound(id));
        }
        if self.entries.values().any(|r| r.entry.account == id) {
            return Err(LedgerError::AccountHasEntries(id));
        }
        self.accounts.remove(&id);
        Ok(())
    }

    fn insert_booking(&mut self, booking: Booking) -> LedgerResult<()> {
        self.bookings.insert(booking.id, booking);
        Ok(())
    }

    fn update_booking(&mut self, booking: Booking) -> LedgerResult<()> {
        match self.bookings.get_mut(&booking.id) {
            Some(slot) => {
                *slot = booking;
                Ok(())
            }
            None => Err(LedgerError::BookingNotFound(booking.id)),
        }
    }

    fn delete_booking(&mut self, id: BookingId) -> LedgerResult<()> {
        if !self.bookings.contains_key(&id) {
            return Err(LedgerError::BookingNotFound(id));
        }
        if self.entries.values().any(|r| r.entry.booking == id) {
            return Err(LedgerError::BookingHasEntries(id));
        }
        self.bookings.remove(&id);
        Ok(())
    }

    fn insert_entry(&mut self, entry: Entry) -> LedgerResult<()> {
        self.check_entry_refs(&entry)?;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(entry.id, EntryRow { seq, entry });
        Ok(())
    }

    fn update_entry(&mut self, entry: Entry) -> LedgerResult<()> {
        self.check_entry_refs(&entry)?;
        match self.entries.get_mut(&entry.id) {
            Some(row) => {
                row.entry = entry;
                Ok(())
            }
            None => Err(LedgerError::EntryNotFound(entry.id)),
        }
    }

    fn delete_entry(&mut self, id: EntryId) -> LedgerResult<()> {
        self.entries
            .remove(&id)
            .map(|_| ())
            .ok_or(LedgerError::EntryNotFound(id))
    }
}
