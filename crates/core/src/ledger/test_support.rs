//! In-memory read view for unit and property tests.

use std::cell::Cell;

use rust_decimal::Decimal;
use tally_shared::types::{AccountId, BookingId, Currency, EntryId, Money, ParentId};

use super::booking::Booking;
use super::entry::{Entry, EntrySide, NewEntry};
use super::error::LedgerResult;
use super::repository::{LedgerRead, SumScope};
use super::tree::{Account, Parent};

/// Plain in-memory read view with a counter on sum queries.
#[derive(Default)]
pub(crate) struct Fixture {
    pub(crate) parents: Vec<Parent>,
    pub(crate) accounts: Vec<Account>,
    pub(crate) bookings: Vec<Booking>,
    pub(crate) entries: Vec<Entry>,
    pub(crate) sum_queries: Cell<usize>,
}

impl Fixture {
    pub(crate) fn parent(&mut self, name: &str, parent: Option<ParentId>) -> ParentId {
        let p = Parent::new(name, true, parent);
        let id = p.id;
        self.parents.push(p);
        id
    }

    pub(crate) fn account(&mut self, name: &str, parent: ParentId, is_virtual: bool) -> AccountId {
        let a = Account::new(name, Some(parent), is_virtual);
        let id = a.id;
        self.accounts.push(a);
        id
    }

    pub(crate) fn booking(&mut self) -> BookingId {
        let b = Booking::new("", None);
        let id = b.id;
        self.bookings.push(b);
        id
    }

    pub(crate) fn post_to(
        &mut self,
        booking: BookingId,
        account: AccountId,
        side: EntrySide,
        amount: Decimal,
        is_virtual: bool,
    ) {
        let money = Money::new(amount, Currency::Eur);
        let input = match side {
            EntrySide::Debit => NewEntry::debit(account, booking, "", money),
            EntrySide::Credit => NewEntry::credit(account, booking, "", money),
        };
        let input = if is_virtual { input.into_virtual() } else { input };
        self.entries.push(input.into_entry());
    }

    /// Posts into a fresh booking.
    pub(crate) fn post(&mut self, account: AccountId, side: EntrySide, amount: Decimal, is_virtual: bool) {
        let booking = self.booking();
        self.post_to(booking, account, side, amount, is_virtual);
    }
}

impl LedgerRead for Fixture {
    fn find_parent(&self, id: ParentId) -> LedgerResult<Option<Parent>> {
        Ok(self.parents.iter().find(|p| p.id == id).cloned())
    }

    fn child_parents(&self, id: ParentId) -> LedgerResult<Vec<Parent>> {
        Ok(self.parents.iter().filter(|p| p.parent == Some(id)).cloned().collect())
    }

    fn root_parents(&self) -> LedgerResult<Vec<Parent>> {
        Ok(self.parents.iter().filter(|p| p.is_root()).cloned().collect())
    }

    fn all_parents(&self) -> LedgerResult<Vec<Parent>> {
        Ok(self.parents.clone())
    }

    fn find_account(&self, id: AccountId) -> LedgerResult<Option<Account>> {
        Ok(self.accounts.iter().find(|a| a.id == id).cloned())
    }

    fn accounts_of(&self, parent: ParentId) -> LedgerResult<Vec<Account>> {
        Ok(self.accounts.iter().filter(|a| a.parent == Some(parent)).cloned().collect())
    }

    fn find_booking(&self, id: BookingId) -> LedgerResult<Option<Booking>> {
        Ok(self.bookings.iter().find(|b| b.id == id).cloned())
    }

    fn all_bookings(&self) -> LedgerResult<Vec<Booking>> {
        Ok(self.bookings.clone())
    }

    fn find_entry(&self, id: EntryId) -> LedgerResult<Option<Entry>> {
        Ok(self.entries.iter().find(|e| e.id == id).cloned())
    }

    fn entries_of_booking(&self, booking: BookingId) -> LedgerResult<Vec<Entry>> {
        Ok(self.entries.iter().filter(|e| e.booking == booking).cloned().collect())
    }

    fn sum_entries(&self, scope: SumScope, side: EntrySide) -> LedgerResult<Vec<Money>> {
        self.sum_queries.set(self.sum_queries.get() + 1);
        let amounts: Vec<Money> = self
            .entries
            .iter()
            .filter(|e| !e.is_virtual)
            .filter(|e| match scope {
                SumScope::Account(id) => e.account == id,
                SumScope::Booking(id) => e.booking == id,
            })
            .filter_map(|e| e.amount(side))
            .collect();
        if amounts.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Money::sum(amounts, Currency::Eur)?])
    }
}
