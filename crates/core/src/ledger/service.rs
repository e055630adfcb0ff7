//! Ledger service: the gatekept write path and the read/report path.
//!
//! Every mutation runs inside one store transaction. Invariant checks read the
//! persisted state inside that same transaction, so the closing transition is
//! a compare-and-swap on `done` and entry writes can never race a close.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tally_shared::LedgerConfig;
use tally_shared::types::{AccountId, BookingId, Currency, DocumentId, EntryId, Money, ParentId};
use tracing::{debug, info, warn};

use super::aggregation::{Aggregator, LedgerNode, NodeTotals, RootReport, booking_totals};
use super::booking::{Booking, BookingTotals};
use super::entry::{Entry, NewEntry};
use super::error::{LedgerError, LedgerResult};
use super::import::ImportRecord;
use super::repository::{LedgerRead, LedgerRepository, LedgerTx};
use super::tree::{Account, Parent};
use super::validation::{
    BookingWrite, check_balanced, check_booking_open, check_entry_currency, check_entry_shape,
    classify_booking_write,
};

/// Ledger service over a storage collaborator.
pub struct LedgerService<R: LedgerRepository> {
    repo: Arc<R>,
    currency: Currency,
}

impl<R: LedgerRepository> Clone for LedgerService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            currency: self.currency,
        }
    }
}

impl<R: LedgerRepository> LedgerService<R> {
    /// Creates a service reporting totals in `currency`.
    #[must_use]
    pub fn new(repo: Arc<R>, currency: Currency) -> Self {
        Self { repo, currency }
    }

    /// Creates a service using the configured working currency.
    #[must_use]
    pub fn from_config(repo: Arc<R>, config: &LedgerConfig) -> Self {
        Self::new(repo, config.currency)
    }

    /// Working currency.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    // ========== Parents ==========

    /// Creates a parent, optionally nested below `parent`.
    pub fn create_parent(
        &self,
        name: &str,
        active: bool,
        parent: Option<ParentId>,
    ) -> LedgerResult<Parent> {
        self.repo.transaction(|tx| {
            if let Some(parent_id) = parent {
                require_parent(&*tx, parent_id)?;
            }
            let record = Parent::new(name, active, parent);
            tx.insert_parent(record.clone())?;
            debug!(parent_id = %record.id, name, "Parent created");
            Ok(record)
        })
    }

    /// Renames a parent.
    pub fn rename_parent(&self, id: ParentId, name: &str) -> LedgerResult<Parent> {
        self.modify_parent(id, |parent| parent.name = name.to_string())
    }

    /// Toggles a parent's activity flag; its accounts follow.
    pub fn set_parent_active(&self, id: ParentId, active: bool) -> LedgerResult<Parent> {
        self.modify_parent(id, |parent| parent.active = active)
    }

    /// Re-parents a parent and with it the aggregation path of its subtree.
    ///
    /// Fails with `CycleDetected` if `new_parent` is the node itself or one of
    /// its descendants.
    pub fn move_parent(&self, id: ParentId, new_parent: Option<ParentId>) -> LedgerResult<Parent> {
        self.repo.transaction(|tx| {
            let mut record = require_parent(&*tx, id)?;
            if let Some(target) = new_parent {
                ensure_not_descendant(&*tx, id, target)?;
            }
            let previous = record.parent;
            record.parent = new_parent;
            record.updated_at = Utc::now();
            tx.update_parent(record.clone())?;
            info!(
                parent_id = %id,
                from = ?previous,
                to = ?new_parent,
                "Parent moved"
            );
            Ok(record)
        })
    }

    /// Deletes a parent; rejected while accounts or child parents reference it.
    pub fn delete_parent(&self, id: ParentId) -> LedgerResult<()> {
        self.repo.transaction(|tx| {
            require_parent(&*tx, id)?;
            tx.delete_parent(id)
        })
    }

    /// Loads a parent.
    pub fn get_parent(&self, id: ParentId) -> LedgerResult<Parent> {
        self.repo.snapshot(|store| require_parent(store, id))
    }

    /// All parents ordered by `(name, active)`.
    pub fn list_parents(&self) -> LedgerResult<Vec<Parent>> {
        self.repo.snapshot(|store| {
            let mut parents = store.all_parents()?;
            Parent::sort_for_listing(&mut parents);
            Ok(parents)
        })
    }

    fn modify_parent<F>(&self, id: ParentId, change: F) -> LedgerResult<Parent>
    where
        F: FnOnce(&mut Parent),
    {
        self.repo.transaction(|tx| {
            let mut record = require_parent(&*tx, id)?;
            change(&mut record);
            record.updated_at = Utc::now();
            tx.update_parent(record.clone())?;
            debug!(parent_id = %id, "Parent updated");
            Ok(record)
        })
    }

    // ========== Accounts ==========

    /// Creates an account; `(name, parent)` must be unique.
    pub fn create_account(
        &self,
        name: &str,
        parent: Option<ParentId>,
        is_virtual: bool,
    ) -> LedgerResult<Account> {
        self.repo.transaction(|tx| {
            if let Some(parent_id) = parent {
                require_parent(&*tx, parent_id)?;
            }
            let record = Account::new(name, parent, is_virtual);
            tx.insert_account(record.clone())?;
            debug!(account_id = %record.id, name, "Account created");
            Ok(record)
        })
    }

    /// Renames an account.
    pub fn rename_account(&self, id: AccountId, name: &str) -> LedgerResult<Account> {
        self.repo.transaction(|tx| {
            let mut record = require_account(&*tx, id)?;
            record.name = name.to_string();
            record.updated_at = Utc::now();
            tx.update_account(record.clone())?;
            Ok(record)
        })
    }

    /// Attaches an account to another parent.
    pub fn move_account(&self, id: AccountId, parent: Option<ParentId>) -> LedgerResult<Account> {
        self.repo.transaction(|tx| {
            let mut record = require_account(&*tx, id)?;
            if let Some(parent_id) = parent {
                require_parent(&*tx, parent_id)?;
            }
            let previous = record.parent;
            record.parent = parent;
            record.updated_at = Utc::now();
            tx.update_account(record.clone())?;
            info!(account_id = %id, from = ?previous, to = ?parent, "Account moved");
            Ok(record)
        })
    }

    /// Deletes an account; rejected while entries reference it.
    pub fn delete_account(&self, id: AccountId) -> LedgerResult<()> {
        self.repo.transaction(|tx| {
            require_account(&*tx, id)?;
            tx.delete_account(id)
        })
    }

    /// Loads an account.
    pub fn get_account(&self, id: AccountId) -> LedgerResult<Account> {
        self.repo.snapshot(|store| require_account(store, id))
    }

    /// Activity of an account, derived from its parent.
    pub fn account_active(&self, id: AccountId) -> LedgerResult<bool> {
        self.repo.snapshot(|store| {
            let account = require_account(store, id)?;
            let parent = match account.parent {
                Some(parent_id) => store.find_parent(parent_id)?,
                None => None,
            };
            Ok(account.active(parent.as_ref()))
        })
    }

    // ========== Bookings ==========

    /// Creates an open booking.
    pub fn create_booking(&self, text: &str, document: Option<DocumentId>) -> LedgerResult<Booking> {
        self.repo.transaction(|tx| {
            let record = Booking::new(text, document);
            tx.insert_booking(record.clone())?;
            debug!(booking_id = %record.id, "Booking created");
            Ok(record)
        })
    }

    /// Persists a booking according to the transition table.
    ///
    /// The previous `done` value is read from the store inside the write
    /// transaction. Setting `done` on an open booking closes it, provided the
    /// non-virtual debit and credit sums match; otherwise the write fails with
    /// `Unbalanced`, nothing is persisted and `booking.done` is reset to
    /// `false`. Any write to a closed booking fails with `ClosedBooking`.
    pub fn save_booking(&self, booking: &mut Booking) -> LedgerResult<()> {
        let proposed = booking.clone();
        let result = self.repo.transaction(|tx| {
            let persisted = require_booking(&*tx, proposed.id)?;
            let write = classify_booking_write(proposed.id, persisted.done, proposed.done)?;

            if write == BookingWrite::Close {
                let totals = booking_totals(&*tx, proposed.id, self.currency)?;
                if let Err(err) = check_balanced(&totals) {
                    warn!(
                        booking_id = %proposed.id,
                        debit = %totals.debit,
                        credit = %totals.credit,
                        "Booking close rejected"
                    );
                    return Err(err);
                }
            }

            let record = Booking {
                created_at: persisted.created_at,
                updated_at: Utc::now(),
                ..proposed
            };
            tx.update_booking(record.clone())?;
            Ok((write, record))
        });

        match result {
            Ok((write, record)) => {
                if write == BookingWrite::Close {
                    info!(booking_id = %record.id, "Booking closed");
                }
                *booking = record;
                Ok(())
            }
            Err(err) => {
                if matches!(err, LedgerError::Unbalanced { .. }) {
                    booking.done = false;
                }
                Err(err)
            }
        }
    }

    /// Closes a booking by id.
    pub fn close_booking(&self, id: BookingId) -> LedgerResult<Booking> {
        let mut booking = self.get_booking(id)?;
        booking.done = true;
        self.save_booking(&mut booking)?;
        Ok(booking)
    }

    /// Deletes an open booking that owns no entries.
    pub fn delete_booking(&self, id: BookingId) -> LedgerResult<()> {
        self.repo.transaction(|tx| {
            let booking = require_booking(&*tx, id)?;
            check_booking_open(&booking)?;
            tx.delete_booking(id)
        })
    }

    /// Loads a booking.
    pub fn get_booking(&self, id: BookingId) -> LedgerResult<Booking> {
        self.repo.snapshot(|store| require_booking(store, id))
    }

    /// All bookings, oldest first.
    pub fn list_bookings(&self) -> LedgerResult<Vec<Booking>> {
        self.repo.snapshot(|store| {
            let mut bookings = store.all_bookings()?;
            bookings.sort_by_key(|b| (b.created_at, b.id));
            Ok(bookings)
        })
    }

    /// Entries of a booking, in creation order.
    pub fn booking_entries(&self, id: BookingId) -> LedgerResult<Vec<Entry>> {
        self.repo.snapshot(|store| {
            require_booking(store, id)?;
            store.entries_of_booking(id)
        })
    }

    /// Non-virtual debit and credit sums of a booking.
    pub fn booking_totals(&self, id: BookingId) -> LedgerResult<BookingTotals> {
        self.repo.snapshot(|store| {
            require_booking(store, id)?;
            booking_totals(store, id, self.currency)
        })
    }

    // ========== Entries ==========

    /// Creates an entry against an open booking, in the working currency.
    pub fn create_entry(&self, input: NewEntry) -> LedgerResult<Entry> {
        self.repo
            .transaction(|tx| insert_new_entry(tx, input, self.currency))
    }

    /// Overwrites an entry; both its current and its target booking must be open
    /// and the amount must stay in the working currency.
    pub fn update_entry(&self, entry: &Entry) -> LedgerResult<Entry> {
        self.repo.transaction(|tx| {
            let persisted = require_entry(&*tx, entry.id)?;
            check_booking_open(&require_booking(&*tx, persisted.booking)?)?;
            if entry.booking != persisted.booking {
                check_booking_open(&require_booking(&*tx, entry.booking)?)?;
            }
            check_entry_shape(entry.debit.as_ref(), entry.credit.as_ref())?;
            check_entry_currency(entry.debit.as_ref(), entry.credit.as_ref(), self.currency)?;
            require_account(&*tx, entry.account)?;

            let record = Entry {
                created_at: persisted.created_at,
                updated_at: Utc::now(),
                ..entry.clone()
            };
            tx.update_entry(record.clone())?;
            debug!(entry_id = %record.id, booking_id = %record.booking, "Entry updated");
            Ok(record)
        })
    }

    /// Deletes an entry of an open booking.
    pub fn delete_entry(&self, id: EntryId) -> LedgerResult<()> {
        self.repo.transaction(|tx| {
            let persisted = require_entry(&*tx, id)?;
            check_booking_open(&require_booking(&*tx, persisted.booking)?)?;
            tx.delete_entry(id)
        })
    }

    /// Loads an entry.
    pub fn get_entry(&self, id: EntryId) -> LedgerResult<Entry> {
        self.repo.snapshot(|store| require_entry(store, id))
    }

    /// Whether an entry's booking is closed.
    pub fn entry_done(&self, id: EntryId) -> LedgerResult<bool> {
        self.repo.snapshot(|store| {
            let entry = require_entry(store, id)?;
            Ok(require_booking(store, entry.booking)?.done)
        })
    }

    // ========== Aggregation ==========

    /// Debit and credit totals of an account or parent.
    pub fn totals(&self, node: impl Into<LedgerNode>) -> LedgerResult<NodeTotals> {
        let node = node.into();
        self.repo.snapshot(|store| {
            let mut aggregator = Aggregator::new(store, self.currency);
            match node {
                LedgerNode::Account(id) => aggregator.account_totals(id),
                LedgerNode::Parent(id) => aggregator.parent_totals(id),
            }
        })
    }

    /// Debit total of an account or parent.
    pub fn debit(&self, node: impl Into<LedgerNode>) -> LedgerResult<Money> {
        Ok(self.totals(node)?.debit)
    }

    /// Credit total of an account or parent.
    pub fn credit(&self, node: impl Into<LedgerNode>) -> LedgerResult<Money> {
        Ok(self.totals(node)?.credit)
    }

    /// Root parents ordered by `(name, active)` with their recursive totals.
    ///
    /// Computed from one snapshot; shared subtrees are summed once.
    pub fn get_roots(&self) -> LedgerResult<Vec<RootReport>> {
        self.repo
            .snapshot(|store| Aggregator::new(store, self.currency).roots())
    }

    // ========== Bulk import ==========

    /// Creates one open booking with one entry per record, in input order.
    ///
    /// Each record is its own transaction: a failing record leaves nothing
    /// behind and stops the import, records before it stay committed.
    pub fn bulk_import(
        &self,
        records: &[ImportRecord],
        account: AccountId,
    ) -> LedgerResult<Vec<Booking>> {
        let mut bookings = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let booking = self
                .repo
                .transaction(|tx| self.import_record(tx, record, account))
                .inspect_err(|err| {
                    warn!(index, imported = bookings.len(), error = %err, "Bulk import stopped");
                })?;
            bookings.push(booking);
        }
        info!(account_id = %account, count = bookings.len(), "Bulk import finished");
        Ok(bookings)
    }

    /// Like [`Self::bulk_import`], but the whole batch commits or nothing does.
    pub fn bulk_import_atomic(
        &self,
        records: &[ImportRecord],
        account: AccountId,
    ) -> LedgerResult<Vec<Booking>> {
        let bookings = self.repo.transaction(|tx| {
            let mut bookings = Vec::with_capacity(records.len());
            for record in records {
                bookings.push(self.import_record(&mut *tx, record, account)?);
            }
            Ok(bookings)
        })?;
        info!(account_id = %account, count = bookings.len(), "Atomic bulk import finished");
        Ok(bookings)
    }

    fn import_record(
        &self,
        tx: &mut dyn LedgerTx,
        record: &ImportRecord,
        account: AccountId,
    ) -> LedgerResult<Booking> {
        let booking = Booking::new(record.text.clone(), None);
        tx.insert_booking(booking.clone())?;
        insert_new_entry(
            tx,
            record.to_entry(account, booking.id, self.currency),
            self.currency,
        )?;
        Ok(booking)
    }
}

fn insert_new_entry(
    tx: &mut dyn LedgerTx,
    input: NewEntry,
    currency: Currency,
) -> LedgerResult<Entry> {
    check_booking_open(&require_booking(&*tx, input.booking)?)?;
    check_entry_shape(input.debit.as_ref(), input.credit.as_ref())?;
    check_entry_currency(input.debit.as_ref(), input.credit.as_ref(), currency)?;
    require_account(&*tx, input.account)?;

    let record = input.into_entry();
    tx.insert_entry(record.clone())?;
    debug!(entry_id = %record.id, booking_id = %record.booking, "Entry created");
    Ok(record)
}

fn require_parent<S: LedgerRead + ?Sized>(store: &S, id: ParentId) -> LedgerResult<Parent> {
    store.find_parent(id)?.ok_or(LedgerError::ParentNotFound(id))
}

fn require_account<S: LedgerRead + ?Sized>(store: &S, id: AccountId) -> LedgerResult<Account> {
    store.find_account(id)?.ok_or(LedgerError::AccountNotFound(id))
}

fn require_booking<S: LedgerRead + ?Sized>(store: &S, id: BookingId) -> LedgerResult<Booking> {
    store.find_booking(id)?.ok_or(LedgerError::BookingNotFound(id))
}

fn require_entry<S: LedgerRead + ?Sized>(store: &S, id: EntryId) -> LedgerResult<Entry> {
    store.find_entry(id)?.ok_or(LedgerError::EntryNotFound(id))
}

/// Walks up from `target`; reaching `id` means the move would close a cycle.
fn ensure_not_descendant<S: LedgerRead + ?Sized>(
    store: &S,
    id: ParentId,
    target: ParentId,
) -> LedgerResult<()> {
    let mut seen = HashSet::new();
    let mut cursor = Some(target);
    while let Some(current) = cursor {
        if current == id || !seen.insert(current) {
            warn!(parent_id = %id, target = %target, "Parent move would create a cycle");
            return Err(LedgerError::CycleDetected(current));
        }
        cursor = require_parent(store, current)?.parent;
    }
    Ok(())
}
