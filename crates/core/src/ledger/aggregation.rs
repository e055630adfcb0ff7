//! Recursive debit/credit aggregation over the ledger tree.
//!
//! An [`Aggregator`] is bound to one read view. Parent totals are memoized
//! for the lifetime of the aggregator, so a report over many roots walks each
//! subtree once. A visiting set guards against cycles in stored data.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, BookingId, Currency, Money, MoneyError, ParentId};
use tracing::{debug, warn};

use super::booking::BookingTotals;
use super::entry::EntrySide;
use super::error::{LedgerError, LedgerResult};
use super::repository::{LedgerRead, SumScope};
use super::tree::Parent;

/// Debit and credit totals of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTotals {
    /// Total debit.
    pub debit: Money,
    /// Total credit.
    pub credit: Money,
}

impl NodeTotals {
    /// Zero totals in `currency`.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            debit: Money::zero(currency),
            credit: Money::zero(currency),
        }
    }

    /// Adds two totals column by column.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::CurrencyMismatch` if the currencies differ and
    /// `MoneyError::Overflow` if a column leaves `Decimal` range.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        Ok(Self {
            debit: self.debit.checked_add(other.debit)?,
            credit: self.credit.checked_add(other.credit)?,
        })
    }
}

impl From<NodeTotals> for BookingTotals {
    fn from(totals: NodeTotals) -> Self {
        Self {
            debit: totals.debit,
            credit: totals.credit,
        }
    }
}

/// A node of the ledger tree that totals can be computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerNode {
    /// A grouping parent.
    Parent(ParentId),
    /// A single account.
    Account(AccountId),
}

impl From<ParentId> for LedgerNode {
    fn from(id: ParentId) -> Self {
        Self::Parent(id)
    }
}

impl From<AccountId> for LedgerNode {
    fn from(id: AccountId) -> Self {
        Self::Account(id)
    }
}

/// One line of the top-level report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootReport {
    /// Root parent ID.
    pub id: ParentId,
    /// Root parent name.
    pub name: String,
    /// Root parent activity flag.
    pub active: bool,
    /// Recursive debit total.
    pub debit: Money,
    /// Recursive credit total.
    pub credit: Money,
}

/// Non-virtual debit/credit sums for one scope.
pub fn scope_totals<S>(store: &S, scope: SumScope, currency: Currency) -> LedgerResult<NodeTotals>
where
    S: LedgerRead + ?Sized,
{
    let debit = Money::sum(store.sum_entries(scope, EntrySide::Debit)?, currency)?;
    let credit = Money::sum(store.sum_entries(scope, EntrySide::Credit)?, currency)?;
    Ok(NodeTotals { debit, credit })
}

/// Non-virtual debit/credit sums of a booking.
pub fn booking_totals<S>(store: &S, id: BookingId, currency: Currency) -> LedgerResult<BookingTotals>
where
    S: LedgerRead + ?Sized,
{
    scope_totals(store, SumScope::Booking(id), currency).map(Into::into)
}

/// Computes totals for accounts and parents within one read view.
pub struct Aggregator<'a, S: LedgerRead + ?Sized> {
    store: &'a S,
    currency: Currency,
    memo: HashMap<ParentId, NodeTotals>,
    visiting: HashSet<ParentId>,
}

impl<'a, S: LedgerRead + ?Sized> Aggregator<'a, S> {
    /// Creates an aggregator over `store` reporting in `currency`.
    pub fn new(store: &'a S, currency: Currency) -> Self {
        Self {
            store,
            currency,
            memo: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    /// Totals of one account's non-virtual entries.
    pub fn account_totals(&self, id: AccountId) -> LedgerResult<NodeTotals> {
        if self.store.find_account(id)?.is_none() {
            return Err(LedgerError::AccountNotFound(id));
        }
        scope_totals(self.store, SumScope::Account(id), self.currency)
    }

    /// Totals of a parent: its non-virtual accounts plus every child parent, recursively.
    pub fn parent_totals(&mut self, id: ParentId) -> LedgerResult<NodeTotals> {
        if let Some(totals) = self.memo.get(&id) {
            return Ok(*totals);
        }
        if !self.visiting.insert(id) {
            warn!(parent_id = %id, "Cycle detected while aggregating parent tree");
            return Err(LedgerError::CycleDetected(id));
        }

        let result = self.compute_parent(id);
        self.visiting.remove(&id);

        let totals = result?;
        self.memo.insert(id, totals);
        Ok(totals)
    }

    fn compute_parent(&mut self, id: ParentId) -> LedgerResult<NodeTotals> {
        if self.store.find_parent(id)?.is_none() {
            return Err(LedgerError::ParentNotFound(id));
        }

        let mut totals = NodeTotals::zero(self.currency);
        for account in self.store.accounts_of(id)? {
            if account.is_virtual {
                continue;
            }
            let account_totals = scope_totals(self.store, SumScope::Account(account.id), self.currency)?;
            totals = totals.checked_add(account_totals)?;
        }
        for child in self.store.child_parents(id)? {
            totals = totals.checked_add(self.parent_totals(child.id)?)?;
        }
        Ok(totals)
    }

    /// Root parents in listing order, each with its recursive totals.
    pub fn roots(&mut self) -> LedgerResult<Vec<RootReport>> {
        let mut roots = self.store.root_parents()?;
        Parent::sort_for_listing(&mut roots);

        let mut report = Vec::with_capacity(roots.len());
        for root in roots {
            let totals = self.parent_totals(root.id)?;
            report.push(RootReport {
                id: root.id,
                name: root.name,
                active: root.active,
                debit: totals.debit,
                credit: totals.credit,
            });
        }

        debug!(roots = report.len(), memoized = self.memo.len(), "Root report computed");
        Ok(report)
    }
}
