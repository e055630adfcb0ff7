//! Ledger tree: grouping parents and the accounts attached to them.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, ParentId};

/// A grouping node. Parents may nest under other parents, forming a forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    /// Unique identifier.
    pub id: ParentId,
    /// Display name.
    pub name: String,
    /// Explicit activity flag; accounts inherit it.
    pub active: bool,
    /// Enclosing parent, `None` for roots.
    pub parent: Option<ParentId>,
    /// When the parent was created.
    pub created_at: DateTime<Utc>,
    /// When the parent was last written.
    pub updated_at: DateTime<Utc>,
}

impl Parent {
    /// Creates a new parent record.
    #[must_use]
    pub fn new(name: impl Into<String>, active: bool, parent: Option<ParentId>) -> Self {
        let now = Utc::now();
        Self {
            id: ParentId::new(),
            name: name.into(),
            active,
            parent,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if this parent has no enclosing parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Listing order: by name, then by the active flag (inactive first).
    #[must_use]
    pub fn listing_order(a: &Self, b: &Self) -> Ordering {
        a.name.cmp(&b.name).then(a.active.cmp(&b.active))
    }

    /// Sorts parents in listing order.
    pub fn sort_for_listing(parents: &mut [Self]) {
        parents.sort_by(Self::listing_order);
    }
}

/// A ledger account. Entries post against accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Display name, unique per parent.
    pub name: String,
    /// Parent the account is attached to.
    pub parent: Option<ParentId>,
    /// Virtual accounts are skipped when rolling totals up into parents.
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last written.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new account record.
    #[must_use]
    pub fn new(name: impl Into<String>, parent: Option<ParentId>, is_virtual: bool) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            name: name.into(),
            parent,
            is_virtual,
            created_at: now,
            updated_at: now,
        }
    }

    /// Activity is inherited from the parent; an account without one is inactive.
    ///
    /// `parent` must be the record referenced by `self.parent`.
    #[must_use]
    pub fn active(&self, parent: Option<&Parent>) -> bool {
        match (self.parent, parent) {
            (Some(id), Some(parent)) if parent.id == id => parent.active,
            _ => false,
        }
    }
}
