//! Property-based tests for tree aggregation.
//!
//! - Account totals equal the sum of its non-virtual entries.
//! - Parent totals equal its non-virtual accounts plus its child parents.
//! - Re-parenting moves a subtree's totals from one chain to the other.

use proptest::prelude::*;
use proptest::sample::Index;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, Currency, ParentId};

use super::aggregation::{Aggregator, NodeTotals};
use super::entry::EntrySide;
use super::test_support::Fixture;

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn side() -> impl Strategy<Value = EntrySide> {
    prop_oneof![Just(EntrySide::Debit), Just(EntrySide::Credit)]
}

/// Random acyclic tree: each parent may only hang below an earlier one.
#[derive(Debug, Clone)]
struct TreeShape {
    parents: Vec<Option<Index>>,
    accounts: Vec<(Index, bool)>,
    entries: Vec<(Index, EntrySide, Decimal, bool)>,
}

fn tree_shape() -> impl Strategy<Value = TreeShape> {
    (
        prop::collection::vec(proptest::option::of(any::<Index>()), 1..8),
        prop::collection::vec((any::<Index>(), any::<bool>()), 1..10),
        prop::collection::vec((any::<Index>(), side(), amount(), any::<bool>()), 0..30),
    )
        .prop_map(|(parents, accounts, entries)| TreeShape {
            parents,
            accounts,
            entries,
        })
}

fn build(shape: &TreeShape) -> (Fixture, Vec<ParentId>, Vec<AccountId>) {
    let mut fx = Fixture::default();
    let mut parents = Vec::with_capacity(shape.parents.len());
    for (i, pick) in shape.parents.iter().enumerate() {
        let above = match pick {
            Some(idx) if i > 0 => Some(parents[idx.index(i)]),
            _ => None,
        };
        parents.push(fx.parent(&format!("P{i}"), above));
    }

    let mut accounts = Vec::with_capacity(shape.accounts.len());
    for (i, (pick, is_virtual)) in shape.accounts.iter().enumerate() {
        let parent = parents[pick.index(parents.len())];
        accounts.push(fx.account(&format!("A{i}"), parent, *is_virtual));
    }

    for (pick, side, amount, is_virtual) in &shape.entries {
        let account = accounts[pick.index(accounts.len())];
        fx.post(account, *side, *amount, *is_virtual);
    }
    (fx, parents, accounts)
}

/// Independent sum of an account's non-virtual entries.
fn direct_sum(fx: &Fixture, account: AccountId) -> (Decimal, Decimal) {
    fx.entries
        .iter()
        .filter(|e| e.account == account && !e.is_virtual)
        .fold((Decimal::ZERO, Decimal::ZERO), |(debit, credit), e| {
            (
                debit + e.debit.map_or(Decimal::ZERO, |m| m.amount),
                credit + e.credit.map_or(Decimal::ZERO, |m| m.amount),
            )
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_account_totals_match_entries(shape in tree_shape()) {
        let (fx, _, accounts) = build(&shape);
        let agg = Aggregator::new(&fx, Currency::Eur);

        for account in accounts {
            let totals = agg.account_totals(account).unwrap();
            let (debit, credit) = direct_sum(&fx, account);
            prop_assert_eq!(totals.debit.amount, debit);
            prop_assert_eq!(totals.credit.amount, credit);
        }
    }

    #[test]
    fn prop_parent_is_accounts_plus_children(shape in tree_shape()) {
        let (fx, parents, _) = build(&shape);
        let mut agg = Aggregator::new(&fx, Currency::Eur);

        for parent in &parents {
            let totals = agg.parent_totals(*parent).unwrap();

            let mut expected = NodeTotals::zero(Currency::Eur);
            for account in fx.accounts.iter().filter(|a| a.parent == Some(*parent) && !a.is_virtual) {
                expected = expected.checked_add(agg.account_totals(account.id).unwrap()).unwrap();
            }
            let children: Vec<ParentId> = fx
                .parents
                .iter()
                .filter(|p| p.parent == Some(*parent))
                .map(|p| p.id)
                .collect();
            for child in children {
                expected = expected.checked_add(agg.parent_totals(child).unwrap()).unwrap();
            }

            prop_assert_eq!(totals, expected);
        }
    }

    #[test]
    fn prop_roots_cover_all_non_virtual_accounts(shape in tree_shape()) {
        let (fx, _, accounts) = build(&shape);
        let mut agg = Aggregator::new(&fx, Currency::Eur);
        let roots = agg.roots().unwrap();

        let (mut debit, mut credit) = (Decimal::ZERO, Decimal::ZERO);
        for account in fx.accounts.iter().filter(|a| accounts.contains(&a.id) && !a.is_virtual) {
            let (d, c) = direct_sum(&fx, account.id);
            debit += d;
            credit += c;
        }

        prop_assert_eq!(roots.iter().map(|r| r.debit.amount).sum::<Decimal>(), debit);
        prop_assert_eq!(roots.iter().map(|r| r.credit.amount).sum::<Decimal>(), credit);
    }

    #[test]
    fn prop_reparenting_moves_totals(
        amounts in prop::collection::vec((side(), amount()), 1..10),
    ) {
        let mut fx = Fixture::default();
        let left = fx.parent("Left", None);
        let right = fx.parent("Right", None);
        let moved = fx.parent("Moved", Some(left));
        let account = fx.account("Bank", moved, false);
        for (side, amount) in &amounts {
            fx.post(account, *side, *amount, false);
        }

        let before = Aggregator::new(&fx, Currency::Eur).parent_totals(left).unwrap();
        prop_assert_eq!(before, Aggregator::new(&fx, Currency::Eur).parent_totals(moved).unwrap());

        let idx = fx.parents.iter().position(|p| p.id == moved).unwrap();
        fx.parents[idx].parent = Some(right);

        let mut agg = Aggregator::new(&fx, Currency::Eur);
        prop_assert_eq!(agg.parent_totals(left).unwrap(), NodeTotals::zero(Currency::Eur));
        prop_assert_eq!(agg.parent_totals(right).unwrap(), before);
    }
}
