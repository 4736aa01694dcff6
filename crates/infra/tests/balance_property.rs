use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use cashbook_infra::audit::InMemoryAuditLog;
use cashbook_infra::ledger_store::{InMemoryLedgerStore, LedgerStore};
use cashbook_infra::stats_cache::StatsCache;
use cashbook_infra::storage::LedgerTables;
use cashbook_infra::{LedgerConfig, OperationContext};
use cashbook_ledger::{MovementKind, NewMovement, balance_of};

#[derive(Debug, Clone)]
enum Op {
    Record(MovementKind, i64),
    Delete(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (
            prop_oneof![Just(MovementKind::Entry), Just(MovementKind::Exit)],
            1i64..1_000_000i64
        )
            .prop_map(|(kind, cents)| Op::Record(kind, cents)),
        1 => any::<usize>().prop_map(Op::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// Property: after any sequence of records and deletes, the balance equals
    /// a from-scratch sum over the listed movements.
    #[test]
    fn balance_matches_scan_after_any_sequence(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let config = LedgerConfig::default();
        let store = InMemoryLedgerStore::new(
            Arc::new(LedgerTables::new()),
            Arc::new(InMemoryAuditLog::new()),
            Arc::new(StatsCache::new(config.stats_ttl())),
            config,
        );
        let ctx = OperationContext::new("prop");
        let mut live = Vec::new();

        for op in ops {
            match op {
                Op::Record(kind, cents) => {
                    let id = store
                        .record_movement(&ctx, NewMovement::new(kind, Decimal::new(cents, 2), "p"))
                        .unwrap();
                    live.push(id);
                }
                Op::Delete(pick) if !live.is_empty() => {
                    let id = live.remove(pick % live.len());
                    store.delete_movement(&ctx, id).unwrap();
                }
                Op::Delete(_) => {}
            }

            let movements: Vec<_> = live.iter().map(|id| store.get_movement(*id).unwrap()).collect();
            prop_assert_eq!(store.get_balance().unwrap(), balance_of(&movements).unwrap());
        }

        prop_assert!(store.reconcile().unwrap().is_consistent());
        prop_assert_eq!(store.summary().unwrap().movement_count, live.len() as u64);
    }
}
