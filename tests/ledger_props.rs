use chrono::Utc;
use proptest::prelude::*;

use ops_backend::models::inventory::{
    LedgerOp, MovementDraft, ReservationPlan, StockBalance, StockMovement, StockRecord,
};

const ORDER_ID: i64 = 77;

fn op_strategy() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        (-3..40i32).prop_map(LedgerOp::Receive),
        (-3..40i32).prop_map(LedgerOp::Issue),
        (-20..60i32).prop_map(LedgerOp::Adjust),
        (-3..40i32).prop_map(LedgerOp::Reserve),
        (-3..40i32).prop_map(LedgerOp::Unreserve),
        (-3..40i32).prop_map(LedgerOp::Ship),
        (-3..40i32).prop_map(LedgerOp::AcceptProduction),
        (-3..40i32).prop_map(LedgerOp::Backorder),
    ]
}

// Mesma convenção do ledger: expedição e reserva levam o pedido; baixa manual não.
fn order_for(op: LedgerOp) -> Option<i64> {
    match op {
        LedgerOp::Ship(_) | LedgerOp::Reserve(_) | LedgerOp::Unreserve(_) | LedgerOp::AcceptProduction(_) => {
            Some(ORDER_ID)
        }
        _ => None,
    }
}

fn journal_entry(id: i64, draft: MovementDraft, order_id: Option<i64>) -> StockMovement {
    StockMovement {
        id,
        warehouse: "MSK".into(),
        product_id: 1,
        movement_type: draft.movement_type,
        qty: draft.qty,
        order_id,
        note: None,
        created_at: Utc::now(),
    }
}

proptest! {
    #[test]
    fn counters_never_go_negative(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut record = StockRecord::empty("MSK", 1);
        for op in ops {
            let before = record.clone();
            if op.apply(&mut record).is_err() {
                // Operação recusada não altera nada.
                prop_assert_eq!(&record, &before);
            }
            prop_assert!(record.qty >= 0);
            prop_assert!(record.reserved_qty >= 0);
            prop_assert!(record.on_order_qty >= 0);
        }
    }

    #[test]
    fn replaying_the_journal_rebuilds_the_balance(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut record = StockRecord::empty("MSK", 1);
        let mut journal = Vec::new();

        for op in ops {
            if let Ok(Some(draft)) = op.apply(&mut record) {
                journal.push(journal_entry(journal.len() as i64 + 1, draft, order_for(op)));
            }
        }

        prop_assert_eq!(StockBalance::replay(&journal), record.balance());
    }

    #[test]
    fn reservation_splits_request_exactly(available in -5..100i32, requested in 0..100i32) {
        let plan = ReservationPlan::new(available, requested);
        prop_assert_eq!(plan.can_reserve + plan.missing, requested);
        prop_assert!(plan.can_reserve <= available.max(0));
        prop_assert!(plan.missing >= 0);
    }

    #[test]
    fn reserving_the_plan_always_succeeds(qty in 0..100i32, requested in 1..100i32) {
        let mut record = StockRecord { qty, ..StockRecord::empty("MSK", 1) };
        let plan = ReservationPlan::new(record.qty, requested);
        if plan.can_reserve > 0 {
            prop_assert!(LedgerOp::Reserve(plan.can_reserve).apply(&mut record).is_ok());
        }
        prop_assert_eq!(record.qty + record.reserved_qty, qty);
    }
}
