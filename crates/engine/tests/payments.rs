use chrono::NaiveDate;
use sea_orm::Database;
use uuid::Uuid;

use engine::{
    CreateEntryCmd, Engine, EngineError, EntryKind, MoneyCents, NewItem, PaymentMethod,
    PaymentStatus, RecordPaymentCmd, Settlement,
};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// An unpaid expense of 100.00 owned by `alice`.
async fn unpaid_entry(engine: &Engine) -> Uuid {
    engine
        .create_entry(
            CreateEntryCmd::new(
                "alice",
                EntryKind::Expense,
                "landlord",
                date(2026, 3, 1),
                Settlement::Unpaid {
                    due_date: date(2026, 3, 31),
                },
            )
            .item(NewItem::new("rent", 1, MoneyCents::new(10_000))),
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn partial_then_full_payment_walks_the_status_ladder() {
    let engine = engine_with_db().await;
    let entry_id = unpaid_entry(&engine).await;

    let entry = engine
        .record_payment(RecordPaymentCmd::new(
            "alice",
            entry_id,
            MoneyCents::new(4_000),
        ))
        .await
        .unwrap();
    assert_eq!(entry.paid, MoneyCents::new(4_000));
    assert_eq!(entry.status, PaymentStatus::PartiallyPaid);
    // Still owing, the due date stays.
    assert_eq!(entry.due_date, Some(date(2026, 3, 31)));

    let entry = engine
        .record_payment(
            RecordPaymentCmd::new("alice", entry_id, MoneyCents::new(6_000))
                .method(PaymentMethod::Card)
                .reference("POS-1234"),
        )
        .await
        .unwrap();
    assert_eq!(entry.paid, MoneyCents::new(10_000));
    assert_eq!(entry.status, PaymentStatus::Paid);
    assert_eq!(entry.due_date, None);
    assert_eq!(entry.payments.len(), 2);

    // Payments are the provenance of `paid`.
    let sum: i64 = entry.payments.iter().map(|p| p.amount.cents()).sum();
    assert_eq!(sum, entry.paid.cents());
}

#[tokio::test]
async fn overpayment_is_rejected_and_leaves_the_entry_untouched() {
    let engine = engine_with_db().await;
    let entry_id = unpaid_entry(&engine).await;

    let err = engine
        .record_payment(RecordPaymentCmd::new(
            "alice",
            entry_id,
            MoneyCents::new(12_000),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let entry = engine.entry("alice", entry_id).await.unwrap();
    assert_eq!(entry.paid, MoneyCents::ZERO);
    assert_eq!(entry.status, PaymentStatus::Unpaid);
    assert!(entry.payments.is_empty());

    // Paying exactly the outstanding amount is fine.
    engine
        .record_payment(RecordPaymentCmd::new(
            "alice",
            entry_id,
            MoneyCents::new(10_000),
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn concurrent_partial_payments_both_land() {
    let engine = engine_with_db().await;
    let entry_id = unpaid_entry(&engine).await;

    let (a, b) = tokio::join!(
        engine.record_payment(RecordPaymentCmd::new(
            "alice",
            entry_id,
            MoneyCents::new(3_000),
        )),
        engine.record_payment(RecordPaymentCmd::new(
            "alice",
            entry_id,
            MoneyCents::new(4_000),
        )),
    );
    a.unwrap();
    b.unwrap();

    let entry = engine.entry("alice", entry_id).await.unwrap();
    assert_eq!(entry.paid, MoneyCents::new(7_000));
    assert_eq!(entry.status, PaymentStatus::PartiallyPaid);
    assert_eq!(entry.payments.len(), 2);
}

#[tokio::test]
async fn non_cash_payment_requires_a_reference() {
    let engine = engine_with_db().await;
    let entry_id = unpaid_entry(&engine).await;

    let err = engine
        .record_payment(
            RecordPaymentCmd::new("alice", entry_id, MoneyCents::new(1_000))
                .method(PaymentMethod::BankTransfer),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(violations) = err else {
        panic!("expected validation error");
    };
    assert!(violations.iter().any(|v| v.field == "reference"));
}

#[tokio::test]
async fn zero_and_negative_amounts_are_rejected() {
    let engine = engine_with_db().await;
    let entry_id = unpaid_entry(&engine).await;

    for amount in [MoneyCents::ZERO, MoneyCents::new(-500)] {
        let err = engine
            .record_payment(RecordPaymentCmd::new("alice", entry_id, amount))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}

#[tokio::test]
async fn paying_a_foreign_entry_is_not_found() {
    let engine = engine_with_db().await;
    let entry_id = unpaid_entry(&engine).await;

    let err = engine
        .record_payment(RecordPaymentCmd::new(
            "bob",
            entry_id,
            MoneyCents::new(1_000),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}
