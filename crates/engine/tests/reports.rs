use chrono::NaiveDate;
use sea_orm::Database;

use engine::{
    CreateEntryCmd, DateFilter, Dimension, Engine, EngineError, EntryKind, MoneyCents, NewItem,
    Origin, OutstandingSort, PaymentMethod, PaymentStatus, Settlement,
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

async fn unpaid_expense(
    engine: &Engine,
    vendor: &str,
    on: NaiveDate,
    due: NaiveDate,
    amount: i64,
) {
    engine
        .create_entry(
            CreateEntryCmd::new(
                "alice",
                EntryKind::Expense,
                vendor,
                on,
                Settlement::Unpaid { due_date: due },
            )
            .item(NewItem::new("line", 1, MoneyCents::new(amount))),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn overdue_days_count_from_the_due_date() {
    let engine = engine_with_db().await;
    let as_of = date(2026, 3, 15);

    unpaid_expense(&engine, "yesterday", date(2026, 3, 1), date(2026, 3, 14), 100).await;
    unpaid_expense(&engine, "today", date(2026, 3, 1), date(2026, 3, 15), 100).await;
    unpaid_expense(&engine, "tomorrow", date(2026, 3, 1), date(2026, 3, 16), 100).await;

    let outstanding = engine
        .list_outstanding("alice", None, OutstandingSort::DueDate, as_of)
        .await
        .unwrap();
    assert_eq!(outstanding.len(), 3);
    assert_eq!(outstanding[0].entry.vendor, "yesterday");
    assert_eq!(outstanding[0].overdue_days, Some(1));
    assert_eq!(outstanding[1].overdue_days, Some(0));
    assert_eq!(outstanding[2].overdue_days, Some(-1));
}

#[tokio::test]
async fn outstanding_sorts_and_narrows_by_status() {
    let engine = engine_with_db().await;
    let as_of = date(2026, 3, 15);

    unpaid_expense(&engine, "bakery", date(2026, 3, 1), date(2026, 3, 20), 5_000).await;
    unpaid_expense(&engine, "atelier", date(2026, 3, 2), date(2026, 3, 10), 20_000).await;
    engine
        .create_entry(
            CreateEntryCmd::new(
                "alice",
                EntryKind::Expense,
                "cafe",
                date(2026, 3, 3),
                Settlement::PartiallyPaid {
                    paid: MoneyCents::new(9_000),
                    method: PaymentMethod::Cash,
                    reference: None,
                    due_date: date(2026, 3, 12),
                },
            )
            .item(NewItem::new("catering", 1, MoneyCents::new(10_000))),
        )
        .await
        .unwrap();
    // Fully paid entries never show up.
    engine
        .create_entry(
            CreateEntryCmd::new(
                "alice",
                EntryKind::Expense,
                "kiosk",
                date(2026, 3, 4),
                Settlement::Paid {
                    method: PaymentMethod::Cash,
                    reference: None,
                },
            )
            .item(NewItem::new("paper", 1, MoneyCents::new(300))),
        )
        .await
        .unwrap();

    let by_payable = engine
        .list_outstanding("alice", None, OutstandingSort::Payable, as_of)
        .await
        .unwrap();
    let payables: Vec<i64> = by_payable.iter().map(|o| o.payable.cents()).collect();
    assert_eq!(payables, vec![20_000, 5_000, 1_000]);

    let by_vendor = engine
        .list_outstanding("alice", None, OutstandingSort::Vendor, as_of)
        .await
        .unwrap();
    let vendors: Vec<&str> = by_vendor.iter().map(|o| o.entry.vendor.as_str()).collect();
    assert_eq!(vendors, vec!["atelier", "bakery", "cafe"]);

    let partial_only = engine
        .list_outstanding(
            "alice",
            Some(PaymentStatus::PartiallyPaid),
            OutstandingSort::DueDate,
            as_of,
        )
        .await
        .unwrap();
    assert_eq!(partial_only.len(), 1);
    assert_eq!(partial_only[0].entry.vendor, "cafe");

    let err = engine
        .list_outstanding("alice", Some(PaymentStatus::Paid), OutstandingSort::DueDate, as_of)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn category_breakdown_computes_percentage_shares() {
    let engine = engine_with_db().await;

    engine
        .create_entry(
            CreateEntryCmd::new(
                "alice",
                EntryKind::Expense,
                "shop",
                date(2026, 3, 5),
                Settlement::Paid {
                    method: PaymentMethod::Cash,
                    reference: None,
                },
            )
            .item(NewItem::new("one", 1, MoneyCents::new(10_000)).category("a"))
            .item(NewItem::new("two", 1, MoneyCents::new(5_000)).category("a")),
        )
        .await
        .unwrap();
    engine
        .create_entry(
            CreateEntryCmd::new(
                "alice",
                EntryKind::Expense,
                "shop",
                date(2026, 3, 6),
                Settlement::Paid {
                    method: PaymentMethod::Cash,
                    reference: None,
                },
            )
            .item(NewItem::new("three", 1, MoneyCents::new(5_000)).category("b")),
        )
        .await
        .unwrap();

    let rows = engine
        .aggregate("alice", Dimension::Category, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].key, "a");
    assert_eq!(rows[0].amount, MoneyCents::new(15_000));
    assert_eq!(rows[0].percentage, 75.0);
    assert_eq!(rows[1].key, "b");
    assert_eq!(rows[1].amount, MoneyCents::new(5_000));
    assert_eq!(rows[1].percentage, 25.0);

    let total_share: f64 = rows.iter().map(|r| r.percentage).sum();
    assert!((total_share - 100.0).abs() <= 0.01 * rows.len() as f64);
}

#[tokio::test]
async fn vendor_month_and_item_dimensions() {
    let engine = engine_with_db().await;

    for (vendor, month, amount) in [("shop", 1, 6_000), ("shop", 2, 3_000), ("cafe", 2, 1_000)] {
        engine
            .create_entry(
                CreateEntryCmd::new(
                    "alice",
                    EntryKind::Expense,
                    vendor,
                    date(2026, month, 10),
                    Settlement::Paid {
                        method: PaymentMethod::Cash,
                        reference: None,
                    },
                )
                .item(NewItem::new("coffee", 2, MoneyCents::new(amount / 2))),
            )
            .await
            .unwrap();
    }

    let by_vendor = engine
        .aggregate("alice", Dimension::Vendor, None)
        .await
        .unwrap();
    assert_eq!(by_vendor[0].key, "shop");
    assert_eq!(by_vendor[0].amount, MoneyCents::new(9_000));
    assert_eq!(by_vendor[0].count, Some(2));
    assert_eq!(by_vendor[1].count, Some(1));

    let by_month = engine
        .aggregate("alice", Dimension::Month, None)
        .await
        .unwrap();
    assert_eq!(by_month[0].key, "2026-01");
    assert_eq!(by_month[1].key, "2026-02");
    assert_eq!(by_month[1].amount, MoneyCents::new(4_000));

    let by_item = engine
        .aggregate("alice", Dimension::Item, None)
        .await
        .unwrap();
    assert_eq!(by_item.len(), 1);
    assert_eq!(by_item[0].key, "coffee");
    assert_eq!(by_item[0].quantity, Some(6));
}

#[tokio::test]
async fn date_filter_is_half_open_and_empty_windows_yield_nothing() {
    let engine = engine_with_db().await;

    unpaid_expense(&engine, "jan", date(2026, 1, 31), date(2026, 2, 28), 1_000).await;
    unpaid_expense(&engine, "feb", date(2026, 2, 1), date(2026, 3, 1), 2_000).await;

    let jan = engine
        .aggregate("alice", Dimension::Vendor, Some(DateFilter::month(2026, 1)))
        .await
        .unwrap();
    assert_eq!(jan.len(), 1);
    assert_eq!(jan[0].key, "jan");

    let year = engine
        .aggregate("alice", Dimension::Vendor, Some(DateFilter::year(2026)))
        .await
        .unwrap();
    assert_eq!(year.len(), 2);

    let empty = engine
        .aggregate("alice", Dimension::Vendor, Some(DateFilter::year(2020)))
        .await
        .unwrap();
    assert!(empty.is_empty());

    let err = engine
        .aggregate("alice", Dimension::Vendor, Some(DateFilter::month(2026, 13)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn table_rows_flatten_items_with_entry_context() {
    let engine = engine_with_db().await;

    let entry = engine
        .create_entry(
            CreateEntryCmd::new(
                "alice",
                EntryKind::Expense,
                "market",
                date(2026, 3, 10),
                Settlement::Paid {
                    method: PaymentMethod::Cash,
                    reference: None,
                },
            )
            .item(NewItem::new("apples", 3, MoneyCents::new(120)).category("fruit"))
            .item(NewItem::new("soap", 1, MoneyCents::new(250)))
            .origin(Origin::Ocr),
        )
        .await
        .unwrap();

    let rows = engine.table_rows("alice", None).await.unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.entry_id, entry.id);
        assert_eq!(row.vendor, "market");
        assert_eq!(row.entry_total, MoneyCents::new(610));
        assert_eq!(row.origin, Origin::Ocr);
    }
    assert!(rows.iter().any(|r| r.item_name == "apples" && r.quantity == 3));
}
