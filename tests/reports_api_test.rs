mod common;

use axum::http::StatusCode;
use common::{dec, local, BillFixture, TestApp};
use fnb_backoffice::{
    models::{bill::BillStatus, payment::PaymentStatus},
    services::reports::ReportKind,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use uuid::Uuid;

const RANGE: &str = "start_date=2024-03-01&end_date=2024-03-02";

struct Seeded {
    app: TestApp,
    store_id: Uuid,
    p1: Uuid,
    p2: Uuid,
    cashier: Uuid,
    member: Uuid,
    promo: Uuid,
}

/// Two paid bills inside 2024-03-01..=2024-03-02 (local), one paid bill just
/// after local midnight on 03-03 and a void bill inside the range.
async fn seeded() -> Seeded {
    let app = TestApp::new().await;
    let (company, _, store) = app.seed_outlet("ACME").await;
    let member = app.seed_member(company.id, "M-001", 0).await;
    let (p1, p2, cashier, promo) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    BillFixture::paid(company.id, &store, "B-1", local(2024, 3, 1, 10, 0))
        .cashier(cashier)
        .member(member.id)
        .tax(dec!(10))
        .item(p1, "P1", 2, dec!(30), dec!(10))
        .item(p2, "P2", 1, dec!(40), dec!(15))
        .promotion(promo, "Happy Hour", dec!(5), Decimal::ZERO)
        .payment("CASH", dec!(60), PaymentStatus::Success)
        .payment("QRIS", dec!(45), PaymentStatus::Success)
        .insert(&app)
        .await;

    BillFixture::paid(company.id, &store, "B-2", local(2024, 3, 2, 23, 30))
        .cashier(cashier)
        .item(p1, "P1", 1, dec!(30), dec!(10))
        .payment("CARD", dec!(30), PaymentStatus::Failed)
        .payment("CASH", dec!(30), PaymentStatus::Success)
        .insert(&app)
        .await;

    BillFixture::paid(company.id, &store, "B-3", local(2024, 3, 3, 0, 30))
        .cashier(cashier)
        .item(p2, "P2", 5, dec!(40), dec!(15))
        .payment("CASH", dec!(200), PaymentStatus::Success)
        .insert(&app)
        .await;

    BillFixture::paid(company.id, &store, "B-4", local(2024, 3, 1, 12, 0))
        .status(BillStatus::Void)
        .item(p1, "P1", 10, dec!(30), dec!(10))
        .payment("CASH", dec!(300), PaymentStatus::Success)
        .insert(&app)
        .await;

    Seeded {
        app,
        store_id: store.id,
        p1,
        p2,
        cashier,
        member: member.id,
        promo,
    }
}

async fn report(app: &TestApp, slug: &str, query: &str) -> Value {
    let (status, body) = app
        .get(&format!("/api/v1/analytics/{slug}?{query}"))
        .await;
    assert_eq!(status, StatusCode::OK, "{slug}: {body}");
    assert_eq!(body["success"], true);
    body["data"].clone()
}

fn results(data: &Value) -> &Vec<Value> {
    data["results"].as_array().expect("results array")
}

#[tokio::test]
async fn daily_sales_groups_by_business_date() {
    let s = seeded().await;
    let data = report(&s.app, "daily-sales", RANGE).await;

    assert_eq!(data["report"], "daily-sales");
    assert_eq!(data["period"]["start"], "2024-03-01");
    assert_eq!(data["period"]["end"], "2024-03-02");

    let rows = results(&data);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["date"], "2024-03-01");
    assert_eq!(rows[0]["bill_count"], 1);
    assert_eq!(dec(&rows[0]["net_sales"]), dec!(105));
    // 23:30 local stays on the 2nd; 00:30 on the 3rd is outside the range
    assert_eq!(rows[1]["date"], "2024-03-02");
    assert_eq!(dec(&rows[1]["net_sales"]), dec!(30));

    let summary = &data["summary"];
    assert_eq!(summary["bill_count"], 2);
    assert_eq!(dec(&summary["gross_sales"]), dec!(130));
    assert_eq!(dec(&summary["discount"]), dec!(5));
    assert_eq!(dec(&summary["net_sales"]), dec!(135));
    assert_eq!(dec(&summary["average_bill"]), dec!(67.5));
}

#[tokio::test]
async fn summary_totals_match_the_rows_for_every_report() {
    let s = seeded().await;
    let checks: [(&str, &str, &str); 6] = [
        ("daily-sales", "net_sales", "net_sales"),
        ("product-sales", "revenue", "total_revenue"),
        ("promotion-performance", "total_discount", "total_discount"),
        ("member-analytics", "total_spent", "total_spent"),
        ("inventory-cogs", "cogs", "total_cogs"),
        ("payment-methods", "total_amount", "total_amount"),
    ];

    for (slug, row_field, summary_field) in checks {
        let data = report(&s.app, slug, RANGE).await;
        let sum: Decimal = results(&data).iter().map(|r| dec(&r[row_field])).sum();
        assert_eq!(sum, dec(&data["summary"][summary_field]), "{slug}");
    }

    let data = report(&s.app, "cashier-performance", RANGE).await;
    let bills: u64 = results(&data)
        .iter()
        .map(|r| r["bill_count"].as_u64().unwrap())
        .sum();
    assert_eq!(data["summary"]["total_bills"].as_u64().unwrap(), bills);
}

#[tokio::test]
async fn product_and_cogs_reports_ignore_void_bills() {
    let s = seeded().await;

    let data = report(&s.app, "product-sales", RANGE).await;
    let rows = results(&data);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["product_id"], s.p1.to_string());
    assert_eq!(rows[0]["quantity"], 3);
    assert_eq!(dec(&rows[0]["revenue"]), dec!(90));
    assert_eq!(rows[0]["bill_count"], 2);
    assert_eq!(rows[1]["product_id"], s.p2.to_string());

    let data = report(&s.app, "inventory-cogs", RANGE).await;
    let rows = results(&data);
    assert_eq!(dec(&rows[0]["cogs"]), dec!(30));
    assert_eq!(dec(&rows[0]["gross_margin"]), dec!(60));
    assert_eq!(dec(&rows[0]["margin_percent"]), dec!(66.67));
    assert_eq!(dec(&data["summary"]["total_revenue"]), dec!(130));
    assert_eq!(dec(&data["summary"]["total_cogs"]), dec!(45));
}

#[tokio::test]
async fn payment_methods_count_successful_payments_only() {
    let s = seeded().await;
    let data = report(&s.app, "payment-methods", RANGE).await;

    let rows = results(&data);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["payment_method"], "CASH");
    assert_eq!(rows[0]["transaction_count"], 2);
    assert_eq!(dec(&rows[0]["total_amount"]), dec!(90));
    assert_eq!(dec(&rows[0]["percentage"]), dec!(66.67));
    assert_eq!(rows[1]["payment_method"], "QRIS");
    assert_eq!(dec(&rows[1]["percentage"]), dec!(33.33));
    assert_eq!(data["summary"]["total_transactions"], 3);

    let data = report(&s.app, "payment-methods", &format!("{RANGE}&payment_method=QRIS")).await;
    assert_eq!(results(&data).len(), 1);
}

#[tokio::test]
async fn member_cashier_and_promotion_reports() {
    let s = seeded().await;

    let data = report(&s.app, "member-analytics", RANGE).await;
    let rows = results(&data);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["member_id"], s.member.to_string());
    assert_eq!(rows[0]["visit_count"], 1);
    assert_eq!(rows[0]["first_visit"], "2024-03-01");

    let data = report(&s.app, "cashier-performance", RANGE).await;
    let rows = results(&data);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["cashier_id"], s.cashier.to_string());
    assert_eq!(rows[0]["bill_count"], 2);
    assert_eq!(dec(&rows[0]["total_sales"]), dec!(135));

    let data = report(&s.app, "promotion-performance", RANGE).await;
    let rows = results(&data);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["promotion_id"], s.promo.to_string());
    assert_eq!(rows[0]["usage_count"], 1);
    assert_eq!(dec(&rows[0]["total_discount"]), dec!(5));
}

#[tokio::test]
async fn filters_narrow_the_result() {
    let s = seeded().await;

    let data = report(
        &s.app,
        "product-sales",
        &format!("{RANGE}&product_id={}", s.p2),
    )
    .await;
    assert_eq!(results(&data).len(), 1);

    let data = report(
        &s.app,
        "daily-sales",
        &format!("{RANGE}&store_id={}", Uuid::new_v4()),
    )
    .await;
    assert!(results(&data).is_empty());
    assert_eq!(data["summary"]["bill_count"], 0);
    assert_eq!(dec(&data["summary"]["average_bill"]), Decimal::ZERO);

    let data = report(
        &s.app,
        "daily-sales",
        &format!("{RANGE}&store_id={}", s.store_id),
    )
    .await;
    assert_eq!(results(&data).len(), 2);
}

#[tokio::test]
async fn reports_answer_with_a_trailing_slash() {
    let s = seeded().await;
    let (status, body) = s
        .app
        .get(&format!("/api/v1/analytics/daily-sales/?{RANGE}"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_ranges_are_validation_errors() {
    let app = TestApp::new().await;

    for query in [
        "start_date=2024-03-01",
        "start_date=03/01/2024&end_date=2024-03-02",
        "start_date=2024-03-01&end_date=2024-03-02&store_id=abc",
    ] {
        let (status, body) = app
            .get(&format!("/api/v1/analytics/payment-methods?{query}"))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
        assert_eq!(body["code"], "validation_error", "{query}");
    }
}

#[tokio::test]
async fn every_report_rejects_an_inverted_range() {
    let app = TestApp::new().await;

    for kind in ReportKind::all() {
        let slug = kind.slug();
        let (status, body) = app
            .get(&format!(
                "/api/v1/analytics/{slug}?start_date=2024-03-05&end_date=2024-03-01"
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{slug}");
        assert_eq!(body["code"], "validation_error", "{slug}");
    }
}

#[tokio::test]
async fn out_of_calendar_years_are_validation_errors() {
    let app = TestApp::new().await;

    for query in [
        "start_date=2024-03-01&end_date=%2B262143-12-31",
        "start_date=-0001-01-01&end_date=2024-03-01",
        "start_date=0000-01-01&end_date=2024-03-01",
    ] {
        let (status, body) = app
            .get(&format!("/api/v1/analytics/daily-sales?{query}"))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
        assert_eq!(body["code"], "validation_error", "{query}");
    }

    let data = report(&app, "daily-sales", "start_date=9999-12-31&end_date=9999-12-31").await;
    assert!(results(&data).is_empty());
}

#[tokio::test]
async fn single_day_range_is_allowed() {
    let s = seeded().await;
    let data = report(
        &s.app,
        "daily-sales",
        "start_date=2024-03-03&end_date=2024-03-03",
    )
    .await;
    let rows = results(&data);
    assert_eq!(rows.len(), 1);
    assert_eq!(dec(&rows[0]["net_sales"]), dec!(200));
}
