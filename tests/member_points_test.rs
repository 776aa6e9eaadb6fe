mod common;

use common::{date, local, TestApp};
use fnb_backoffice::{
    models::{
        member,
        member_transaction::{self, TransactionType},
    },
    services::members::{expiry_cutoff, MemberExpiry},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

async fn points(app: &TestApp, member_id: Uuid) -> i32 {
    member::Entity::find_by_id(member_id)
        .one(app.db())
        .await
        .unwrap()
        .unwrap()
        .points
}

async fn ledger(app: &TestApp, member_id: Uuid) -> Vec<member_transaction::Model> {
    member_transaction::Entity::find()
        .filter(member_transaction::Column::MemberId.eq(member_id))
        .all(app.db())
        .await
        .unwrap()
}

#[tokio::test]
async fn earn_on_the_cutoff_date_expires_and_the_day_after_survives() {
    let app = TestApp::new().await;
    let company = app.seed_company("ACME", 12).await;
    let m = app.seed_member(company.id, "M-001", 150).await;

    // 12 months of 30 days before 2024-12-31 is 2024-01-06
    let old = app.seed_earn(m.id, 100, local(2024, 1, 6, 23, 59)).await;
    let fresh = app.seed_earn(m.id, 50, local(2024, 1, 7, 0, 0)).await;

    let summary = app
        .state
        .services
        .members
        .expire_points(date(2024, 12, 31), false)
        .await
        .unwrap();
    assert_eq!(summary.members_affected, 1);
    assert_eq!(summary.transactions_expired, 1);
    assert_eq!(summary.points_expired, 100);
    assert_eq!(points(&app, m.id).await, 50);

    let entries = ledger(&app, m.id).await;
    let by_id = |id: Uuid| entries.iter().find(|t| t.id == id).unwrap();
    assert!(by_id(old.id).is_expired);
    assert!(by_id(old.id).expired_at.is_some());
    assert!(!by_id(fresh.id).is_expired);

    let debit: Vec<_> = entries
        .iter()
        .filter(|t| t.transaction_type == TransactionType::Expired)
        .collect();
    assert_eq!(debit.len(), 1);
    assert_eq!(debit[0].points_change, -100);
    assert_eq!(debit[0].points_before, 150);
    assert_eq!(debit[0].points_after, 50);
}

#[tokio::test]
async fn second_run_on_the_same_day_is_a_no_op() {
    let app = TestApp::new().await;
    let company = app.seed_company("ACME", 12).await;
    let m = app.seed_member(company.id, "M-001", 100).await;
    app.seed_earn(m.id, 100, local(2023, 6, 1, 12, 0)).await;

    let service = &app.state.services.members;
    service.expire_points(date(2024, 12, 31), false).await.unwrap();
    let again = service.expire_points(date(2024, 12, 31), false).await.unwrap();

    assert_eq!(again.members_affected, 0);
    assert_eq!(again.points_expired, 0);
    assert_eq!(points(&app, m.id).await, 0);
    assert_eq!(ledger(&app, m.id).await.len(), 2);
}

#[tokio::test]
async fn debit_never_takes_a_member_below_zero() {
    let app = TestApp::new().await;
    let company = app.seed_company("ACME", 12).await;
    // Most of the earned points were already redeemed
    let m = app.seed_member(company.id, "M-001", 30).await;
    app.seed_earn(m.id, 100, local(2023, 6, 1, 12, 0)).await;

    let summary = app
        .state
        .services
        .members
        .expire_points(date(2024, 12, 31), false)
        .await
        .unwrap();
    assert_eq!(summary.points_expired, 30);
    assert_eq!(points(&app, m.id).await, 0);
}

#[tokio::test]
async fn dry_run_reports_without_writing() {
    let app = TestApp::new().await;
    let company = app.seed_company("ACME", 12).await;
    let m = app.seed_member(company.id, "M-001", 100).await;
    let earn = app.seed_earn(m.id, 100, local(2023, 6, 1, 12, 0)).await;

    let summary = app
        .state
        .services
        .members
        .expire_points(date(2024, 12, 31), true)
        .await
        .unwrap();
    assert!(summary.dry_run);
    assert_eq!(summary.points_expired, 100);

    assert_eq!(points(&app, m.id).await, 100);
    let entries = ledger(&app, m.id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, earn.id);
    assert!(!entries[0].is_expired);
}

#[tokio::test]
async fn companies_without_expiry_are_skipped() {
    let app = TestApp::new().await;
    let company = app.seed_company("NOEXP", 0).await;
    let m = app.seed_member(company.id, "M-001", 100).await;
    app.seed_earn(m.id, 100, local(2020, 1, 1, 12, 0)).await;

    let summary = app
        .state
        .services
        .members
        .expire_points(date(2024, 12, 31), false)
        .await
        .unwrap();
    assert_eq!(summary.companies_processed, 0);
    assert_eq!(points(&app, m.id).await, 100);
}

#[tokio::test]
async fn settling_a_member_twice_never_debits_twice() {
    let app = TestApp::new().await;
    let company = app.seed_company("ACME", 12).await;
    let m = app.seed_member(company.id, "M-001", 150).await;
    app.seed_earn(m.id, 100, local(2023, 6, 1, 12, 0)).await;
    let fresh = app.seed_earn(m.id, 50, local(2024, 12, 1, 12, 0)).await;

    let service = &app.state.services.members;
    let cutoff = expiry_cutoff(date(2024, 12, 31), 12);
    let first = service.expire_member(m.id, cutoff, false).await.unwrap();
    assert_eq!(
        first,
        MemberExpiry {
            transactions: 1,
            points: 100
        }
    );

    // A run that picked this member before the first one committed
    let second = service.expire_member(m.id, cutoff, false).await.unwrap();
    assert_eq!(second, MemberExpiry::default());

    assert_eq!(points(&app, m.id).await, 50);
    let entries = ledger(&app, m.id).await;
    let debits = entries
        .iter()
        .filter(|t| t.transaction_type == TransactionType::Expired)
        .count();
    assert_eq!(debits, 1);
    assert!(!entries.iter().find(|t| t.id == fresh.id).unwrap().is_expired);
}

#[tokio::test]
async fn earns_flagged_elsewhere_are_not_debited() {
    let app = TestApp::new().await;
    let company = app.seed_company("ACME", 12).await;
    let m = app.seed_member(company.id, "M-001", 150).await;
    let old = app.seed_earn(m.id, 100, local(2023, 6, 1, 12, 0)).await;

    let mut flagged: member_transaction::ActiveModel = old.into();
    flagged.is_expired = Set(true);
    flagged.update(app.db()).await.unwrap();

    let summary = app
        .state
        .services
        .members
        .expire_points(date(2024, 12, 31), false)
        .await
        .unwrap();
    assert_eq!(summary.members_affected, 0);
    assert_eq!(summary.points_expired, 0);
    assert_eq!(points(&app, m.id).await, 150);
    assert_eq!(ledger(&app, m.id).await.len(), 1);
}

#[tokio::test]
async fn inactive_members_are_skipped() {
    let app = TestApp::new().await;
    let company = app.seed_company("ACME", 12).await;
    let m = app.seed_member(company.id, "M-001", 100).await;
    let earn = app.seed_earn(m.id, 100, local(2023, 6, 1, 12, 0)).await;

    let mut inactive: member::ActiveModel = m.clone().into();
    inactive.is_active = Set(false);
    inactive.update(app.db()).await.unwrap();

    let summary = app
        .state
        .services
        .members
        .expire_points(date(2024, 12, 31), false)
        .await
        .unwrap();
    assert_eq!(summary.members_affected, 0);
    assert_eq!(points(&app, m.id).await, 100);
    let entries = ledger(&app, m.id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, earn.id);
    assert!(!entries[0].is_expired);
}
