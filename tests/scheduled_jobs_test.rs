mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{date, local, offset, BillFixture, TestApp};
use fnb_backoffice::{
    jobs::{Beat, JobInvocation, JobKind, JobRunner, Worker},
    message_queue::InMemoryMessageQueue,
    models::{
        job_run::{self, JobRunStatus},
        member,
        payment::PaymentStatus,
        promotion_log, report_snapshot,
    },
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

fn runner(app: &TestApp) -> JobRunner {
    JobRunner::new(app.state.db.clone(), &app.state.config)
}

async fn snapshot_count(app: &TestApp) -> u64 {
    report_snapshot::Entity::find().count(app.db()).await.unwrap()
}

#[tokio::test]
async fn invocation_past_its_window_is_recorded_as_expired() {
    let app = TestApp::new().await;
    let scheduled = local(2024, 3, 1, 23, 0);
    let invocation = JobInvocation::new(JobKind::GenerateDailyReports, scheduled);

    let run = runner(&app)
        .execute(&invocation, scheduled + Duration::hours(2))
        .await
        .unwrap();

    assert_eq!(run.status, JobRunStatus::Expired);
    assert!(run.finished_at.is_none());
    assert_eq!(snapshot_count(&app).await, 0);
    assert_eq!(job_run::Entity::find().count(app.db()).await.unwrap(), 1);
}

#[tokio::test]
async fn daily_reports_are_materialized_once_per_date() {
    let app = TestApp::new().await;
    let (company, _, store) = app.seed_outlet("ACME").await;
    BillFixture::paid(company.id, &store, "B-1", local(2024, 3, 1, 12, 0))
        .item(Uuid::new_v4(), "P1", 2, dec!(25), dec!(10))
        .payment("CASH", dec!(50), PaymentStatus::Success)
        .insert(&app)
        .await;

    let scheduled = local(2024, 3, 1, 23, 0);
    let invocation = JobInvocation::new(JobKind::GenerateDailyReports, scheduled);
    let runner = runner(&app);

    let run = runner
        .execute(&invocation, scheduled + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(run.status, JobRunStatus::Succeeded, "{:?}", run.detail);
    assert_eq!(snapshot_count(&app).await, 7);

    runner
        .execute(&invocation, scheduled + Duration::minutes(10))
        .await
        .unwrap();
    assert_eq!(snapshot_count(&app).await, 7);

    let daily = report_snapshot::Entity::find()
        .filter(report_snapshot::Column::ReportKind.eq("daily-sales"))
        .one(app.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(daily.report_date, date(2024, 3, 1));
    assert_eq!(daily.payload["summary"]["bill_count"], 1);
}

#[tokio::test]
async fn dry_run_jobs_leave_no_trace() {
    let app = TestApp::new().await;
    let scheduled = local(2024, 3, 1, 23, 0);
    let invocation = JobInvocation::new(JobKind::GenerateDailyReports, scheduled).dry_run(true);

    let run = runner(&app).execute(&invocation, scheduled).await.unwrap();
    assert_eq!(run.status, JobRunStatus::Succeeded);
    assert_eq!(snapshot_count(&app).await, 0);
    assert_eq!(job_run::Entity::find().count(app.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn points_expiry_job_uses_the_local_business_date() {
    let app = TestApp::new().await;
    let company = app.seed_company("ACME", 12).await;
    let m = app.seed_member(company.id, "M-001", 100).await;
    // Cutoff for business date 2024-12-31 is 2024-01-06
    app.seed_earn(m.id, 100, local(2024, 1, 6, 18, 0)).await;

    // Local midnight of the 31st is still the 30th in UTC
    let scheduled = local(2024, 12, 31, 0, 0);
    let invocation = JobInvocation::new(JobKind::ExpireMemberPoints, scheduled);
    let run = runner(&app).execute(&invocation, scheduled).await.unwrap();
    assert_eq!(run.status, JobRunStatus::Succeeded, "{:?}", run.detail);

    let member = member::Entity::find_by_id(m.id)
        .one(app.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(member.points, 0);
}

#[tokio::test]
async fn cleanup_purges_logs_past_retention() {
    let app = TestApp::new().await;
    let runner = runner(&app);
    let now = Utc::now();
    let retention = Duration::days(i64::from(runner.context().log_retention_days));

    for created_at in [now - retention - Duration::days(1), now - Duration::days(1)] {
        promotion_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            bill_id: Set(None),
            promotion_id: Set(None),
            status: Set("applied".to_string()),
            reason: Set(None),
            discount_amount: Set(Decimal::ZERO),
            created_at: Set(created_at),
        }
        .insert(app.db())
        .await
        .unwrap();
    }

    let run = runner
        .execute(&JobInvocation::new(JobKind::CleanupOldLogs, now), now)
        .await
        .unwrap();
    assert_eq!(run.status, JobRunStatus::Succeeded);
    assert_eq!(promotion_log::Entity::find().count(app.db()).await.unwrap(), 1);
}

#[tokio::test]
async fn sync_check_counts_stores_with_recent_bills() {
    let app = TestApp::new().await;
    let (company, brand, synced) = app.seed_outlet("ACME").await;
    app.seed_store(brand.id, "ACME-02").await;
    let now = Utc::now();
    BillFixture::paid(company.id, &synced, "B-1", now - Duration::minutes(30))
        .item(Uuid::new_v4(), "P1", 1, dec!(10), dec!(4))
        .insert(&app)
        .await;

    let run = runner(&app)
        .execute(&JobInvocation::new(JobKind::SyncHealthCheck, now), now)
        .await
        .unwrap();
    assert_eq!(run.status, JobRunStatus::Succeeded);
    assert!(run.detail.unwrap().starts_with("1 of 2 active stores"));
}

#[tokio::test]
async fn unreachable_sync_endpoint_fails_the_run() {
    let app = TestApp::new().await;
    let mut config = app.state.config.clone();
    config.sync_health_url = Some("http://127.0.0.1:9/health".to_string());
    config.sync_health_timeout_secs = 1;
    let runner = JobRunner::new(app.state.db.clone(), &config);

    let now = Utc::now();
    let run = runner
        .execute(&JobInvocation::new(JobKind::SyncHealthCheck, now), now)
        .await
        .unwrap();
    assert_eq!(run.status, JobRunStatus::Failed);
    assert!(run.detail.unwrap().contains("sync endpoint"));
}

#[tokio::test]
async fn worker_runs_what_the_beat_publishes() {
    let app = TestApp::new().await;
    let queue = InMemoryMessageQueue::new();
    let beat = Beat::new(Arc::new(queue.clone()), offset());
    let worker = Worker::new(
        Arc::new(queue.clone()),
        runner(&app),
        std::time::Duration::from_millis(10),
    );

    beat.publish(JobKind::CleanupOldLogs, Utc::now()).await.unwrap();
    let handle = worker.poll_once().await.unwrap().expect("an invocation");
    handle.await.unwrap();

    let runs = job_run::Entity::find()
        .filter(job_run::Column::Task.eq("jobs.cleanup_old_logs"))
        .all(app.db())
        .await
        .unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, JobRunStatus::Succeeded);

    assert!(worker.poll_once().await.unwrap().is_none());
}

#[tokio::test]
async fn worker_drops_stale_invocations_without_running_them() {
    let app = TestApp::new().await;
    let queue = InMemoryMessageQueue::new();
    let beat = Beat::new(Arc::new(queue.clone()), offset());
    let worker = Worker::new(
        Arc::new(queue.clone()),
        runner(&app),
        std::time::Duration::from_millis(10),
    );

    beat.publish(JobKind::SyncHealthCheck, Utc::now() - Duration::hours(1))
        .await
        .unwrap();
    worker.poll_once().await.unwrap().unwrap().await.unwrap();

    let run = job_run::Entity::find().one(app.db()).await.unwrap().unwrap();
    assert_eq!(run.status, JobRunStatus::Expired);
}
