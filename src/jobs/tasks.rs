//! Job bodies. Each returns a short detail line stored on the `job_run` row.

use crate::{
    common::DateRange,
    config::AppConfig,
    db::DbPool,
    errors::ServiceError,
    models::{bill, job_run, promotion_log, report_snapshot, store},
    services::{
        members::MemberPointsService,
        reports::{ReportFilter, ReportKind, ReportService},
    },
};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use metrics::gauge;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Everything a job body needs besides its invocation.
#[derive(Clone)]
pub struct JobContext {
    pub db_pool: Arc<DbPool>,
    pub offset: FixedOffset,
    pub log_retention_days: u32,
    pub sync_stale_after_hours: u32,
    pub sync_health_url: Option<String>,
    pub sync_health_timeout: std::time::Duration,
}

impl JobContext {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            db_pool,
            offset: config.business_offset(),
            log_retention_days: config.log_retention_days,
            sync_stale_after_hours: config.sync_stale_after_hours,
            sync_health_url: config.sync_health_url.clone(),
            sync_health_timeout: std::time::Duration::from_secs(config.sync_health_timeout_secs),
        }
    }
}

pub async fn expire_member_points(
    ctx: &JobContext,
    date: NaiveDate,
    dry_run: bool,
) -> Result<String, ServiceError> {
    let summary = MemberPointsService::new(ctx.db_pool.clone(), ctx.offset)
        .expire_points(date, dry_run)
        .await?;
    Ok(serde_json::to_string(&summary)?)
}

/// Materializes every report for one business date, replacing earlier
/// snapshots of the same report and date.
pub async fn generate_daily_reports(
    ctx: &JobContext,
    date: NaiveDate,
    dry_run: bool,
) -> Result<String, ServiceError> {
    let reports = ReportService::new(ctx.db_pool.clone(), ctx.offset);
    let filter = ReportFilter::for_range(DateRange::single(date));
    let mut written = 0;

    for kind in ReportKind::all() {
        let data = reports.run(kind, &filter).await?;
        let payload = serde_json::to_value(&data)?;
        if dry_run {
            continue;
        }

        let txn = ctx.db_pool.begin().await?;
        report_snapshot::Entity::delete_many()
            .filter(report_snapshot::Column::ReportKind.eq(kind.slug()))
            .filter(report_snapshot::Column::ReportDate.eq(date))
            .exec(&txn)
            .await?;
        report_snapshot::ActiveModel {
            id: Set(Uuid::new_v4()),
            report_kind: Set(kind.slug().to_string()),
            report_date: Set(date),
            payload: Set(payload),
            generated_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;
        written += 1;
    }

    info!(%date, written, dry_run, "daily report snapshots generated");
    Ok(format!("{} report snapshots for {}", written, date))
}

/// Flags active stores whose POS has not synced bills recently and probes
/// the sync endpoint when one is configured.
pub async fn sync_health_check(
    ctx: &JobContext,
    now: DateTime<Utc>,
) -> Result<String, ServiceError> {
    let db = &*ctx.db_pool;
    let since = now - Duration::hours(i64::from(ctx.sync_stale_after_hours));

    let synced: HashSet<Uuid> = bill::Entity::find()
        .select_only()
        .column(bill::Column::StoreId)
        .filter(bill::Column::SyncedAt.gte(since))
        .distinct()
        .into_tuple::<Uuid>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let stores = store::Entity::find()
        .filter(store::Column::IsActive.eq(true))
        .all(db)
        .await?;
    let stale: Vec<&str> = stores
        .iter()
        .filter(|s| !synced.contains(&s.id))
        .map(|s| s.store_code.as_str())
        .collect();

    gauge!("fnb_jobs.stale_stores", stale.len() as f64);
    if !stale.is_empty() {
        warn!(stores = ?stale, hours = ctx.sync_stale_after_hours, "stores without a recent sync");
    }

    if let Some(url) = ctx.sync_health_url.as_deref() {
        probe_sync_endpoint(url, ctx.sync_health_timeout).await?;
    }

    Ok(format!(
        "{} of {} active stores synced in the last {}h",
        stores.len() - stale.len(),
        stores.len(),
        ctx.sync_stale_after_hours
    ))
}

async fn probe_sync_endpoint(url: &str, timeout: std::time::Duration) -> Result<(), ServiceError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ServiceError::InternalError(format!("http client: {}", e)))?;

    let response = client.get(url).send().await.map_err(|e| {
        ServiceError::ExternalServiceError(format!("sync endpoint {} unreachable: {}", url, e))
    })?;
    if !response.status().is_success() {
        return Err(ServiceError::ExternalServiceError(format!(
            "sync endpoint {} returned {}",
            url,
            response.status()
        )));
    }
    Ok(())
}

/// Purges promotion logs and job run records past the retention window.
pub async fn cleanup_old_logs(
    ctx: &JobContext,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<String, ServiceError> {
    let db = &*ctx.db_pool;
    let cutoff = now - Duration::days(i64::from(ctx.log_retention_days));

    let (promotion_logs, job_runs) = if dry_run {
        (
            promotion_log::Entity::find()
                .filter(promotion_log::Column::CreatedAt.lt(cutoff))
                .count(db)
                .await?,
            job_run::Entity::find()
                .filter(job_run::Column::StartedAt.lt(cutoff))
                .count(db)
                .await?,
        )
    } else {
        (
            promotion_log::Entity::delete_many()
                .filter(promotion_log::Column::CreatedAt.lt(cutoff))
                .exec(db)
                .await?
                .rows_affected,
            job_run::Entity::delete_many()
                .filter(job_run::Column::StartedAt.lt(cutoff))
                .exec(db)
                .await?
                .rows_affected,
        )
    };

    info!(promotion_logs, job_runs, %cutoff, dry_run, "old logs cleaned up");
    Ok(format!(
        "{} promotion logs and {} job runs older than {}",
        promotion_logs,
        job_runs,
        cutoff.format("%Y-%m-%d")
    ))
}
