use super::{
    tasks::{self, JobContext},
    JobInvocation, JobKind,
};
use crate::{
    common::business_date,
    config::AppConfig,
    db::DbPool,
    errors::ServiceError,
    models::job_run::{self, JobRunStatus},
    tracing::{scope_request_id, RequestId},
};
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Executes job invocations and records every outcome in `job_run`.
#[derive(Clone)]
pub struct JobRunner {
    ctx: Arc<JobContext>,
}

impl JobRunner {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            ctx: Arc::new(JobContext::new(db_pool, config)),
        }
    }

    pub fn context(&self) -> &JobContext {
        &self.ctx
    }

    /// Runs `invocation` as of `now`.
    ///
    /// An invocation past its expiry is recorded as `expired` without running
    /// the body. A failing body is recorded as `failed` and not retried. Only
    /// a failure to write the record itself is returned as an error. Dry runs
    /// are not persisted.
    #[instrument(
        skip(self, invocation),
        fields(job = invocation.job.name(), task = invocation.job.task(), scheduled_for = %invocation.scheduled_for)
    )]
    pub async fn execute(
        &self,
        invocation: &JobInvocation,
        now: DateTime<Utc>,
    ) -> Result<job_run::Model, ServiceError> {
        if invocation.is_expired(now) {
            warn!(expires_at = %invocation.expires_at, "discarding expired job invocation");
            counter!("fnb_jobs.runs", 1, "job" => invocation.job.name(), "status" => "expired");
            return self
                .record(
                    invocation,
                    now,
                    None,
                    JobRunStatus::Expired,
                    Some(format!("expired at {}", invocation.expires_at.to_rfc3339())),
                )
                .await;
        }

        info!(dry_run = invocation.dry_run, "job started");
        let started = Instant::now();
        let run_id = RequestId::for_job(invocation.job.name(), invocation.scheduled_for);
        let outcome = scope_request_id(run_id, self.dispatch(invocation, now)).await;
        let finished_at = now + Duration::from_std(started.elapsed()).unwrap_or_else(|_| Duration::zero());

        let (status, detail) = match outcome {
            Ok(detail) => {
                info!(elapsed = ?started.elapsed(), %detail, "job finished");
                (JobRunStatus::Succeeded, detail)
            }
            Err(e) => {
                error!(error = %e, "job failed");
                (JobRunStatus::Failed, e.to_string())
            }
        };
        counter!(
            "fnb_jobs.runs",
            1,
            "job" => invocation.job.name(),
            "status" => if status == JobRunStatus::Succeeded { "succeeded" } else { "failed" }
        );

        self.record(invocation, now, Some(finished_at), status, Some(detail))
            .await
    }

    async fn dispatch(
        &self,
        invocation: &JobInvocation,
        now: DateTime<Utc>,
    ) -> Result<String, ServiceError> {
        let ctx = &*self.ctx;
        let date = invocation
            .business_date
            .unwrap_or_else(|| business_date(invocation.scheduled_for, ctx.offset));

        match invocation.job {
            JobKind::ExpireMemberPoints => {
                tasks::expire_member_points(ctx, date, invocation.dry_run).await
            }
            JobKind::GenerateDailyReports => {
                tasks::generate_daily_reports(ctx, date, invocation.dry_run).await
            }
            JobKind::SyncHealthCheck => tasks::sync_health_check(ctx, now).await,
            JobKind::CleanupOldLogs => tasks::cleanup_old_logs(ctx, now, invocation.dry_run).await,
        }
    }

    async fn record(
        &self,
        invocation: &JobInvocation,
        started_at: DateTime<Utc>,
        finished_at: Option<DateTime<Utc>>,
        status: JobRunStatus,
        detail: Option<String>,
    ) -> Result<job_run::Model, ServiceError> {
        let run = job_run::Model {
            id: Uuid::new_v4(),
            job_name: invocation.job.name().to_string(),
            task: invocation.job.task().to_string(),
            scheduled_for: invocation.scheduled_for,
            started_at,
            finished_at,
            status,
            detail,
        };
        if invocation.dry_run {
            return Ok(run);
        }

        let active = job_run::ActiveModel {
            id: Set(run.id),
            job_name: Set(run.job_name),
            task: Set(run.task),
            scheduled_for: Set(run.scheduled_for),
            started_at: Set(run.started_at),
            finished_at: Set(run.finished_at),
            status: Set(run.status),
            detail: Set(run.detail),
        };
        Ok(active.insert(&*self.ctx.db_pool).await?)
    }
}
