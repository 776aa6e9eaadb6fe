/*!
 * # Scheduled jobs
 *
 * The beat table lists every periodic job with its task id, trigger and
 * expiry window. [`beat::Beat`] turns the table into [`JobInvocation`]s on the
 * job queue; [`worker::Worker`] consumes them and hands each one to
 * [`runner::JobRunner`], which drops invocations that expired in the queue,
 * runs the job body and records the outcome in `job_run`.
 *
 * Times follow the configured business offset. Overlapping runs of the same
 * job are not prevented; every job body is idempotent.
 */

pub mod beat;
pub mod runner;
pub mod schedule;
pub mod tasks;
pub mod worker;

pub use beat::Beat;
pub use runner::JobRunner;
pub use schedule::Trigger;
pub use worker::Worker;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

/// Queue topic carrying job invocations.
pub const JOB_TOPIC: &str = "scheduled-jobs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    ExpireMemberPoints,
    GenerateDailyReports,
    SyncHealthCheck,
    CleanupOldLogs,
}

impl JobKind {
    /// Beat table entry name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExpireMemberPoints => "expire-member-points-daily",
            Self::GenerateDailyReports => "generate-daily-reports",
            Self::SyncHealthCheck => "sync-health-check-hourly",
            Self::CleanupOldLogs => "cleanup-old-logs-weekly",
        }
    }

    /// Task id the worker dispatches on.
    pub fn task(&self) -> &'static str {
        match self {
            Self::ExpireMemberPoints => "jobs.expire_member_points",
            Self::GenerateDailyReports => "jobs.generate_daily_reports",
            Self::SyncHealthCheck => "jobs.sync_health_check",
            Self::CleanupOldLogs => "jobs.cleanup_old_logs",
        }
    }

    /// Accepts either the task id or the entry name.
    pub fn from_task(task: &str) -> Option<Self> {
        Self::iter().find(|job| job.task() == task || job.name() == task)
    }

    pub fn trigger(&self) -> Trigger {
        match self {
            Self::ExpireMemberPoints => Trigger::Daily { at: hour(0) },
            Self::GenerateDailyReports => Trigger::Daily { at: hour(23) },
            Self::SyncHealthCheck => Trigger::Hourly { minute: 0 },
            Self::CleanupOldLogs => Trigger::Weekly {
                weekday: Weekday::Sun,
                at: hour(2),
            },
        }
    }

    /// How long an invocation may wait in the queue before it is discarded.
    pub fn expires(&self) -> Duration {
        match self {
            Self::ExpireMemberPoints | Self::GenerateDailyReports => Duration::seconds(3600),
            Self::SyncHealthCheck => Duration::seconds(300),
            Self::CleanupOldLogs => Duration::seconds(7200),
        }
    }
}

fn hour(h: i64) -> NaiveTime {
    NaiveTime::MIN + Duration::hours(h)
}

/// One row of the beat table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatEntry {
    pub job: JobKind,
    pub name: &'static str,
    pub task: &'static str,
    pub trigger: Trigger,
    pub expires: Duration,
}

impl From<JobKind> for BeatEntry {
    fn from(job: JobKind) -> Self {
        Self {
            job,
            name: job.name(),
            task: job.task(),
            trigger: job.trigger(),
            expires: job.expires(),
        }
    }
}

/// The periodic job table.
pub fn beat_schedule() -> Vec<BeatEntry> {
    JobKind::iter().map(BeatEntry::from).collect()
}

/// A single scheduled execution of a job, as carried on the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInvocation {
    pub job: JobKind,
    pub scheduled_for: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub dry_run: bool,
    /// Overrides the business date derived from `scheduled_for`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_date: Option<NaiveDate>,
}

impl JobInvocation {
    pub fn new(job: JobKind, scheduled_for: DateTime<Utc>) -> Self {
        Self {
            job,
            scheduled_for,
            expires_at: scheduled_for + job.expires(),
            dry_run: false,
            business_date: None,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn for_date(mut self, date: Option<NaiveDate>) -> Self {
        self.business_date = date;
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn beat_table_matches_the_documented_schedule() {
        let table: Vec<(&str, &str, String, i64)> = beat_schedule()
            .into_iter()
            .map(|e| (e.name, e.task, e.trigger.to_string(), e.expires.num_seconds()))
            .collect();

        assert_eq!(
            table,
            vec![
                ("expire-member-points-daily", "jobs.expire_member_points", "daily 00:00".to_string(), 3600),
                ("generate-daily-reports", "jobs.generate_daily_reports", "daily 23:00".to_string(), 3600),
                ("sync-health-check-hourly", "jobs.sync_health_check", "hourly :00".to_string(), 300),
                ("cleanup-old-logs-weekly", "jobs.cleanup_old_logs", "weekly Sun 02:00".to_string(), 7200),
            ]
        );
    }

    #[test]
    fn tasks_resolve_by_id_or_name() {
        assert_eq!(
            JobKind::from_task("jobs.cleanup_old_logs"),
            Some(JobKind::CleanupOldLogs)
        );
        assert_eq!(
            JobKind::from_task("generate-daily-reports"),
            Some(JobKind::GenerateDailyReports)
        );
        assert_eq!(JobKind::from_task("jobs.unknown"), None);
    }

    #[test]
    fn invocation_expires_after_its_window() {
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 16, 0, 0).unwrap();
        let invocation = JobInvocation::new(JobKind::GenerateDailyReports, at);
        assert!(!invocation.is_expired(at + Duration::seconds(3600)));
        assert!(invocation.is_expired(at + Duration::hours(2)));
    }
}
