use super::{beat_schedule, BeatEntry, JobInvocation, JobKind, JOB_TOPIC};
use crate::{
    errors::ServiceError,
    message_queue::{Message, MessageQueue},
};
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Publishes job invocations when their triggers fire.
pub struct Beat {
    queue: Arc<dyn MessageQueue>,
    schedule: Vec<BeatEntry>,
    offset: FixedOffset,
}

impl Beat {
    pub fn new(queue: Arc<dyn MessageQueue>, offset: FixedOffset) -> Self {
        Self {
            queue,
            schedule: beat_schedule(),
            offset,
        }
    }

    /// Earliest fire time after `now` and every job due at that instant.
    pub fn next_due(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, Vec<JobKind>)> {
        let local_now = now.with_timezone(&self.offset);
        let fire_times: Vec<(DateTime<Utc>, JobKind)> = self
            .schedule
            .iter()
            .map(|entry| {
                (
                    entry.trigger.next_after(local_now).with_timezone(&Utc),
                    entry.job,
                )
            })
            .collect();

        let earliest = fire_times.iter().map(|(at, _)| *at).min()?;
        let jobs = fire_times
            .into_iter()
            .filter(|(at, _)| *at == earliest)
            .map(|(_, job)| job)
            .collect();
        Some((earliest, jobs))
    }

    pub async fn publish(
        &self,
        job: JobKind,
        scheduled_for: DateTime<Utc>,
    ) -> Result<JobInvocation, ServiceError> {
        let invocation = JobInvocation::new(job, scheduled_for);
        let message = Message::new(JOB_TOPIC, serde_json::to_value(&invocation)?)
            .with_expiry(invocation.expires_at);
        self.queue.publish(message).await?;
        debug!(job = job.name(), %scheduled_for, "job invocation published");
        Ok(invocation)
    }

    /// Sleeps until the next fire time, publishes, repeats.
    pub async fn run(self) {
        info!(entries = self.schedule.len(), offset = %self.offset, "beat started");
        loop {
            let Some((due, jobs)) = self.next_due(Utc::now()) else {
                info!("beat schedule is empty, stopping");
                return;
            };
            let wait = (due - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            for job in jobs {
                if let Err(e) = self.publish(job, due).await {
                    error!(job = job.name(), error = %e, "failed to publish job invocation");
                }
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_queue::InMemoryMessageQueue;
    use chrono::TimeZone;

    fn jakarta() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    #[test]
    fn midnight_fires_points_expiry_with_the_hourly_check() {
        let beat = Beat::new(Arc::new(InMemoryMessageQueue::new()), jakarta());
        // 23:30 local on a Wednesday
        let now = Utc.with_ymd_and_hms(2024, 3, 13, 16, 30, 0).unwrap();

        let (due, mut jobs) = beat.next_due(now).unwrap();
        jobs.sort_by_key(|j| j.name());
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 3, 13, 17, 0, 0).unwrap());
        assert_eq!(
            jobs,
            vec![JobKind::ExpireMemberPoints, JobKind::SyncHealthCheck]
        );
    }

    #[test]
    fn daily_reports_are_due_at_local_eleven_pm() {
        let beat = Beat::new(Arc::new(InMemoryMessageQueue::new()), jakarta());
        let now = Utc.with_ymd_and_hms(2024, 3, 13, 15, 30, 0).unwrap();

        let (due, jobs) = beat.next_due(now).unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 3, 13, 16, 0, 0).unwrap());
        assert!(jobs.contains(&JobKind::GenerateDailyReports));
        assert!(jobs.contains(&JobKind::SyncHealthCheck));
    }

    #[tokio::test]
    async fn publish_puts_the_invocation_on_the_job_topic() {
        let queue = InMemoryMessageQueue::new();
        let beat = Beat::new(Arc::new(queue.clone()), jakarta());
        let at = Utc.with_ymd_and_hms(2024, 3, 13, 16, 0, 0).unwrap();

        let invocation = beat.publish(JobKind::GenerateDailyReports, at).await.unwrap();
        let message = queue.subscribe(JOB_TOPIC).await.unwrap().unwrap();
        let decoded: JobInvocation = serde_json::from_value(message.payload).unwrap();
        assert_eq!(decoded, invocation);
        assert_eq!(message.expires_at, Some(at + chrono::Duration::hours(1)));
    }
}
