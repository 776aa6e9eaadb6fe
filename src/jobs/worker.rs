use super::{JobInvocation, JobRunner, JOB_TOPIC};
use crate::{errors::ServiceError, message_queue::MessageQueue};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Consumes job invocations; every invocation runs in its own task.
pub struct Worker {
    queue: Arc<dyn MessageQueue>,
    runner: JobRunner,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(queue: Arc<dyn MessageQueue>, runner: JobRunner, poll_interval: Duration) -> Self {
        Self {
            queue,
            runner,
            poll_interval,
        }
    }

    /// Takes one invocation off the queue and spawns its execution.
    pub async fn poll_once(&self) -> Result<Option<JoinHandle<()>>, ServiceError> {
        let Some(message) = self.queue.subscribe(JOB_TOPIC).await? else {
            return Ok(None);
        };

        let invocation: JobInvocation = match serde_json::from_value(message.payload.clone()) {
            Ok(invocation) => invocation,
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "dropping malformed job invocation");
                self.queue.ack(&message.id).await?;
                return Ok(None);
            }
        };
        self.queue.ack(&message.id).await?;

        let runner = self.runner.clone();
        Ok(Some(tokio::spawn(async move {
            if let Err(e) = runner.execute(&invocation, Utc::now()).await {
                error!(job = invocation.job.name(), error = %e, "failed to record job run");
            }
        })))
    }

    pub async fn run(self) {
        info!(poll_interval = ?self.poll_interval, "job worker started");
        loop {
            match self.poll_once().await {
                Ok(Some(_)) => continue,
                Ok(None) => sleep(self.poll_interval).await,
                Err(e) => {
                    error!("job worker error: {}", e);
                    sleep(self.poll_interval).await;
                }
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
