use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use courier_persist::TaskQueue;
use courier_types::{ScheduledTask, SEND_SCHEDULED_EMAIL};

use crate::service::EmailService;
use crate::telemetry;

const DEFAULT_LEASE: Duration = Duration::from_secs(300);

/// Polls the task queue and delivers scheduled emails when they fall due
///
/// Claims are leased; a task left running by a worker that died is picked
/// up again once its lease expires.
pub struct ScheduledDeliveryWorker {
    service: Arc<EmailService>,
    tasks: Arc<dyn TaskQueue>,
    poll_interval: Duration,
    batch_size: usize,
    lease: Duration,
}

impl ScheduledDeliveryWorker {
    pub fn new(service: Arc<EmailService>, poll_interval: Duration, batch_size: usize) -> Self {
        let tasks = service.tasks();
        Self {
            service,
            tasks,
            poll_interval,
            batch_size: batch_size.max(1),
            lease: DEFAULT_LEASE,
        }
    }

    /// How long a claimed task stays reserved for this worker
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// Run until `shutdown` flips to true
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(interval = ?self.poll_interval, "Scheduled delivery worker started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_once().await {
                            tracing::error!(error = %e, "Failed to poll scheduled tasks");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("Scheduled delivery worker stopped");
        })
    }

    /// Claim and process one batch of due tasks, returning how many were claimed
    pub async fn run_once(&self) -> courier_persist::Result<usize> {
        let now = Utc::now();
        let lease = chrono::Duration::from_std(self.lease).unwrap_or_else(|_| chrono::Duration::seconds(300));
        let due = self.tasks.claim_due(now, now + lease, self.batch_size).await?;
        let claimed = due.len();

        for task in due {
            self.process(task).await;
        }
        Ok(claimed)
    }

    async fn process(&self, task: ScheduledTask) {
        let outcome = if task.task_type == SEND_SCHEDULED_EMAIL {
            self.service
                .deliver_scheduled(&task.payload)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string())
        } else {
            Err(format!("unknown task type '{}'", task.task_type))
        };

        let recorded = match &outcome {
            Ok(()) => {
                metrics::counter!(telemetry::SCHEDULED_DELIVERIES_TOTAL, "status" => "done").increment(1);
                self.tasks.complete(&task.id).await
            }
            Err(error) => {
                tracing::error!(task_id = %task.id, payload = %task.payload, error = %error, "Scheduled task failed");
                metrics::counter!(telemetry::SCHEDULED_DELIVERIES_TOTAL, "status" => "failed").increment(1);
                self.tasks.fail(&task.id, error).await
            }
        };

        if let Err(e) = recorded {
            tracing::error!(task_id = %task.id, error = %e, "Failed to record task outcome");
        }
    }
}
