use std::sync::Arc;

use chrono::{DateTime, Utc};

use courier_persist::{Result, TaskQueue};
use courier_types::{EmailMessage, ScheduledTask, TaskPriority, SEND_SCHEDULED_EMAIL};

/// Defers delivery of a stored draft to a later time
pub struct DeliveryScheduler {
    tasks: Arc<dyn TaskQueue>,
}

impl DeliveryScheduler {
    pub fn new(tasks: Arc<dyn TaskQueue>) -> Self {
        Self { tasks }
    }

    /// Enqueue a high-priority send task keyed by the message id
    pub async fn schedule(&self, message: &EmailMessage, run_at: DateTime<Utc>) -> Result<String> {
        let task = ScheduledTask::new(
            SEND_SCHEDULED_EMAIL,
            message.message_id.clone(),
            run_at,
            TaskPriority::High,
        );

        let task_id = self.tasks.schedule(task).await?;
        tracing::info!(
            message_id = %message.message_id,
            task_id = %task_id,
            run_at = %run_at,
            "Email scheduled"
        );
        Ok(task_id)
    }
}
