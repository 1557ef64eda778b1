use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task type fired when a scheduled email becomes due
pub const SEND_SCHEDULED_EMAIL: &str = "send_scheduled_email";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Normal,
    High,
}

impl TaskPriority {
    /// Numeric rank, higher runs first
    pub fn rank(&self) -> i32 {
        match self {
            TaskPriority::Low => 0,
            TaskPriority::Normal => 5,
            TaskPriority::High => 10,
        }
    }

    pub fn from_rank(rank: i32) -> Self {
        match rank {
            r if r >= 10 => TaskPriority::High,
            r if r >= 5 => TaskPriority::Normal,
            _ => TaskPriority::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        }
    }
}

/// Durable unit of deferred work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: String,
    pub task_type: String,
    pub payload: String,
    pub run_at: DateTime<Utc>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub attempts: u32,
    /// While running, the claim expires at this time and the task may be claimed again
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScheduledTask {
    pub fn new(
        task_type: impl Into<String>,
        payload: impl Into<String>,
        run_at: DateTime<Utc>,
        priority: TaskPriority,
    ) -> Self {
        Self {
            id: String::new(),
            task_type: task_type.into(),
            payload: payload.into(),
            run_at,
            priority,
            status: TaskStatus::Pending,
            attempts: 0,
            lease_until: None,
            last_error: None,
            created_at: Utc::now(),
        }
    }

    /// Pending and due, or running under a lease that has expired
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            TaskStatus::Pending => self.run_at <= now,
            TaskStatus::Running => self.lease_until.is_some_and(|lease| lease <= now),
            TaskStatus::Done | TaskStatus::Failed => false,
        }
    }
}
