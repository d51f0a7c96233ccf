//! Background jobs: the serializable payloads, the handler seam and an
//! in-process tokio queue with bounded retries.

mod worker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sea_orm::DbErr;
use std::time::Duration;
use thiserror::Error;

use crate::entities::order::Status;
use crate::mail::MailError;

pub use worker::{run_job, JobOutcome, TokioTaskQueue};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    OrderPlaced(OrderPlaced),
    OrderStatusChanged(OrderStatusChanged),
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::OrderPlaced(_) => "order_placed",
            Job::OrderStatusChanged(_) => "order_status_changed",
        }
    }

    pub fn order_id(&self) -> i32 {
        match self {
            Job::OrderPlaced(job) => job.order_id,
            Job::OrderStatusChanged(job) => job.order_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: i32,
}

/// Statuses are captured when the change is saved; by the time the job runs
/// the order may have moved on again.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub order_id: i32,
    pub from: Status,
    pub to: Status,
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("mail delivery failed: {0}")]
    Mail(#[from] MailError),
    #[error("order {0} not found")]
    OrderNotFound(i32),
    #[error("order {0} has no customer email")]
    MissingRecipient(i32),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

impl JobError {
    /// Only transport failures are worth another attempt. A bad address or
    /// message fails the same way every time, as does missing data.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::Mail(MailError::Transport(_)))
    }
}

#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> Result<(), JobError>;

    /// Called once when a job gives up, either after its last attempt or on a
    /// non-retryable error.
    async fn failed(&self, job: &Job, error: &JobError);
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("task queue is closed")]
    Closed,
    #[error("task queue is full")]
    Full,
}

#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn dispatch(&self, job: Job) -> Result<(), QueueError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(600),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based):
    /// `base * 2^(attempt - 1)`, capped at `max_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use async_trait::async_trait;
    use std::sync::Mutex;

    use super::{Job, QueueError, TaskQueue};

    /// Keeps dispatched jobs instead of running them.
    #[derive(Default)]
    pub struct RecordingQueue {
        jobs: Mutex<Vec<Job>>,
    }

    impl RecordingQueue {
        pub fn jobs(&self) -> Vec<Job> {
            self.jobs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TaskQueue for RecordingQueue {
        async fn dispatch(&self, job: Job) -> Result<(), QueueError> {
            self.jobs.lock().unwrap().push(job);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(60),
        };

        assert_eq!(policy.backoff(1), Duration::from_secs(10));
        assert_eq!(policy.backoff(2), Duration::from_secs(20));
        assert_eq!(policy.backoff(3), Duration::from_secs(40));
        assert_eq!(policy.backoff(4), Duration::from_secs(60));
        assert_eq!(policy.backoff(40), Duration::from_secs(60));
    }

    #[test]
    fn jobs_serialize_with_status_strings() {
        let job = Job::OrderStatusChanged(OrderStatusChanged {
            order_id: 12,
            from: Status::Pending,
            to: Status::Confirmed,
        });

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "order_status_changed",
                "order_id": 12,
                "from": "pending",
                "to": "confirmed"
            })
        );
        assert_eq!(serde_json::from_value::<Job>(value).unwrap(), job);
    }

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(JobError::Mail(MailError::Transport("timeout".into())).is_retryable());
        assert!(!JobError::Mail(MailError::InvalidAddress("ada@".into())).is_retryable());
        assert!(!JobError::Mail(MailError::Build("no body".into())).is_retryable());
        assert!(!JobError::OrderNotFound(1).is_retryable());
        assert!(!JobError::MissingRecipient(1).is_retryable());
    }
}
