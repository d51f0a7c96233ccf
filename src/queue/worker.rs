use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{Job, JobHandler, QueueError, RetryPolicy, TaskQueue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    Completed { attempts: u32 },
    Failed { attempts: u32 },
}

/// Runs `job` until it succeeds, hits a non-retryable error or uses up
/// `policy.max_attempts`. `JobHandler::failed` runs at most once.
pub async fn run_job(
    handler: &dyn JobHandler,
    policy: &RetryPolicy,
    job_id: Uuid,
    job: &Job,
) -> JobOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match handler.handle(job).await {
            Ok(()) => {
                info!(
                    %job_id,
                    job = job.name(),
                    order_id = job.order_id(),
                    attempt,
                    "Job completed"
                );
                return JobOutcome::Completed { attempts: attempt };
            }
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                warn!(
                    %job_id,
                    job = job.name(),
                    order_id = job.order_id(),
                    attempt,
                    max_attempts,
                    retry_in = ?delay,
                    error = %err,
                    "Job attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                error!(
                    %job_id,
                    job = job.name(),
                    order_id = job.order_id(),
                    attempt,
                    retryable = err.is_retryable(),
                    error = %err,
                    "Job failed permanently"
                );
                handler.failed(job, &err).await;
                return JobOutcome::Failed { attempts: attempt };
            }
        }
    }
}

struct Envelope {
    id: Uuid,
    job: Job,
}

/// In-process queue: a bounded channel drained by a dispatcher that runs every
/// job on its own tokio task.
#[derive(Clone)]
pub struct TokioTaskQueue {
    sender: mpsc::Sender<Envelope>,
}

impl TokioTaskQueue {
    pub fn start(handler: Arc<dyn JobHandler>, policy: RetryPolicy, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Envelope>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(envelope) = receiver.recv().await {
                let handler = handler.clone();
                tokio::spawn(async move {
                    run_job(handler.as_ref(), &policy, envelope.id, &envelope.job).await;
                });
            }
            info!("Task queue closed");
        });

        TokioTaskQueue { sender }
    }
}

#[async_trait]
impl TaskQueue for TokioTaskQueue {
    async fn dispatch(&self, job: Job) -> Result<(), QueueError> {
        let id = Uuid::new_v4();
        info!(job_id = %id, job = job.name(), order_id = job.order_id(), "Job enqueued");

        self.sender.try_send(Envelope { id, job }).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}
