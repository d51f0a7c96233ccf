//! Turns queued order jobs into customer and back-office emails.

mod order_placed;
mod order_status;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;

use crate::mail::Mailer;
use crate::media::ImageUrlNormalizer;
use crate::orders::OrderStore;
use crate::queue::{Job, JobError, JobHandler};

pub struct Notifier {
    store: Arc<dyn OrderStore>,
    mailer: Arc<dyn Mailer>,
    images: ImageUrlNormalizer,
    admin_email: Option<String>,
}

impl Notifier {
    pub fn new(
        store: Arc<dyn OrderStore>,
        mailer: Arc<dyn Mailer>,
        images: ImageUrlNormalizer,
        admin_email: Option<String>,
    ) -> Self {
        Notifier {
            store,
            mailer,
            images,
            admin_email,
        }
    }
}

#[async_trait]
impl JobHandler for Notifier {
    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        match job {
            Job::OrderPlaced(job) => order_placed::handle(self, job).await,
            Job::OrderStatusChanged(job) => order_status::handle(self, job).await,
        }
    }

    async fn failed(&self, job: &Job, err: &JobError) {
        match job {
            Job::OrderPlaced(job) => order_placed::failed(self, job, err).await,
            Job::OrderStatusChanged(job) => order_status::failed(self, job, err).await,
        }
    }
}

/// Best-effort recipient lookup for failure records; the job has already
/// failed so a second error here is only logged.
async fn customer_email_for(notifier: &Notifier, order_id: i32) -> Option<String> {
    match notifier.store.load_with_product(order_id).await {
        Ok(context) => context.map(|context| context.order.customer_email),
        Err(err) => {
            error!(order_id, error = %err, "Could not load order for failure record");
            None
        }
    }
}
