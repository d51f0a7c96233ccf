use tracing::{error, info};

use super::{customer_email_for, Notifier};
use crate::mail::templates;
use crate::queue::{JobError, OrderStatusChanged};

pub(super) async fn handle(notifier: &Notifier, job: &OrderStatusChanged) -> Result<(), JobError> {
    let context = notifier
        .store
        .load_with_product(job.order_id)
        .await?
        .ok_or(JobError::OrderNotFound(job.order_id))?;
    let order = &context.order;

    if order.customer_email.trim().is_empty() {
        return Err(JobError::MissingRecipient(order.id));
    }

    let image_url = notifier.images.for_order(order, context.product.as_ref());
    let message = templates::status_update(
        order,
        job.from,
        job.to,
        image_url.as_deref(),
        notifier.images.base_url(),
    );

    if let Err(err) = notifier.mailer.send(&message).await {
        error!(
            order_id = order.id,
            reference = %order.reference,
            customer_email = %order.customer_email,
            from = %job.from,
            to = %job.to,
            error = %err,
            "Failed to send order status email"
        );
        return Err(err.into());
    }

    info!(
        order_id = order.id,
        reference = %order.reference,
        customer_email = %order.customer_email,
        from = %job.from,
        to = %job.to,
        "Order status email sent"
    );
    Ok(())
}

pub(super) async fn failed(notifier: &Notifier, job: &OrderStatusChanged, err: &JobError) {
    let customer_email = customer_email_for(notifier, job.order_id).await;
    error!(
        order_id = job.order_id,
        customer_email = customer_email.as_deref().unwrap_or("unknown"),
        from = %job.from,
        to = %job.to,
        error = %err,
        "Order status email permanently failed"
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    use crate::catalog::{fixtures::product, ProductRecord};
    use crate::entities::order::Status;
    use crate::mail::templates::status_copy;
    use crate::media::ImageUrlNormalizer;
    use crate::notifications::fixtures::{order, MemoryStore, RecordingMailer};
    use crate::notifications::Notifier;
    use crate::orders::OrderContext;
    use crate::queue::{run_job, Job, JobError, JobHandler, JobOutcome, OrderStatusChanged, RetryPolicy};

    fn notifier(store: MemoryStore, mailer: Arc<RecordingMailer>) -> Notifier {
        Notifier::new(
            Arc::new(store),
            mailer,
            ImageUrlNormalizer::new("https://shop.test"),
            None,
        )
    }

    fn confirmed_job() -> Job {
        Job::OrderStatusChanged(OrderStatusChanged {
            order_id: 41,
            from: Status::Pending,
            to: Status::Confirmed,
        })
    }

    fn stored_order() -> MemoryStore {
        let mut snapshot = order();
        snapshot.status = Status::Confirmed;
        MemoryStore::with(OrderContext {
            order: snapshot,
            product: Some(ProductRecord::new(product(Some("products/live.jpg"), None), None)),
        })
    }

    #[tokio::test]
    async fn sends_one_email_to_the_customer() {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = notifier(stored_order(), mailer.clone());

        notifier.handle(&confirmed_job()).await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        let headline = status_copy(Status::Confirmed).unwrap().headline;
        assert!(sent[0].text_body.contains(headline));
        assert!(sent[0]
            .html_body
            .contains("https://shop.test/storage/products/trail.jpg"));
    }

    #[tokio::test]
    async fn rerunning_the_same_job_sends_again() {
        // No idempotency key exists; a redelivered job produces a second email.
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = notifier(stored_order(), mailer.clone());

        notifier.handle(&confirmed_job()).await.unwrap();
        notifier.handle(&confirmed_job()).await.unwrap();

        assert_eq!(mailer.sent().len(), 2);
    }

    #[tokio::test]
    async fn missing_order_is_a_permanent_failure() {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = notifier(MemoryStore::default(), mailer.clone());

        let err = notifier.handle(&confirmed_job()).await.unwrap_err();
        assert!(matches!(err, JobError::OrderNotFound(41)));
        assert!(!err.is_retryable());
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn empty_recipient_is_a_permanent_failure() {
        let mut snapshot = order();
        snapshot.customer_email = " ".to_string();
        let store = MemoryStore::with(OrderContext {
            order: snapshot,
            product: None,
        });
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = notifier(store, mailer.clone());

        let err = notifier.handle(&confirmed_job()).await.unwrap_err();
        assert!(matches!(err, JobError::MissingRecipient(41)));
        assert_eq!(*mailer.attempts.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn failing_transport_exhausts_retries() {
        let mailer = Arc::new(RecordingMailer::failing());
        let notifier = notifier(stored_order(), mailer.clone());
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        };

        let outcome = run_job(&notifier, &policy, Uuid::new_v4(), &confirmed_job()).await;

        assert_eq!(outcome, JobOutcome::Failed { attempts: 3 });
        assert_eq!(*mailer.attempts.lock().unwrap(), 3);
        assert!(mailer.sent().is_empty());
    }
}
