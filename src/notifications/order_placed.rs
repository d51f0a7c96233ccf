use tracing::{error, info, warn};

use super::{customer_email_for, Notifier};
use crate::mail::templates;
use crate::queue::{JobError, OrderPlaced};

/// Customer confirmation plus, when configured, the back-office alert. A retry
/// resends both.
pub(super) async fn handle(notifier: &Notifier, job: &OrderPlaced) -> Result<(), JobError> {
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
    let app_url = notifier.images.base_url();

    let confirmation = templates::order_placed(order, image_url.as_deref(), app_url);
    notifier.mailer.send(&confirmation).await.map_err(|err| {
        error!(
            order_id = order.id,
            reference = %order.reference,
            customer_email = %order.customer_email,
            error = %err,
            "Failed to send order confirmation email"
        );
        err
    })?;
    info!(
        order_id = order.id,
        reference = %order.reference,
        customer_email = %order.customer_email,
        "Order confirmation email sent"
    );

    match &notifier.admin_email {
        Some(admin_email) => {
            let alert = templates::admin_alert(order, admin_email, image_url.as_deref(), app_url);
            notifier.mailer.send(&alert).await.map_err(|err| {
                error!(
                    order_id = order.id,
                    reference = %order.reference,
                    admin_email = %admin_email,
                    error = %err,
                    "Failed to send admin order alert"
                );
                err
            })?;
            info!(order_id = order.id, admin_email = %admin_email, "Admin order alert sent");
        }
        None => warn!(order_id = order.id, "ADMIN_EMAIL not set, skipping admin alert"),
    }

    Ok(())
}

pub(super) async fn failed(notifier: &Notifier, job: &OrderPlaced, err: &JobError) {
    let customer_email = customer_email_for(notifier, job.order_id).await;
    error!(
        order_id = job.order_id,
        customer_email = customer_email.as_deref().unwrap_or("unknown"),
        error = %err,
        "Order placed notifications permanently failed"
    );
}
