//! Order lifecycle: `pending → confirmed → processing → shipped → delivered`,
//! with `cancelled` reachable from anywhere. Legality of a move is not checked
//! here; any status may be written and every change is reported.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::order::{self, Status};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: Status,
    pub to: Status,
}

pub fn diff_status(old: Status, new: Status) -> Option<StatusTransition> {
    if old == new {
        None
    } else {
        Some(StatusTransition { from: old, to: new })
    }
}

/// Writes the new status onto `order`, stamping the matching lifecycle
/// timestamp the first time the order reaches it.
pub fn apply_status(order: &mut order::ActiveModel, current: &order::Model, to: Status, now: DateTime<Utc>) {
    order.status = Set(to);
    order.updated_at = Set(now);

    match to {
        Status::Confirmed if current.confirmed_at.is_none() => order.confirmed_at = Set(Some(now)),
        Status::Shipped if current.shipped_at.is_none() => order.shipped_at = Set(Some(now)),
        Status::Delivered if current.delivered_at.is_none() => order.delivered_at = Set(Some(now)),
        _ => {}
    }
}

#[derive(Debug)]
pub enum StatusUpdate {
    NotFound,
    Unchanged(order::Model),
    Changed {
        order: order::Model,
        transition: StatusTransition,
    },
}

/// Persists a status change and reports the transition that happened, if any.
/// The caller enqueues notifications once this returns, i.e. after commit.
pub async fn update_status<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    order_id: i32,
    to: Status,
) -> Result<StatusUpdate, DbErr> {
    let txn = db.begin().await?;

    let Some(current) = order::Entity::find_by_id(order_id).one(&txn).await? else {
        txn.rollback().await?;
        return Ok(StatusUpdate::NotFound);
    };

    let Some(transition) = diff_status(current.status, to) else {
        txn.rollback().await?;
        return Ok(StatusUpdate::Unchanged(current));
    };

    let mut active: order::ActiveModel = current.clone().into();
    apply_status(&mut active, &current, to, Utc::now());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    info!(
        order_id,
        reference = %updated.reference,
        from = %transition.from,
        to = %transition.to,
        "Order status changed"
    );

    Ok(StatusUpdate::Changed {
        order: updated,
        transition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::fixtures::order;

    #[test]
    fn equal_statuses_are_not_a_transition() {
        assert_eq!(diff_status(Status::Pending, Status::Pending), None);
    }

    #[test]
    fn change_is_reported_with_both_ends() {
        assert_eq!(
            diff_status(Status::Pending, Status::Confirmed),
            Some(StatusTransition {
                from: Status::Pending,
                to: Status::Confirmed
            })
        );
    }

    #[test]
    fn backwards_moves_are_still_reported() {
        assert_eq!(
            diff_status(Status::Delivered, Status::Pending),
            Some(StatusTransition {
                from: Status::Delivered,
                to: Status::Pending
            })
        );
    }

    #[test]
    fn lifecycle_timestamps_are_stamped_once() {
        let now = Utc::now();
        let current = order();
        let mut active: order::ActiveModel = current.clone().into();
        apply_status(&mut active, &current, Status::Shipped, now);
        assert_eq!(active.shipped_at, Set(Some(now)));
        assert_eq!(active.status, Set(Status::Shipped));

        let mut shipped = current.clone();
        let earlier = now - chrono::Duration::days(1);
        shipped.shipped_at = Some(earlier);
        let mut active: order::ActiveModel = shipped.clone().into();
        apply_status(&mut active, &shipped, Status::Shipped, now);
        assert_eq!(active.shipped_at.clone().unwrap(), Some(earlier));
    }
}
