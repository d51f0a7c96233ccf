//! Guest checkout: turns a validated request into a `pending` order, taking
//! the product snapshot and reserving size stock in one transaction.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

use crate::catalog::{load_product_record, pricing};
use crate::entities::{campaign, order, product, product_size_stock};
use crate::orders::reference::generate_reference;

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub product_id: i32,
    #[validate(length(min = 1, max = 16))]
    pub size: String,
    #[validate(length(max = 32))]
    pub color: Option<String>,
    #[validate(range(min = 1, max = 20))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 120))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(min = 5, max = 32))]
    pub customer_phone: String,
    #[validate(length(min = 1, max = 500))]
    pub shipping_address: String,
    #[validate(length(min = 1, max = 120))]
    pub city: String,
    #[validate(length(min = 1, max = 16))]
    pub postal_code: String,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("No product with {0} id was found")]
    ProductNotFound(i32),
    #[error("Product {0} is not available")]
    Unavailable(i32),
    #[error("Size {size} is not offered for this product")]
    UnknownSize { size: String },
    #[error("Only {available} left in size {size}")]
    InsufficientStock { size: String, available: i32 },
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

pub async fn place_order<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    request: CheckoutRequest,
    now: DateTime<Utc>,
) -> Result<order::Model, CheckoutError> {
    let txn = db.begin().await?;
    let size = request.size.trim().to_string();

    let record = load_product_record(&txn, request.product_id)
        .await?
        .ok_or(CheckoutError::ProductNotFound(request.product_id))?;
    if !record.product.is_available {
        return Err(CheckoutError::Unavailable(request.product_id));
    }

    let size_row = product_size_stock::Entity::find()
        .filter(product_size_stock::Column::ProductId.eq(request.product_id))
        .filter(product_size_stock::Column::Size.eq(size.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| CheckoutError::UnknownSize { size: size.clone() })?;

    // Conditional decrement so two checkouts cannot both take the last pair.
    let reserved = product_size_stock::Entity::update_many()
        .col_expr(
            product_size_stock::Column::Quantity,
            Expr::col(product_size_stock::Column::Quantity).sub(request.quantity),
        )
        .filter(product_size_stock::Column::Id.eq(size_row.id))
        .filter(product_size_stock::Column::Quantity.gte(request.quantity))
        .exec(&txn)
        .await?;
    if reserved.rows_affected != 1 {
        return Err(CheckoutError::InsufficientStock {
            size,
            available: size_row.quantity,
        });
    }

    product::Entity::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(request.quantity),
        )
        .filter(product::Column::Id.eq(request.product_id))
        .exec(&txn)
        .await?;

    let campaigns = campaign::Entity::find()
        .filter(campaign::Column::ProductId.eq(request.product_id))
        .all(&txn)
        .await?;
    let price = pricing::price_for(&record.product, &campaigns, now);
    let total = round_money(price.effective_price * f64::from(request.quantity));

    let new_order = order::ActiveModel {
        reference: Set(generate_reference()),
        customer_name: Set(request.customer_name.trim().to_string()),
        customer_email: Set(request.customer_email.trim().to_ascii_lowercase()),
        customer_phone: Set(request.customer_phone.trim().to_string()),
        shipping_address: Set(request.shipping_address.trim().to_string()),
        city: Set(request.city.trim().to_string()),
        postal_code: Set(request.postal_code.trim().to_string()),
        product_id: Set(Some(record.product.id)),
        product_name: Set(record.product.name.clone()),
        product_price: Set(price.effective_price),
        product_image: Set(record.snapshot_image()),
        size: Set(size),
        color: Set(request
            .color
            .map(|color| color.trim().to_string())
            .filter(|color| !color.is_empty())),
        quantity: Set(request.quantity),
        total: Set(total),
        status: Set(order::Status::Pending),
        confirmed_at: Set(None),
        shipped_at: Set(None),
        delivered_at: Set(None),
        notes: Set(request
            .notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let placed = new_order.insert(&txn).await?;
    txn.commit().await?;

    Ok(placed)
}

fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_are_rounded_to_cents() {
        assert_eq!(round_money(0.1 * 3.0), 0.3);
        assert_eq!(round_money(89.999), 90.0);
    }

    #[test]
    fn request_validation_rejects_bad_email_and_quantity() {
        let request = CheckoutRequest {
            product_id: 1,
            size: "42".to_string(),
            color: None,
            quantity: 0,
            customer_name: "Ada".to_string(),
            customer_email: "not-an-email".to_string(),
            customer_phone: "+3725551234".to_string(),
            shipping_address: "Main st 1".to_string(),
            city: "Tallinn".to_string(),
            postal_code: "10111".to_string(),
            notes: None,
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("quantity"));
        assert!(fields.contains_key("customer_email"));
    }
}
