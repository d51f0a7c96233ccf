use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use std::sync::Arc;

use crate::catalog::{load_product_record, ProductRecord};
use crate::entities::order;

/// An order with the product it was placed for, if that product still exists.
#[derive(Clone, Debug)]
pub struct OrderContext {
    pub order: order::Model,
    pub product: Option<ProductRecord>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn load_with_product(&self, order_id: i32) -> Result<Option<OrderContext>, DbErr>;
}

#[derive(Clone)]
pub struct SeaOrderStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrderStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        SeaOrderStore { db }
    }
}

#[async_trait]
impl OrderStore for SeaOrderStore {
    async fn load_with_product(&self, order_id: i32) -> Result<Option<OrderContext>, DbErr> {
        let Some(order) = order::Entity::find_by_id(order_id).one(&*self.db).await? else {
            return Ok(None);
        };

        let product = match order.product_id {
            Some(product_id) => load_product_record(&*self.db, product_id).await?,
            None => None,
        };

        Ok(Some(OrderContext { order, product }))
    }
}
