pub mod campaign;
pub mod category;
pub mod image;
pub mod order;
pub mod product;
pub mod product_category;
pub mod product_size_stock;
pub mod user;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use sea_orm::{
    sea_query::Index, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Schema, Set,
};
use tracing::info;

use crate::entities::{
    campaign::Entity as Campaign, category::Entity as Category, image::Entity as Image,
    order::Entity as Order, product::Entity as Product,
    product_category::Entity as ProductCategory, product_size_stock::Entity as ProductSizeStock,
    user::Entity as User,
};

/// Creates every table the service needs, leaving existing ones alone.
pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let tables = [
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Image),
        schema.create_table_from_entity(Category),
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(ProductCategory),
        schema.create_table_from_entity(ProductSizeStock),
        schema.create_table_from_entity(Campaign),
        schema.create_table_from_entity(Order),
    ];

    for mut table in tables {
        table.if_not_exists();
        db.execute(backend.build(&table)).await?;
    }

    let size_index = Index::create()
        .name("idx_product_size_stock_product_size")
        .table(ProductSizeStock)
        .col(product_size_stock::Column::ProductId)
        .col(product_size_stock::Column::Size)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&size_index)).await?;

    Ok(())
}

/// Seeds the configured back-office account unless it already exists.
pub async fn primary_setup(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<(), DbErr> {
    let existing = User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| DbErr::Custom(format!("Failed to hash admin password: {err}")))?
        .to_string();

    let admin = user::ActiveModel {
        username: Set(username.to_owned()),
        password: Set(password_hash),
        ..Default::default()
    };
    User::insert(admin).exec(db).await?;
    info!(username, "Seeded admin account");

    Ok(())
}
