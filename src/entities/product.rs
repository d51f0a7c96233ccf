use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub price: f64,
    /// Legacy single image column: a URL, a root-relative path or a path under
    /// the public storage root.
    #[sea_orm(nullable)]
    pub image: Option<String>,
    /// Attached media-library image; takes precedence over `image`.
    #[sea_orm(nullable)]
    pub image_id: Option<i32>,
    #[sea_orm(default_value = 0)]
    pub stock: i32,
    pub gender: Gender,
    #[sea_orm(default_value = false)]
    pub is_featured: bool,
    #[sea_orm(default_value = true)]
    pub is_available: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::image::Entity",
        from = "Column::ImageId",
        to = "crate::entities::image::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Image,
    #[sea_orm(has_many = "crate::entities::product_size_stock::Entity")]
    SizeStock,
    #[sea_orm(has_many = "crate::entities::campaign::Entity")]
    Campaign,
    #[sea_orm(has_many = "crate::entities::product_category::Entity")]
    ProductCategory,
}

impl Related<crate::entities::image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Image.def()
    }
}

impl Related<crate::entities::product_size_stock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SizeStock.def()
    }
}

impl Related<crate::entities::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl Related<crate::entities::category::Entity> for Entity {
    fn to() -> RelationDef {
        crate::entities::product_category::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(crate::entities::product_category::Relation::Product.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    enum_name = "gender_enum",
    db_type = "String(StringLen::N(16))",
    rs_type = "String"
)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[sea_orm(string_value = "men")]
    Men,
    #[sea_orm(string_value = "women")]
    Women,
    #[sea_orm(string_value = "unisex")]
    Unisex,
    #[sea_orm(string_value = "kids")]
    Kids,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "men" => Ok(Self::Men),
            "women" => Ok(Self::Women),
            "unisex" => Ok(Self::Unisex),
            "kids" => Ok(Self::Kids),
            _ => Err(format!("Invalid gender: {}", s)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Men => "men",
            Self::Women => "women",
            Self::Unisex => "unisex",
            Self::Kids => "kids",
        };
        f.write_str(value)
    }
}
