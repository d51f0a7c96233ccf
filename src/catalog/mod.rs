//! Product records as the rest of the service sees them: the product row with
//! its media attachment resolved once at load time, plus campaign pricing.

pub mod pricing;

use sea_orm::{ConnectionTrait, DbErr, EntityTrait};
use serde::Serialize;

use crate::entities::{image, product};

/// Media-library image attached to a product.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttachedImage {
    pub id: i32,
    pub url: String,
}

impl From<image::Model> for AttachedImage {
    fn from(value: image::Model) -> Self {
        AttachedImage {
            id: value.id,
            url: value.url(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductRecord {
    pub product: product::Model,
    pub attached_image: Option<AttachedImage>,
}

impl ProductRecord {
    pub fn new(product: product::Model, image: Option<image::Model>) -> Self {
        ProductRecord {
            product,
            attached_image: image.map(AttachedImage::from),
        }
    }

    /// Raw image reference copied into an order at checkout: the media URL if
    /// one is attached, the legacy column otherwise.
    pub fn snapshot_image(&self) -> Option<String> {
        match &self.attached_image {
            Some(image) => Some(image.url.clone()),
            None => self
                .product
                .image
                .as_ref()
                .filter(|path| !path.trim().is_empty())
                .cloned(),
        }
    }
}

pub async fn load_product_record<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Option<ProductRecord>, DbErr> {
    let found = product::Entity::find_by_id(id)
        .find_also_related(image::Entity)
        .one(conn)
        .await?;

    Ok(found.map(|(product, image)| ProductRecord::new(product, image)))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::entities::{image, product};

    pub fn product(image: Option<&str>, image_id: Option<i32>) -> product::Model {
        product::Model {
            id: 7,
            name: "Trail Runner".to_string(),
            description: "Lightweight trail shoe".to_string(),
            price: 120.0,
            image: image.map(str::to_string),
            image_id,
            stock: 10,
            gender: product::Gender::Unisex,
            is_featured: false,
            is_available: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    pub fn media(id: i32) -> image::Model {
        image::Model {
            id,
            file_name: "trail_runner".to_string(),
            path_name: "0b7c".to_string(),
            extension: image::FileExtension::Jpg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{media, product};
    use super::*;

    #[test]
    fn snapshot_prefers_attached_media() {
        let record = ProductRecord::new(product(Some("products/a.jpg"), Some(3)), Some(media(3)));
        assert_eq!(
            record.snapshot_image().as_deref(),
            Some("/storage/media/0b7c.jpg")
        );
    }

    #[test]
    fn snapshot_falls_back_to_legacy_column() {
        let record = ProductRecord::new(product(Some("products/a.jpg"), None), None);
        assert_eq!(record.snapshot_image().as_deref(), Some("products/a.jpg"));

        let blank = ProductRecord::new(product(Some("  "), None), None);
        assert_eq!(blank.snapshot_image(), None);
    }
}
