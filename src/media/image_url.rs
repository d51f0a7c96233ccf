//! Turns the image references stored across the catalog and orders into
//! absolute URLs that can be embedded in email bodies and API responses.
//!
//! A raw reference is one of:
//! * an absolute `http(s)://` URL, passed through;
//! * a root-relative path (`/img/a.jpg`), joined to the application URL;
//! * anything else, taken as relative to the public storage root and served
//!   under `/storage/`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::ProductRecord;
use crate::entities::order;

static ABSOLUTE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());

#[derive(Clone, Debug)]
pub struct ImageUrlNormalizer {
    base_url: String,
}

impl ImageUrlNormalizer {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        ImageUrlNormalizer { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn normalize(&self, raw: Option<&str>) -> Option<String> {
        let raw = raw?.trim();
        if raw.is_empty() {
            return None;
        }

        if ABSOLUTE_URL.is_match(raw) {
            return Some(raw.to_string());
        }

        if raw.starts_with('/') {
            return Some(format!("{}{}", self.base_url, raw));
        }

        Some(format!(
            "{}/storage/{}",
            self.base_url,
            raw.trim_start_matches('/')
        ))
    }

    /// Attached media image first, then the legacy image column.
    pub fn from_product(&self, product: Option<&ProductRecord>) -> Option<String> {
        let product = product?;

        if let Some(url) = product
            .attached_image
            .as_ref()
            .and_then(|image| self.normalize(Some(&image.url)))
        {
            return Some(url);
        }

        self.normalize(product.product.image.as_deref())
    }

    /// Order snapshot first, then whatever the live product still offers.
    pub fn for_order(
        &self,
        order: &order::Model,
        product: Option<&ProductRecord>,
    ) -> Option<String> {
        self.normalize(order.product_image.as_deref())
            .or_else(|| self.from_product(product))
    }
}
