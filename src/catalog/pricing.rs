use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::{campaign, product};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Price {
    pub price: f64,
    pub effective_price: f64,
    pub campaign: Option<CampaignSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CampaignSummary {
    pub id: i32,
    pub name: String,
    pub ends_at: DateTime<Utc>,
}

/// Cheapest campaign running at `now` for this product, if any.
pub fn running_campaign<'a>(
    product_id: i32,
    campaigns: &'a [campaign::Model],
    now: DateTime<Utc>,
) -> Option<&'a campaign::Model> {
    campaigns
        .iter()
        .filter(|campaign| campaign.product_id == product_id && campaign.is_running(now))
        .min_by(|a, b| a.discount_price.total_cmp(&b.discount_price))
}

pub fn price_for(
    product: &product::Model,
    campaigns: &[campaign::Model],
    now: DateTime<Utc>,
) -> Price {
    match running_campaign(product.id, campaigns, now) {
        Some(campaign) => Price {
            price: product.price,
            effective_price: campaign.discount_price,
            campaign: Some(CampaignSummary {
                id: campaign.id,
                name: campaign.name.clone(),
                ends_at: campaign.ends_at,
            }),
        },
        None => Price {
            price: product.price,
            effective_price: product.price,
            campaign: None,
        },
    }
}
