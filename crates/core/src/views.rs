//! Join views produced by the dataset store.
//!
//! Columns present on both sides of a join keep both values, suffixed with the
//! table they came from. Influencer-side columns are `None` when the left row
//! references an influencer that is not loaded.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Influencer, InfluencerId, Post, TrackingRecord};

/// A post joined with the influencer who published it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedPost {
    pub id_post: u64,
    pub influencer_id: InfluencerId,
    pub platform_post: String,
    pub date: NaiveDate,
    pub reach: u64,
    pub likes: u64,
    pub comments: u64,
    pub id_influencer: Option<InfluencerId>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub platform_influencer: Option<String>,
    pub follower_count: Option<u64>,
    pub gender: Option<String>,
    pub created_date: Option<NaiveDate>,
}

impl MergedPost {
    pub fn join(post: &Post, influencer: Option<&Influencer>) -> Self {
        Self {
            id_post: post.id,
            influencer_id: post.influencer_id,
            platform_post: post.platform.clone(),
            date: post.date,
            reach: post.reach,
            likes: post.likes,
            comments: post.comments,
            id_influencer: influencer.map(|i| i.id),
            name: influencer.map(|i| i.name.clone()),
            category: influencer.map(|i| i.category.clone()),
            platform_influencer: influencer.map(|i| i.platform.clone()),
            follower_count: influencer.map(|i| i.follower_count),
            gender: influencer.map(|i| i.gender.clone()),
            created_date: influencer.map(|i| i.created_date),
        }
    }
}

/// A tracking record joined with the attributed influencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedTracking {
    pub influencer_id: InfluencerId,
    pub campaign: String,
    pub brand: String,
    pub platform_tracking: String,
    pub product: String,
    pub date: NaiveDate,
    pub orders: u64,
    pub revenue: f64,
    pub id: Option<InfluencerId>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub platform_influencer: Option<String>,
    pub follower_count: Option<u64>,
    pub gender: Option<String>,
    pub created_date: Option<NaiveDate>,
}

impl MergedTracking {
    pub fn join(record: &TrackingRecord, influencer: Option<&Influencer>) -> Self {
        Self {
            influencer_id: record.influencer_id,
            campaign: record.campaign.clone(),
            brand: record.brand.clone(),
            platform_tracking: record.platform.clone(),
            product: record.product.clone(),
            date: record.date,
            orders: record.orders,
            revenue: record.revenue,
            id: influencer.map(|i| i.id),
            name: influencer.map(|i| i.name.clone()),
            category: influencer.map(|i| i.category.clone()),
            platform_influencer: influencer.map(|i| i.platform.clone()),
            follower_count: influencer.map(|i| i.follower_count),
            gender: influencer.map(|i| i.gender.clone()),
            created_date: influencer.map(|i| i.created_date),
        }
    }
}
