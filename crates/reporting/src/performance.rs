//! Per-influencer performance rollup: engagement from posts, revenue from
//! tracking, cost from payouts, and ROAS over the three.

use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;

use influencer_core::{
    AnalyticsResult, DatasetStore, Influencer, InfluencerId, Payout, Post, TrackingRecord,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filter::Selection;
use crate::metrics::{conversion_rate, engagement_rate, roas};
use crate::rollup::{count_by, sum_by};

/// Engagement, conversion and return figures for one influencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluencerPerformance {
    pub influencer_id: InfluencerId,
    pub posts: u64,
    pub reach: u64,
    pub likes: u64,
    pub comments: u64,
    /// Mean of the per-post engagement rates.
    pub engagement_rate: f64,
    pub orders: u64,
    pub conversion_rate: f64,
    pub revenue: f64,
    pub total_payout: f64,
    pub roas: f64,
}

#[derive(Default)]
struct PostTotals {
    posts: u64,
    reach: u64,
    likes: u64,
    comments: u64,
    engagement_sum: f64,
}

/// One row per influencer that has at least one post, ordered by id.
///
/// Revenue and cost are left-joined onto the post aggregate and default to
/// zero; influencers that only appear in tracking or payouts are not
/// reported.
pub fn analyze_influencer_performance(
    posts: &[Post],
    tracking: &[TrackingRecord],
    payouts: &[Payout],
) -> Vec<InfluencerPerformance> {
    let mut post_totals: BTreeMap<InfluencerId, PostTotals> = BTreeMap::new();
    for post in posts {
        let totals = post_totals.entry(post.influencer_id).or_default();
        totals.posts += 1;
        totals.reach = totals.reach.saturating_add(post.reach);
        totals.likes = totals.likes.saturating_add(post.likes);
        totals.comments = totals.comments.saturating_add(post.comments);
        totals.engagement_sum += engagement_rate(post.likes, post.comments, post.reach);
    }

    let revenue = sum_by(tracking, |t| t.influencer_id, |t| t.revenue);
    let orders = count_by(tracking, |t| t.influencer_id, |t| t.orders);
    let cost = sum_by(payouts, |p| p.influencer_id, |p| p.total_payout);

    let rows: Vec<InfluencerPerformance> = post_totals
        .into_iter()
        .map(|(influencer_id, totals)| {
            let revenue = revenue.get(&influencer_id).copied().unwrap_or(0.0);
            let total_payout = cost.get(&influencer_id).copied().unwrap_or(0.0);
            let orders = orders.get(&influencer_id).copied().unwrap_or(0);
            InfluencerPerformance {
                influencer_id,
                posts: totals.posts,
                reach: totals.reach,
                likes: totals.likes,
                comments: totals.comments,
                engagement_rate: totals.engagement_sum / totals.posts as f64,
                orders,
                conversion_rate: conversion_rate(orders, totals.reach),
                revenue,
                total_payout,
                roas: roas(revenue, total_payout),
            }
        })
        .collect();

    debug!(influencers = rows.len(), "Influencer performance computed");
    rows
}

/// [`analyze_influencer_performance`] over the store's tables.
pub fn store_influencer_performance(
    store: &DatasetStore,
) -> AnalyticsResult<Vec<InfluencerPerformance>> {
    Ok(analyze_influencer_performance(
        store.require_posts()?,
        store.require_tracking()?,
        store.require_payouts()?,
    ))
}

/// Performance row with the influencer's profile columns attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfiledPerformance {
    #[serde(flatten)]
    pub performance: InfluencerPerformance,
    pub name: String,
    pub category: String,
    pub platform: String,
    pub follower_count: u64,
}

/// Attach profile columns. Rows whose influencer is not loaded are dropped.
pub fn enrich_with_profiles(
    rows: &[InfluencerPerformance],
    influencers: &[Influencer],
) -> Vec<ProfiledPerformance> {
    let index: HashMap<InfluencerId, &Influencer> =
        influencer_core::store::influencer_index(influencers);
    rows.iter()
        .filter_map(|row| {
            let profile = index.get(&row.influencer_id)?;
            Some(ProfiledPerformance {
                performance: row.clone(),
                name: profile.name.clone(),
                category: profile.category.clone(),
                platform: profile.platform.clone(),
                follower_count: profile.follower_count,
            })
        })
        .collect()
}

/// Narrows profiled rows by category and follower count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFilter {
    pub category: Selection,
    pub followers: Option<RangeInclusive<u64>>,
}

impl ProfileFilter {
    pub fn matches(&self, row: &ProfiledPerformance) -> bool {
        let category_ok = self
            .category
            .value()
            .map_or(true, |c| c == row.category);
        let followers_ok = self
            .followers
            .as_ref()
            .map_or(true, |range| range.contains(&row.follower_count));
        category_ok && followers_ok
    }

    pub fn apply(&self, rows: &[ProfiledPerformance]) -> Vec<ProfiledPerformance> {
        rows.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Follower range spanned by the loaded influencers, for seeding a
/// [`ProfileFilter`].
pub fn follower_bounds(influencers: &[Influencer]) -> Option<RangeInclusive<u64>> {
    let min = influencers.iter().map(|i| i.follower_count).min()?;
    let max = influencers.iter().map(|i| i.follower_count).max()?;
    Some(min..=max)
}
