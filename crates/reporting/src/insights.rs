//! Portfolio overview and ranked leaderboards.

use influencer_core::config::ReportingConfig;
use influencer_core::store::influencer_index;
use influencer_core::{
    AnalyticsResult, DatasetStore, Influencer, InfluencerId, Payout, PayoutStatus, TrackingRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::breakdown::{group_revenue, monthly_revenue_growth, RevenueBucket, RevenueGrowth};
use crate::metrics::roas;
use crate::rollup::{rank_desc, sum_by, total_count};

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

/// Headline totals across every campaign and influencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOverview {
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_orders: u64,
    pub overall_roas: f64,
    /// Distinct campaign labels seen in tracking.
    pub active_campaigns: usize,
    pub total_influencers: usize,
}

pub fn portfolio_overview(store: &DatasetStore) -> AnalyticsResult<PortfolioOverview> {
    let tracking = store.require_tracking()?;
    let payouts = store.require_payouts()?;
    let influencers = store.require_influencers()?;

    let total_revenue: f64 = tracking.iter().map(|t| t.revenue).sum();
    let total_cost: f64 = payouts.iter().map(|p| p.total_payout).sum();
    let active_campaigns = tracking
        .iter()
        .map(|t| t.campaign.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    Ok(PortfolioOverview {
        total_revenue,
        total_cost,
        total_orders: total_count(tracking.iter().map(|t| t.orders)),
        overall_roas: roas(total_revenue, total_cost),
        active_campaigns,
        total_influencers: influencers.len(),
    })
}

// ---------------------------------------------------------------------------
// Leaderboards
// ---------------------------------------------------------------------------

/// An influencer with the figure it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedInfluencer {
    pub influencer_id: InfluencerId,
    pub name: String,
    pub value: f64,
}

/// Rank `values` descending and keep the first `limit`.
///
/// Names are joined before truncating: ids missing from the influencer
/// table are dropped first, so the list still holds `limit` entries when
/// enough named influencers exist. Truncating first and joining after would
/// shorten the list by every unnamed id in the top `limit`.
fn rank_named(
    values: BTreeMap<InfluencerId, f64>,
    influencers: &[Influencer],
    limit: usize,
) -> Vec<RankedInfluencer> {
    let index = influencer_index(influencers);
    let mut ranked: Vec<RankedInfluencer> = values
        .into_iter()
        .filter_map(|(influencer_id, value)| {
            let influencer = index.get(&influencer_id)?;
            Some(RankedInfluencer {
                influencer_id,
                name: influencer.name.clone(),
                value,
            })
        })
        .collect();
    rank_desc(&mut ranked, |r| r.value);
    ranked.truncate(limit);
    ranked
}

pub fn top_influencers_by_revenue(
    tracking: &[TrackingRecord],
    influencers: &[Influencer],
    limit: usize,
) -> Vec<RankedInfluencer> {
    let revenue = sum_by(tracking, |t| t.influencer_id, |t| t.revenue);
    rank_named(revenue, influencers, limit)
}

/// Ranked over every influencer with tracking rows; cost defaults to zero,
/// which yields a ROAS of zero.
pub fn top_influencers_by_roas(
    tracking: &[TrackingRecord],
    payouts: &[Payout],
    influencers: &[Influencer],
    limit: usize,
) -> Vec<RankedInfluencer> {
    let revenue = sum_by(tracking, |t| t.influencer_id, |t| t.revenue);
    let cost = sum_by(payouts, |p| p.influencer_id, |p| p.total_payout);
    let ratios = revenue
        .into_iter()
        .map(|(id, revenue)| (id, roas(revenue, cost.get(&id).copied().unwrap_or(0.0))))
        .collect();
    rank_named(ratios, influencers, limit)
}

pub fn top_influencers_by_payout(
    payouts: &[Payout],
    influencers: &[Influencer],
    limit: usize,
) -> Vec<RankedInfluencer> {
    let cost = sum_by(payouts, |p| p.influencer_id, |p| p.total_payout);
    rank_named(cost, influencers, limit)
}

pub fn top_campaigns_by_revenue(tracking: &[TrackingRecord], limit: usize) -> Vec<RevenueBucket> {
    let mut campaigns = group_revenue(tracking, |t| Some(t.campaign.as_str()));
    rank_desc(&mut campaigns, |c| c.revenue);
    campaigns.truncate(limit);
    campaigns
}

// ---------------------------------------------------------------------------
// Payout status
// ---------------------------------------------------------------------------

/// Number of payouts in one status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: PayoutStatus,
    pub count: usize,
}

/// Payout count per status, most frequent first.
pub fn payout_status_distribution(payouts: &[Payout]) -> Vec<StatusCount> {
    let mut counts: BTreeMap<PayoutStatus, usize> = BTreeMap::new();
    for payout in payouts {
        *counts.entry(payout.status).or_default() += 1;
    }
    let mut distribution: Vec<StatusCount> = counts
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count));
    distribution
}

// ---------------------------------------------------------------------------
// Insights report
// ---------------------------------------------------------------------------

/// Overview, leaderboards, growth and payout status in one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsReport {
    pub overview: PortfolioOverview,
    pub top_influencers_by_revenue: Vec<RankedInfluencer>,
    pub top_influencers_by_roas: Vec<RankedInfluencer>,
    pub top_campaigns_by_revenue: Vec<RevenueBucket>,
    /// Latest month against the one before it, when at least two months of
    /// tracking exist.
    pub latest_growth: Option<RevenueGrowth>,
    pub payout_status: Vec<StatusCount>,
}

pub fn generate_insights(
    store: &DatasetStore,
    config: &ReportingConfig,
) -> AnalyticsResult<InsightsReport> {
    let overview = portfolio_overview(store)?;
    let tracking = store.require_tracking()?;
    let payouts = store.require_payouts()?;
    let influencers = store.require_influencers()?;

    let growth = monthly_revenue_growth(tracking);
    let latest_growth = if growth.len() >= 2 {
        growth.last().cloned()
    } else {
        None
    };

    let report = InsightsReport {
        top_influencers_by_revenue: top_influencers_by_revenue(
            tracking,
            influencers,
            config.top_influencers,
        ),
        top_influencers_by_roas: top_influencers_by_roas(
            tracking,
            payouts,
            influencers,
            config.top_influencers,
        ),
        top_campaigns_by_revenue: top_campaigns_by_revenue(tracking, config.top_campaigns),
        latest_growth,
        payout_status: payout_status_distribution(payouts),
        overview,
    };

    info!(
        total_revenue = report.overview.total_revenue,
        overall_roas = report.overview.overall_roas,
        campaigns = report.overview.active_campaigns,
        "Insights generated"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
