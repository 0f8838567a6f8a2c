//! Campaign-level ROAS and the campaign-scoped performance view.

use std::collections::{BTreeMap, BTreeSet};

use influencer_core::{
    AnalyticsResult, DatasetStore, InfluencerId, MergedTracking, Payout, TrackingRecord,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::breakdown::{group_revenue, revenue_over_time, PeriodActivity, RevenueBucket, TimeBucket};
use crate::filter::{apply_filters, FilterCriteria, Selection};
use crate::metrics::{incremental_roas, roas};
use crate::rollup::{sum_by, total_count};

// ---------------------------------------------------------------------------
// Campaign ROAS
// ---------------------------------------------------------------------------

/// Revenue, cost and return figures for one campaign label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRoas {
    pub campaign: String,
    pub revenue: f64,
    pub total_payout: f64,
    pub roas: f64,
    /// Measured against the revenue of every other campaign.
    pub incremental_roas: f64,
    /// Revenue needed for ROAS to reach 1.0.
    pub break_even: f64,
}

/// Revenue and cost per campaign label, outer-combined across tracking and
/// payouts with zero fill, ordered by campaign.
pub fn campaign_roas(tracking: &[TrackingRecord], payouts: &[Payout]) -> Vec<CampaignRoas> {
    let revenue = sum_by(tracking, |t| t.campaign.clone(), |t| t.revenue);
    let cost = sum_by(payouts, |p| p.campaign.clone(), |p| p.total_payout);
    let portfolio_revenue: f64 = tracking.iter().map(|t| t.revenue).sum();

    let campaigns: BTreeSet<&String> = revenue.keys().chain(cost.keys()).collect();
    let rows: Vec<CampaignRoas> = campaigns
        .into_iter()
        .map(|campaign| {
            let revenue = revenue.get(campaign).copied().unwrap_or(0.0);
            let total_payout = cost.get(campaign).copied().unwrap_or(0.0);
            CampaignRoas {
                campaign: campaign.clone(),
                revenue,
                total_payout,
                roas: roas(revenue, total_payout),
                incremental_roas: incremental_roas(
                    revenue,
                    portfolio_revenue - revenue,
                    total_payout,
                ),
                break_even: total_payout,
            }
        })
        .collect();

    debug!(campaigns = rows.len(), portfolio_revenue, "Campaign ROAS computed");
    rows
}

pub fn store_campaign_roas(store: &DatasetStore) -> AnalyticsResult<Vec<CampaignRoas>> {
    Ok(campaign_roas(store.require_tracking()?, store.require_payouts()?))
}

/// Total revenue over total cost across the whole portfolio.
pub fn overall_roas(tracking: &[TrackingRecord], payouts: &[Payout]) -> f64 {
    let revenue: f64 = tracking.iter().map(|t| t.revenue).sum();
    let cost: f64 = payouts.iter().map(|p| p.total_payout).sum();
    roas(revenue, cost)
}

// ---------------------------------------------------------------------------
// Campaign scope
// ---------------------------------------------------------------------------

/// Headline figures of a campaign scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignScopeTotals {
    pub orders: u64,
    pub revenue: f64,
    pub cost: f64,
    pub roas: f64,
}

/// One influencer's orders, revenue and cost inside a campaign scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluencerCampaignRow {
    pub influencer_id: InfluencerId,
    pub name: Option<String>,
    pub orders: u64,
    pub revenue: f64,
    pub total_payout: f64,
    pub roas: f64,
}

/// Everything the campaign view shows for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignScopeView {
    pub campaign: Selection,
    pub totals: CampaignScopeTotals,
    pub influencers: Vec<InfluencerCampaignRow>,
    pub timeline: Vec<PeriodActivity>,
    pub platforms: Vec<RevenueBucket>,
}

/// Payouts attributable to the selected campaign; all payouts when no
/// single campaign is selected.
pub fn scope_payouts<'a>(payouts: &'a [Payout], campaign: &Selection) -> Vec<&'a Payout> {
    match campaign.value() {
        Some(name) => payouts.iter().filter(|p| p.campaign == name).collect(),
        None => payouts.iter().collect(),
    }
}

/// Build the campaign view from tracking rows that have already been
/// filtered. Cost is drawn from payouts restricted to the same campaign so
/// revenue and cost share one scope.
pub fn campaign_scoped_performance(
    filtered: &[MergedTracking],
    payouts: &[Payout],
    campaign: &Selection,
) -> CampaignScopeView {
    let scoped = scope_payouts(payouts, campaign);
    let cost_by_influencer = sum_by(scoped.iter().copied(), |p| p.influencer_id, |p| p.total_payout);

    let mut by_influencer: BTreeMap<InfluencerId, InfluencerCampaignRow> = BTreeMap::new();
    for row in filtered {
        let entry = by_influencer
            .entry(row.influencer_id)
            .or_insert_with(|| InfluencerCampaignRow {
                influencer_id: row.influencer_id,
                name: row.name.clone(),
                orders: 0,
                revenue: 0.0,
                total_payout: 0.0,
                roas: 0.0,
            });
        entry.orders = entry.orders.saturating_add(row.orders);
        entry.revenue += row.revenue;
    }
    let influencers: Vec<InfluencerCampaignRow> = by_influencer
        .into_values()
        .map(|mut row| {
            row.total_payout = cost_by_influencer
                .get(&row.influencer_id)
                .copied()
                .unwrap_or(0.0);
            row.roas = roas(row.revenue, row.total_payout);
            row
        })
        .collect();

    let revenue: f64 = filtered.iter().map(|r| r.revenue).sum();
    let cost: f64 = scoped.iter().map(|p| p.total_payout).sum();
    let totals = CampaignScopeTotals {
        orders: total_count(filtered.iter().map(|r| r.orders)),
        revenue,
        cost,
        roas: roas(revenue, cost),
    };

    CampaignScopeView {
        campaign: campaign.clone(),
        totals,
        influencers,
        timeline: revenue_over_time(filtered, TimeBucket::Day),
        platforms: group_revenue(filtered, |r| Some(r.platform_tracking.as_str())),
    }
}

/// Filter the merged tracking view with `criteria` and build the campaign
/// view for the resulting scope.
pub fn campaign_scope(
    store: &DatasetStore,
    criteria: &FilterCriteria,
) -> AnalyticsResult<CampaignScopeView> {
    let view = store.merged_tracking_view()?;
    let filtered = apply_filters(&view, criteria)?;
    debug!(
        rows = filtered.len(),
        campaign = ?criteria.campaign.value(),
        "Campaign scope filtered"
    );
    Ok(campaign_scoped_performance(
        &filtered,
        store.require_payouts()?,
        &criteria.campaign,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
