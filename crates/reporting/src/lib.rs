//! Influencer campaign analytics: ratio metrics, row filters, per-influencer
//! and per-campaign rollups, breakdowns and portfolio insights.

pub mod breakdown;
pub mod campaign;
pub mod filter;
pub mod insights;
pub mod metrics;
pub mod performance;
mod rollup;

pub use campaign::{campaign_roas, campaign_scope, overall_roas, CampaignRoas, CampaignScopeView};
pub use filter::{apply_filters, Dimension, FilterCriteria, Filterable, Selection};
pub use insights::{generate_insights, portfolio_overview, InsightsReport, PortfolioOverview};
pub use performance::{analyze_influencer_performance, InfluencerPerformance};
