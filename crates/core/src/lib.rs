//! Influencer campaign data model: typed tables, the session dataset store,
//! join views, configuration and errors.

pub mod config;
pub mod error;
pub mod store;
pub mod types;
pub mod views;

pub use config::AppConfig;
pub use error::{AnalyticsError, AnalyticsResult};
pub use store::{DatasetStore, LoadSummary, TablePayload, ValidationReport};
pub use types::{
    Influencer, InfluencerId, Payout, PayoutBasis, PayoutStatus, Post, TableKind, TrackingRecord,
};
pub use views::{MergedPost, MergedTracking};
