//! Row filtering over tables and join views: categorical equality filters
//! plus an inclusive calendar-date range, combined with AND.

use chrono::NaiveDate;
use influencer_core::{
    AnalyticsError, AnalyticsResult, MergedPost, MergedTracking, Payout, Post, TrackingRecord,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Categorical columns a filter can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Brand,
    Platform,
    Campaign,
    Product,
    Category,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Brand,
        Dimension::Platform,
        Dimension::Campaign,
        Dimension::Product,
        Dimension::Category,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dimension::Brand => "brand",
            Dimension::Platform => "platform",
            Dimension::Campaign => "campaign",
            Dimension::Product => "product",
            Dimension::Category => "category",
        }
    }
}

pub const ALL_SENTINEL: &str = "All";

/// A categorical filter value. `All` matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::Only(v) => Some(v.as_str()),
        }
    }

    fn matches(&self, actual: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => actual == Some(expected.as_str()),
        }
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        if value == ALL_SENTINEL {
            Selection::All
        } else {
            Selection::Only(value)
        }
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::from(value.to_string())
    }
}

impl From<Selection> for String {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::All => ALL_SENTINEL.to_string(),
            Selection::Only(v) => v,
        }
    }
}

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Categorical selections plus an optional date range, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub brand: Selection,
    #[serde(default)]
    pub platform: Selection,
    #[serde(default)]
    pub campaign: Selection,
    #[serde(default)]
    pub product: Selection,
    #[serde(default)]
    pub category: Selection,
    #[serde(default)]
    pub date_range: Option<DateRange>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dimension: Dimension, selection: impl Into<Selection>) -> Self {
        *self.selection_mut(dimension) = selection.into();
        self
    }

    pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some(DateRange::new(start, end));
        self
    }

    pub fn selection(&self, dimension: Dimension) -> &Selection {
        match dimension {
            Dimension::Brand => &self.brand,
            Dimension::Platform => &self.platform,
            Dimension::Campaign => &self.campaign,
            Dimension::Product => &self.product,
            Dimension::Category => &self.category,
        }
    }

    fn selection_mut(&mut self, dimension: Dimension) -> &mut Selection {
        match dimension {
            Dimension::Brand => &mut self.brand,
            Dimension::Platform => &mut self.platform,
            Dimension::Campaign => &mut self.campaign,
            Dimension::Product => &mut self.product,
            Dimension::Category => &mut self.category,
        }
    }

    /// Dimensions with a concrete value selected.
    pub fn active_dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        Dimension::ALL
            .into_iter()
            .filter(|d| !self.selection(*d).is_all())
    }

    pub fn matches<T: Filterable>(&self, row: &T) -> bool {
        self.active_dimensions()
            .all(|d| self.selection(d).matches(row.dimension(d)))
            && self
                .date_range
                .map_or(true, |range| range.contains(row.filter_date()))
    }
}

/// Rows the filter engine can narrow.
pub trait Filterable {
    /// Name used in error messages.
    const VIEW: &'static str;

    /// Whether rows of this type carry the given column at all.
    fn supports(dimension: Dimension) -> bool;

    /// Value of a categorical column; `None` when the column is absent or the
    /// joined side is missing.
    fn dimension(&self, dimension: Dimension) -> Option<&str>;

    /// Date compared against the criteria's date range.
    fn filter_date(&self) -> NaiveDate;
}

/// Return the rows matching every active criterion. The input is not
/// modified. Selecting a value for a column the row type does not carry is
/// rejected before any row is examined.
pub fn apply_filters<T: Filterable + Clone>(
    rows: &[T],
    criteria: &FilterCriteria,
) -> AnalyticsResult<Vec<T>> {
    if let Some(dimension) = criteria.active_dimensions().find(|d| !T::supports(*d)) {
        return Err(AnalyticsError::UnsupportedFilter {
            dimension: dimension.name(),
            view: T::VIEW,
        });
    }

    let filtered: Vec<T> = rows
        .iter()
        .filter(|row| criteria.matches(*row))
        .cloned()
        .collect();
    debug!(
        view = T::VIEW,
        input = rows.len(),
        output = filtered.len(),
        "Filters applied"
    );
    Ok(filtered)
}

/// Payouts whose payment date falls within `[start, end]`.
pub fn filter_payouts_by_date(payouts: &[Payout], start: NaiveDate, end: NaiveDate) -> Vec<Payout> {
    let range = DateRange::new(start, end);
    payouts
        .iter()
        .filter(|p| range.contains(p.payment_date))
        .cloned()
        .collect()
}

impl Filterable for MergedTracking {
    const VIEW: &'static str = "tracking_with_influencers";

    fn supports(_dimension: Dimension) -> bool {
        true
    }

    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Brand => Some(self.brand.as_str()),
            Dimension::Platform => Some(self.platform_tracking.as_str()),
            Dimension::Campaign => Some(self.campaign.as_str()),
            Dimension::Product => Some(self.product.as_str()),
            Dimension::Category => self.category.as_deref(),
        }
    }

    fn filter_date(&self) -> NaiveDate {
        self.date
    }
}

impl Filterable for TrackingRecord {
    const VIEW: &'static str = "tracking";

    fn supports(dimension: Dimension) -> bool {
        dimension != Dimension::Category
    }

    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Brand => Some(self.brand.as_str()),
            Dimension::Platform => Some(self.platform.as_str()),
            Dimension::Campaign => Some(self.campaign.as_str()),
            Dimension::Product => Some(self.product.as_str()),
            Dimension::Category => None,
        }
    }

    fn filter_date(&self) -> NaiveDate {
        self.date
    }
}

impl Filterable for MergedPost {
    const VIEW: &'static str = "posts_with_influencers";

    fn supports(dimension: Dimension) -> bool {
        matches!(dimension, Dimension::Platform | Dimension::Category)
    }

    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Platform => Some(self.platform_post.as_str()),
            Dimension::Category => self.category.as_deref(),
            _ => None,
        }
    }

    fn filter_date(&self) -> NaiveDate {
        self.date
    }
}

impl Filterable for Post {
    const VIEW: &'static str = "posts";

    fn supports(dimension: Dimension) -> bool {
        dimension == Dimension::Platform
    }

    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Platform => Some(self.platform.as_str()),
            _ => None,
        }
    }

    fn filter_date(&self) -> NaiveDate {
        self.date
    }
}

impl Filterable for Payout {
    const VIEW: &'static str = "payouts";

    fn supports(dimension: Dimension) -> bool {
        dimension == Dimension::Campaign
    }

    fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Campaign => Some(self.campaign.as_str()),
            _ => None,
        }
    }

    fn filter_date(&self) -> NaiveDate {
        self.payment_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use influencer_core::{PayoutBasis, PayoutStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payout(influencer_id: u64, total_payout: f64, payment_date: NaiveDate) -> Payout {
        Payout {
            influencer_id,
            campaign: format!("Campaign_{}", influencer_id % 2),
            basis: PayoutBasis::Post,
            rate: total_payout,
            orders: 0,
            posts: 1,
            total_payout,
            payment_date,
            status: PayoutStatus::Pending,
        }
    }

    fn sample_payouts() -> Vec<Payout> {
        vec![
            payout(1, 100.0, date(2024, 1, 10)),
            payout(2, 200.0, date(2024, 1, 15)),
            payout(3, 300.0, date(2024, 1, 20)),
            payout(4, 400.0, date(2024, 2, 1)),
        ]
    }

    fn ids(rows: &[Payout]) -> Vec<u64> {
        let mut ids: Vec<u64> = rows.iter().map(|p| p.influencer_id).collect();
        ids.sort_unstable();
        ids
    }

    fn tracking(brand: &str, platform: &str, campaign: &str, day: u32) -> TrackingRecord {
        TrackingRecord {
            influencer_id: 1,
            campaign: campaign.to_string(),
            brand: brand.to_string(),
            platform: platform.to_string(),
            product: "Vitamins".to_string(),
            date: date(2024, 3, day),
            orders: 1,
            revenue: 100.0,
        }
    }

    #[test]
    fn test_payout_date_range_inclusive() {
        let payouts = sample_payouts();
        let cases = [
            ((2024, 1, 10), (2024, 1, 20), vec![1, 2, 3]),
            ((2024, 1, 15), (2024, 1, 15), vec![2]),
            ((2023, 12, 31), (2024, 1, 9), vec![]),
            ((2024, 1, 21), (2024, 1, 31), vec![]),
            ((2024, 2, 1), (2024, 2, 1), vec![4]),
        ];
        for ((sy, sm, sd), (ey, em, ed), expected) in cases {
            let start = date(sy, sm, sd);
            let end = date(ey, em, ed);
            assert_eq!(ids(&filter_payouts_by_date(&payouts, start, end)), expected);

            let criteria = FilterCriteria::new().between(start, end);
            assert_eq!(ids(&apply_filters(&payouts, &criteria).unwrap()), expected);
        }
    }

    #[test]
    fn test_categorical_filters_and_combined() {
        let rows = vec![
            tracking("MuscleBlaze", "Instagram", "Campaign_1", 1),
            tracking("MuscleBlaze", "YouTube", "Campaign_1", 2),
            tracking("Gritzo", "Instagram", "Campaign_2", 3),
        ];
        let criteria = FilterCriteria::new()
            .with(Dimension::Brand, "MuscleBlaze")
            .with(Dimension::Platform, "Instagram");
        let filtered = apply_filters(&rows, &criteria).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].date, date(2024, 3, 1));

        let all = FilterCriteria::new().with(Dimension::Campaign, ALL_SENTINEL);
        assert_eq!(apply_filters(&rows, &all).unwrap().len(), 3);
    }

    #[test]
    fn test_unmatched_value_is_empty_not_error() {
        let rows = vec![tracking("HKVitals", "Twitter", "Campaign_3", 4)];
        let criteria = FilterCriteria::new().with(Dimension::Product, "Omega-3");
        assert!(apply_filters(&rows, &criteria).unwrap().is_empty());
    }

    #[test]
    fn test_filter_idempotent_and_source_untouched() {
        let rows = vec![
            tracking("MuscleBlaze", "Instagram", "Campaign_1", 1),
            tracking("Gritzo", "YouTube", "Campaign_1", 9),
            tracking("Gritzo", "YouTube", "Campaign_2", 20),
        ];
        let criteria = FilterCriteria::new()
            .with(Dimension::Campaign, "Campaign_1")
            .between(date(2024, 3, 1), date(2024, 3, 10));
        let once = apply_filters(&rows, &criteria).unwrap();
        let twice = apply_filters(&once, &criteria).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_unsupported_dimension_rejected() {
        let rows = vec![tracking("Gritzo", "YouTube", "Campaign_2", 20)];
        let criteria = FilterCriteria::new().with(Dimension::Category, "Fitness");
        let err = apply_filters(&rows, &criteria).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::UnsupportedFilter { dimension: "category", view: "tracking" }
        ));
    }

    fn merged_post(id: u64, platform: &str, category: Option<&str>) -> MergedPost {
        let post = Post {
            id,
            influencer_id: id,
            platform: platform.to_string(),
            date: date(2024, 4, id as u32),
            reach: 1000,
            likes: 10,
            comments: 1,
        };
        let influencer = category.map(|category| influencer_core::Influencer {
            id,
            name: format!("Influencer_{id}"),
            category: category.to_string(),
            platform: "Instagram".to_string(),
            follower_count: 25_000,
            gender: "Female".to_string(),
            created_date: date(2023, 6, 1),
        });
        MergedPost::join(&post, influencer.as_ref())
    }

    #[test]
    fn test_merged_posts_filter_by_category_and_platform() {
        let rows = vec![
            merged_post(1, "YouTube", Some("Fitness")),
            merged_post(2, "Instagram", Some("Fitness")),
            merged_post(3, "YouTube", Some("Health")),
            merged_post(4, "YouTube", None),
        ];

        let fitness = FilterCriteria::new().with(Dimension::Category, "Fitness");
        let ids: Vec<u64> = apply_filters(&rows, &fitness)
            .unwrap()
            .iter()
            .map(|r| r.id_post)
            .collect();
        assert_eq!(ids, vec![1, 2]);

        // Platform targets the post's own platform, not the influencer's.
        let youtube = FilterCriteria::new().with(Dimension::Platform, "YouTube");
        assert_eq!(apply_filters(&rows, &youtube).unwrap().len(), 3);

        let both = fitness.with(Dimension::Platform, "YouTube");
        let filtered = apply_filters(&rows, &both).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id_post, 1);
    }

    #[test]
    fn test_posts_reject_tracking_dimensions() {
        let rows = vec![merged_post(1, "YouTube", Some("Fitness"))];
        let criteria = FilterCriteria::new().with(Dimension::Brand, "Gritzo");
        assert!(matches!(
            apply_filters(&rows, &criteria).unwrap_err(),
            AnalyticsError::UnsupportedFilter { dimension: "brand", view: "posts_with_influencers" }
        ));

        let posts = vec![Post {
            id: 5,
            influencer_id: 1,
            platform: "Twitter".to_string(),
            date: date(2024, 4, 9),
            reach: 10,
            likes: 1,
            comments: 0,
        }];
        let by_platform = FilterCriteria::new()
            .with(Dimension::Platform, "Twitter")
            .between(date(2024, 4, 1), date(2024, 4, 30));
        assert_eq!(apply_filters(&posts, &by_platform).unwrap().len(), 1);

        let by_category = FilterCriteria::new().with(Dimension::Category, "Fitness");
        assert!(matches!(
            apply_filters(&posts, &by_category).unwrap_err(),
            AnalyticsError::UnsupportedFilter { dimension: "category", view: "posts" }
        ));
    }

    #[test]
    fn test_selection_serde_uses_all_sentinel() {
        let criteria: FilterCriteria =
            serde_json::from_str(r#"{"brand": "All", "campaign": "Campaign_7"}"#).unwrap();
        assert!(criteria.brand.is_all());
        assert_eq!(criteria.campaign.value(), Some("Campaign_7"));
        assert!(criteria.platform.is_all());
        assert!(criteria.date_range.is_none());
    }
}
