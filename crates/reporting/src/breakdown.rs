//! Revenue, cost and ROAS broken down by category and by time bucket.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use influencer_core::{
    AnalyticsError, AnalyticsResult, Influencer, MergedTracking, Payout, TrackingRecord,
};
use serde::{Deserialize, Serialize};

use crate::filter::{Dimension, Filterable};
use crate::metrics::{pct_change, roas};
use crate::rollup::sum_by;

// ---------------------------------------------------------------------------
// Revenue by dimension
// ---------------------------------------------------------------------------

/// Rows carrying order and revenue figures.
pub trait ConversionRow {
    fn orders(&self) -> u64;
    fn revenue(&self) -> f64;
    fn date(&self) -> NaiveDate;
}

impl ConversionRow for TrackingRecord {
    fn orders(&self) -> u64 {
        self.orders
    }
    fn revenue(&self) -> f64 {
        self.revenue
    }
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl ConversionRow for MergedTracking {
    fn orders(&self) -> u64 {
        self.orders
    }
    fn revenue(&self) -> f64 {
        self.revenue
    }
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Orders and revenue summed under one categorical key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueBucket {
    pub key: String,
    pub orders: u64,
    pub revenue: f64,
}

/// Sum orders and revenue per key, ordered by key. Rows without a key are
/// skipped.
pub fn group_revenue<'a, T, F>(rows: &'a [T], key: F) -> Vec<RevenueBucket>
where
    T: ConversionRow,
    F: Fn(&'a T) -> Option<&'a str>,
{
    let mut buckets: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
    for row in rows {
        if let Some(k) = key(row) {
            let entry = buckets.entry(k).or_default();
            entry.0 = entry.0.saturating_add(row.orders());
            entry.1 += row.revenue();
        }
    }
    buckets
        .into_iter()
        .map(|(key, (orders, revenue))| RevenueBucket {
            key: key.to_string(),
            orders,
            revenue,
        })
        .collect()
}

/// Orders and revenue per brand, platform, campaign, product or category.
pub fn revenue_by<T>(rows: &[T], dimension: Dimension) -> AnalyticsResult<Vec<RevenueBucket>>
where
    T: ConversionRow + Filterable,
{
    if !T::supports(dimension) {
        return Err(AnalyticsError::UnsupportedFilter {
            dimension: dimension.name(),
            view: T::VIEW,
        });
    }
    Ok(group_revenue(rows, |row| row.dimension(dimension)))
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// Granularity of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    Day,
    Month,
}

impl TimeBucket {
    /// First day of the bucket containing `date`.
    pub fn start_of(self, date: NaiveDate) -> NaiveDate {
        match self {
            TimeBucket::Day => date,
            TimeBucket::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

/// Orders and revenue for one day or month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodActivity {
    pub period: NaiveDate,
    pub orders: u64,
    pub revenue: f64,
}

/// Orders and revenue per period, for periods that have activity.
pub fn revenue_over_time<T: ConversionRow>(rows: &[T], bucket: TimeBucket) -> Vec<PeriodActivity> {
    let mut periods: BTreeMap<NaiveDate, (u64, f64)> = BTreeMap::new();
    for row in rows {
        let entry = periods.entry(bucket.start_of(row.date())).or_default();
        entry.0 = entry.0.saturating_add(row.orders());
        entry.1 += row.revenue();
    }
    periods
        .into_iter()
        .map(|(period, (orders, revenue))| PeriodActivity {
            period,
            orders,
            revenue,
        })
        .collect()
}

/// Payout total for one period, keyed by payment date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodPayout {
    pub period: NaiveDate,
    pub total_payout: f64,
}

pub fn payouts_over_time(payouts: &[Payout], bucket: TimeBucket) -> Vec<PeriodPayout> {
    sum_by(payouts, |p| bucket.start_of(p.payment_date), |p| p.total_payout)
        .into_iter()
        .map(|(period, total_payout)| PeriodPayout {
            period,
            total_payout,
        })
        .collect()
}

/// One calendar month of revenue with its change from the month before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueGrowth {
    pub month: NaiveDate,
    pub revenue: f64,
    /// Change against the previous month; `None` for the first month or
    /// when the previous month had no revenue.
    pub pct_change: Option<f64>,
}

/// Calendar-month revenue from the first to the last active month, months
/// without activity included at zero.
pub fn monthly_revenue_growth<T: ConversionRow>(rows: &[T]) -> Vec<RevenueGrowth> {
    let monthly = sum_by(rows, |r| TimeBucket::Month.start_of(r.date()), |r| r.revenue());
    let (Some(first), Some(last)) = (
        monthly.keys().next().copied(),
        monthly.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    let mut growth = Vec::new();
    let mut previous: Option<f64> = None;
    let mut month = first;
    while month <= last {
        let revenue = monthly.get(&month).copied().unwrap_or(0.0);
        growth.push(RevenueGrowth {
            month,
            revenue,
            pct_change: previous.and_then(|p| pct_change(p, revenue)),
        });
        previous = Some(revenue);
        month = match month.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    growth
}

// ---------------------------------------------------------------------------
// Platform ROAS
// ---------------------------------------------------------------------------

/// Revenue and cost attributed to one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSpend {
    pub platform: String,
    pub revenue: f64,
    pub total_payout: f64,
}

/// Revenue, cost and ROAS for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRoas {
    pub platform: String,
    pub revenue: f64,
    pub total_payout: f64,
    pub roas: f64,
}

/// Group spend rows by platform and compute ROAS per platform.
pub fn platform_roas(rows: &[PlatformSpend]) -> Vec<PlatformRoas> {
    let mut totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for row in rows {
        let entry = totals.entry(row.platform.as_str()).or_default();
        entry.0 += row.revenue;
        entry.1 += row.total_payout;
    }
    totals
        .into_iter()
        .map(|(platform, (revenue, total_payout))| PlatformRoas {
            platform: platform.to_string(),
            revenue,
            total_payout,
            roas: roas(revenue, total_payout),
        })
        .collect()
}

/// Spend rows per platform. Revenue is keyed by the platform recorded on the
/// tracking row; payouts carry no platform, so cost is keyed by the paid
/// influencer's home platform. Payouts to unknown influencers are skipped.
pub fn platform_spend(
    tracking: &[TrackingRecord],
    payouts: &[Payout],
    influencers: &[Influencer],
) -> Vec<PlatformSpend> {
    let index = influencer_core::store::influencer_index(influencers);
    let revenue = sum_by(tracking, |t| t.platform.clone(), |t| t.revenue);
    let cost = sum_by(
        payouts
            .iter()
            .filter(|p| index.contains_key(&p.influencer_id)),
        |p| {
            index
                .get(&p.influencer_id)
                .map(|i| i.platform.clone())
                .unwrap_or_default()
        },
        |p| p.total_payout,
    );

    let mut platforms: Vec<&String> = revenue.keys().chain(cost.keys()).collect();
    platforms.sort();
    platforms.dedup();
    platforms
        .into_iter()
        .map(|platform| PlatformSpend {
            platform: platform.clone(),
            revenue: revenue.get(platform).copied().unwrap_or(0.0),
            total_payout: cost.get(platform).copied().unwrap_or(0.0),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use influencer_core::{PayoutBasis, PayoutStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(brand: &str, platform: &str, when: NaiveDate, orders: u64, revenue: f64) -> TrackingRecord {
        TrackingRecord {
            influencer_id: 1,
            campaign: "Campaign_1".into(),
            brand: brand.into(),
            platform: platform.into(),
            product: "Pre-Workout".into(),
            date: when,
            orders,
            revenue,
        }
    }

    fn payout(influencer_id: u64, when: NaiveDate, total_payout: f64) -> Payout {
        Payout {
            influencer_id,
            campaign: "Campaign_1".into(),
            basis: PayoutBasis::Order,
            rate: 10.0,
            orders: 1,
            posts: 0,
            total_payout,
            payment_date: when,
            status: PayoutStatus::Pending,
        }
    }

    fn influencer(id: u64, platform: &str) -> Influencer {
        Influencer {
            id,
            name: format!("Influencer_{id}"),
            category: "Sports".into(),
            platform: platform.into(),
            follower_count: 1000,
            gender: "Male".into(),
            created_date: date(2023, 6, 1),
        }
    }

    #[test]
    fn test_revenue_by_brand() {
        let rows = vec![
            sale("MuscleBlaze", "Instagram", date(2024, 1, 1), 2, 300.0),
            sale("Gritzo", "Instagram", date(2024, 1, 2), 1, 50.0),
            sale("MuscleBlaze", "YouTube", date(2024, 1, 3), 1, 200.0),
        ];
        let buckets = revenue_by(&rows, Dimension::Brand).unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, "Gritzo");
        assert_eq!(buckets[1].key, "MuscleBlaze");
        assert_eq!(buckets[1].orders, 3);
        assert_eq!(buckets[1].revenue, 500.0);

        assert!(revenue_by(&rows, Dimension::Category).is_err());
    }

    #[test]
    fn test_revenue_over_time_buckets() {
        let rows = vec![
            sale("Gritzo", "Twitter", date(2024, 1, 5), 1, 100.0),
            sale("Gritzo", "Twitter", date(2024, 1, 5), 2, 150.0),
            sale("Gritzo", "Twitter", date(2024, 1, 28), 1, 50.0),
            sale("Gritzo", "Twitter", date(2024, 2, 2), 1, 25.0),
        ];
        let daily = revenue_over_time(&rows, TimeBucket::Day);
        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].orders, 3);
        assert_eq!(daily[0].revenue, 250.0);

        let monthly = revenue_over_time(&rows, TimeBucket::Month);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].period, date(2024, 1, 1));
        assert_eq!(monthly[0].revenue, 300.0);
        assert_eq!(monthly[1].period, date(2024, 2, 1));
    }

    #[test]
    fn test_monthly_growth_fills_gaps() {
        let rows = vec![
            sale("HKVitals", "YouTube", date(2024, 1, 10), 1, 200.0),
            sale("HKVitals", "YouTube", date(2024, 3, 10), 1, 300.0),
            sale("HKVitals", "YouTube", date(2024, 4, 10), 1, 450.0),
        ];
        let growth = monthly_revenue_growth(&rows);
        assert_eq!(growth.len(), 4);
        assert_eq!(growth[0].pct_change, None);
        assert_eq!(growth[1].revenue, 0.0);
        assert_eq!(growth[1].pct_change, Some(-100.0));
        assert_eq!(growth[2].pct_change, None);
        assert_eq!(growth[3].pct_change, Some(50.0));

        assert!(monthly_revenue_growth::<TrackingRecord>(&[]).is_empty());
    }

    #[test]
    fn test_payouts_over_time() {
        let payouts = vec![
            payout(1, date(2024, 1, 10), 100.0),
            payout(2, date(2024, 1, 31), 50.0),
            payout(3, date(2024, 2, 1), 25.0),
        ];
        let monthly = payouts_over_time(&payouts, TimeBucket::Month);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].total_payout, 150.0);
        assert_eq!(monthly[1].period, date(2024, 2, 1));
    }

    #[test]
    fn test_platform_roas() {
        let rows = vec![
            PlatformSpend { platform: "YouTube".into(), revenue: 900.0, total_payout: 300.0 },
            PlatformSpend { platform: "Instagram".into(), revenue: 100.0, total_payout: 0.0 },
            PlatformSpend { platform: "YouTube".into(), revenue: 300.0, total_payout: 100.0 },
        ];
        let result = platform_roas(&rows);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].platform, "Instagram");
        assert_eq!(result[0].roas, 0.0);
        assert_eq!(result[1].revenue, 1200.0);
        assert_eq!(result[1].roas, 3.0);
    }

    #[test]
    fn test_platform_spend_attributes_cost_by_influencer_platform() {
        let tracking = vec![
            sale("Gritzo", "Instagram", date(2024, 1, 1), 1, 400.0),
            sale("Gritzo", "YouTube", date(2024, 1, 1), 1, 600.0),
        ];
        let payouts = vec![
            payout(1, date(2024, 1, 2), 200.0),
            payout(2, date(2024, 1, 2), 100.0),
            payout(9, date(2024, 1, 2), 999.0),
        ];
        let influencers = vec![influencer(1, "YouTube"), influencer(2, "Twitter")];
        let spend = platform_spend(&tracking, &payouts, &influencers);
        let platforms: Vec<&str> = spend.iter().map(|s| s.platform.as_str()).collect();
        assert_eq!(platforms, vec!["Instagram", "Twitter", "YouTube"]);
        assert_eq!(spend[1].revenue, 0.0);
        assert_eq!(spend[1].total_payout, 100.0);
        assert_eq!(spend[2].total_payout, 200.0);

        let roas = platform_roas(&spend);
        assert_eq!(roas[2].roas, 3.0);
    }
}
