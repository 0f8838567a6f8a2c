//! Ratio metrics shared by every rollup.
//!
//! Each ratio resolves a zero denominator to `0.0` instead of dividing.

/// Return on ad spend: `revenue / cost`, `0.0` when nothing was spent.
pub fn roas(revenue: f64, cost: f64) -> f64 {
    if cost == 0.0 {
        return 0.0;
    }
    revenue / cost
}

/// `(campaign_revenue - baseline_revenue) / campaign_cost`.
///
/// Not floored at zero: a campaign below its baseline yields a negative value.
pub fn incremental_roas(campaign_revenue: f64, baseline_revenue: f64, campaign_cost: f64) -> f64 {
    if campaign_cost == 0.0 {
        return 0.0;
    }
    (campaign_revenue - baseline_revenue) / campaign_cost
}

/// Likes plus comments as a percentage of reach.
pub fn engagement_rate(likes: u64, comments: u64, reach: u64) -> f64 {
    if reach == 0 {
        return 0.0;
    }
    (likes as f64 + comments as f64) / reach as f64 * 100.0
}

/// Orders as a percentage of reach.
pub fn conversion_rate(orders: u64, reach: u64) -> f64 {
    if reach == 0 {
        return 0.0;
    }
    orders as f64 / reach as f64 * 100.0
}

pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Period-over-period change in percent.
pub fn pct_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roas_zero_cost() {
        assert_eq!(roas(1000.0, 0.0), 0.0);
        assert_eq!(roas(-250.0, 0.0), 0.0);
        assert_eq!(roas(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_roas_basic() {
        assert_eq!(roas(1000.0, 500.0), 2.0);
        assert_eq!(roas(0.0, 100.0), 0.0);
        assert_eq!(roas(750.0, 250.0), 3.0);
    }

    #[test]
    fn test_incremental_roas() {
        assert_eq!(incremental_roas(200.0, 100.0, 50.0), 2.0);
        assert_eq!(incremental_roas(100.0, 150.0, 50.0), -1.0);
        assert_eq!(incremental_roas(0.0, 100.0, 50.0), -2.0);
        assert_eq!(incremental_roas(500.0, 100.0, 0.0), 0.0);
    }

    #[test]
    fn test_engagement_and_conversion() {
        assert_eq!(engagement_rate(100, 50, 1000), 15.0);
        assert_eq!(engagement_rate(0, 0, 100), 0.0);
        assert_eq!(engagement_rate(10, 5, 0), 0.0);

        for (comments, reach) in [(50u64, 1000u64), (0, 100), (7, 300)] {
            let expected = comments as f64 / reach as f64 * 100.0;
            assert!((conversion_rate(comments, reach) - expected).abs() < 1e-12);
        }
        assert_eq!(conversion_rate(3, 0), 0.0);
    }

    #[test]
    fn test_engagement_rate_large_counts() {
        let rate = engagement_rate(u64::MAX, 1, 10);
        assert!(rate.is_finite());
        assert!(rate > 1e19);
        assert_eq!(engagement_rate(u64::MAX, u64::MAX, u64::MAX), 200.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.34567, 2), 2.35);
        assert_eq!(round_to(-1.004, 2), -1.0);
        assert_eq!(round_to(6.0, 0), 6.0);
    }

    #[test]
    fn test_pct_change() {
        assert_eq!(pct_change(0.0, 10.0), None);
        assert_eq!(pct_change(200.0, 250.0), Some(25.0));
        assert_eq!(pct_change(200.0, 100.0), Some(-50.0));
    }
}
