use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type InfluencerId = u64;

/// The four tables held by a [`DatasetStore`](crate::store::DatasetStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Influencers,
    Posts,
    Tracking,
    Payouts,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Influencers,
        TableKind::Posts,
        TableKind::Tracking,
        TableKind::Payouts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TableKind::Influencers => "influencers",
            TableKind::Posts => "posts",
            TableKind::Tracking => "tracking",
            TableKind::Payouts => "payouts",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TableKind::Influencers => "Influencers",
            TableKind::Posts => "Posts",
            TableKind::Tracking => "Tracking",
            TableKind::Payouts => "Payouts",
        }
    }

    /// Resolve a filename-like identifier (`Posts_march.csv`, `tracking`) to
    /// a table by case-insensitive prefix. Unknown identifiers yield `None`.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let lowered = identifier.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| lowered.starts_with(kind.name()))
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Influencer {
    #[serde(deserialize_with = "de::count")]
    pub id: InfluencerId,
    pub name: String,
    pub category: String,
    pub platform: String,
    #[serde(deserialize_with = "de::count")]
    pub follower_count: u64,
    pub gender: String,
    #[serde(deserialize_with = "de::calendar_date")]
    pub created_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(deserialize_with = "de::count")]
    pub id: u64,
    #[serde(deserialize_with = "de::count")]
    pub influencer_id: InfluencerId,
    pub platform: String,
    #[serde(deserialize_with = "de::calendar_date")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "de::count")]
    pub reach: u64,
    #[serde(deserialize_with = "de::count")]
    pub likes: u64,
    #[serde(deserialize_with = "de::count")]
    pub comments: u64,
}

/// An order/conversion event attributed to an influencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingRecord {
    #[serde(deserialize_with = "de::count")]
    pub influencer_id: InfluencerId,
    pub campaign: String,
    pub brand: String,
    pub platform: String,
    pub product: String,
    #[serde(deserialize_with = "de::calendar_date")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "de::count")]
    pub orders: u64,
    #[serde(deserialize_with = "de::amount")]
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    #[serde(deserialize_with = "de::count")]
    pub influencer_id: InfluencerId,
    pub campaign: String,
    #[serde(deserialize_with = "de::parsed")]
    pub basis: PayoutBasis,
    #[serde(deserialize_with = "de::amount")]
    pub rate: f64,
    #[serde(deserialize_with = "de::count")]
    pub orders: u64,
    #[serde(deserialize_with = "de::count")]
    pub posts: u64,
    #[serde(deserialize_with = "de::amount")]
    pub total_payout: f64,
    #[serde(deserialize_with = "de::calendar_date")]
    pub payment_date: NaiveDate,
    #[serde(deserialize_with = "de::parsed")]
    pub status: PayoutStatus,
}

/// Whether a payout is computed per post or per order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutBasis {
    Post,
    Order,
}

impl FromStr for PayoutBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "post" => Ok(Self::Post),
            "order" => Ok(Self::Order),
            other => Err(format!("unknown payout basis `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Paid,
}

impl FromStr for PayoutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "paid" => Ok(Self::Paid),
            other => Err(format!("unknown payout status `{other}`")),
        }
    }
}

/// Lenient field decoders for rows that come out of CSV text, where numbers
/// and enums arrive as strings and dates may carry a time-of-day.
pub(crate) mod de {
    use std::fmt::Display;
    use std::str::FromStr;

    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Numeric {
        Int(u64),
        Float(f64),
        Text(String),
    }

    impl Numeric {
        fn as_f64(&self) -> Result<f64, String> {
            match self {
                Numeric::Int(v) => Ok(*v as f64),
                Numeric::Float(v) => Ok(*v),
                Numeric::Text(s) => s
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| format!("`{s}` is not a number")),
            }
        }
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = Numeric::deserialize(deserializer)?;
        match &value {
            Numeric::Int(v) => return Ok(*v),
            Numeric::Text(s) => {
                if let Ok(v) = s.trim().parse::<u64>() {
                    return Ok(v);
                }
            }
            Numeric::Float(_) => {}
        }
        let v = value.as_f64().map_err(D::Error::custom)?;
        // 2^64 and above do not fit in a u64.
        if v < 0.0 || v.fract() != 0.0 || !v.is_finite() || v >= u64::MAX as f64 {
            return Err(D::Error::custom(format!(
                "expected a non-negative integer, got {v}"
            )));
        }
        Ok(v as u64)
    }

    pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let v = Numeric::deserialize(deserializer)?
            .as_f64()
            .map_err(D::Error::custom)?;
        if v < 0.0 || !v.is_finite() {
            return Err(D::Error::custom(format!(
                "expected a non-negative amount, got {v}"
            )));
        }
        Ok(v)
    }

    pub fn parsed<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }

    pub fn calendar_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_calendar_date(&raw).ok_or_else(|| D::Error::custom(format!("`{raw}` is not a date")))
    }

    /// Parse a date, dropping any time-of-day component.
    pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date);
        }
        for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(ts.date());
            }
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.naive_local().date())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_kind_prefix_matching() {
        assert_eq!(
            TableKind::from_identifier("Influencers_2024.csv"),
            Some(TableKind::Influencers)
        );
        assert_eq!(TableKind::from_identifier("POSTS.csv"), Some(TableKind::Posts));
        assert_eq!(TableKind::from_identifier("tracking"), Some(TableKind::Tracking));
        assert_eq!(TableKind::from_identifier("payouts-q1.json"), Some(TableKind::Payouts));
        assert_eq!(TableKind::from_identifier("orders.csv"), None);
        assert_eq!(TableKind::from_identifier("my_posts.csv"), None);
    }

    #[test]
    fn test_csv_style_row_decodes() {
        let row = json!({
            "id": "7",
            "influencer_id": "3",
            "platform": "Instagram",
            "date": "2024-03-05 18:22:10",
            "reach": "12000",
            "likes": 540.0,
            "comments": 31,
            "caption": "ignored extra column"
        });
        let post: Post = serde_json::from_value(row).unwrap();
        assert_eq!(post.id, 7);
        assert_eq!(post.influencer_id, 3);
        assert_eq!(post.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(post.reach, 12_000);
        assert_eq!(post.likes, 540);
    }

    #[test]
    fn test_negative_and_fractional_counts_rejected() {
        let row = json!({
            "influencer_id": 1, "campaign": "C1", "brand": "B", "platform": "YouTube",
            "product": "Vitamins", "date": "2024-01-01", "orders": -2, "revenue": 10.0
        });
        assert!(serde_json::from_value::<TrackingRecord>(row).is_err());

        let row = json!({
            "influencer_id": 1, "campaign": "C1", "brand": "B", "platform": "YouTube",
            "product": "Vitamins", "date": "2024-01-01", "orders": 1.5, "revenue": 10.0
        });
        assert!(serde_json::from_value::<TrackingRecord>(row).is_err());
    }

    #[test]
    fn test_counts_beyond_u64_rejected() {
        let post = |reach: serde_json::Value| {
            json!({
                "id": 1, "influencer_id": 1, "platform": "YouTube", "date": "2024-01-01",
                "reach": reach, "likes": 0, "comments": 0
            })
        };
        assert!(serde_json::from_value::<Post>(post(json!("1e25"))).is_err());
        assert!(serde_json::from_value::<Post>(post(json!(1e25))).is_err());
        assert!(serde_json::from_value::<Post>(post(json!("18446744073709551616"))).is_err());

        let max: Post = serde_json::from_value(post(json!("18446744073709551615"))).unwrap();
        assert_eq!(max.reach, u64::MAX);
        let max: Post = serde_json::from_value(post(json!(u64::MAX))).unwrap();
        assert_eq!(max.reach, u64::MAX);
    }

    #[test]
    fn test_payout_enums_case_insensitive() {
        let row = json!({
            "influencer_id": 4, "campaign": "Campaign_2", "basis": "Order", "rate": "120.5",
            "orders": 3, "posts": 0, "total_payout": 361.5,
            "payment_date": "2024-02-01T09:30:00+05:30", "status": "PAID"
        });
        let payout: Payout = serde_json::from_value(row).unwrap();
        assert_eq!(payout.basis, PayoutBasis::Order);
        assert_eq!(payout.status, PayoutStatus::Paid);
        assert_eq!(payout.payment_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert!((payout.rate - 120.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_column_rejected() {
        let row = json!({ "id": 1, "name": "Influencer_1" });
        assert!(serde_json::from_value::<Influencer>(row).is_err());
    }
}
