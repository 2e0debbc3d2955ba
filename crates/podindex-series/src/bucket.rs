//! Time-bucketed aggregates.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::date::BucketDate;

/// One time-keyed aggregate data point (e.g. a per-day sum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockBucket {
    pub total_amount: f64,
    pub block_chunk: i64,
    pub block_chunk_date: String,
}

impl BlockBucket {
    pub fn new(total_amount: f64, block_chunk: i64, block_chunk_date: impl Into<String>) -> Self {
        Self {
            total_amount,
            block_chunk,
            block_chunk_date: block_chunk_date.into(),
        }
    }

    /// A synthesized bucket for a date the series has no data for.
    pub fn placeholder(date: BucketDate, total_amount: f64) -> Self {
        Self::new(total_amount, 0, date.canonical())
    }
}

/// A date-ordered sequence of buckets.
pub type Series = Vec<BlockBucket>;

/// Group `(timestamp, amount)` points into one bucket per UTC day.
///
/// Buckets come out in ascending date order; `block_chunk` is the bucket's
/// position in the output.
pub fn bucket_by_day(points: &[(DateTime<Utc>, f64)]) -> Series {
    let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (ts, amount) in points {
        *days.entry(ts.date_naive()).or_insert(0.0) += amount;
    }
    days.into_iter()
        .enumerate()
        .map(|(i, (day, total))| BlockBucket::new(total, i as i64, BucketDate::new(day).canonical()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn json_shape() {
        let b: BlockBucket = serde_json::from_str(
            r#"{"total_amount": 32.5, "block_chunk": 17, "block_chunk_date": "2024-01-05"}"#,
        )
        .unwrap();
        assert_eq!(b, BlockBucket::new(32.5, 17, "2024-01-05"));
    }

    #[test]
    fn daily_buckets_sum_per_day() {
        let at = |d, h| Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap();
        let series = bucket_by_day(&[(at(2, 9), 1.0), (at(1, 23), 32.0), (at(2, 18), 2.5)]);
        assert_eq!(
            series,
            vec![BlockBucket::new(32.0, 0, "01/01/24"), BlockBucket::new(3.5, 1, "01/02/24")]
        );
    }

    #[test]
    fn no_points_no_buckets() {
        assert!(bucket_by_day(&[]).is_empty());
    }
}
