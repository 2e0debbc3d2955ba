//! Series alignment: N independently sampled series onto one date domain.
//!
//! The domain is the union of every canonical date present in any input,
//! sorted chronologically. Each output series has exactly one bucket per
//! domain date; gaps are filled according to a [`FillPolicy`]:
//!
//! - `Zero`: a gap means no activity that day (`total_amount = 0`).
//! - `Forward`: a gap means unchanged (`total_amount` = the last amount
//!   seen for that series, `0` before its first observation). Use this for
//!   cumulative metrics such as balances.
//!
//! Placeholders always carry `block_chunk = 0`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::bucket::{BlockBucket, Series};
use crate::date::BucketDate;
use crate::error::SeriesError;

/// How gaps in a series are filled during alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillPolicy {
    #[default]
    Zero,
    Forward,
}

/// N series sharing one sorted date domain.
///
/// Invariant: every series has `dates.len()` buckets, and the i-th bucket of
/// every series is dated `dates[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeriesSet {
    pub dates: Vec<BucketDate>,
    pub series: Vec<Series>,
}

impl AlignedSeriesSet {
    /// Length of the shared date domain.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Domain dates rendered as `MM/DD/YY`.
    pub fn timestamps(&self) -> Vec<String> {
        self.dates.iter().map(BucketDate::canonical).collect()
    }

    /// One amounts list per series, index-aligned with [`timestamps`](Self::timestamps).
    pub fn amounts(&self) -> Vec<Vec<f64>> {
        self.series
            .iter()
            .map(|s| s.iter().map(|b| b.total_amount).collect())
            .collect()
    }
}

/// Index a series by canonical date. A later bucket for the same date
/// replaces an earlier one.
fn index_by_date(series: &[BlockBucket]) -> Result<BTreeMap<BucketDate, &BlockBucket>, SeriesError> {
    let mut map = BTreeMap::new();
    for bucket in series {
        map.insert(BucketDate::parse(&bucket.block_chunk_date)?, bucket);
    }
    Ok(map)
}

/// The sorted union of all canonical dates across `series`.
pub fn date_domain(series: &[Series]) -> Result<Vec<BucketDate>, SeriesError> {
    let mut domain = BTreeSet::new();
    for s in series {
        for bucket in s {
            domain.insert(BucketDate::parse(&bucket.block_chunk_date)?);
        }
    }
    Ok(domain.into_iter().collect())
}

/// Align `series` onto the union of their dates.
pub fn align(series: &[Series], fill: FillPolicy) -> Result<AlignedSeriesSet, SeriesError> {
    let indexed = series
        .iter()
        .map(|s| index_by_date(s))
        .collect::<Result<Vec<_>, _>>()?;

    let dates: Vec<BucketDate> = indexed
        .iter()
        .flat_map(|m| m.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let aligned = indexed
        .iter()
        .map(|by_date| fill_series(by_date, &dates, fill))
        .collect();

    Ok(AlignedSeriesSet {
        dates,
        series: aligned,
    })
}

fn fill_series(
    by_date: &BTreeMap<BucketDate, &BlockBucket>,
    dates: &[BucketDate],
    fill: FillPolicy,
) -> Series {
    let mut last_amount = 0.0;
    dates
        .iter()
        .map(|date| match by_date.get(date) {
            Some(bucket) => {
                last_amount = bucket.total_amount;
                BlockBucket {
                    block_chunk_date: date.canonical(),
                    ..(*bucket).clone()
                }
            }
            None => match fill {
                FillPolicy::Zero => BlockBucket::placeholder(*date, 0.0),
                FillPolicy::Forward => BlockBucket::placeholder(*date, last_amount),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(amount: f64, chunk: i64, date: &str) -> BlockBucket {
        BlockBucket::new(amount, chunk, date)
    }

    fn amounts(s: &Series) -> Vec<f64> {
        s.iter().map(|b| b.total_amount).collect()
    }

    #[test]
    fn zero_fill_vs_forward_fill() {
        let input = vec![vec![b(10.0, 3, "01/01/24")], vec![b(1.0, 1, "01/02/24")]];

        let zero = align(&input, FillPolicy::Zero).unwrap();
        assert_eq!(amounts(&zero.series[0]), vec![10.0, 0.0]);

        let forward = align(&input, FillPolicy::Forward).unwrap();
        assert_eq!(amounts(&forward.series[0]), vec![10.0, 10.0]);
        assert_eq!(forward.series[0][1].block_chunk, 0);
    }

    #[test]
    fn forward_fill_starts_at_zero() {
        let input = vec![
            vec![b(5.0, 1, "2024-01-03")],
            vec![b(1.0, 1, "2024-01-01"), b(2.0, 2, "2024-01-02"), b(3.0, 3, "2024-01-04")],
        ];
        let set = align(&input, FillPolicy::Forward).unwrap();
        assert_eq!(amounts(&set.series[0]), vec![0.0, 0.0, 5.0, 5.0]);
        assert_eq!(amounts(&set.series[1]), vec![1.0, 2.0, 2.0, 3.0]);
    }

    #[test]
    fn domain_is_sorted_union() {
        let input = vec![
            vec![b(1.0, 1, "2024-01-03"), b(1.0, 2, "2023-12-31")],
            vec![b(1.0, 1, "01/01/24"), b(1.0, 2, "2024-01-03T00:00:00Z")],
            vec![],
        ];
        let set = align(&input, FillPolicy::Zero).unwrap();
        assert_eq!(set.timestamps(), vec!["12/31/23", "01/01/24", "01/03/24"]);
        for s in &set.series {
            assert_eq!(s.len(), set.len());
            for (bucket, date) in s.iter().zip(&set.timestamps()) {
                assert_eq!(&bucket.block_chunk_date, date);
            }
        }
    }

    #[test]
    fn mixed_spellings_share_a_bucket() {
        let input = vec![vec![b(4.0, 9, "2024-01-01")], vec![b(6.0, 9, "01/01/24")]];
        let set = align(&input, FillPolicy::Zero).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.amounts(), vec![vec![4.0], vec![6.0]]);
    }

    #[test]
    fn real_buckets_keep_their_chunk() {
        let set = align(&[vec![b(4.0, 42, "2024-01-01")]], FillPolicy::Zero).unwrap();
        assert_eq!(set.series[0][0], b(4.0, 42, "01/01/24"));
    }

    #[test]
    fn empty_input() {
        let set = align(&[], FillPolicy::Forward).unwrap();
        assert!(set.is_empty());
        assert!(set.series.is_empty());
        assert!(date_domain(&[vec![]]).unwrap().is_empty());
    }

    #[test]
    fn malformed_date_fails_fast() {
        let err = align(&[vec![b(1.0, 1, "not a date")]], FillPolicy::Zero).unwrap_err();
        assert!(matches!(err, SeriesError::DateParseFailure { .. }));
    }
}
