//! Pure functions over series. Empty input always yields empty output.

use crate::align::{align, FillPolicy};
use crate::bucket::{BlockBucket, Series};
use crate::error::SeriesError;

/// Sum `total_amount` over buckets sharing a `block_chunk`, keeping the
/// first-seen order of distinct chunks. The surviving bucket keeps the date
/// of the chunk's first occurrence.
pub fn merge_by_bucket(series: &[BlockBucket]) -> Series {
    let mut merged: Series = Vec::new();
    for bucket in series {
        match merged.iter_mut().find(|m| m.block_chunk == bucket.block_chunk) {
            Some(existing) => existing.total_amount += bucket.total_amount,
            None => merged.push(bucket.clone()),
        }
    }
    merged
}

/// Running total: `out[i] = in[i] + out[i - 1]`. Input must be chronological.
pub fn accumulate(series: &[BlockBucket]) -> Series {
    let mut running = 0.0;
    series
        .iter()
        .map(|bucket| {
            running += bucket.total_amount;
            BlockBucket {
                total_amount: running,
                ..bucket.clone()
            }
        })
        .collect()
}

/// Sum of `total_amount` over the whole series.
pub fn sum_total(series: &[BlockBucket]) -> f64 {
    series.iter().map(|b| b.total_amount).sum()
}

/// Round to `precision` decimal places, halves away from zero.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// [`round_to`] with two decimal places.
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Per-date difference `a - b` over the union of both series' dates.
///
/// A date missing from one side counts as zero there. Both `total_amount`
/// and `block_chunk` are subtracted; output dates are canonical and ascending.
pub fn subtract(a: &[BlockBucket], b: &[BlockBucket]) -> Result<Series, SeriesError> {
    let set = align(&[a.to_vec(), b.to_vec()], FillPolicy::Zero)?;
    let (lhs, rhs) = (&set.series[0], &set.series[1]);
    Ok(set
        .dates
        .iter()
        .zip(lhs.iter().zip(rhs))
        .map(|(date, (x, y))| BlockBucket {
            total_amount: x.total_amount - y.total_amount,
            block_chunk: x.block_chunk - y.block_chunk,
            block_chunk_date: date.canonical(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(amount: f64, chunk: i64, date: &str) -> BlockBucket {
        BlockBucket::new(amount, chunk, date)
    }

    #[test]
    fn merge_sums_same_chunk_in_first_seen_order() {
        let merged = merge_by_bucket(&[
            b(1.0, 7, "01/01/24"),
            b(2.0, 3, "01/02/24"),
            b(4.0, 7, "01/03/24"),
        ]);
        assert_eq!(merged, vec![b(5.0, 7, "01/01/24"), b(2.0, 3, "01/02/24")]);
    }

    #[test]
    fn merge_does_not_touch_input() {
        let input = vec![b(1.0, 1, "01/01/24"), b(1.0, 1, "01/01/24")];
        let _ = merge_by_bucket(&input);
        assert_eq!(input[0].total_amount, 1.0);
    }

    #[test]
    fn accumulate_prefix_sum() {
        let out = accumulate(&[b(5.0, 1, "01/01/24"), b(3.0, 2, "01/02/24"), b(2.0, 3, "01/03/24")]);
        let amounts: Vec<f64> = out.iter().map(|b| b.total_amount).collect();
        assert_eq!(amounts, vec![5.0, 8.0, 10.0]);
        assert_eq!(out[2].block_chunk, 3);
    }

    #[test]
    fn sum_total_of_series() {
        assert_eq!(sum_total(&[b(1.5, 1, "01/01/24"), b(2.5, 2, "01/02/24")]), 4.0);
        assert_eq!(sum_total(&[]), 0.0);
    }

    #[test]
    fn rounding_half_away_from_zero() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.236), 1.24);
        assert_eq!(round_to(1234.5678, 1), 1234.6);
    }

    #[test]
    fn subtract_matching_and_one_sided_dates() {
        let a = vec![b(10.0, 5, "01/01/24"), b(7.0, 2, "2024-01-02")];
        let c = vec![b(4.0, 1, "2024-01-01")];
        let diff = subtract(&a, &c).unwrap();
        assert_eq!(diff, vec![b(6.0, 4, "01/01/24"), b(7.0, 2, "01/02/24")]);
    }

    #[test]
    fn subtract_b_only_date_goes_negative() {
        let diff = subtract(&[], &[b(3.0, 1, "01/05/24")]).unwrap();
        assert_eq!(diff, vec![b(-3.0, -1, "01/05/24")]);
    }

    #[test]
    fn empty_inputs() {
        assert!(merge_by_bucket(&[]).is_empty());
        assert!(accumulate(&[]).is_empty());
        assert!(subtract(&[], &[]).unwrap().is_empty());
    }
}
