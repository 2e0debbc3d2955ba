//! podindex-series: turning persisted aggregates into chartable series.
//!
//! ```text
//! Vec<Series> ──align(FillPolicy)──▶ AlignedSeriesSet ──extract──▶ Presentation
//!      │
//!      └── merge_by_bucket / accumulate / sum_total / subtract / round_to
//! ```
//!
//! Every function here is pure and deterministic.

pub mod align;
pub mod bucket;
pub mod combinators;
pub mod date;
pub mod error;
pub mod presentation;

pub use align::{align, date_domain, AlignedSeriesSet, FillPolicy};
pub use bucket::{bucket_by_day, BlockBucket, Series};
pub use combinators::{accumulate, merge_by_bucket, round2, round_to, subtract, sum_total};
pub use date::{format_date, BucketDate};
pub use error::SeriesError;
pub use presentation::{extract, Presentation};
