//! Chart-ready output: one shared timestamp axis, one amounts line per series.

use serde::{Deserialize, Serialize};

use crate::align::{align, FillPolicy};
use crate::bucket::Series;
use crate::error::SeriesError;

/// Parallel label/value arrays for a line chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// `MM/DD/YY` dates, ascending.
    pub timestamps: Vec<String>,
    /// One list per input series, each `timestamps.len()` long.
    pub amounts: Vec<Vec<f64>>,
}

/// Align `series` with `fill` and split the result into chart arrays.
pub fn extract(series: &[Series], fill: FillPolicy) -> Result<Presentation, SeriesError> {
    let set = align(series, fill)?;
    Ok(Presentation {
        timestamps: set.timestamps(),
        amounts: set.amounts(),
    })
}
