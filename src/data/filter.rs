use super::model::StructuredArray;
use crate::error::CsError;

// ---------------------------------------------------------------------------
// Range predicate on one numeric column
// ---------------------------------------------------------------------------

/// Exclusive bounds on a column's values. An absent bound is no constraint;
/// a bound of `0.0` is still a bound.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RangeFilter {
    /// Keep rows with value strictly greater than this.
    pub min: Option<f64>,
    /// Keep rows with value strictly less than this.
    pub max: Option<f64>,
}

impl RangeFilter {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        RangeFilter { min, max }
    }

    /// True when no bound is set and every row passes, NaN included.
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// NaN fails any comparison, so it is dropped as soon as one bound is set
    /// and kept while the filter is unbounded.
    pub fn keeps(&self, value: f64) -> bool {
        self.min.map_or(true, |lo| value > lo) && self.max.map_or(true, |hi| value < hi)
    }
}

/// Return indices of values that pass the filter, in ascending order.
pub fn filtered_indices(values: &[f64], filter: &RangeFilter) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| filter.keeps(v))
        .map(|(i, _)| i)
        .collect()
}

/// Build a new array with the rows of `array` whose `column` passes `filter`.
///
/// The column must exist and hold one numeric value per row, even when the
/// filter is unbounded and every row is kept.
pub fn filter_rows(
    array: &StructuredArray,
    column: &str,
    filter: &RangeFilter,
) -> Result<StructuredArray, CsError> {
    let values = array.scalar_values(column)?;
    let keep = filtered_indices(&values, filter);
    Ok(array.take_rows(&keep))
}
