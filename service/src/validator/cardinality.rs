//! Table-level cardinality check

use serde_json::Value;

use crate::frame::{DataFrame, FrameError, FrameResult, series_values};

/// Key groups of `column` whose occurrence count lies outside `[min, max]`
///
/// Groups come in first-seen order. Nulls form their own group counting zero.
///
/// # Errors
///
/// Returns an error for an unknown column or one polars cannot group by
pub fn cardinality_violations(
    df: &DataFrame,
    column: &str,
    min: Option<u64>,
    max: Option<u64>,
) -> FrameResult<Vec<(Value, usize)>> {
    let groups = df.group_by_stable([column])?;
    let keys = groups.keys();
    let key_column = keys
        .first()
        .ok_or_else(|| FrameError::Compute(format!("no group keys for column '{column}'")))?;
    let key_values = series_values(key_column.as_materialized_series())?;
    let counts = groups.get_groups().group_count();

    let outside = |count: usize| {
        min.is_some_and(|min| usize::try_from(min).ok().is_none_or(|min| count < min))
            || max.is_some_and(|max| usize::try_from(max).is_ok_and(|max| count > max))
    };

    Ok(key_values
        .into_iter()
        .zip(&counts)
        .map(|(key, count)| {
            let count = if key.is_null() {
                0
            } else {
                count.map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX))
            };
            (key, count)
        })
        .filter(|(_, count)| outside(*count))
        .collect())
}

/// Whether every key of `column` occurs between `min` and `max` times
///
/// # Errors
///
/// Returns an error for an unknown column or one polars cannot group by
pub fn check_cardinality(
    df: &DataFrame,
    column: &str,
    min: Option<u64>,
    max: Option<u64>,
) -> FrameResult<bool> {
    Ok(cardinality_violations(df, column, min, max)?.is_empty())
}
