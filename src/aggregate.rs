//! Aggregation engine: resampled time series, entity rankings and
//! market-share tables.
//!
//! Every function is total over its input: empty or degenerate tables
//! produce empty frames, never errors.

use crate::error::Result;
use crate::models::Frequency;
use crate::prepare::coerce::is_numeric_dtype;
use crate::prepare::normalize::{has_column, has_columns, month_start_date};
use polars::prelude::*;

/// Sum the given value columns per calendar period. Buckets are the
/// period-start date (month, quarter or year start), sorted ascending.
/// Rows without a date are excluded; value columns that are absent or
/// non-numeric are skipped.
pub fn time_series(df: &DataFrame, value_cols: &[&str], freq: Frequency) -> Result<DataFrame> {
    if df.height() == 0 || !has_column(df, "date") {
        return Ok(DataFrame::default());
    }

    let sums: Vec<Expr> = value_cols
        .iter()
        .filter(|c| numeric_column(df, c))
        .map(|c| col(*c).sum())
        .collect();
    if sums.is_empty() {
        return Ok(DataFrame::default());
    }

    let out = df
        .clone()
        .lazy()
        .filter(col("date").is_not_null())
        .with_column(period_start(freq).alias("period"))
        .group_by_stable([col("period")])
        .agg(sums)
        .sort(["period"], SortMultipleOptions::default())
        .collect()?;
    Ok(out)
}

/// First day of the calendar period containing `date`.
fn period_start(freq: Frequency) -> Expr {
    let year = col("date").dt().year();
    match freq {
        Frequency::Monthly => col("date"),
        Frequency::Quarterly => {
            let quarter_month = (col("date").dt().quarter().cast(DataType::Int32) - lit(1))
                * lit(3)
                + lit(1);
            month_start_date(year, quarter_month)
        }
        Frequency::Yearly => month_start_date(year, lit(1)),
    }
}

/// Top `top_n` entities by summed `value_col`, descending, with a stable
/// tie-break on first appearance.
pub fn ranking(
    df: &DataFrame,
    entity_keys: &[&str],
    value_col: &str,
    top_n: usize,
) -> Result<DataFrame> {
    if df.height() == 0 || !has_columns(df, entity_keys) || !numeric_column(df, value_col) {
        return Ok(DataFrame::default());
    }

    let keys: Vec<Expr> = entity_keys.iter().map(|k| col(*k)).collect();
    let out = df
        .clone()
        .lazy()
        .group_by_stable(keys)
        .agg([col(value_col).sum()])
        .sort(
            [value_col],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .limit(top_n as IdxSize)
        .collect()?;
    Ok(out)
}

/// Per-entity share of the grand total of `value_col`. Entities past
/// `top_n` collapse into a single `Others` row; the emitted `share`
/// column sums to 1. Empty when the grand total is not positive.
pub fn market_share(
    df: &DataFrame,
    entity_key: &str,
    value_col: &str,
    top_n: usize,
) -> Result<DataFrame> {
    let totals = entity_totals(df, entity_key, value_col)?;
    let grand_total: f64 = totals.iter().map(|(_, v)| v).sum();
    if totals.is_empty() || grand_total <= 0.0 {
        return Ok(DataFrame::default());
    }

    let mut names: Vec<String> = Vec::new();
    let mut values: Vec<f64> = Vec::new();
    for (name, value) in totals.iter().take(top_n) {
        names.push(name.clone());
        values.push(*value);
    }
    if totals.len() > top_n {
        let rest: f64 = totals.iter().skip(top_n).map(|(_, v)| v).sum();
        names.push("Others".to_string());
        values.push(rest);
    }
    let shares: Vec<f64> = values.iter().map(|v| v / grand_total).collect();

    let out = DataFrame::new(vec![
        Column::new(entity_key.into(), names),
        Column::new(value_col.into(), values),
        Column::new("share".into(), shares),
    ])?;
    Ok(out)
}

/// Summed `value_col` per entity, descending with stable ties. The key is
/// read as a string; null keys are dropped.
pub fn entity_totals(
    df: &DataFrame,
    entity_key: &str,
    value_col: &str,
) -> Result<Vec<(String, f64)>> {
    if df.height() == 0 || !has_column(df, entity_key) || !numeric_column(df, value_col) {
        return Ok(Vec::new());
    }

    let grouped = df
        .clone()
        .lazy()
        .filter(col(entity_key).is_not_null())
        .group_by_stable([col(entity_key).cast(DataType::String)])
        .agg([col(value_col).sum()])
        .collect()?;

    let keys = grouped.column(entity_key)?.str()?;
    let sums = grouped.column(value_col)?.f64()?;
    let mut totals: Vec<(String, f64)> = keys
        .into_iter()
        .zip(sums)
        .filter_map(|(k, v)| Some((k?.to_string(), v.unwrap_or(0.0))))
        .collect();
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(totals)
}

fn numeric_column(df: &DataFrame, name: &str) -> bool {
    df.column(name)
        .map(|c| is_numeric_dtype(c.dtype()))
        .unwrap_or(false)
}
