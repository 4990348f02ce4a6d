//! Dataset preparation: normalization, coercion, family-specific
//! derivations and row filters.
//!
//! [`prepare`] is the single entry point used by the loader; the filters
//! operate on already-prepared tables and are total, an absent filter
//! column makes them a no-op rather than an error.

pub mod airline;
pub mod airport;
pub mod coerce;
pub mod normalize;
pub mod route;

pub use airline::prepare_airline;
pub use airport::prepare_airport;
pub use coerce::{fill_numeric_with_zero, replace_sentinels, to_numeric};
pub use normalize::{add_date_fields, normalize_columns};
pub use route::prepare_route;

use crate::error::Result;
use crate::models::{DatasetFamily, PreparedTable};
use crate::prepare::normalize::{has_column, has_columns};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::collections::HashSet;

/// Run the family's preparer on a raw table.
pub fn prepare(family: DatasetFamily, raw: &DataFrame) -> Result<PreparedTable> {
    if raw.width() == 0 {
        return Ok(PreparedTable::empty(family));
    }
    match family {
        DatasetFamily::Airport => prepare_airport(raw),
        DatasetFamily::Airline => prepare_airline(raw),
        DatasetFamily::Route => prepare_route(raw),
    }
}

/// Keep rows whose `date` falls in the inclusive `[start, end]` window.
/// Rows with a null date are dropped when any bound is set. No-op when the
/// table has no `date` column or no bound is given.
pub fn filter_by_date(
    df: &DataFrame,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<DataFrame> {
    if !has_column(df, "date") || (start.is_none() && end.is_none()) {
        return Ok(df.clone());
    }

    let dates = df.column("date")?.as_materialized_series().date()?;
    let start_days = start.map(days_since_epoch);
    let end_days = end.map(days_since_epoch);
    let mask: Vec<bool> = dates
        .into_iter()
        .map(|d| match d {
            Some(days) => {
                start_days.is_none_or(|s| days >= s) && end_days.is_none_or(|e| days <= e)
            }
            None => false,
        })
        .collect();

    Ok(df.filter(&BooleanChunked::from_slice("mask".into(), &mask))?)
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    // polars dates are days since 1970-01-01; chrono counts from 0001-01-01.
    date.num_days_from_ce() - 719_163
}

/// Keep rows touching any of the given airport codes: `code_aeroport` on
/// airport tables, either endpoint on route tables. No-op when `codes` is
/// empty or no matching column exists.
pub fn filter_by_airports(df: &DataFrame, codes: &[String]) -> Result<DataFrame> {
    if codes.is_empty() {
        return Ok(df.clone());
    }
    let wanted: HashSet<&str> = codes.iter().map(|c| c.as_str()).collect();

    if has_column(df, "code_aeroport") {
        filter_by_membership(df, &["code_aeroport"], &wanted)
    } else if has_columns(df, &["lsn_1", "lsn_2"]) {
        filter_by_membership(df, &["lsn_1", "lsn_2"], &wanted)
    } else {
        Ok(df.clone())
    }
}

/// Keep rows whose `cie` code is in `codes`. No-op when `codes` is empty
/// or the column is absent.
pub fn filter_by_airlines(df: &DataFrame, codes: &[String]) -> Result<DataFrame> {
    if codes.is_empty() || !has_column(df, "cie") {
        return Ok(df.clone());
    }
    let wanted: HashSet<&str> = codes.iter().map(|c| c.as_str()).collect();
    filter_by_membership(df, &["cie"], &wanted)
}

/// Rows where any of `columns` holds a value from `wanted`.
fn filter_by_membership(
    df: &DataFrame,
    columns: &[&str],
    wanted: &HashSet<&str>,
) -> Result<DataFrame> {
    let mut mask = vec![false; df.height()];
    for column in columns {
        let values = df.column(column)?.cast(&DataType::String)?;
        for (i, value) in values.str()?.into_iter().enumerate() {
            if let Some(v) = value
                && wanted.contains(v)
            {
                mask[i] = true;
            }
        }
    }
    Ok(df.filter(&BooleanChunked::from_slice("mask".into(), &mask))?)
}
