//! Route-segment (LSN) preparer.
//!
//! Adds two route keys: `route_dir` keeps the flown direction
//! (`lsn_1 → lsn_2`), `route_pair` orders the endpoints lexicographically
//! so both directions of a leg collapse onto one key. Metric columns are
//! zero-filled, as for airlines.

use crate::error::Result;
use crate::models::{DatasetFamily, PreparedTable};
use crate::prepare::coerce::{fill_numeric_with_zero, replace_sentinels, to_numeric};
use crate::prepare::normalize::{add_date_fields, has_columns, normalize_columns};
use crate::validate::validate_family;
use polars::prelude::*;
use tracing::debug;

pub fn prepare_route(raw: &DataFrame) -> Result<PreparedTable> {
    let family = DatasetFamily::Route;
    let df = normalize_columns(raw)?;
    let df = add_date_fields(df)?;
    let df = replace_sentinels(&df)?;
    let df = to_numeric(&df, family.numeric_columns())?;
    let df = fill_numeric_with_zero(&df)?;
    let df = add_route_keys(df)?;

    let schema_report = validate_family(&df, family);
    debug!(rows = df.height(), "route table prepared");

    Ok(PreparedTable {
        family,
        data: df,
        schema_report,
        dimension: None,
    })
}

fn add_route_keys(df: DataFrame) -> Result<DataFrame> {
    if !has_columns(&df, &["lsn_1", "lsn_2"]) {
        return Ok(df);
    }

    let a = col("lsn_1").cast(DataType::String);
    let b = col("lsn_2").cast(DataType::String);
    let directed = concat_str([a.clone(), b.clone()], " → ", false);
    let pair_forward = concat_str([a.clone(), b.clone()], " — ", false);
    let pair_reverse = concat_str([b.clone(), a.clone()], " — ", false);

    let out = df
        .lazy()
        .with_columns([
            directed.alias("route_dir"),
            when(a.lt_eq(b))
                .then(pair_forward)
                .otherwise(pair_reverse)
                .alias("route_pair"),
        ])
        .collect()?;
    Ok(out)
}
