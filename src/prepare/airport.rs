//! Airport-traffic (APT) preparer.
//!
//! Adds `passagers_total` (departures + arrivals, transit excluded),
//! `fret_total` and the `has_geo` flag, and extracts a de-duplicated
//! airport dimension for label and map lookups. Nulls in the metric
//! columns are kept so missingness stays visible downstream.

use crate::error::Result;
use crate::models::{DatasetFamily, PreparedTable};
use crate::prepare::coerce::{replace_sentinels, to_numeric};
use crate::prepare::normalize::{add_date_fields, has_column, has_columns, normalize_columns};
use crate::validate::validate_family;
use polars::prelude::*;
use tracing::debug;

const DIMENSION_ATTRIBUTES: &[&str] = &["nom_aeroport", "zone", "ville", "latitude", "longitude"];

pub fn prepare_airport(raw: &DataFrame) -> Result<PreparedTable> {
    let family = DatasetFamily::Airport;
    let df = normalize_columns(raw)?;
    let df = add_date_fields(df)?;
    let df = replace_sentinels(&df)?;
    let df = to_numeric(&df, family.numeric_columns())?;
    let df = add_derived_totals(df)?;

    let schema_report = validate_family(&df, family);
    let dimension = airport_dimension(&df)?;
    debug!(
        rows = df.height(),
        has_dimension = dimension.is_some(),
        "airport table prepared"
    );

    Ok(PreparedTable {
        family,
        data: df,
        schema_report,
        dimension,
    })
}

/// Add `passagers_total`, `fret_total` and `has_geo`, each guarded on the
/// presence of its source columns. Nulls count as zero inside the sums so
/// a one-sided record still contributes.
fn add_derived_totals(df: DataFrame) -> Result<DataFrame> {
    let mut exprs: Vec<Expr> = Vec::new();

    if has_columns(&df, &["passagers_depart", "passagers_arrivee"]) {
        exprs.push(
            (col("passagers_depart").fill_null(lit(0.0))
                + col("passagers_arrivee").fill_null(lit(0.0)))
            .alias("passagers_total"),
        );
    }
    if has_columns(&df, &["fret_depart", "fret_arrivee"]) {
        exprs.push(
            (col("fret_depart").fill_null(lit(0.0)) + col("fret_arrivee").fill_null(lit(0.0)))
                .alias("fret_total"),
        );
    }
    if has_columns(&df, &["latitude", "longitude"]) {
        exprs.push(
            col("latitude")
                .is_not_null()
                .and(col("longitude").is_not_null())
                .alias("has_geo"),
        );
    }

    if exprs.is_empty() {
        return Ok(df);
    }
    Ok(df.lazy().with_columns(exprs).collect()?)
}

/// One row per airport code with its descriptive attributes, first
/// occurrence wins. `None` when the table has no code column.
fn airport_dimension(df: &DataFrame) -> Result<Option<DataFrame>> {
    if !has_column(df, "code_aeroport") {
        return Ok(None);
    }

    let attrs: Vec<Expr> = DIMENSION_ATTRIBUTES
        .iter()
        .filter(|c| has_column(df, c))
        .map(|c| col(*c).first())
        .collect();

    let dim = df
        .clone()
        .lazy()
        .filter(col("code_aeroport").is_not_null())
        .group_by_stable([col("code_aeroport")])
        .agg(attrs)
        .collect()?;
    Ok(Some(dim))
}
