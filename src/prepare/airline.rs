//! Airline-traffic (CIE) preparer.
//!
//! Metric columns are zero-filled after coercion: airline series are summed
//! freely by the aggregation layer and a null there would silently drop a
//! carrier-month. Also extracts the airline dimension (code, name,
//! nationality, country).

use crate::error::Result;
use crate::models::{DatasetFamily, PreparedTable};
use crate::prepare::coerce::{fill_numeric_with_zero, replace_sentinels, to_numeric};
use crate::prepare::normalize::{add_date_fields, has_column, normalize_columns};
use crate::validate::validate_family;
use polars::prelude::*;
use tracing::debug;

const DIMENSION_ATTRIBUTES: &[&str] = &["cie_nom", "cie_nat", "cie_pays"];

pub fn prepare_airline(raw: &DataFrame) -> Result<PreparedTable> {
    let family = DatasetFamily::Airline;
    let df = normalize_columns(raw)?;
    let df = add_date_fields(df)?;
    let df = replace_sentinels(&df)?;
    let df = to_numeric(&df, family.numeric_columns())?;
    let df = fill_numeric_with_zero(&df)?;

    let schema_report = validate_family(&df, family);
    let dimension = airline_dimension(&df)?;
    debug!(rows = df.height(), "airline table prepared");

    Ok(PreparedTable {
        family,
        data: df,
        schema_report,
        dimension,
    })
}

fn airline_dimension(df: &DataFrame) -> Result<Option<DataFrame>> {
    if !has_column(df, "cie") {
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
        .filter(col("cie").is_not_null())
        .group_by_stable([col("cie")])
        .agg(attrs)
        .collect()?;
    Ok(Some(dim))
}
