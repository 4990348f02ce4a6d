//! Numeric coercion and missing-value sentinel handling.
//!
//! Coercion is deliberately lenient: cells that fail to convert become null
//! rather than aborting preparation. Zero-filling is a separate, explicit
//! step because the families disagree on whether missing means zero.

use crate::constants::SENTINEL_TOKENS;
use crate::error::Result;
use crate::prepare::normalize::has_column;
use polars::prelude::*;

/// Convert the listed columns (those actually present) to `Float64`.
/// Unconvertible values become null; unlisted columns are untouched.
/// Returns a new frame, the input is never mutated.
pub fn to_numeric(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let exprs: Vec<Expr> = columns
        .iter()
        .filter(|c| has_column(df, c))
        .map(|c| col(*c).cast(DataType::Float64))
        .collect();

    if exprs.is_empty() {
        return Ok(df.clone());
    }
    Ok(df.clone().lazy().with_columns(exprs).collect()?)
}

/// Replace sentinel "empty" tokens in string columns with true nulls.
/// Tokens are matched after trimming; `nan` matches case-insensitively.
pub fn replace_sentinels(df: &DataFrame) -> Result<DataFrame> {
    let exprs: Vec<Expr> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::String)
        .map(|c| {
            let name = c.name().as_str();
            when(sentinel_condition(name))
                .then(lit(NULL))
                .otherwise(col(name))
                .alias(name)
        })
        .collect();

    if exprs.is_empty() {
        return Ok(df.clone());
    }
    Ok(df.clone().lazy().with_columns(exprs).collect()?)
}

fn sentinel_condition(name: &str) -> Expr {
    let trimmed = col(name).str().strip_chars(lit(NULL));
    let mut condition: Option<Expr> = None;
    for token in SENTINEL_TOKENS {
        let matches = if token.eq_ignore_ascii_case("nan") {
            trimmed.clone().str().to_lowercase().eq(lit("nan"))
        } else {
            trimmed.clone().eq(lit(*token))
        };
        condition = Some(match condition {
            Some(c) => c.or(matches),
            None => matches,
        });
    }
    // SENTINEL_TOKENS is non-empty.
    condition.unwrap_or(lit(false))
}

/// Fill nulls with zero in every numeric column. Used by the airline and
/// route preparers, whose metrics are summed freely; the airport preparer
/// keeps nulls so missingness stays visible.
pub fn fill_numeric_with_zero(df: &DataFrame) -> Result<DataFrame> {
    let exprs: Vec<Expr> = df
        .get_columns()
        .iter()
        .filter_map(|c| {
            let name = c.name().as_str();
            if is_float_dtype(c.dtype()) {
                Some(col(name).fill_null(lit(0.0)))
            } else if is_integer_dtype(c.dtype()) {
                Some(col(name).fill_null(lit(0)))
            } else {
                None
            }
        })
        .collect();

    if exprs.is_empty() {
        return Ok(df.clone());
    }
    Ok(df.clone().lazy().with_columns(exprs).collect()?)
}

pub(crate) fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

pub(crate) fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_float_dtype(dtype) || is_integer_dtype(dtype)
}
