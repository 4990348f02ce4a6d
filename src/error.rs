//! Error handling for air-traffic analytics operations.
//!
//! Data-quality problems (malformed cells, schema drift, absent input files,
//! degenerate metric inputs) are never surfaced through these types: they
//! become nulls, advisory reports, NaN sentinels or empty tables. The
//! variants below cover genuinely exceptional conditions only.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
