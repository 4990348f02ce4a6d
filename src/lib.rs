//! Air-Traffic Analytics Library
//!
//! A Rust library for analyzing the French DGAC monthly air-traffic
//! statistics (1990 onward) across three dataset families: airport traffic
//! (APT), airline traffic (CIE) and route segments (LSN).
//!
//! This library provides tools for:
//! - Normalizing and coercing the raw CSV exports into typed tables
//! - Advisory schema validation that reports drift without failing
//! - Time-series resampling, entity rankings and market-share tables
//! - Traffic metrics: CAGR, MoM/YoY growth, recovery ratios, seasonality,
//!   HHI concentration and contribution-to-change decompositions
//! - Geographic summaries: hubs, route distances, centroids
//! - Data-quality reporting: null counts, duplicate keys, IQR outliers
//! - Delimiter-sniffing CSV loading with an mtime-keyed table cache

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod geo;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod prepare;
pub mod quality;
pub mod validate;

// Re-export commonly used types
pub use config::AnalyticsConfig;
pub use error::{AnalyticsError, Result};
pub use loader::DatasetCache;
pub use models::{DatasetFamily, Frequency, PreparedTable, QualityReport, SchemaReport};
