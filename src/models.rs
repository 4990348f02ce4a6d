//! Core data structures and types for air-traffic analytics.
//!
//! Defines the dataset families, the prepared-table wrapper handed to the
//! presentation layer, time-series frequencies, and the serializable KPI and
//! quality-report structures.

use crate::constants;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The three DGAC dataset families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetFamily {
    /// APT: airport traffic, one row per airport and month.
    Airport,
    /// CIE: airline traffic, one row per airline and month.
    Airline,
    /// LSN: route-segment traffic, one row per segment and month.
    Route,
}

impl DatasetFamily {
    /// Detect the family from a file name (`apt*.csv`, `cie*.csv`, `lsn*.csv`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.starts_with("apt") {
            Some(DatasetFamily::Airport)
        } else if name.starts_with("cie") {
            Some(DatasetFamily::Airline)
        } else if name.starts_with("lsn") {
            Some(DatasetFamily::Route)
        } else {
            None
        }
    }

    /// Expected raw columns for this family.
    pub fn expected_columns(&self) -> &'static [&'static str] {
        match self {
            DatasetFamily::Airport => constants::APT_EXPECTED_COLUMNS,
            DatasetFamily::Airline => constants::CIE_EXPECTED_COLUMNS,
            DatasetFamily::Route => constants::LSN_EXPECTED_COLUMNS,
        }
    }

    /// Columns coerced to numeric during preparation.
    pub fn numeric_columns(&self) -> &'static [&'static str] {
        match self {
            DatasetFamily::Airport => constants::APT_NUMERIC_COLUMNS,
            DatasetFamily::Airline => constants::CIE_NUMERIC_COLUMNS,
            DatasetFamily::Route => constants::LSN_NUMERIC_COLUMNS,
        }
    }

    /// Key columns that must uniquely identify a row.
    pub fn duplicate_keys(&self) -> &'static [&'static str] {
        match self {
            DatasetFamily::Airport => constants::duplicate_keys::APT,
            DatasetFamily::Airline => constants::duplicate_keys::CIE,
            DatasetFamily::Route => constants::duplicate_keys::LSN,
        }
    }

    /// Default processed file name within the data directory.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            DatasetFamily::Airport => constants::file_names::APT,
            DatasetFamily::Airline => constants::file_names::CIE,
            DatasetFamily::Route => constants::file_names::LSN,
        }
    }

    /// Short DGAC code for this family.
    pub fn code(&self) -> &'static str {
        match self {
            DatasetFamily::Airport => "APT",
            DatasetFamily::Airline => "CIE",
            DatasetFamily::Route => "LSN",
        }
    }
}

impl fmt::Display for DatasetFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Time granularity for resampled series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Monthly,
    Quarterly,
    Yearly,
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M" | "MONTH" | "MONTHLY" => Ok(Frequency::Monthly),
            "Q" | "QUARTER" | "QUARTERLY" => Ok(Frequency::Quarterly),
            "Y" | "YEAR" | "YEARLY" | "A" => Ok(Frequency::Yearly),
            other => Err(format!("unknown frequency '{other}'")),
        }
    }
}

/// Advisory schema-validation report attached to every prepared table.
///
/// Never treated as fatal: `missing` and `extras` describe drift between the
/// file and the expected schema, `derived` lists recognized derived columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReport {
    /// Expected columns absent from the table, sorted.
    pub missing: Vec<String>,
    /// Present columns neither expected nor known-derived, sorted.
    pub extras: Vec<String>,
    /// Present known-derived columns, sorted; informational only.
    pub derived: Vec<String>,
}

impl SchemaReport {
    /// True when neither expected columns are missing nor unknown extras exist.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extras.is_empty()
    }
}

/// A dataset after preparation: normalized, coerced, enriched with derived
/// fields and annotated with its schema report. Immutable by convention;
/// re-derive from source rather than mutating in place.
#[derive(Debug, Clone)]
pub struct PreparedTable {
    pub family: DatasetFamily,
    pub data: DataFrame,
    pub schema_report: SchemaReport,
    /// De-duplicated entity dimension (airports or airlines) for label and
    /// tooltip lookups; `None` for families without one or when the raw
    /// table lacks the dimension columns.
    pub dimension: Option<DataFrame>,
}

impl PreparedTable {
    /// An empty table for a family, used when the source file is absent.
    pub fn empty(family: DatasetFamily) -> Self {
        Self {
            family,
            data: DataFrame::default(),
            schema_report: SchemaReport::default(),
            dimension: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }
}

// =============================================================================
// KPI bundles
// =============================================================================

/// KPI card values for the airport dataset.
///
/// Growth-rate fields are percentages; `cagr` and `top3_airport_share` are
/// fractions; NaN encodes "not available".
#[derive(Debug, Clone, Serialize)]
pub struct AirportKpis {
    pub total_passengers: f64,
    pub total_freight: f64,
    pub top_airport_code: Option<String>,
    pub top_airport_name: Option<String>,
    pub top_airport_passengers: f64,
    pub peak_month: Option<NaiveDate>,
    pub peak_month_passengers: Option<f64>,
    pub yoy_pct: f64,
    pub mom_pct: f64,
    pub recovery_vs_baseline_pct: f64,
    pub cagr: f64,
    pub hhi_airports: f64,
    pub top3_airport_share: f64,
}

/// KPI card values for the airline dataset.
#[derive(Debug, Clone, Serialize)]
pub struct AirlineKpis {
    pub total_passengers: f64,
    pub total_flights: f64,
    pub top_airline_code: Option<String>,
    pub top_airline_name: Option<String>,
    pub top_airline_passengers: f64,
    pub yoy_pct: f64,
    pub mom_pct: f64,
    pub recovery_vs_baseline_pct: f64,
    pub cagr: f64,
    pub hhi_airlines: f64,
    pub top3_airline_share: f64,
}

/// KPI card values for the route dataset.
#[derive(Debug, Clone, Serialize)]
pub struct RouteKpis {
    pub total_passengers: f64,
    pub top_route: Option<String>,
    pub top_route_passengers: f64,
    pub yoy_pct: f64,
    pub mom_pct: f64,
    pub recovery_vs_baseline_pct: f64,
    pub cagr: f64,
    pub hhi_routes: f64,
    pub top3_route_share: f64,
}

// =============================================================================
// Quality report
// =============================================================================

/// First/last observed month of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCoverage {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Null count for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

/// Quality diagnostics for one dataset family.
#[derive(Debug, Clone, Serialize)]
pub struct FamilyQuality {
    pub rows: usize,
    pub columns: usize,
    pub coverage: Option<DateCoverage>,
    pub schema: SchemaReport,
    /// Columns with at least one null, descending by count.
    pub missing: Vec<MissingCount>,
    /// Rows participating in a duplicated key group.
    pub duplicate_rows: usize,
}

/// Combined quality report across the three families, serializable as-is
/// for the download/export path.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub airports: FamilyQuality,
    pub airlines: FamilyQuality,
    pub routes: FamilyQuality,
}
