//! Configuration for the analytics pipeline.
//!
//! Carries the data-directory layout, per-family file names and the tunable
//! analytics defaults (baseline year, ranking size). Constructed once and
//! passed to the loader and the KPI builders.

use crate::constants::{DEFAULT_BASELINE_YEAR, DEFAULT_TOP_N};
use crate::models::DatasetFamily;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global configuration for dataset loading and analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Root directory containing the processed per-family subdirectories
    /// (`APT/processed`, `CIE/processed`, `LSN/processed`).
    pub data_dir: PathBuf,

    /// Override file names per family; defaults come from the family itself.
    pub apt_file: Option<String>,
    pub cie_file: Option<String>,
    pub lsn_file: Option<String>,

    /// Reference year for recovery ratios.
    pub baseline_year: i32,

    /// Default ranking / market-share truncation size.
    pub top_n: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            apt_file: None,
            cie_file: None,
            lsn_file: None,
            baseline_year: DEFAULT_BASELINE_YEAR,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl AnalyticsConfig {
    /// Configuration rooted at a specific data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Use a custom baseline year for recovery ratios.
    pub fn with_baseline_year(mut self, year: i32) -> Self {
        self.baseline_year = year;
        self
    }

    /// Use a custom default top-N size.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Override the processed file name for one family.
    pub fn with_file_name(mut self, family: DatasetFamily, name: impl Into<String>) -> Self {
        let name = Some(name.into());
        match family {
            DatasetFamily::Airport => self.apt_file = name,
            DatasetFamily::Airline => self.cie_file = name,
            DatasetFamily::Route => self.lsn_file = name,
        }
        self
    }

    /// Subdirectory holding a family's processed files.
    pub fn family_dir(&self, family: DatasetFamily) -> PathBuf {
        self.data_dir.join(family.code()).join("processed")
    }

    /// Full path to the processed file for a family.
    pub fn family_path(&self, family: DatasetFamily) -> PathBuf {
        let name = match family {
            DatasetFamily::Airport => self.apt_file.as_deref(),
            DatasetFamily::Airline => self.cie_file.as_deref(),
            DatasetFamily::Route => self.lsn_file.as_deref(),
        };
        self.family_dir(family)
            .join(name.unwrap_or(family.default_file_name()))
    }

    /// Root data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
