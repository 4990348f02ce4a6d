//! Command-line argument definitions, clap derive API.

use crate::config::AnalyticsConfig;
use crate::constants::{DEFAULT_BASELINE_YEAR, DEFAULT_TOP_N};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the DGAC air-traffic analytics tool.
///
/// Reads the processed monthly DGAC datasets (airports, airlines, route
/// segments) and produces KPI summaries and data-quality reports.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "airtraffic-analytics",
    version,
    about = "KPIs and quality reports over the French DGAC monthly air-traffic statistics",
    arg_required_else_help = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Compute per-family KPI cards
    Kpis(KpisArgs),
    /// Produce the combined data-quality report
    Quality(QualityArgs),
    /// List the CSV files discovered under the data directory
    List(ListArgs),
}

/// Arguments for the `kpis` command.
#[derive(Debug, Clone, Parser)]
pub struct KpisArgs {
    /// Root directory with the APT/CIE/LSN processed subdirectories
    #[arg(short, long, value_name = "PATH", default_value = "data")]
    pub data_dir: PathBuf,

    /// Reference year for traffic-recovery ratios
    #[arg(long, value_name = "YEAR", default_value_t = DEFAULT_BASELINE_YEAR)]
    pub baseline_year: i32,

    /// Ranking and market-share truncation size
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for the `quality` command.
#[derive(Debug, Clone, Parser)]
pub struct QualityArgs {
    /// Root directory with the APT/CIE/LSN processed subdirectories
    #[arg(short, long, value_name = "PATH", default_value = "data")]
    pub data_dir: PathBuf,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Parser)]
pub struct ListArgs {
    /// Root directory to scan for CSV files
    #[arg(short, long, value_name = "PATH", default_value = "data")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored human-readable cards
    Text,
    /// Machine-readable JSON
    Json,
}

impl KpisArgs {
    pub fn to_config(&self) -> AnalyticsConfig {
        AnalyticsConfig::new(self.data_dir.clone())
            .with_baseline_year(self.baseline_year)
            .with_top_n(self.top_n)
    }
}

impl QualityArgs {
    pub fn to_config(&self) -> AnalyticsConfig {
        AnalyticsConfig::new(self.data_dir.clone())
    }
}
