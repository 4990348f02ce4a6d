//! Command execution: loads the prepared tables and renders KPI cards,
//! quality reports and dataset listings.

use crate::cli::args::{Args, Commands, KpisArgs, ListArgs, OutputFormat, QualityArgs};
use crate::error::Result;
use crate::geo::geo_bundle;
use crate::loader::{DatasetCache, discover_tables};
use crate::metrics::{airline_kpis, airport_kpis, route_kpis};
use crate::models::{AirlineKpis, AirportKpis, DatasetFamily, PreparedTable, RouteKpis};
use crate::quality::quality_report;
use colored::Colorize;
use serde_json::json;
use tracing::{debug, info};

pub fn run(args: Args) -> Result<()> {
    setup_logging(args.verbose);
    debug!(?args, "command line parsed");

    match args.command {
        Commands::Kpis(kpis) => run_kpis(&kpis),
        Commands::Quality(quality) => run_quality(&quality),
        Commands::List(list) => run_list(&list),
    }
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("airtraffic_analytics={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

struct LoadedTables {
    airports: std::sync::Arc<PreparedTable>,
    airlines: std::sync::Arc<PreparedTable>,
    routes: std::sync::Arc<PreparedTable>,
}

fn load_all(config: &crate::config::AnalyticsConfig) -> Result<LoadedTables> {
    let mut cache = DatasetCache::new();
    Ok(LoadedTables {
        airports: cache.load_family(config, DatasetFamily::Airport)?,
        airlines: cache.load_family(config, DatasetFamily::Airline)?,
        routes: cache.load_family(config, DatasetFamily::Route)?,
    })
}

fn run_kpis(args: &KpisArgs) -> Result<()> {
    let config = args.to_config();
    info!(data_dir = %config.data_dir.display(), "computing KPIs");

    let tables = load_all(&config)?;
    let airports = airport_kpis(&tables.airports, config.baseline_year)?;
    let airlines = airline_kpis(&tables.airlines, config.baseline_year)?;
    let routes = route_kpis(&tables.routes, config.baseline_year)?;
    let geo = geo_bundle(&tables.airports, &tables.routes, config.top_n)?;

    match args.format {
        OutputFormat::Json => {
            let payload = json!({
                "airports": airports,
                "airlines": airlines,
                "routes": routes,
                "geo": {
                    "summary": geo.summary,
                    "average_route_distance_km": nan_to_null(geo.average_distance_km),
                },
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Text => {
            print_airport_card(&airports);
            print_airline_card(&airlines);
            print_route_card(&routes, geo.average_distance_km);
        }
    }
    Ok(())
}

fn print_airport_card(kpis: &AirportKpis) {
    println!("{}", "Airports (APT)".bold().cyan());
    println!("  passengers          {}", fmt_count(kpis.total_passengers));
    println!("  freight (t)         {}", fmt_count(kpis.total_freight));
    if let Some(code) = &kpis.top_airport_code {
        let name = kpis.top_airport_name.as_deref().unwrap_or("");
        println!(
            "  busiest airport     {} {} ({})",
            code.bold(),
            name,
            fmt_count(kpis.top_airport_passengers)
        );
    }
    if let (Some(month), Some(pax)) = (kpis.peak_month, kpis.peak_month_passengers) {
        println!(
            "  peak month          {} ({})",
            month.format("%Y-%m"),
            fmt_count(pax)
        );
    }
    print_growth_lines(
        kpis.yoy_pct,
        kpis.mom_pct,
        kpis.recovery_vs_baseline_pct,
        kpis.cagr,
    );
    println!("  HHI / top-3 share   {} / {}", fmt_ratio(kpis.hhi_airports), fmt_share(kpis.top3_airport_share));
    println!();
}

fn print_airline_card(kpis: &AirlineKpis) {
    println!("{}", "Airlines (CIE)".bold().cyan());
    println!("  passengers          {}", fmt_count(kpis.total_passengers));
    println!("  flights             {}", fmt_count(kpis.total_flights));
    if let Some(code) = &kpis.top_airline_code {
        let name = kpis.top_airline_name.as_deref().unwrap_or("");
        println!(
            "  leading airline     {} {} ({})",
            code.bold(),
            name,
            fmt_count(kpis.top_airline_passengers)
        );
    }
    print_growth_lines(
        kpis.yoy_pct,
        kpis.mom_pct,
        kpis.recovery_vs_baseline_pct,
        kpis.cagr,
    );
    println!("  HHI / top-3 share   {} / {}", fmt_ratio(kpis.hhi_airlines), fmt_share(kpis.top3_airline_share));
    println!();
}

fn print_route_card(kpis: &RouteKpis, average_distance_km: f64) {
    println!("{}", "Routes (LSN)".bold().cyan());
    println!("  passengers          {}", fmt_count(kpis.total_passengers));
    if let Some(route) = &kpis.top_route {
        println!(
            "  busiest route       {} ({})",
            route.bold(),
            fmt_count(kpis.top_route_passengers)
        );
    }
    if !average_distance_km.is_nan() {
        println!("  avg route length    {:.0} km", average_distance_km);
    }
    print_growth_lines(
        kpis.yoy_pct,
        kpis.mom_pct,
        kpis.recovery_vs_baseline_pct,
        kpis.cagr,
    );
    println!("  HHI / top-3 share   {} / {}", fmt_ratio(kpis.hhi_routes), fmt_share(kpis.top3_route_share));
    println!();
}

fn print_growth_lines(yoy_pct: f64, mom_pct: f64, recovery_pct: f64, cagr: f64) {
    println!("  YoY / MoM           {} / {}", fmt_signed_pct(yoy_pct), fmt_signed_pct(mom_pct));
    println!("  recovery vs base    {}", fmt_pct(recovery_pct));
    println!("  CAGR                {}", fmt_signed_pct(cagr * 100.0));
}

fn run_quality(args: &QualityArgs) -> Result<()> {
    let config = args.to_config();
    info!(data_dir = %config.data_dir.display(), "building quality report");

    let tables = load_all(&config)?;
    let report = quality_report(&tables.airports, &tables.airlines, &tables.routes)?;
    let payload = serde_json::to_string_pretty(&report)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, payload)?;
            println!("{} {}", "report written to".green(), path.display());
        }
        None => println!("{payload}"),
    }
    Ok(())
}

fn run_list(args: &ListArgs) -> Result<()> {
    let found = discover_tables(&args.data_dir)?;
    if found.is_empty() {
        println!(
            "{} {}",
            "no CSV files under".yellow(),
            args.data_dir.display()
        );
        return Ok(());
    }

    for path in found {
        let family = DatasetFamily::from_path(&path)
            .map(|f| f.code())
            .unwrap_or("?");
        println!("{:>4}  {}", family.bold(), path.display());
    }
    Ok(())
}

fn nan_to_null(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

/// Integer count with thousands separators, `n/a` for NaN.
fn fmt_count(value: f64) -> String {
    if value.is_nan() {
        return "n/a".to_string();
    }
    let rounded = value.round() as i64;
    let digits = rounded.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn fmt_pct(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{value:.1}%")
    }
}

fn fmt_signed_pct(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{value:+.1}%")
    }
}

fn fmt_ratio(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{value:.3}")
    }
}

fn fmt_share(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.1}%", value * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_formatting_groups_thousands() {
        assert_eq!(fmt_count(0.0), "0");
        assert_eq!(fmt_count(1234.0), "1 234");
        assert_eq!(fmt_count(98_765_432.0), "98 765 432");
        assert_eq!(fmt_count(-1234.0), "-1 234");
        assert_eq!(fmt_count(f64::NAN), "n/a");
    }

    #[test]
    fn percent_formatting_handles_nan() {
        assert_eq!(fmt_signed_pct(f64::NAN), "n/a");
        assert_eq!(fmt_signed_pct(12.34), "+12.3%");
        assert_eq!(fmt_pct(75.0), "75.0%");
        assert_eq!(fmt_share(0.415), "41.5%");
    }
}
