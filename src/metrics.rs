//! Scalar and tabular traffic metrics, plus the per-family KPI bundles.
//!
//! Scalar metrics return `f64::NAN` for degenerate input (missing columns,
//! empty tables, zero denominators); tabular metrics return an empty frame.
//! Growth rates are fractions; the `*_pct` KPI fields scale them by 100.

use crate::aggregate::{entity_totals, time_series};
use crate::error::Result;
use crate::models::{AirlineKpis, AirportKpis, Frequency, PreparedTable, RouteKpis};
use crate::prepare::normalize::has_column;
use chrono::NaiveDate;
use polars::prelude::*;

// =============================================================================
// Series helpers
// =============================================================================

/// Summed `value_col` per calendar year, ascending. Empty when the table
/// has no usable `year` column.
pub fn yearly_totals(df: &DataFrame, value_col: &str) -> Result<Vec<(i32, f64)>> {
    if df.height() == 0 || !has_column(df, "year") || !has_column(df, value_col) {
        return Ok(Vec::new());
    }

    let grouped = df
        .clone()
        .lazy()
        .filter(col("year").is_not_null())
        .group_by_stable([col("year").cast(DataType::Int32)])
        .agg([col(value_col).cast(DataType::Float64).sum()])
        .collect()?;

    let years = grouped.column("year")?.i32()?;
    let sums = grouped.column(value_col)?.f64()?;
    let mut totals: Vec<(i32, f64)> = years
        .into_iter()
        .zip(sums)
        .filter_map(|(y, v)| Some((y?, v.unwrap_or(0.0))))
        .collect();
    totals.sort_by_key(|(year, _)| *year);
    Ok(totals)
}

/// Monthly totals of `value_col`, ascending by month.
pub fn monthly_totals(df: &DataFrame, value_col: &str) -> Result<Vec<(NaiveDate, f64)>> {
    let series = time_series(df, &[value_col], Frequency::Monthly)?;
    if series.height() == 0 {
        return Ok(Vec::new());
    }

    let dates = series.column("period")?.as_materialized_series().date()?;
    let values = series.column(value_col)?.f64()?;
    Ok(dates
        .into_iter()
        .zip(values)
        .filter_map(|(d, v)| Some((date_from_days(d?)?, v.unwrap_or(0.0))))
        .collect())
}

pub(crate) fn date_from_days(days: i32) -> Option<NaiveDate> {
    // polars date = days since 1970-01-01; chrono counts from 0001-01-01.
    NaiveDate::from_num_days_from_ce_opt(days + 719_163)
}

// =============================================================================
// Scalar metrics
// =============================================================================

/// Compound annual growth rate between two observed years,
/// `(end/start)^(1/n) - 1` with `n = end_year - start_year`. NaN when either
/// endpoint year is absent, the span is zero, or an endpoint total is not
/// positive.
pub fn cagr(df: &DataFrame, value_col: &str, start_year: i32, end_year: i32) -> Result<f64> {
    let totals = yearly_totals(df, value_col)?;
    let start = totals.iter().find(|(y, _)| *y == start_year).map(|(_, v)| *v);
    let end = totals.iter().find(|(y, _)| *y == end_year).map(|(_, v)| *v);

    let (Some(start), Some(end)) = (start, end) else {
        return Ok(f64::NAN);
    };
    let span = end_year - start_year;
    if span <= 0 || start <= 0.0 || end <= 0.0 {
        return Ok(f64::NAN);
    }
    Ok((end / start).powf(1.0 / f64::from(span)) - 1.0)
}

/// Growth of the latest month over the month before it, as a fraction.
pub fn month_over_month(df: &DataFrame, value_col: &str) -> Result<f64> {
    let months = monthly_totals(df, value_col)?;
    Ok(trailing_growth(&months, 1))
}

/// Growth of the latest month over the same month one year earlier.
/// Needs at least 13 monthly points.
pub fn year_over_year_recent(df: &DataFrame, value_col: &str) -> Result<f64> {
    let months = monthly_totals(df, value_col)?;
    Ok(trailing_growth(&months, 12))
}

fn trailing_growth(months: &[(NaiveDate, f64)], lag: usize) -> f64 {
    if months.len() <= lag {
        return f64::NAN;
    }
    let current = months[months.len() - 1].1;
    let reference = months[months.len() - 1 - lag].1;
    if reference <= 0.0 {
        return f64::NAN;
    }
    (current - reference) / reference
}

/// Latest year's total as a percentage of the baseline year's total.
/// NaN when either year is absent or the baseline is not positive.
pub fn recovery_vs_baseline(df: &DataFrame, value_col: &str, baseline_year: i32) -> Result<f64> {
    let totals = yearly_totals(df, value_col)?;
    let Some((_, latest)) = totals.last() else {
        return Ok(f64::NAN);
    };
    let Some((_, baseline)) = totals.iter().find(|(y, _)| *y == baseline_year) else {
        return Ok(f64::NAN);
    };
    if *baseline <= 0.0 {
        return Ok(f64::NAN);
    }
    Ok(latest / baseline * 100.0)
}

/// Herfindahl-Hirschman index over entity shares of `value_col`, in (0, 1].
/// NaN when the grand total is not positive.
pub fn hhi(df: &DataFrame, entity_key: &str, value_col: &str) -> Result<f64> {
    let totals = entity_totals(df, entity_key, value_col)?;
    let grand_total: f64 = totals.iter().map(|(_, v)| v).sum();
    if totals.is_empty() || grand_total <= 0.0 {
        return Ok(f64::NAN);
    }
    Ok(totals
        .iter()
        .map(|(_, v)| (v / grand_total).powi(2))
        .sum())
}

/// Combined share of the `n` largest entities, as a fraction.
pub fn top_n_share(df: &DataFrame, entity_key: &str, value_col: &str, n: usize) -> Result<f64> {
    let totals = entity_totals(df, entity_key, value_col)?;
    let grand_total: f64 = totals.iter().map(|(_, v)| v).sum();
    if totals.is_empty() || grand_total <= 0.0 {
        return Ok(f64::NAN);
    }
    let top: f64 = totals.iter().take(n).map(|(_, v)| v).sum();
    Ok(top / grand_total)
}

// =============================================================================
// Tabular metrics
// =============================================================================

/// Mean monthly total per calendar month divided by the grand mean of those
/// twelve means. Values above 1 mark high-season months. Empty when the
/// table lacks `year`/`month` fields.
pub fn seasonality_index(df: &DataFrame, value_col: &str) -> Result<DataFrame> {
    if df.height() == 0
        || !has_column(df, "year")
        || !has_column(df, "month")
        || !has_column(df, value_col)
    {
        return Ok(DataFrame::default());
    }

    let per_month = df
        .clone()
        .lazy()
        .filter(col("month").is_not_null())
        .group_by_stable([
            col("year").cast(DataType::Int32),
            col("month").cast(DataType::Int32),
        ])
        .agg([col(value_col).cast(DataType::Float64).sum()])
        .group_by_stable([col("month")])
        .agg([col(value_col).mean()])
        .sort(["month"], SortMultipleOptions::default())
        .collect()?;

    let months = per_month.column("month")?.i32()?;
    let means = per_month.column(value_col)?.f64()?;
    let pairs: Vec<(i32, f64)> = months
        .into_iter()
        .zip(means)
        .filter_map(|(m, v)| Some((m?, v?)))
        .collect();
    let grand_mean: f64 = pairs.iter().map(|(_, v)| v).sum::<f64>() / pairs.len() as f64;
    if pairs.is_empty() || grand_mean <= 0.0 {
        return Ok(DataFrame::default());
    }

    let out = DataFrame::new(vec![
        Column::new("month".into(), pairs.iter().map(|(m, _)| *m).collect::<Vec<i32>>()),
        Column::new(
            "index".into(),
            pairs.iter().map(|(_, v)| v / grand_mean).collect::<Vec<f64>>(),
        ),
    ])?;
    Ok(out)
}

/// Per-entity change of `value_col` between two years. An entity absent
/// from one year contributes zero for it; `share_of_delta` is NaN when the
/// overall change is zero. Sorted by delta descending, truncated to `top_n`.
pub fn contribution_to_change(
    df: &DataFrame,
    entity_key: &str,
    value_col: &str,
    year_from: i32,
    year_to: i32,
    top_n: usize,
) -> Result<DataFrame> {
    if df.height() == 0 || !has_column(df, "year") {
        return Ok(DataFrame::default());
    }

    let from_totals = entity_totals(&filter_year(df, year_from)?, entity_key, value_col)?;
    let to_totals = entity_totals(&filter_year(df, year_to)?, entity_key, value_col)?;
    if from_totals.is_empty() && to_totals.is_empty() {
        return Ok(DataFrame::default());
    }

    let mut merged: std::collections::BTreeMap<String, (f64, f64)> = std::collections::BTreeMap::new();
    for (entity, value) in from_totals {
        merged.entry(entity).or_insert((0.0, 0.0)).0 = value;
    }
    for (entity, value) in to_totals {
        merged.entry(entity).or_insert((0.0, 0.0)).1 = value;
    }

    let total_delta: f64 = merged.values().map(|(from, to)| to - from).sum();
    let mut rows: Vec<(String, f64, f64, f64)> = merged
        .into_iter()
        .map(|(entity, (from, to))| (entity, from, to, to - from))
        .collect();
    rows.sort_by(|a, b| b.3.total_cmp(&a.3));
    rows.truncate(top_n);

    let shares: Vec<f64> = rows
        .iter()
        .map(|(_, _, _, delta)| {
            if total_delta == 0.0 {
                f64::NAN
            } else {
                delta / total_delta
            }
        })
        .collect();

    let out = DataFrame::new(vec![
        Column::new(
            entity_key.into(),
            rows.iter().map(|r| r.0.clone()).collect::<Vec<String>>(),
        ),
        Column::new("value_from".into(), rows.iter().map(|r| r.1).collect::<Vec<f64>>()),
        Column::new("value_to".into(), rows.iter().map(|r| r.2).collect::<Vec<f64>>()),
        Column::new("delta".into(), rows.iter().map(|r| r.3).collect::<Vec<f64>>()),
        Column::new("share_of_delta".into(), shares),
    ])?;
    Ok(out)
}

fn filter_year(df: &DataFrame, year: i32) -> Result<DataFrame> {
    let years = df.column("year")?.cast(&DataType::Int32)?;
    let mask: Vec<bool> = years
        .i32()?
        .into_iter()
        .map(|y| y == Some(year))
        .collect();
    Ok(df.filter(&BooleanChunked::from_slice("mask".into(), &mask))?)
}

// =============================================================================
// KPI bundles
// =============================================================================

/// Sum of a column, zero when absent. Used for headline totals.
fn column_sum(df: &DataFrame, name: &str) -> Result<f64> {
    if !has_column(df, name) {
        return Ok(0.0);
    }
    let values = df.column(name)?.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().flatten().sum())
}

/// Full-span CAGR over the observed years, NaN with fewer than two.
fn observed_cagr(df: &DataFrame, value_col: &str) -> Result<f64> {
    let totals = yearly_totals(df, value_col)?;
    match (totals.first(), totals.last()) {
        (Some((first, _)), Some((last, _))) if first != last => {
            cagr(df, value_col, *first, *last)
        }
        _ => Ok(f64::NAN),
    }
}

/// Look up an entity's display name in a dimension table.
fn dimension_label(
    dimension: Option<&DataFrame>,
    key_col: &str,
    name_col: &str,
    code: &str,
) -> Option<String> {
    let dim = dimension?;
    if !has_column(dim, key_col) || !has_column(dim, name_col) {
        return None;
    }
    let keys = dim.column(key_col).ok()?.str().ok()?;
    let names = dim.column(name_col).ok()?.str().ok()?;
    for i in 0..dim.height() {
        if keys.get(i) == Some(code) {
            return names.get(i).map(|n| n.to_string());
        }
    }
    None
}

pub fn airport_kpis(table: &PreparedTable, baseline_year: i32) -> Result<AirportKpis> {
    let df = &table.data;
    let value = "passagers_total";

    let leaders = entity_totals(df, "code_aeroport", value)?;
    let top = leaders.first();
    let top_airport_code = top.map(|(code, _)| code.clone());
    let top_airport_name = top_airport_code.as_deref().and_then(|code| {
        dimension_label(table.dimension.as_ref(), "code_aeroport", "nom_aeroport", code)
    });

    let months = monthly_totals(df, value)?;
    let peak = months
        .iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .copied();

    Ok(AirportKpis {
        total_passengers: column_sum(df, value)?,
        total_freight: column_sum(df, "fret_total")?,
        top_airport_code,
        top_airport_name,
        top_airport_passengers: top.map(|(_, v)| *v).unwrap_or(f64::NAN),
        peak_month: peak.map(|(d, _)| d),
        peak_month_passengers: peak.map(|(_, v)| v),
        yoy_pct: year_over_year_recent(df, value)? * 100.0,
        mom_pct: month_over_month(df, value)? * 100.0,
        recovery_vs_baseline_pct: recovery_vs_baseline(df, value, baseline_year)?,
        cagr: observed_cagr(df, value)?,
        hhi_airports: hhi(df, "code_aeroport", value)?,
        top3_airport_share: top_n_share(df, "code_aeroport", value, 3)?,
    })
}

pub fn airline_kpis(table: &PreparedTable, baseline_year: i32) -> Result<AirlineKpis> {
    let df = &table.data;
    let value = "cie_pax";

    let leaders = entity_totals(df, "cie", value)?;
    let top = leaders.first();
    let top_airline_code = top.map(|(code, _)| code.clone());
    let top_airline_name = top_airline_code.as_deref().and_then(|code| {
        dimension_label(table.dimension.as_ref(), "cie", "cie_nom", code)
    });

    Ok(AirlineKpis {
        total_passengers: column_sum(df, value)?,
        total_flights: column_sum(df, "cie_vol")?,
        top_airline_code,
        top_airline_name,
        top_airline_passengers: top.map(|(_, v)| *v).unwrap_or(f64::NAN),
        yoy_pct: year_over_year_recent(df, value)? * 100.0,
        mom_pct: month_over_month(df, value)? * 100.0,
        recovery_vs_baseline_pct: recovery_vs_baseline(df, value, baseline_year)?,
        cagr: observed_cagr(df, value)?,
        hhi_airlines: hhi(df, "cie", value)?,
        top3_airline_share: top_n_share(df, "cie", value, 3)?,
    })
}

pub fn route_kpis(table: &PreparedTable, baseline_year: i32) -> Result<RouteKpis> {
    let df = &table.data;
    let value = "lsn_pax";

    let leaders = entity_totals(df, "route_pair", value)?;
    let top = leaders.first();

    Ok(RouteKpis {
        total_passengers: column_sum(df, value)?,
        top_route: top.map(|(pair, _)| pair.clone()),
        top_route_passengers: top.map(|(_, v)| *v).unwrap_or(f64::NAN),
        yoy_pct: year_over_year_recent(df, value)? * 100.0,
        mom_pct: month_over_month(df, value)? * 100.0,
        recovery_vs_baseline_pct: recovery_vs_baseline(df, value, baseline_year)?,
        cagr: observed_cagr(df, value)?,
        hhi_routes: hhi(df, "route_pair", value)?,
        top3_route_share: top_n_share(df, "route_pair", value, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DatasetFamily;
    use crate::prepare::normalize::add_date_fields;

    fn with_dates(annee: Vec<i64>, mois: Vec<i64>, pax: Vec<f64>) -> DataFrame {
        let df = df!(
            "annee" => annee,
            "mois" => mois,
            "passagers_total" => pax,
        )
        .unwrap();
        add_date_fields(df).unwrap()
    }

    #[test]
    fn cagr_exact_two_year_doubling_rate() {
        let df = with_dates(
            vec![2020, 2021, 2022],
            vec![6, 6, 6],
            vec![100.0, 105.0, 121.0],
        );
        let rate = cagr(&df, "passagers_total", 2020, 2022).unwrap();
        assert!((rate - 0.10).abs() < 1e-12, "got {rate}");
    }

    #[test]
    fn cagr_degenerate_cases_are_nan() {
        let df = with_dates(vec![2020, 2022], vec![6, 6], vec![100.0, 121.0]);
        // Absent endpoint year.
        assert!(cagr(&df, "passagers_total", 2019, 2022).unwrap().is_nan());
        // Zero span.
        assert!(cagr(&df, "passagers_total", 2020, 2020).unwrap().is_nan());

        let zeros = with_dates(vec![2020, 2022], vec![6, 6], vec![0.0, 121.0]);
        assert!(cagr(&zeros, "passagers_total", 2020, 2022).unwrap().is_nan());
    }

    #[test]
    fn month_over_month_fraction() {
        let df = with_dates(vec![2024, 2024, 2024], vec![1, 2, 3], vec![80.0, 100.0, 110.0]);
        let mom = month_over_month(&df, "passagers_total").unwrap();
        assert!((mom - 0.10).abs() < 1e-12);

        let single = with_dates(vec![2024], vec![1], vec![80.0]);
        assert!(month_over_month(&single, "passagers_total").unwrap().is_nan());
    }

    #[test]
    fn year_over_year_needs_thirteen_months() {
        let mut annee = vec![2023i64; 12];
        annee.push(2024);
        let mois: Vec<i64> = (1..=12).chain(std::iter::once(1)).collect();
        let mut pax = vec![100.0; 12];
        pax.push(120.0);

        let df = with_dates(annee, mois, pax);
        let yoy = year_over_year_recent(&df, "passagers_total").unwrap();
        assert!((yoy - 0.20).abs() < 1e-12);

        let short = with_dates(vec![2024, 2024], vec![1, 2], vec![100.0, 120.0]);
        assert!(year_over_year_recent(&short, "passagers_total").unwrap().is_nan());
    }

    #[test]
    fn recovery_requires_baseline_year() {
        let df = with_dates(vec![2019, 2024], vec![6, 6], vec![200.0, 150.0]);
        let recovery = recovery_vs_baseline(&df, "passagers_total", 2019).unwrap();
        assert!((recovery - 75.0).abs() < 1e-12);

        let no_baseline = with_dates(vec![2021, 2024], vec![6, 6], vec![100.0, 150.0]);
        assert!(recovery_vs_baseline(&no_baseline, "passagers_total", 2019)
            .unwrap()
            .is_nan());
    }

    #[test]
    fn hhi_bounds_and_single_entity() {
        let df = df!(
            "cie" => &["A", "B"],
            "cie_pax" => &[50.0f64, 50.0],
        )
        .unwrap();
        let index = hhi(&df, "cie", "cie_pax").unwrap();
        assert!((index - 0.5).abs() < 1e-12);

        let single = df!("cie" => &["A"], "cie_pax" => &[10.0f64]).unwrap();
        assert!((hhi(&single, "cie", "cie_pax").unwrap() - 1.0).abs() < 1e-12);

        let empty = DataFrame::default();
        assert!(hhi(&empty, "cie", "cie_pax").unwrap().is_nan());
    }

    #[test]
    fn top_n_share_is_monotone_in_n() {
        let df = df!(
            "cie" => &["A", "B", "C"],
            "cie_pax" => &[60.0f64, 30.0, 10.0],
        )
        .unwrap();
        let one = top_n_share(&df, "cie", "cie_pax", 1).unwrap();
        let two = top_n_share(&df, "cie", "cie_pax", 2).unwrap();
        let three = top_n_share(&df, "cie", "cie_pax", 3).unwrap();
        assert!(one <= two && two <= three);
        assert!((one - 0.6).abs() < 1e-12);
        assert!((three - 1.0).abs() < 1e-12);
    }

    #[test]
    fn seasonality_index_averages_to_one() {
        // Two years, summer double the winter.
        let df = with_dates(
            vec![2022, 2022, 2023, 2023],
            vec![1, 7, 1, 7],
            vec![100.0, 200.0, 100.0, 200.0],
        );
        let out = seasonality_index(&df, "passagers_total").unwrap();
        assert_eq!(out.height(), 2);
        let index = out.column("index").unwrap().f64().unwrap();
        assert!((index.get(0).unwrap() - 100.0 / 150.0).abs() < 1e-12);
        assert!((index.get(1).unwrap() - 200.0 / 150.0).abs() < 1e-12);
    }

    #[test]
    fn contribution_handles_entity_absent_in_one_year() {
        let df = df!(
            "year" => &[2023i32, 2023, 2024, 2024],
            "cie" => &["A", "B", "A", "C"],
            "cie_pax" => &[100.0f64, 50.0, 130.0, 40.0],
        )
        .unwrap();

        let out = contribution_to_change(&df, "cie", "cie_pax", 2023, 2024, 10).unwrap();
        assert_eq!(out.height(), 3);

        let entities = out.column("cie").unwrap().str().unwrap();
        let deltas = out.column("delta").unwrap().f64().unwrap();
        // C appears only in 2024 with +40; B only in 2023 with -50.
        assert_eq!(entities.get(0), Some("C"));
        assert_eq!(deltas.get(0), Some(40.0));
        assert_eq!(entities.get(2), Some("B"));
        assert_eq!(deltas.get(2), Some(-50.0));

        let shares = out.column("share_of_delta").unwrap().f64().unwrap();
        let sum: f64 = shares.into_iter().flatten().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn contribution_share_nan_on_zero_delta() {
        let df = df!(
            "year" => &[2023i32, 2024],
            "cie" => &["A", "A"],
            "cie_pax" => &[100.0f64, 100.0],
        )
        .unwrap();
        let out = contribution_to_change(&df, "cie", "cie_pax", 2023, 2024, 10).unwrap();
        let shares = out.column("share_of_delta").unwrap().f64().unwrap();
        assert!(shares.get(0).unwrap().is_nan());
    }

    #[test]
    fn airport_kpis_over_prepared_like_table() {
        let df = with_dates(
            vec![2019, 2024, 2024],
            vec![6, 5, 6],
            vec![200.0, 90.0, 60.0],
        );
        let df = df
            .lazy()
            .with_column(lit("LFPG").alias("code_aeroport"))
            .collect()
            .unwrap();
        let table = PreparedTable {
            family: DatasetFamily::Airport,
            data: df,
            schema_report: Default::default(),
            dimension: None,
        };

        let kpis = airport_kpis(&table, 2019).unwrap();
        assert_eq!(kpis.total_passengers, 350.0);
        assert_eq!(kpis.top_airport_code.as_deref(), Some("LFPG"));
        assert!((kpis.recovery_vs_baseline_pct - 75.0).abs() < 1e-12);
        assert_eq!(
            kpis.peak_month,
            NaiveDate::from_ymd_opt(2019, 6, 1)
        );
        // Single airport concentrates the whole market.
        assert!((kpis.hhi_airports - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_table_kpis_are_total() {
        let table = PreparedTable::empty(DatasetFamily::Route);
        let kpis = route_kpis(&table, 2019).unwrap();
        assert_eq!(kpis.total_passengers, 0.0);
        assert!(kpis.top_route.is_none());
        assert!(kpis.cagr.is_nan());
        assert!(kpis.mom_pct.is_nan());
    }
}
