//! Data-quality diagnostics: null counts, duplicate keys, IQR outliers,
//! date coverage and the combined serializable report.

use crate::error::Result;
use crate::metrics::date_from_days;
use crate::models::{DateCoverage, FamilyQuality, MissingCount, PreparedTable, QualityReport};
use crate::prepare::normalize::has_column;
use polars::prelude::*;
use tracing::debug;

/// Null counts per column, nonzero only, descending.
pub fn missing_by_column(df: &DataFrame) -> Vec<MissingCount> {
    let mut counts: Vec<MissingCount> = df
        .get_columns()
        .iter()
        .filter_map(|c| {
            let missing = c.null_count();
            (missing > 0).then(|| MissingCount {
                column: c.name().to_string(),
                missing,
            })
        })
        .collect();
    counts.sort_by(|a, b| b.missing.cmp(&a.missing));
    counts
}

/// Number of rows belonging to a key group that occurs more than once.
/// Keys absent from the table are ignored; zero when none remain.
pub fn duplicate_key_rows(df: &DataFrame, keys: &[&str]) -> Result<usize> {
    let present: Vec<Expr> = keys
        .iter()
        .filter(|k| has_column(df, k))
        .map(|k| col(*k))
        .collect();
    if df.height() == 0 || present.is_empty() {
        return Ok(0);
    }

    let grouped = df
        .clone()
        .lazy()
        .group_by_stable(present)
        .agg([len().alias("rows")])
        .collect()?;

    let sizes = grouped.column("rows")?.u32()?;
    Ok(sizes
        .into_iter()
        .flatten()
        .filter(|n| *n > 1)
        .map(|n| n as usize)
        .sum())
}

/// Rows whose `column` value falls outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`.
/// Quartiles use linear interpolation over the sorted non-null values.
/// Empty when the column is absent or carries no values.
pub fn iqr_outliers(df: &DataFrame, column: &str) -> Result<DataFrame> {
    if df.height() == 0 || !has_column(df, column) {
        return Ok(DataFrame::default());
    }

    let values = df.column(column)?.cast(&DataType::Float64)?;
    let values = values.f64()?;
    let mut sorted: Vec<f64> = values.into_iter().flatten().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Ok(DataFrame::default());
    }
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile_linear(&sorted, 0.25);
    let q3 = quantile_linear(&sorted, 0.75);
    let iqr = q3 - q1;
    let low = q1 - 1.5 * iqr;
    let high = q3 + 1.5 * iqr;

    let mask: Vec<bool> = values
        .into_iter()
        .map(|v| v.map(|v| v < low || v > high).unwrap_or(false))
        .collect();
    Ok(df.filter(&BooleanChunked::from_slice("mask".into(), &mask))?)
}

/// Linear-interpolated quantile of a sorted non-empty slice.
fn quantile_linear(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// First and last observed month, `None` without a usable `date` column.
pub fn date_coverage(df: &DataFrame) -> Result<Option<DateCoverage>> {
    if df.height() == 0 || !has_column(df, "date") {
        return Ok(None);
    }

    let dates = df.column("date")?.as_materialized_series().date()?;
    let mut bounds: Option<(i32, i32)> = None;
    for days in dates.into_iter().flatten() {
        bounds = Some(match bounds {
            Some((min, max)) => (min.min(days), max.max(days)),
            None => (days, days),
        });
    }

    let Some((min, max)) = bounds else {
        return Ok(None);
    };
    let (Some(start), Some(end)) = (date_from_days(min), date_from_days(max)) else {
        return Ok(None);
    };
    Ok(Some(DateCoverage { start, end }))
}

/// Diagnostics for one prepared table.
pub fn family_quality(table: &PreparedTable) -> Result<FamilyQuality> {
    let df = &table.data;
    let quality = FamilyQuality {
        rows: df.height(),
        columns: df.width(),
        coverage: date_coverage(df)?,
        schema: table.schema_report.clone(),
        missing: missing_by_column(df),
        duplicate_rows: duplicate_key_rows(df, table.family.duplicate_keys())?,
    };
    debug!(
        family = %table.family,
        rows = quality.rows,
        duplicates = quality.duplicate_rows,
        "quality computed"
    );
    Ok(quality)
}

/// Combined report over the three families, ready for JSON export.
pub fn quality_report(
    airports: &PreparedTable,
    airlines: &PreparedTable,
    routes: &PreparedTable,
) -> Result<QualityReport> {
    Ok(QualityReport {
        airports: family_quality(airports)?,
        airlines: family_quality(airlines)?,
        routes: family_quality(routes)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DatasetFamily;
    use crate::prepare::normalize::add_date_fields;
    use chrono::NaiveDate;

    #[test]
    fn missing_counts_sorted_descending() {
        let df = df!(
            "a" => &[Some(1.0f64), None, None],
            "b" => &[Some(1.0f64), Some(2.0), None],
            "c" => &[1.0f64, 2.0, 3.0],
        )
        .unwrap();

        let counts = missing_by_column(&df);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].column, "a");
        assert_eq!(counts[0].missing, 2);
        assert_eq!(counts[1].missing, 1);
    }

    #[test]
    fn duplicate_rows_count_whole_groups() {
        let df = df!(
            "annee" => &[2024i32, 2024, 2024, 2023],
            "mois" => &[1i32, 1, 2, 1],
            "cie" => &["AFR", "AFR", "AFR", "AFR"],
        )
        .unwrap();

        // (2024, 1, AFR) occurs twice: both rows count.
        let dupes = duplicate_key_rows(&df, &["annee", "mois", "cie"]).unwrap();
        assert_eq!(dupes, 2);

        let clean = df!("annee" => &[2024i32, 2023]).unwrap();
        assert_eq!(duplicate_key_rows(&clean, &["annee"]).unwrap(), 0);
        assert_eq!(duplicate_key_rows(&clean, &["absent"]).unwrap(), 0);
    }

    #[test]
    fn iqr_flags_extreme_rows_only() {
        let mut values: Vec<f64> = (1..=20).map(f64::from).collect();
        values.push(1000.0);
        let df = df!("passagers_total" => values).unwrap();

        let outliers = iqr_outliers(&df, "passagers_total").unwrap();
        assert_eq!(outliers.height(), 1);
        let v = outliers.column("passagers_total").unwrap().f64().unwrap();
        assert_eq!(v.get(0), Some(1000.0));

        assert_eq!(iqr_outliers(&df, "absent").unwrap().height(), 0);
    }

    #[test]
    fn coverage_spans_observed_months() {
        let df = df!(
            "annee" => &[Some(2019i64), Some(2024), None],
            "mois" => &[Some(3i64), Some(11), Some(1)],
        )
        .unwrap();
        let df = add_date_fields(df).unwrap();

        let coverage = date_coverage(&df).unwrap().unwrap();
        assert_eq!(coverage.start, NaiveDate::from_ymd_opt(2019, 3, 1).unwrap());
        assert_eq!(coverage.end, NaiveDate::from_ymd_opt(2024, 11, 1).unwrap());

        let undated = df!("cie" => &["AFR"]).unwrap();
        assert!(date_coverage(&undated).unwrap().is_none());
    }

    #[test]
    fn report_covers_all_families() {
        let apt = PreparedTable::empty(DatasetFamily::Airport);
        let cie = PreparedTable::empty(DatasetFamily::Airline);
        let lsn = PreparedTable::empty(DatasetFamily::Route);

        let report = quality_report(&apt, &cie, &lsn).unwrap();
        assert_eq!(report.airports.rows, 0);
        assert!(report.routes.coverage.is_none());

        // The report serializes as-is for the export path.
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"airlines\""));
    }
}
