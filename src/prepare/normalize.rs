//! Column-name normalization and calendar-field derivation.
//!
//! Raw DGAC exports vary in how they encode the reporting month: either an
//! (`annee`, `mois`) pair or a packed `YYYYMM` value under `anmois` or
//! `annee_mois`. Derivation is an explicit ordered list of strategies; the
//! first applicable one wins and the rest are never consulted.

use crate::error::Result;
use polars::prelude::*;

/// Lower-case, trim, strip BOM artifacts and fold spaces/hyphens to `_` in
/// every column name. Idempotent.
pub fn normalize_columns(df: &DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| normalize_name(name.as_str()))
        .collect();

    let mut out = df.clone();
    out.set_column_names(names.iter().map(|s| s.as_str()))?;
    Ok(out)
}

fn normalize_name(name: &str) -> String {
    name.replace('\u{feff}', "")
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

/// One way of recovering the reporting month from raw columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStrategy {
    /// Separate `annee` and `mois` columns.
    YearMonthPair,
    /// Packed `YYYYMM` under `anmois`; back-fills `annee`/`mois`.
    PackedAnmois,
    /// Packed `YYYYMM` under `annee_mois`; back-fills `annee`/`mois`.
    PackedAnneeMois,
}

/// Strategies in priority order; the first applicable one is used.
pub const DATE_STRATEGIES: &[DateStrategy] = &[
    DateStrategy::YearMonthPair,
    DateStrategy::PackedAnmois,
    DateStrategy::PackedAnneeMois,
];

impl DateStrategy {
    /// Whether the raw table carries the columns this strategy needs.
    pub fn applies(&self, df: &DataFrame) -> bool {
        match self {
            DateStrategy::YearMonthPair => has_column(df, "annee") && has_column(df, "mois"),
            DateStrategy::PackedAnmois => has_column(df, "anmois"),
            DateStrategy::PackedAnneeMois => has_column(df, "annee_mois"),
        }
    }

    /// Add the `date` column (and `annee`/`mois` for packed encodings).
    /// Unparseable rows get a null date and are retained.
    fn apply(&self, lf: LazyFrame) -> LazyFrame {
        match self {
            DateStrategy::YearMonthPair => lf.with_column(
                month_start_date(col("annee"), col("mois")).alias("date"),
            ),
            DateStrategy::PackedAnmois => apply_packed(lf, "anmois"),
            DateStrategy::PackedAnneeMois => apply_packed(lf, "annee_mois"),
        }
    }
}

fn apply_packed(lf: LazyFrame, column: &str) -> LazyFrame {
    let digits = col(column)
        .cast(DataType::String)
        .str()
        .replace_all(lit(r"[^0-9]"), lit(""), false)
        .str()
        .zfill(lit(6));

    lf.with_columns([
        digits
            .clone()
            .str()
            .slice(lit(0), lit(4))
            .cast(DataType::Int32)
            .alias("annee"),
        digits
            .str()
            .slice(lit(4), lit(2))
            .cast(DataType::Int32)
            .alias("mois"),
    ])
    .with_column(month_start_date(col("annee"), col("mois")).alias("date"))
}

/// Build the first-of-month date from year and month expressions.
/// Null or unparseable components yield a null date.
pub(crate) fn month_start_date(year: Expr, month: Expr) -> Expr {
    concat_str(
        [
            year.cast(DataType::Int32).cast(DataType::String),
            month
                .cast(DataType::Int32)
                .cast(DataType::String)
                .str()
                .zfill(lit(2)),
            lit("01"),
        ],
        "-",
        false,
    )
    .str()
    .to_date(StrptimeOptions {
        format: Some("%Y-%m-%d".into()),
        strict: false,
        exact: true,
        cache: true,
    })
}

/// Derive `date`, `year`, `month` and `quarter` using the first applicable
/// strategy. Leaves the table untouched when no encoding is present:
/// downstream consumers must tolerate the absence of `date`.
pub fn add_date_fields(df: DataFrame) -> Result<DataFrame> {
    let Some(strategy) = DATE_STRATEGIES.iter().find(|s| s.applies(&df)) else {
        return Ok(df);
    };

    let lf = strategy.apply(df.lazy()).with_columns([
        col("date").dt().year().alias("year"),
        col("date").dt().month().cast(DataType::Int32).alias("month"),
        concat_str(
            [
                col("date").dt().year().cast(DataType::String),
                col("date").dt().quarter().cast(DataType::String),
            ],
            "Q",
            false,
        )
        .alias("quarter"),
    ]);

    Ok(lf.collect()?)
}

pub(crate) fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

pub(crate) fn has_columns(df: &DataFrame, names: &[&str]) -> bool {
    names.iter().all(|n| has_column(df, n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_cleans_and_folds_names() {
        let df = df!(
            "\u{feff}Annee Mois" => &[202401i64],
            " CODE-AEROPORT " => &["LFPG"],
        )
        .unwrap();

        let out = normalize_columns(&df).unwrap();
        let names: Vec<&str> = out.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["annee_mois", "code_aeroport"]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let df = df!("Passagers Depart" => &[1i64, 2]).unwrap();
        let once = normalize_columns(&df).unwrap();
        let twice = normalize_columns(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn date_from_year_month_pair() {
        let df = df!(
            "annee" => &[2023i64, 2023, 2024],
            "mois" => &[1i64, 12, 7],
        )
        .unwrap();

        let out = add_date_fields(df).unwrap();
        assert!(has_columns(&out, &["date", "year", "month", "quarter"]));

        let years = out.column("year").unwrap().i32().unwrap();
        assert_eq!(years.get(2), Some(2024));
        let months = out.column("month").unwrap().i32().unwrap();
        assert_eq!(months.get(1), Some(12));
        let quarters = out.column("quarter").unwrap().str().unwrap();
        assert_eq!(quarters.get(2), Some("2024Q3"));
    }

    #[test]
    fn date_from_packed_anmois() {
        let df = df!("anmois" => &["202403", "1990-07", "199012"]).unwrap();

        let out = add_date_fields(df).unwrap();
        let annee = out.column("annee").unwrap().i32().unwrap();
        let mois = out.column("mois").unwrap().i32().unwrap();
        assert_eq!(annee.get(0), Some(2024));
        assert_eq!(mois.get(0), Some(3));
        // Non-digit separators are stripped before splitting.
        assert_eq!(annee.get(1), Some(1990));
        assert_eq!(mois.get(1), Some(7));
        assert_eq!(mois.get(2), Some(12));
    }

    #[test]
    fn unparseable_rows_keep_null_date() {
        let df = df!(
            "annee" => &[Some(2023i64), None],
            "mois" => &[Some(5i64), Some(3)],
        )
        .unwrap();

        let out = add_date_fields(df).unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(out.column("date").unwrap().null_count(), 1);
    }

    #[test]
    fn no_encoding_leaves_table_unchanged() {
        let df = df!("code_aeroport" => &["LFPG"]).unwrap();
        let out = add_date_fields(df.clone()).unwrap();
        assert!(!has_column(&out, "date"));
        assert_eq!(out, df);
    }

    #[test]
    fn pair_strategy_wins_over_packed() {
        let df = df!(
            "annee" => &[2020i64],
            "mois" => &[6i64],
            "anmois" => &["199901"],
        )
        .unwrap();

        let out = add_date_fields(df).unwrap();
        let years = out.column("year").unwrap().i32().unwrap();
        assert_eq!(years.get(0), Some(2020));
    }
}
