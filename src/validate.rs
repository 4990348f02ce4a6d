//! Advisory schema validation.
//!
//! Compares a prepared table's columns against the expected schema of its
//! dataset family. Drift is classified, reported and attached as metadata;
//! it never aborts processing.

use crate::constants::KNOWN_DERIVED_COLUMNS;
use crate::models::{DatasetFamily, SchemaReport};
use polars::prelude::DataFrame;
use std::collections::BTreeSet;
use tracing::debug;

/// Classify the table's columns into `missing` / `extras` / `derived`
/// relative to `expected`, with `allowed_extras` tolerated on top of the
/// fixed derived-column allow-list. All result sets are sorted.
pub fn validate_schema(
    df: &DataFrame,
    expected: &[&str],
    allowed_extras: &[&str],
) -> SchemaReport {
    let present: BTreeSet<String> = df
        .get_column_names()
        .iter()
        .map(|c| c.as_str().to_string())
        .collect();
    let expected: BTreeSet<String> = expected.iter().map(|c| c.to_lowercase()).collect();
    let allowed: BTreeSet<String> = KNOWN_DERIVED_COLUMNS
        .iter()
        .chain(allowed_extras.iter())
        .map(|c| c.to_lowercase())
        .collect();

    let missing: Vec<String> = expected.difference(&present).cloned().collect();
    let derived: Vec<String> = present
        .iter()
        .filter(|c| allowed.contains(*c) && !expected.contains(*c))
        .cloned()
        .collect();
    let extras: Vec<String> = present
        .iter()
        .filter(|c| !expected.contains(*c) && !allowed.contains(*c))
        .cloned()
        .collect();

    let report = SchemaReport {
        missing,
        extras,
        derived,
    };
    if !report.is_clean() {
        debug!(
            missing = report.missing.len(),
            extras = report.extras.len(),
            "schema drift detected"
        );
    }
    report
}

/// Validate against a family's expected schema.
pub fn validate_family(df: &DataFrame, family: DatasetFamily) -> SchemaReport {
    validate_schema(df, family.expected_columns(), &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn drift_is_reported_not_fatal() {
        // One expected column absent, one unrecognized extra present.
        let df = df!(
            "annee" => &[2024i32],
            "mystery" => &[1i32],
        )
        .unwrap();

        let report = validate_schema(&df, &["annee", "mois"], &[]);
        assert_eq!(report.missing, vec!["mois".to_string()]);
        assert_eq!(report.extras, vec!["mystery".to_string()]);
        assert!(report.derived.is_empty());
    }

    #[test]
    fn derived_columns_are_not_flagged() {
        let df = df!(
            "annee" => &[2024i32],
            "date" => &["2024-01-01"],
            "passagers_total" => &[10.0f64],
        )
        .unwrap();

        let report = validate_schema(&df, &["annee"], &[]);
        assert!(report.extras.is_empty());
        assert_eq!(
            report.derived,
            vec!["date".to_string(), "passagers_total".to_string()]
        );
    }

    #[test]
    fn clean_schema_for_exact_match() {
        let df = df!("annee" => &[2024i32], "mois" => &[1i32]).unwrap();
        let report = validate_schema(&df, &["annee", "mois"], &[]);
        assert!(report.is_clean());
        assert!(report.missing.is_empty());
    }

    #[test]
    fn allowed_extras_are_tolerated() {
        let df = df!("annee" => &[2024i32], "note" => &["x"]).unwrap();
        let report = validate_schema(&df, &["annee"], &["note"]);
        assert!(report.extras.is_empty());
        assert_eq!(report.derived, vec!["note".to_string()]);
    }
}
