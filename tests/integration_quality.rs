//! Quality-report tests over deliberately messy synthetic files:
//! duplicate key rows, sentinel cells, schema drift and an absent family.

use airtraffic_analytics::quality::{iqr_outliers, quality_report};
use airtraffic_analytics::{AnalyticsConfig, DatasetCache, DatasetFamily};
use chrono::NaiveDate;
use std::fs;
use std::path::Path;

// (2024, 1, LFPG) appears twice and one row carries sentinel cells.
const APT_CSV: &str = "\
annee;mois;code_aeroport;nom_aeroport;passagers_depart;passagers_arrivee;ville
2023;12;LFPG;Paris-CDG;480;470;Paris
2024;1;LFPG;Paris-CDG;500;510;Paris
2024;1;LFPG;Paris-CDG;500;510;Paris
2024;1;LFMN;Nice;-;190;nan
2024;2;LFMN;Nice;210;200;Nice
";

// A misspelled column produces both a missing and an extra entry.
const CIE_CSV: &str = "\
anmois;cie;cie_name;cie_pax
202401;AFR;Air France;900
202402;AFR;Air France;950
";

fn write_dataset(root: &Path, family: DatasetFamily, content: &str) {
    let dir = root.join(family.code()).join("processed");
    fs::create_dir_all(&dir).expect("create family directory");
    fs::write(dir.join(family.default_file_name()), content).expect("write dataset");
}

#[test]
fn report_flags_duplicates_drift_and_absence() {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_dataset(dir.path(), DatasetFamily::Airport, APT_CSV);
    write_dataset(dir.path(), DatasetFamily::Airline, CIE_CSV);
    // No LSN file at all.

    let config = AnalyticsConfig::new(dir.path());
    let mut cache = DatasetCache::new();
    let airports = cache
        .load_family(&config, DatasetFamily::Airport)
        .expect("load airports");
    let airlines = cache
        .load_family(&config, DatasetFamily::Airline)
        .expect("load airlines");
    let routes = cache
        .load_family(&config, DatasetFamily::Route)
        .expect("load absent routes");

    let report = quality_report(&airports, &airlines, &routes).expect("quality report");

    // Both rows of the duplicated (2024, 1, LFPG) key count.
    assert_eq!(report.airports.rows, 5);
    assert_eq!(report.airports.duplicate_rows, 2);

    let coverage = report.airports.coverage.expect("airport coverage");
    assert_eq!(coverage.start, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
    assert_eq!(coverage.end, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

    // Sentinel cells surface as null counts after preparation.
    assert!(
        report
            .airports
            .missing
            .iter()
            .any(|m| m.column == "passagers_depart" && m.missing == 1)
    );
    assert!(
        report
            .airports
            .missing
            .iter()
            .any(|m| m.column == "ville" && m.missing == 1)
    );

    // Misspelled airline column: expected name missing, unknown name extra.
    assert!(
        report
            .airlines
            .schema
            .missing
            .contains(&"cie_nom".to_string())
    );
    assert!(
        report
            .airlines
            .schema
            .extras
            .contains(&"cie_name".to_string())
    );
    assert_eq!(report.airlines.duplicate_rows, 0);

    // The absent family is reported, not errored.
    assert_eq!(report.routes.rows, 0);
    assert!(report.routes.coverage.is_none());

    let json = serde_json::to_string_pretty(&report).expect("serialize report");
    assert!(json.contains("\"duplicate_rows\": 2"));
    assert!(json.contains("\"start\": \"2023-12-01\""));
}

#[test]
fn outlier_scan_on_prepared_traffic() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut csv = String::from("annee;mois;code_aeroport;passagers_depart;passagers_arrivee\n");
    for month in 1..=12 {
        csv.push_str(&format!("2024;{month};LFPG;100;10{month}\n"));
    }
    // One month far outside the usual range.
    csv.push_str("2023;12;LFPG;90000;91000\n");
    write_dataset(dir.path(), DatasetFamily::Airport, &csv);

    let config = AnalyticsConfig::new(dir.path());
    let mut cache = DatasetCache::new();
    let airports = cache
        .load_family(&config, DatasetFamily::Airport)
        .expect("load airports");

    let outliers = iqr_outliers(&airports.data, "passagers_total").expect("outlier scan");
    assert_eq!(outliers.height(), 1);
    let v = outliers
        .column("passagers_total")
        .unwrap()
        .f64()
        .unwrap()
        .get(0)
        .unwrap();
    assert_eq!(v, 181_000.0);
}
