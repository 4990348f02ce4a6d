//! Domain constants for the DGAC monthly traffic datasets.
//!
//! Expected raw schemas follow the columns published in the DGAC bulletins:
//! APT (airport traffic), CIE (airline traffic) and LSN (route-segment
//! traffic). Column names are the French wire format; derived columns added
//! during preparation are enumerated in [`KNOWN_DERIVED_COLUMNS`].

/// Mean Earth radius in kilometers, used by the haversine distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Reference year for traffic-recovery ratios (last full pre-pandemic year).
pub const DEFAULT_BASELINE_YEAR: i32 = 2019;

/// Default number of entities kept by rankings and market-share tables.
pub const DEFAULT_TOP_N: usize = 15;

/// Delimiter candidates tried in order when sniffing a CSV file.
pub const DELIMITER_CANDIDATES: &[u8] = &[b';', b',', b'\t', b'|'];

/// A sniffed header line must split into at least this many fields.
pub const MIN_HEADER_FIELDS: usize = 3;

/// Cell tokens treated as missing values after trimming.
/// `nan` is matched case-insensitively; `None` exactly.
pub const SENTINEL_TOKENS: &[&str] = &["", "-", "nan", "None"];

/// Expected raw columns of the airport-traffic (APT) dataset.
pub const APT_EXPECTED_COLUMNS: &[&str] = &[
    "annee_mois",
    "code_aeroport",
    "nom_aeroport",
    "zone",
    "unites_trafic",
    "passagers_depart",
    "passagers_arrivee",
    "passagers_transit",
    "fret_depart",
    "fret_arrivee",
    "mouvements_passagers",
    "mouvements_cargo",
    "source",
    "annee",
    "mois",
    "ville",
    "latitude",
    "longitude",
];

/// Expected raw columns of the airline-traffic (CIE) dataset.
pub const CIE_EXPECTED_COLUMNS: &[&str] = &[
    "anmois",
    "cie",
    "cie_nom",
    "cie_nat",
    "cie_pays",
    "cie_pax",
    "cie_frp",
    "cie_peq",
    "cie_pkt",
    "cie_tkt",
    "cie_peqkt",
    "cie_vol",
    "source_file",
    "annee",
    "mois",
];

/// Expected raw columns of the route-segment (LSN) dataset.
pub const LSN_EXPECTED_COLUMNS: &[&str] = &[
    "anmois",
    "lsn_seg",
    "lsn_fsc",
    "lsn_1",
    "lsn_2",
    "lsn_2_cont",
    "lsn_peq",
    "lsn_peqkt",
    "lsn_pax",
    "lsn_pkt",
    "lsn_frp",
    "lsn_tkt",
    "lsn_drt",
    "source_file",
    "annee",
    "mois",
];

/// Columns legitimately added by preparation; reported for transparency by
/// the schema validator but never flagged as a problem.
pub const KNOWN_DERIVED_COLUMNS: &[&str] = &[
    "date",
    "year",
    "month",
    "quarter",
    "passagers_total",
    "fret_total",
    "has_geo",
    "route_dir",
    "route_pair",
];

/// Numeric columns coerced during APT preparation.
pub const APT_NUMERIC_COLUMNS: &[&str] = &[
    "passagers_depart",
    "passagers_arrivee",
    "passagers_transit",
    "fret_depart",
    "fret_arrivee",
    "mouvements_passagers",
    "mouvements_cargo",
    "latitude",
    "longitude",
    "annee",
    "mois",
];

/// Numeric columns coerced during CIE preparation.
pub const CIE_NUMERIC_COLUMNS: &[&str] = &[
    "cie_pax",
    "cie_pkt",
    "cie_tkt",
    "cie_frp",
    "cie_vol",
    "cie_peq",
    "cie_peqkt",
    "annee",
    "mois",
];

/// Numeric columns coerced during LSN preparation.
pub const LSN_NUMERIC_COLUMNS: &[&str] = &[
    "lsn_pax",
    "lsn_pkt",
    "lsn_tkt",
    "lsn_frp",
    "lsn_peq",
    "lsn_peqkt",
    "annee",
    "mois",
];

/// Duplicate-detection key sets, per family.
pub mod duplicate_keys {
    pub const APT: &[&str] = &["annee", "mois", "code_aeroport"];
    pub const CIE: &[&str] = &["annee", "mois", "cie"];
    pub const LSN: &[&str] = &["annee", "mois", "lsn_seg", "lsn_fsc", "lsn_1", "lsn_2"];
}

/// Default processed file names, per family.
pub mod file_names {
    pub const APT: &str = "apt.csv";
    pub const CIE: &str = "cie.csv";
    pub const LSN: &str = "lsn.csv";
}
