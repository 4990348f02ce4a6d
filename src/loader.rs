//! CSV loading, delimiter detection and the prepared-table cache.
//!
//! Absent files are an expected state (a family may simply not be
//! deployed), so `read_table` warns and returns an empty frame instead of
//! failing. The cache is an explicit value owned by the caller, keyed by
//! path and modification time.

use crate::config::AnalyticsConfig;
use crate::constants::{DELIMITER_CANDIDATES, MIN_HEADER_FIELDS};
use crate::error::Result;
use crate::models::{DatasetFamily, PreparedTable};
use crate::prepare::prepare;
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Sniff the field delimiter from the header line: the first candidate
/// (`;`, `,`, tab, `|`) splitting it into at least [`MIN_HEADER_FIELDS`]
/// fields wins. Falls back to `;`, the DGAC export default, with a warning.
pub fn detect_delimiter(path: &Path) -> Result<u8> {
    let mut header = String::new();
    BufReader::new(File::open(path)?).read_line(&mut header)?;

    for candidate in DELIMITER_CANDIDATES {
        if header.split(*candidate as char).count() >= MIN_HEADER_FIELDS {
            return Ok(*candidate);
        }
    }
    warn!(path = %path.display(), "no delimiter candidate matched, assuming ';'");
    Ok(b';')
}

/// Read a raw CSV table. A missing file yields an empty frame; encoding
/// problems are read lossily rather than rejected.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        warn!(path = %path.display(), "dataset file not found, treating as empty");
        return Ok(DataFrame::default());
    }

    let delimiter = detect_delimiter(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(delimiter)
                .with_encoding(CsvEncoding::LossyUtf8),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(
        path = %path.display(),
        rows = df.height(),
        delimiter = %(delimiter as char),
        "dataset read"
    );
    Ok(df)
}

/// List the CSV files under a data directory, recursively, sorted.
pub fn discover_tables(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*.csv", dir.display());
    let paths = glob::glob(&pattern).map_err(|e| crate::error::AnalyticsError::Configuration {
        message: format!("invalid data directory pattern '{pattern}': {e}"),
    })?;

    let mut found: Vec<PathBuf> = paths.filter_map(|p| p.ok()).collect();
    found.sort();
    Ok(found)
}

struct CacheEntry {
    mtime: Option<SystemTime>,
    table: Arc<PreparedTable>,
}

/// Prepared-table cache keyed by path and file modification time.
///
/// A re-exported file (changed mtime) is re-read and re-prepared on the
/// next access; an unchanged file is served from memory.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and prepare the table at `path`, reusing the cached result
    /// while the file's modification time is unchanged.
    pub fn load(&mut self, family: DatasetFamily, path: &Path) -> Result<Arc<PreparedTable>> {
        let mtime = modification_time(path);
        if let Some(entry) = self.entries.get(path)
            && entry.mtime == mtime
        {
            debug!(path = %path.display(), "serving cached table");
            return Ok(Arc::clone(&entry.table));
        }

        let raw = read_table(path)?;
        let table = Arc::new(prepare(family, &raw)?);
        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                mtime,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    /// Load the family's table at its configured path.
    pub fn load_family(
        &mut self,
        config: &AnalyticsConfig,
        family: DatasetFamily,
    ) -> Result<Arc<PreparedTable>> {
        self.load(family, &config.family_path(family))
    }

    /// Drop the cached entry for one path.
    pub fn invalidate(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    /// Drop every cached entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn modification_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn delimiter_detection_prefers_semicolon() {
        let dir = tempfile::tempdir().unwrap();
        let semi = write_file(dir.path(), "apt.csv", "annee;mois;code_aeroport\n");
        assert_eq!(detect_delimiter(&semi).unwrap(), b';');

        let comma = write_file(dir.path(), "cie.csv", "annee,mois,cie\n");
        assert_eq!(detect_delimiter(&comma).unwrap(), b',');

        // Too few fields for any candidate: DGAC default.
        let odd = write_file(dir.path(), "odd.csv", "annee:mois:cie\n");
        assert_eq!(detect_delimiter(&odd).unwrap(), b';');
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let df = read_table(Path::new("/nonexistent/apt.csv")).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 0);
    }

    #[test]
    fn read_table_applies_detected_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "apt.csv",
            "annee;mois;code_aeroport\n2024;1;LFPG\n2024;2;LFPO\n",
        );

        let df = read_table(&path).unwrap();
        assert_eq!(df.shape(), (2, 3));
    }

    #[test]
    fn cache_serves_same_table_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "cie.csv",
            "anmois;cie;cie_pax\n202401;AFR;100\n",
        );

        let mut cache = DatasetCache::new();
        let first = cache.load(DatasetFamily::Airline, &path).unwrap();
        let second = cache.load(DatasetFamily::Airline, &path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        cache.invalidate(&path);
        assert!(cache.is_empty());
        let third = cache.load(DatasetFamily::Airline, &path).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(first.height(), third.height());
    }

    #[test]
    fn discovery_lists_csv_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("APT/processed")).unwrap();
        write_file(&dir.path().join("APT/processed"), "apt.csv", "a;b;c\n");
        write_file(dir.path(), "cie.csv", "a;b;c\n");
        write_file(dir.path(), "notes.txt", "ignored");

        let found = discover_tables(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("APT/processed/apt.csv"));
        assert!(found[1].ends_with("cie.csv"));
    }
}
