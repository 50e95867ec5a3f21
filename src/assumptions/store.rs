//! Rate table store
//!
//! Tables are packaged as CSV files under `data/tables/` and embedded at compile time.
//! A store may instead read the same file names from a directory on disk. Every table is
//! parsed at most once per store and shared as an `Arc<RateTable>` afterwards.

use crate::error::{ReserveError, Result};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Default path to the packaged rate tables
pub const DEFAULT_TABLES_PATH: &str = "data/tables";

const SELECT_COLUMNS: &[&str] = &[
    "M1", "M2", "M3", "M4", "M5", "M6", "M7", "M8", "M9", "M10", "M11", "M12", "M13", "M14", "M15",
    "M16", "M17", "M18", "M19", "M20", "M21", "M22", "M23", "M24", "Y3", "Y4", "Y5", "Y6", "Y7",
    "Y8", "Y9", "Y10",
];

/// Column layout a table must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub keys: &'static [&'static str],
    pub values: &'static [&'static str],
}

/// Schema for a table id, or None if no such table exists
pub fn schema_for(table_id: &str) -> Option<TableSchema> {
    let (keys, values): (&'static [&'static str], &'static [&'static str]) = match table_id {
        "ctr-select" => (
            &["IDI_OCCUPATION_CLASS", "GENDER", "ELIMINATION_PERIOD", "AGE_INCURRED"],
            SELECT_COLUMNS,
        ),
        "ctr-ultimate" => (&["IDI_OCCUPATION_CLASS", "GENDER", "AGE_ATTAINED"], &["ULTIMATE_CTR"]),
        "ctr-benefit-period-modifier" => (
            &["IDI_BENEFIT_PERIOD", "COLA_FLAG", "DURATION_YEAR"],
            &["BENEFIT_PERIOD_MODIFIER"],
        ),
        "ctr-contract-modifier" => (&["IDI_CONTRACT", "DURATION_YEAR"], &["CONTRACT_MODIFIER"]),
        "ctr-cause-modifier" => (&["IDI_CONTRACT", "GENDER", "DURATION_YEAR"], &["CAUSE_MODIFIER"]),
        "ctr-diagnosis-modifier" => (&["IDI_DIAGNOSIS_GRP", "DURATION_YEAR"], &["DIAGNOSIS_MODIFIER"]),
        "ctr-catastrophic-modifier" => (&["DURATION_YEAR"], &["CATASTROPHIC_MODIFIER"]),
        "margin" => (&["RATE_FAMILY", "DURATION_BAND"], &["MARGIN"]),
        "incidence-base" => (
            &["INCIDENCE_TYPE", "IDI_OCCUPATION_CLASS", "GENDER", "ELIMINATION_PERIOD", "AGE_ATTAINED"],
            &["INCIDENCE_RATE"],
        ),
        "incidence-benefit-period-modifier" => (
            &["IDI_OCCUPATION_CLASS", "IDI_BENEFIT_PERIOD", "ELIMINATION_PERIOD"],
            &["BENEFIT_PERIOD_MODIFIER"],
        ),
        "incidence-contract-modifier" => (&["IDI_CONTRACT"], &["CONTRACT_MODIFIER"]),
        "incidence-market-modifier" => (&["IDI_MARKET"], &["MARKET_MODIFIER"]),
        "incidence-tobacco-modifier" => (
            &["IDI_OCCUPATION_CLASS", "GENDER", "TOBACCO_USAGE"],
            &["TOBACCO_MODIFIER"],
        ),
        "interest" => (&["MIN_YEAR", "MAX_YEAR"], &["INTEREST_RATE"]),
        id if id.starts_with("mortality-") => (&["GENDER", "AGE_ATTAINED"], &["MORTALITY_RATE"]),
        id if id.starts_with("lapse-") => (&["AGE_BAND", "DURATION_YEAR"], &["LAPSE_RATE"]),
        _ => return None,
    };
    Some(TableSchema { keys, values })
}

fn embedded_source(table_id: &str) -> Option<&'static str> {
    let text = match table_id {
        "ctr-select" => include_str!("../../data/tables/ctr-select.csv"),
        "ctr-ultimate" => include_str!("../../data/tables/ctr-ultimate.csv"),
        "ctr-benefit-period-modifier" => include_str!("../../data/tables/ctr-benefit-period-modifier.csv"),
        "ctr-contract-modifier" => include_str!("../../data/tables/ctr-contract-modifier.csv"),
        "ctr-cause-modifier" => include_str!("../../data/tables/ctr-cause-modifier.csv"),
        "ctr-diagnosis-modifier" => include_str!("../../data/tables/ctr-diagnosis-modifier.csv"),
        "ctr-catastrophic-modifier" => include_str!("../../data/tables/ctr-catastrophic-modifier.csv"),
        "margin" => include_str!("../../data/tables/margin.csv"),
        "incidence-base" => include_str!("../../data/tables/incidence-base.csv"),
        "incidence-benefit-period-modifier" => {
            include_str!("../../data/tables/incidence-benefit-period-modifier.csv")
        }
        "incidence-contract-modifier" => include_str!("../../data/tables/incidence-contract-modifier.csv"),
        "incidence-market-modifier" => include_str!("../../data/tables/incidence-market-modifier.csv"),
        "incidence-tobacco-modifier" => include_str!("../../data/tables/incidence-tobacco-modifier.csv"),
        "interest" => include_str!("../../data/tables/interest.csv"),
        "mortality-01CSO" => include_str!("../../data/tables/mortality-01CSO.csv"),
        "mortality-17CSO" => include_str!("../../data/tables/mortality-17CSO.csv"),
        "mortality-58CSO" => include_str!("../../data/tables/mortality-58CSO.csv"),
        "mortality-80CSO" => include_str!("../../data/tables/mortality-80CSO.csv"),
        "lapse-standard" => include_str!("../../data/tables/lapse-standard.csv"),
        _ => return None,
    };
    Some(text)
}

fn join_key(parts: &[&str]) -> String {
    parts.join("|")
}

/// A read-only rate table: composite text key to one or more numeric columns
#[derive(Debug, Clone)]
pub struct RateTable {
    id: String,
    schema: TableSchema,
    rows: Vec<(Vec<String>, Vec<f64>)>,
    index: HashMap<String, usize>,
}

impl RateTable {
    /// Parse a table from CSV text, checking the header against the schema
    pub fn parse<R: std::io::Read>(id: &str, schema: TableSchema, reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let expected: Vec<&str> = schema.keys.iter().chain(schema.values.iter()).copied().collect();
        let found: Vec<&str> = headers.iter().map(str::trim).collect();
        if found != expected {
            return Err(ReserveError::table_format(
                id,
                format!("expected columns {:?}, found {:?}", expected, found),
            ));
        }

        let n_keys = schema.keys.len();
        let mut rows = Vec::new();
        let mut index = HashMap::new();
        for (line, result) in csv_reader.records().enumerate() {
            let record = result?;
            let key: Vec<String> = record.iter().take(n_keys).map(|k| k.trim().to_string()).collect();
            let values = record
                .iter()
                .skip(n_keys)
                .map(|v| v.trim().parse::<f64>())
                .collect::<std::result::Result<Vec<f64>, _>>()
                .map_err(|e| ReserveError::table_format(id, format!("row {}: {}", line + 2, e)))?;

            let joined = join_key(&key.iter().map(String::as_str).collect::<Vec<_>>());
            if index.insert(joined.clone(), rows.len()).is_some() {
                return Err(ReserveError::table_format(id, format!("duplicate key {}", joined)));
            }
            rows.push((key, values));
        }

        Ok(Self { id: id.to_string(), schema, rows, index })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All value columns for an exact key
    pub fn get(&self, key: &[&str]) -> Result<&[f64]> {
        let joined = join_key(key);
        self.index
            .get(&joined)
            .map(|&idx| self.rows[idx].1.as_slice())
            .ok_or_else(|| ReserveError::lookup(&self.id, joined))
    }

    /// The first value column for an exact key
    pub fn rate(&self, key: &[&str]) -> Result<f64> {
        Ok(self.get(key)?[0])
    }

    /// Position of a value column
    pub fn value_column(&self, name: &str) -> Result<usize> {
        self.schema
            .values
            .iter()
            .position(|c| *c == name)
            .ok_or_else(|| ReserveError::table_format(&self.id, format!("no column {}", name)))
    }

    /// Iterate rows in file order
    pub fn rows(&self) -> impl Iterator<Item = (&[String], &[f64])> {
        self.rows.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

/// Where table content comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// Tables compiled into the binary
    Embedded,
    /// `<table_id>.csv` files in a directory
    Directory(PathBuf),
}

/// Load-once cache of rate tables, shared by every resolver in a run
#[derive(Debug)]
pub struct RateTableStore {
    source: TableSource,
    tables: RwLock<HashMap<String, Arc<RateTable>>>,
}

impl RateTableStore {
    /// Store backed by the packaged tables
    pub fn embedded() -> Self {
        Self::with_source(TableSource::Embedded)
    }

    /// Store reading tables from a directory
    pub fn from_dir(path: &Path) -> Self {
        Self::with_source(TableSource::Directory(path.to_path_buf()))
    }

    pub fn with_source(source: TableSource) -> Self {
        Self { source, tables: RwLock::new(HashMap::new()) }
    }

    pub fn source(&self) -> &TableSource {
        &self.source
    }

    /// Get a table, loading it on first use
    pub fn load(&self, table_id: &str) -> Result<Arc<RateTable>> {
        {
            let tables = self.tables.read().map_err(|_| ReserveError::LockPoisoned("rate table cache"))?;
            if let Some(table) = tables.get(table_id) {
                return Ok(Arc::clone(table));
            }
        }

        let mut tables = self.tables.write().map_err(|_| ReserveError::LockPoisoned("rate table cache"))?;
        // Another thread may have loaded it between the two locks
        if let Some(table) = tables.get(table_id) {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(self.read_table(table_id)?);
        debug!("loaded rate table {} ({} rows)", table_id, table.len());
        tables.insert(table_id.to_string(), Arc::clone(&table));
        Ok(table)
    }

    /// Number of tables loaded so far
    ///
    /// A statistic only: reports 0 if a loader panicked and poisoned the lock, while
    /// `load` on the poisoned store fails with `LockPoisoned`.
    pub fn loaded_count(&self) -> usize {
        self.tables.read().map(|t| t.len()).unwrap_or(0)
    }

    fn read_table(&self, table_id: &str) -> Result<RateTable> {
        let schema = schema_for(table_id).ok_or_else(|| ReserveError::TableNotFound(table_id.to_string()))?;
        match &self.source {
            TableSource::Embedded => {
                let text = embedded_source(table_id)
                    .ok_or_else(|| ReserveError::TableNotFound(table_id.to_string()))?;
                RateTable::parse(table_id, schema, text.as_bytes())
            }
            TableSource::Directory(dir) => {
                let path = dir.join(format!("{}.csv", table_id));
                if !path.is_file() {
                    return Err(ReserveError::TableNotFound(table_id.to_string()));
                }
                RateTable::parse(table_id, schema, std::fs::File::open(path)?)
            }
        }
    }
}

impl Default for RateTableStore {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_is_cached() {
        let store = RateTableStore::embedded();
        let first = store.load("ctr-contract-modifier").unwrap();
        let second = store.load("ctr-contract-modifier").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.loaded_count(), 1);
        assert_eq!(first.len(), 50);
    }

    #[test]
    fn test_repeated_lookup_is_bit_identical() {
        let store = RateTableStore::embedded();
        let a = store.load("ctr-select").unwrap().get(&["1", "M", "90", "45"]).unwrap().to_vec();
        let b = store.load("ctr-select").unwrap().get(&["1", "M", "90", "45"]).unwrap().to_vec();
        assert_eq!(a.len(), 32);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn test_unknown_table() {
        let store = RateTableStore::embedded();
        assert!(matches!(store.load("ctr-imaginary"), Err(ReserveError::TableNotFound(_))));
        assert!(matches!(store.load("mortality-99CSO"), Err(ReserveError::TableNotFound(_))));
    }

    #[test]
    fn test_missing_key_is_lookup_error() {
        let store = RateTableStore::embedded();
        let table = store.load("incidence-market-modifier").unwrap();
        assert!((table.rate(&["INDV"]).unwrap() - 1.0).abs() < 1e-12);
        let err = table.rate(&["RETAIL"]).unwrap_err();
        assert_eq!(err.kind(), "LookupError");
    }

    #[test]
    fn test_header_mismatch_is_format_error() {
        let schema = schema_for("incidence-market-modifier").unwrap();
        let err = RateTable::parse("incidence-market-modifier", schema, "MARKET,FACTOR\nINDV,1.0\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, ReserveError::TableFormat { .. }));

        let err = RateTable::parse("incidence-market-modifier", schema, "IDI_MARKET,MARKET_MODIFIER\nINDV,x\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, ReserveError::TableFormat { .. }));
    }

    #[test]
    fn test_directory_source() {
        let dir = std::env::temp_dir().join(format!("idi_tables_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("incidence-contract-modifier.csv"), "IDI_CONTRACT,CONTRACT_MODIFIER\nAS,1.5\n").unwrap();

        let store = RateTableStore::from_dir(&dir);
        let table = store.load("incidence-contract-modifier").unwrap();
        assert!((table.rate(&["AS"]).unwrap() - 1.5).abs() < 1e-12);
        assert!(matches!(store.load("interest"), Err(ReserveError::TableNotFound(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_poisoned_store() {
        let store = Arc::new(RateTableStore::embedded());
        store.load("margin").unwrap();

        let loader = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = loader.tables.write().unwrap();
            panic!("loader died");
        })
        .join();

        assert_eq!(store.loaded_count(), 0);
        assert!(matches!(store.load("margin"), Err(ReserveError::LockPoisoned(_))));
    }
}
