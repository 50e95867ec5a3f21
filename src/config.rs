//! Run configuration shared by every record in a batch
//!
//! Read from a JSON file; every field has a default so a partial file is enough.

use crate::assumptions::RateTableStore;
use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Multiplicative sensitivity modifiers applied on top of the resolved rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default = "default_one")]
    pub ctr_modifier: f64,
    #[serde(default = "default_one")]
    pub interest_modifier: f64,
    #[serde(default = "default_one")]
    pub incidence_modifier: f64,
    #[serde(default = "default_one")]
    pub mortality_modifier: f64,
    #[serde(default = "default_one")]
    pub lapse_modifier: f64,
    #[serde(default = "default_one")]
    pub withdraw_modifier: f64,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            ctr_modifier: 1.0,
            interest_modifier: 1.0,
            incidence_modifier: 1.0,
            mortality_modifier: 1.0,
            lapse_modifier: 1.0,
            withdraw_modifier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_valuation_dt")]
    pub valuation_dt: NaiveDate,

    /// "stat", "gaap" or "best-estimate"
    #[serde(default = "default_assumption_set")]
    pub assumption_set: String,

    /// "NLP", "PT1" or "PT2"
    #[serde(default = "default_net_benefit_method")]
    pub net_benefit_method: String,

    #[serde(default = "default_mortality_table")]
    pub mortality_table: String,

    #[serde(default = "default_lapse_table")]
    pub lapse_table: String,

    /// Combined decrement table replacing mortality and lapse for active lives
    #[serde(default)]
    pub withdraw_table: Option<String>,

    #[serde(flatten)]
    pub modifiers: Modifiers,

    /// Probability social insurance pays in place of the SIS rider
    #[serde(default = "default_sis_probability")]
    pub sis_probability: f64,

    /// Directory of rate tables overriding the packaged ones
    #[serde(default)]
    pub tables_dir: Option<PathBuf>,

    /// Source identifier written to the output metadata
    #[serde(default = "default_source")]
    pub source: String,
}

/// Valuation date when a config names none
pub const DEFAULT_VALUATION_DT: NaiveDate = match NaiveDate::from_ymd_opt(2020, 12, 31) {
    Some(date) => date,
    None => panic!("invalid default valuation date"),
};

fn default_valuation_dt() -> NaiveDate { DEFAULT_VALUATION_DT }
fn default_assumption_set() -> String { "stat".to_string() }
fn default_net_benefit_method() -> String { "NLP".to_string() }
fn default_mortality_table() -> String { "01CSO".to_string() }
fn default_lapse_table() -> String { "standard".to_string() }
fn default_sis_probability() -> f64 { 0.7 }
fn default_source() -> String { "idi_reserves".to_string() }
fn default_one() -> f64 { 1.0 }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            valuation_dt: default_valuation_dt(),
            assumption_set: default_assumption_set(),
            net_benefit_method: default_net_benefit_method(),
            mortality_table: default_mortality_table(),
            lapse_table: default_lapse_table(),
            withdraw_table: None,
            modifiers: Modifiers::default(),
            sis_probability: default_sis_probability(),
            tables_dir: None,
            source: default_source(),
        }
    }
}

impl RunConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    /// Table store over `tables_dir`, or the packaged tables when unset
    pub fn table_store(&self) -> RateTableStore {
        match &self.tables_dir {
            Some(dir) => RateTableStore::from_dir(dir),
            None => RateTableStore::embedded(),
        }
    }
}
