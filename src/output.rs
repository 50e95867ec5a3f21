//! CSV output for batch results
//!
//! Projected rows carry the run metadata and record key first, then the actuarial
//! columns in a fixed order.

use crate::dispatch::{BatchOutput, ErrorRecord};
use crate::error::Result;
use crate::reserves::{ActiveReserveRow, DisabledReserveRow, ReserveResult, RunMetadata, TimeZeroRow};
use csv::Writer;
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A row with a fixed CSV column layout
pub trait CsvRow {
    fn header() -> &'static [&'static str];
    fn fields(&self) -> Vec<String>;
}

const METADATA_HEADER: &[&str] = &[
    "MODEL_VERSION",
    "RUN_DATE_TIME",
    "SOURCE",
    "MODEL",
    "POLICY_ID",
    "CLAIM_ID",
    "COVERAGE_ID",
];

fn metadata_fields<R>(metadata: &RunMetadata, result: &ReserveResult<R>) -> Vec<String> {
    vec![
        metadata.model_version.clone(),
        metadata.run_date_time.format("%Y-%m-%d %H:%M:%S").to_string(),
        metadata.source.clone(),
        result.model.clone(),
        result.key.policy_id.clone(),
        result.key.claim_id.clone().unwrap_or_default(),
        result.key.coverage_id.clone(),
    ]
}

impl CsvRow for DisabledReserveRow {
    fn header() -> &'static [&'static str] {
        &[
            "DATE_BD", "DATE_ED", "DURATION_YEAR", "DURATION_MONTH", "AGE_ATTAINED", "EXPOSURE",
            "CTR", "LIVES_BD", "LIVES_MD", "LIVES_ED", "BENEFIT_AMOUNT", "DISCOUNT_BD",
            "DISCOUNT_MD", "DISCOUNT_ED", "PVFB_BD", "PVFB_ED", "WT_BD", "WT_ED", "DATE_DLR", "DLR",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.date_bd.to_string(),
            self.date_ed.to_string(),
            self.duration_year.to_string(),
            self.duration_month.to_string(),
            self.age_attained.to_string(),
            self.exposure.to_string(),
            self.ctr.to_string(),
            self.lives_bd.to_string(),
            self.lives_md.to_string(),
            self.lives_ed.to_string(),
            format!("{:.2}", self.benefit_amount),
            self.discount_bd.to_string(),
            self.discount_md.to_string(),
            self.discount_ed.to_string(),
            self.pvfb_bd.to_string(),
            self.pvfb_ed.to_string(),
            self.wt_bd.to_string(),
            self.wt_ed.to_string(),
            self.date_dlr.to_string(),
            format!("{:.2}", self.dlr),
        ]
    }
}

impl CsvRow for ActiveReserveRow {
    fn header() -> &'static [&'static str] {
        &[
            "DATE_BD", "DATE_ED", "DURATION_YEAR", "AGE_ATTAINED", "TERMINATION_DT",
            "MORTALITY_RATE", "LAPSE_RATE", "LIVES_BD", "LIVES_MD", "LIVES_ED", "INCIDENCE_RATE",
            "CLAIM_COST", "BENEFIT_COST", "PREMIUM", "DISCOUNT_BD", "DISCOUNT_MD", "DISCOUNT_ED",
            "PVFB", "PVFP", "PVFNB", "ALR_BD", "ALR_ED", "WT_BD", "WT_ED", "DATE_ALR", "ALR",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.date_bd.to_string(),
            self.date_ed.to_string(),
            self.duration_year.to_string(),
            self.age_attained.to_string(),
            self.termination_dt.to_string(),
            self.mortality_rate.to_string(),
            self.lapse_rate.to_string(),
            self.lives_bd.to_string(),
            self.lives_md.to_string(),
            self.lives_ed.to_string(),
            self.incidence_rate.to_string(),
            self.claim_cost.to_string(),
            self.benefit_cost.to_string(),
            format!("{:.2}", self.premium),
            self.discount_bd.to_string(),
            self.discount_md.to_string(),
            self.discount_ed.to_string(),
            self.pvfb.to_string(),
            self.pvfp.to_string(),
            self.pvfnb.to_string(),
            self.alr_bd.to_string(),
            self.alr_ed.to_string(),
            self.wt_bd.to_string(),
            self.wt_ed.to_string(),
            self.date_alr.to_string(),
            format!("{:.2}", self.alr),
        ]
    }
}

impl CsvRow for TimeZeroRow {
    fn header() -> &'static [&'static str] {
        &["POLICY_ID", "CLAIM_ID", "COVERAGE_ID", "MODEL", "VALUATION_DT", "RESERVE_DT", "RESERVE"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.policy_id.clone(),
            self.claim_id.clone().unwrap_or_default(),
            self.coverage_id.clone(),
            self.model.clone(),
            self.valuation_dt.to_string(),
            self.reserve_dt.to_string(),
            format!("{:.2}", self.reserve),
        ]
    }
}

impl CsvRow for ErrorRecord {
    fn header() -> &'static [&'static str] {
        &["POLICY_ID", "CLAIM_ID", "COVERAGE_ID", "ERROR_TYPE", "ERROR_VALUE", "ERROR_TRACE"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.policy_id.clone(),
            self.claim_id.clone().unwrap_or_default(),
            self.coverage_id.clone(),
            self.error_type.clone(),
            self.error_value.clone(),
            self.error_trace.clone(),
        ]
    }
}

/// Write projected rows of every result, metadata columns first
pub fn write_projected<W: Write, R: CsvRow>(writer: W, results: &[ReserveResult<R>]) -> Result<()> {
    let mut csv = Writer::from_writer(writer);
    csv.write_record(METADATA_HEADER.iter().chain(R::header()))?;
    for result in results {
        let prefix = metadata_fields(&result.metadata, result);
        for row in &result.rows {
            csv.write_record(prefix.iter().cloned().chain(row.fields()))?;
        }
    }
    csv.flush()?;
    Ok(())
}

/// Write plain rows under their header; the header is written even with no rows
pub fn write_rows<W: Write, R: CsvRow>(writer: W, rows: &[R]) -> Result<()> {
    let mut csv = Writer::from_writer(writer);
    csv.write_record(R::header())?;
    for row in rows {
        csv.write_record(row.fields())?;
    }
    csv.flush()?;
    Ok(())
}

/// Write `<prefix>-projected.csv`, `<prefix>-time0.csv` and `<prefix>-errors.csv`
pub fn write_batch<R: CsvRow>(dir: &Path, prefix: &str, output: &BatchOutput<R>) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let projected = dir.join(format!("{}-projected.csv", prefix));
    let time_zero = dir.join(format!("{}-time0.csv", prefix));
    let errors = dir.join(format!("{}-errors.csv", prefix));

    write_projected(File::create(&projected)?, &output.results)?;
    write_rows(File::create(&time_zero)?, &output.time_zero)?;
    write_rows(File::create(&errors)?, &output.errors)?;

    info!(
        "wrote {} projected rows, {} time-zero rows and {} errors to {}",
        output.row_count(),
        output.time_zero.len(),
        output.errors.len(),
        dir.display()
    );
    Ok(vec![projected, time_zero, errors])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::AssumptionSet;
    use crate::dispatch::PopulationDispatcher;
    use crate::policy::fixtures::{date, short_tail_claim};
    use crate::reserves::{DisabledLifeModel, ReserveContext};
    use std::sync::Arc;

    fn batch() -> BatchOutput<DisabledReserveRow> {
        let ctx = ReserveContext::for_tests(AssumptionSet::Stat, date(2017, 3, 15));
        let mut bad = short_tail_claim();
        bad.claim_id = "BAD".into();
        bad.idi_occupation_class = "9".into();
        PopulationDispatcher::new(DisabledLifeModel::new(Arc::new(ctx))).run_batch(&[short_tail_claim(), bad])
    }

    #[test]
    fn test_projected_columns() {
        let output = batch();
        let mut buffer = Vec::new();
        write_projected(&mut buffer, &output.results).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        let header: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(&header[..3], &["MODEL_VERSION", "RUN_DATE_TIME", "SOURCE"]);
        assert_eq!(header.last(), Some(&"DLR"));
        assert_eq!(header.len(), METADATA_HEADER.len() + DisabledReserveRow::header().len());

        let first: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(first.len(), header.len());
        assert_eq!(first[3], "DisabledBase");
        assert_eq!(first[5], "P7C1");
        assert_eq!(text.lines().count(), 1 + output.row_count());
    }

    #[test]
    fn test_write_batch_files() {
        let output = batch();
        let dir = std::env::temp_dir().join(format!("idi_reserves_output_{}", std::process::id()));
        let paths = write_batch(&dir, "dlr", &output).unwrap();
        assert_eq!(paths.len(), 3);

        let errors = std::fs::read_to_string(&paths[2]).unwrap();
        assert!(errors.starts_with("POLICY_ID,CLAIM_ID,COVERAGE_ID,ERROR_TYPE"));
        assert!(errors.contains("BAD"));

        let time_zero = std::fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(time_zero.lines().count(), 2);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_rows_still_have_header() {
        let mut buffer = Vec::new();
        write_rows::<_, ErrorRecord>(&mut buffer, &[]).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().trim_end(), ErrorRecord::header().join(","));
    }
}
