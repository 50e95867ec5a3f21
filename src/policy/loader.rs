//! Load disabled and active lives extracts and their rider attributes

use super::{ActivePolicy, DisabledClaim, RecordKey, RiderAttributes};
use crate::error::Result;
use csv::Reader;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// One row of a rider attribute extract
#[derive(Debug, Clone, Deserialize)]
pub struct RiderAttributeRow {
    #[serde(rename = "POLICY_ID")]
    pub policy_id: String,
    #[serde(rename = "CLAIM_ID", default)]
    pub claim_id: Option<String>,
    #[serde(rename = "COVERAGE_ID")]
    pub coverage_id: String,
    #[serde(rename = "RIDER_ATTRIBUTE")]
    pub attribute: String,
    #[serde(rename = "VALUE")]
    pub value: String,
}

/// Records that accept rider attributes
pub trait RiderTarget {
    fn key(&self) -> RecordKey;
    fn riders_mut(&mut self) -> &mut RiderAttributes;
}

impl RiderTarget for DisabledClaim {
    fn key(&self) -> RecordKey {
        DisabledClaim::key(self)
    }

    fn riders_mut(&mut self) -> &mut RiderAttributes {
        &mut self.riders
    }
}

impl RiderTarget for ActivePolicy {
    fn key(&self) -> RecordKey {
        ActivePolicy::key(self)
    }

    fn riders_mut(&mut self) -> &mut RiderAttributes {
        &mut self.riders
    }
}

fn read_rows<T, R>(reader: R) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
    R: std::io::Read,
{
    let mut csv_reader = Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

/// Load a disabled lives extract from a CSV file
pub fn load_disabled_claims<P: AsRef<Path>>(path: P) -> Result<Vec<DisabledClaim>> {
    let claims = read_rows(std::fs::File::open(path.as_ref())?)?;
    debug!("loaded disabled lives extract {}", path.as_ref().display());
    Ok(claims)
}

/// Load a disabled lives extract from any reader
pub fn load_disabled_claims_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<DisabledClaim>> {
    read_rows(reader)
}

/// Load an active lives extract from a CSV file
pub fn load_active_policies<P: AsRef<Path>>(path: P) -> Result<Vec<ActivePolicy>> {
    let policies = read_rows(std::fs::File::open(path.as_ref())?)?;
    debug!("loaded active lives extract {}", path.as_ref().display());
    Ok(policies)
}

/// Load an active lives extract from any reader
pub fn load_active_policies_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<ActivePolicy>> {
    read_rows(reader)
}

/// Load a rider attribute extract from a CSV file
pub fn load_rider_attributes<P: AsRef<Path>>(path: P) -> Result<Vec<RiderAttributeRow>> {
    read_rows(std::fs::File::open(path)?)
}

/// Load a rider attribute extract from any reader
pub fn load_rider_attributes_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<RiderAttributeRow>> {
    read_rows(reader)
}

/// Overlay rider attributes onto the records they belong to
///
/// Rows match on policy id and coverage id, and on claim id when the row carries one.
/// Rows with no matching record are logged and skipped.
pub fn merge_rider_attributes<T: RiderTarget>(records: &mut [T], rows: &[RiderAttributeRow]) -> Result<()> {
    let mut by_key: HashMap<(&str, &str), Vec<usize>> = HashMap::new();
    let keys: Vec<RecordKey> = records.iter().map(|r| r.key()).collect();
    for (idx, key) in keys.iter().enumerate() {
        by_key
            .entry((key.policy_id.as_str(), key.coverage_id.as_str()))
            .or_default()
            .push(idx);
    }

    for row in rows {
        let targets = match by_key.get(&(row.policy_id.as_str(), row.coverage_id.as_str())) {
            Some(targets) => targets,
            None => {
                warn!(
                    "rider attribute {} has no record for policy {} coverage {}",
                    row.attribute, row.policy_id, row.coverage_id
                );
                continue;
            }
        };
        for &idx in targets {
            let claim_matches = match (&row.claim_id, &keys[idx].claim_id) {
                (Some(row_claim), Some(record_claim)) => row_claim == record_claim,
                _ => true,
            };
            if claim_matches {
                records[idx].riders_mut().set(&row.attribute, &row.value)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::fixtures::date;

    const ACTIVE_EXTRACT: &str = "\
POLICY_ID,COVERAGE_ID,GENDER,BIRTH_DT,TOBACCO_USAGE,POLICY_START_DT,POLICY_END_DT,PREMIUM_PAY_TO_DT,ELIMINATION_PERIOD,IDI_MARKET,IDI_CONTRACT,IDI_BENEFIT_PERIOD,IDI_OCCUPATION_CLASS,COLA_PERCENT,GROSS_PREMIUM,GROSS_PREMIUM_FREQ,BENEFIT_AMOUNT
A1,BASE,F,1975-06-01,N,2010-01-01,2040-06-01,2040-06-01,90,INDV,AS,TO65,2,0.0,50.0,MONTH,1000.0
A1,ROP,F,1975-06-01,N,2010-01-01,2040-06-01,2040-06-01,90,INDV,AS,TO65,2,0.0,12.0,MONTH,1000.0
";

    const RIDERS: &str = "\
POLICY_ID,COVERAGE_ID,RIDER_ATTRIBUTE,VALUE
A1,ROP,rop_return_freq,10
A1,ROP,rop_return_percent,0.5
A1,ROP,rop_claims_paid,0
A1,ROP,rop_future_claims_start_dt,2020-01-01
A9,ROP,rop_return_freq,10
";

    #[test]
    fn test_load_active_extract() {
        let policies = load_active_policies_from_reader(ACTIVE_EXTRACT.as_bytes()).unwrap();
        assert_eq!(policies.len(), 2);
        assert_eq!(policies[0].policy_start_dt, date(2010, 1, 1));
        assert_eq!(policies[1].coverage_id, "ROP");
    }

    #[test]
    fn test_merge_rider_attributes() {
        let mut policies = load_active_policies_from_reader(ACTIVE_EXTRACT.as_bytes()).unwrap();
        let riders = load_rider_attributes_from_reader(RIDERS.as_bytes()).unwrap();
        merge_rider_attributes(&mut policies, &riders).unwrap();

        assert_eq!(policies[0].riders, RiderAttributes::default());
        assert_eq!(policies[1].riders.rop_return_freq, Some(10));
        assert_eq!(policies[1].riders.rop_return_percent, Some(0.5));
        assert_eq!(policies[1].riders.rop_future_claims_start_dt, Some(date(2020, 1, 1)));
        assert!(policies[1].attributes().is_ok());
    }

    #[test]
    fn test_bad_rider_value_fails_merge() {
        let mut policies = load_active_policies_from_reader(ACTIVE_EXTRACT.as_bytes()).unwrap();
        let riders = load_rider_attributes_from_reader(
            "POLICY_ID,COVERAGE_ID,RIDER_ATTRIBUTE,VALUE\nA1,ROP,rop_return_freq,ten\n".as_bytes(),
        )
        .unwrap();
        assert!(merge_rider_attributes(&mut policies, &riders).is_err());
    }
}
