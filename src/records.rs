//! User-level threat records
//!
//! Tabular exports and search-index documents carry one row per user. This
//! module decodes those rows and folds them into per-department inputs for
//! the aggregation engines.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::types::{DepartmentRecord, WeightedDepartment};

/// One user's threat score, as stored upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserThreatRecord {
    pub user_id: String,
    pub department: String,
    pub threat_score: f64,
}

impl UserThreatRecord {
    fn validate(&self) -> Result<(), ComputeError> {
        if self.department.trim().is_empty() {
            return Err(ComputeError::MissingField(format!(
                "department (user {})",
                self.user_id
            )));
        }
        Ok(())
    }
}

/// Parse a JSON array of user records
pub fn parse_array(json: &str) -> Result<Vec<UserThreatRecord>, ComputeError> {
    let records: Vec<UserThreatRecord> = serde_json::from_str(json)?;
    for record in &records {
        record.validate()?;
    }
    Ok(records)
}

/// Parse NDJSON (one user record per line), skipping blank lines
pub fn parse_ndjson(ndjson: &str) -> Result<Vec<UserThreatRecord>, ComputeError> {
    let mut records = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = serde_json::from_str::<UserThreatRecord>(trimmed).map_err(|e| {
            ComputeError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
        })?;
        record.validate()?;
        records.push(record);
    }
    Ok(records)
}

/// Group user records by department.
///
/// Each department's user count is the number of records it received, so
/// the resulting records always have matching lengths. Fails if a
/// department receives more records than a user count can hold.
pub fn group_by_department(
    records: &[UserThreatRecord],
) -> Result<BTreeMap<String, DepartmentRecord>, ComputeError> {
    let mut scores: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for record in records {
        scores
            .entry(record.department.clone())
            .or_default()
            .push(record.threat_score);
    }

    scores
        .into_iter()
        .map(|(name, threat_scores)| Ok((name, DepartmentRecord::from_scores(threat_scores)?)))
        .collect()
}

/// Attach importance weights to grouped departments.
///
/// Departments missing from `importances` get `default_importance`.
pub fn with_importance(
    groups: &BTreeMap<String, DepartmentRecord>,
    importances: &HashMap<String, f64>,
    default_importance: f64,
) -> Vec<WeightedDepartment> {
    groups
        .iter()
        .map(|(name, record)| {
            let importance = importances
                .get(name)
                .copied()
                .unwrap_or(default_importance);
            WeightedDepartment::new(name.clone(), record.threat_scores.clone(), importance)
        })
        .collect()
}
