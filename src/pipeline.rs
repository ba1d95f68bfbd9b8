//! Pipeline orchestration
//!
//! This module provides the public entry points for threatscore. It takes
//! department data (JSON or user-level records), runs one of the aggregation
//! engines and encodes the result as a score report.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::EngineConfig;
use crate::encoder::ReportEncoder;
use crate::error::ComputeError;
use crate::mean::MeanAggregator;
use crate::records::{group_by_department, with_importance, UserThreatRecord};
use crate::types::{DepartmentRecord, ScoreReport, WeightedDepartment};
use crate::variance::VarianceAggregator;

/// Compute the variance score for a JSON object of departments.
///
/// # Arguments
/// * `raw_json` - Object mapping department name to `{ "user_count", "threat_scores" }`
///
/// # Returns
/// Pretty-printed score report JSON
///
/// # Example
/// ```ignore
/// let report = variance_score_from_json(
///     r#"{"HR": {"users": 2, "threat_scores": [10, 30]}}"#.to_string()
/// )?;
/// ```
pub fn variance_score_from_json(raw_json: String) -> Result<String, ComputeError> {
    let departments: BTreeMap<String, DepartmentRecord> = serde_json::from_str(&raw_json)?;
    let processor = ScoreProcessor::new();
    let report = processor.variance_report(&departments)?;
    serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
}

/// Compute the clamped mean score for a JSON array of weighted departments.
///
/// # Arguments
/// * `raw_json` - Array of `{ "name", "threat_scores", "importance" }`
///
/// # Returns
/// Pretty-printed score report JSON
///
/// # Example
/// ```ignore
/// let report = mean_score_from_json(
///     r#"[{"name": "HR", "threat_scores": [10, 30], "importance": 2}]"#.to_string()
/// )?;
/// ```
pub fn mean_score_from_json(raw_json: String) -> Result<String, ComputeError> {
    let departments: Vec<WeightedDepartment> = serde_json::from_str(&raw_json)?;
    let processor = ScoreProcessor::new();
    let report = processor.mean_report(&departments)?;
    serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
}

/// Processor holding configuration and a report encoder.
///
/// Use this when one instance id should tag every report, or when importance
/// weights and the clamp range come from configuration.
pub struct ScoreProcessor {
    config: EngineConfig,
    mean: MeanAggregator,
    encoder: ReportEncoder,
}

impl Default for ScoreProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreProcessor {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            mean: MeanAggregator::new(),
            encoder: ReportEncoder::new(),
        }
    }

    /// Create a processor from validated configuration
    pub fn with_config(config: EngineConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        let mean = MeanAggregator::with_range(config.score.range())?;
        Ok(Self {
            config,
            mean,
            encoder: ReportEncoder::new(),
        })
    }

    /// Replace the report encoder (e.g. to pin the instance id)
    pub fn with_encoder(mut self, encoder: ReportEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the variance engine and encode the result
    pub fn variance_report(
        &self,
        departments: &BTreeMap<String, DepartmentRecord>,
    ) -> Result<ScoreReport, ComputeError> {
        let breakdown = VarianceAggregator::breakdown(departments)?;
        info!(
            method = "variance",
            score = breakdown.score,
            departments = departments.len(),
            "threat score computed"
        );
        Ok(self.encoder.encode(&breakdown, None))
    }

    /// Run the mean engine and encode the result
    pub fn mean_report(
        &self,
        departments: &[WeightedDepartment],
    ) -> Result<ScoreReport, ComputeError> {
        let breakdown = self.mean.breakdown(departments)?;
        info!(
            method = "mean",
            score = breakdown.score,
            departments = departments.len(),
            "threat score computed"
        );
        Ok(self.encoder.encode(&breakdown, Some(self.mean.range())))
    }

    /// Group user records by department and run the variance engine
    pub fn variance_from_records(
        &self,
        records: &[UserThreatRecord],
    ) -> Result<ScoreReport, ComputeError> {
        let groups = group_by_department(records)?;
        self.variance_report(&groups)
    }

    /// Group user records, weight departments from configuration and run
    /// the mean engine
    pub fn mean_from_records(
        &self,
        records: &[UserThreatRecord],
    ) -> Result<ScoreReport, ComputeError> {
        let groups = group_by_department(records)?;
        let departments = with_importance(
            &groups,
            &self.config.weights.importance,
            self.config.weights.default_importance,
        );
        self.mean_report(&departments)
    }
}
