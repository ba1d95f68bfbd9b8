//! Score report encoding
//!
//! This module encodes an aggregate breakdown into a JSON report for sinks
//! (dashboards, indexers). Producer metadata and a computation timestamp are
//! attached to every report.

use crate::error::ComputeError;
use crate::types::{AggregateBreakdown, AggregationMethod, ReportProducer, ScoreRange, ScoreReport};
use crate::{PRODUCER_NAME, THREATSCORE_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Encoder producing score reports
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode a breakdown into a report.
    ///
    /// `range` is recorded for the mean method only; variance scores are
    /// never clamped.
    pub fn encode(&self, breakdown: &AggregateBreakdown, range: Option<ScoreRange>) -> ScoreReport {
        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: THREATSCORE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let range = match breakdown.method {
            AggregationMethod::Mean => Some(range.unwrap_or_default()),
            AggregationMethod::Variance => None,
        };

        ScoreReport {
            report_version: REPORT_VERSION.to_string(),
            producer,
            computed_at_utc: Utc::now().to_rfc3339(),
            method: breakdown.method,
            score: breakdown.score,
            range,
            total_weight: breakdown.total_weight,
            departments: breakdown.departments.clone(),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        breakdown: &AggregateBreakdown,
        range: Option<ScoreRange>,
    ) -> Result<String, ComputeError> {
        let report = self.encode(breakdown, range);
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }
}
