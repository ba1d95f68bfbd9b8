//! Core types for threatscore
//!
//! This module defines the data structures that flow through aggregation:
//! department inputs for both engines, the clamp range, per-department
//! breakdowns, and the encoded score report.

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;

/// A department as seen by the variance engine: a user count plus one
/// threat score per user.
///
/// The length of `threat_scores` is expected to match `user_count`, but the
/// engine only warns when it does not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepartmentRecord {
    /// Number of users in the department (the variance weight)
    #[serde(alias = "users")]
    pub user_count: u32,
    /// Per-user threat scores
    pub threat_scores: Vec<f64>,
}

impl DepartmentRecord {
    pub fn new(user_count: u32, threat_scores: Vec<f64>) -> Self {
        Self {
            user_count,
            threat_scores,
        }
    }

    /// Build a record whose user count is the number of scores.
    ///
    /// Fails when there are more scores than a `u32` user count can hold.
    pub fn from_scores(threat_scores: Vec<f64>) -> Result<Self, ComputeError> {
        Ok(Self {
            user_count: user_count_from_len(threat_scores.len())?,
            threat_scores,
        })
    }
}

pub(crate) fn user_count_from_len(len: usize) -> Result<u32, ComputeError> {
    u32::try_from(len).map_err(|_| ComputeError::UserCountOverflow { count: len })
}

/// A department as seen by the mean engine: threat scores plus a
/// caller-assigned importance weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedDepartment {
    /// Department name, used in breakdowns and error messages
    #[serde(default)]
    pub name: String,
    /// Per-user threat scores
    #[serde(alias = "data")]
    pub threat_scores: Vec<f64>,
    /// Non-negative contribution weight
    pub importance: f64,
}

impl WeightedDepartment {
    pub fn new(name: impl Into<String>, threat_scores: Vec<f64>, importance: f64) -> Self {
        Self {
            name: name.into(),
            threat_scores,
            importance,
        }
    }
}

/// Closed range a final score is clamped into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ScoreRange {
    /// Range used by the mean engine unless configured otherwise
    pub const DEFAULT: ScoreRange = ScoreRange {
        min: 0.0,
        max: 90.0,
    };

    /// Percentage scale used by tabular sources
    pub const PERCENT: ScoreRange = ScoreRange {
        min: 0.0,
        max: 100.0,
    };

    /// Create a validated range
    pub fn new(min: f64, max: f64) -> Result<Self, ComputeError> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ComputeError::InvalidScoreRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Saturate `value` at the range bounds
    pub fn clamp(&self, value: f64) -> f64 {
        self.min.max(self.max.min(value))
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Aggregation strategy that produced a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMethod {
    Variance,
    Mean,
}

impl AggregationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationMethod::Variance => "variance",
            AggregationMethod::Mean => "mean",
        }
    }
}

/// How one department fed into an aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentContribution {
    /// Department name
    pub name: String,
    /// Weight used (user count or importance)
    pub weight: f64,
    /// Department statistic (variance or mean); `None` when skipped
    pub statistic: Option<f64>,
    /// Whether the department entered numerator and denominator
    pub included: bool,
}

/// Aggregate score together with its per-department breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBreakdown {
    pub method: AggregationMethod,
    pub score: f64,
    pub total_weight: f64,
    pub departments: Vec<DepartmentContribution>,
}

/// Producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Encoded score report handed to sinks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub method: AggregationMethod,
    pub score: f64,
    /// Clamp range, present for the mean method only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<ScoreRange>,
    pub total_weight: f64,
    pub departments: Vec<DepartmentContribution>,
}
