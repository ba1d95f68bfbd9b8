//! threatscore - Organization-wide threat score aggregation
//!
//! threatscore turns per-department threat telemetry into a single score
//! through one of two deterministic strategies:
//!
//! - **Variance**: user-weighted average of each department's population
//!   variance (unclamped)
//! - **Mean**: importance-weighted average of each department's mean score,
//!   clamped to a fixed range (0-90 by default)
//!
//! Both engines are pure functions over borrowed input. Departments with no
//! weight or no scores are skipped, and an organization with no contributing
//! department scores exactly 0.

pub mod config;
pub mod encoder;
pub mod error;
pub mod generator;
pub mod mean;
pub mod pipeline;
pub mod records;
pub mod stats;
pub mod types;
pub mod variance;

pub use config::EngineConfig;
pub use error::ComputeError;
pub use mean::MeanAggregator;
pub use pipeline::{mean_score_from_json, variance_score_from_json, ScoreProcessor};
pub use types::{DepartmentRecord, ScoreRange, WeightedDepartment};
pub use variance::VarianceAggregator;

// Test-data generation
pub use generator::ThreatScoreGenerator;

/// threatscore version embedded in all reports
pub const THREATSCORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "threatscore";
