//! Synthetic threat data generation
//!
//! Test-fixture and demo data only; none of this is used by the aggregation
//! engines. Scores are bounded-range integers sampled uniformly around a
//! mean, matching how department telemetry is simulated upstream.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::GeneratorConfig;
use crate::error::ComputeError;
use crate::records::UserThreatRecord;
use crate::types::{DepartmentRecord, WeightedDepartment};

/// Departments used for synthetic organizations
pub const STANDARD_DEPARTMENTS: [&str; 5] = ["Engineering", "Marketing", "Finance", "HR", "Science"];

/// Exclusive upper bound for generated department scores
pub const DEFAULT_SCORE_CEILING: i64 = 90;

/// (mean, spread, importance) per standard department for the mean engine
const WEIGHTED_PROFILES: [(i64, i64, f64); 5] = [
    (50, 10, 3.0),
    (40, 15, 2.0),
    (60, 20, 5.0),
    (30, 5, 4.0),
    (55, 10, 1.0),
];

const WEIGHTED_SAMPLES: usize = 50;

/// Random generator for department and user-level threat data
pub struct ThreatScoreGenerator {
    rng: StdRng,
    ceiling: i64,
}

impl Default for ThreatScoreGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreatScoreGenerator {
    /// Create a generator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            ceiling: DEFAULT_SCORE_CEILING,
        }
    }

    /// Create a reproducible generator
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ceiling: DEFAULT_SCORE_CEILING,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        let generator = match config.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };
        generator.with_ceiling(config.ceiling)
    }

    /// Override the exclusive score ceiling
    pub fn with_ceiling(mut self, ceiling: i64) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Sample `count` integer scores from
    /// `[max(mean - spread, 0), min(mean + spread + 1, ceiling))`.
    pub fn generate_scores(
        &mut self,
        mean: i64,
        spread: i64,
        count: usize,
    ) -> Result<Vec<f64>, ComputeError> {
        let low = mean.saturating_sub(spread).max(0);
        let high = mean.saturating_add(spread).saturating_add(1).min(self.ceiling);

        if low >= high {
            return Err(ComputeError::InvalidGeneratorBounds { low, high });
        }

        Ok((0..count)
            .map(|_| self.rng.gen_range(low..high) as f64)
            .collect())
    }

    /// Organization for the variance engine: each standard department gets
    /// 10-199 users with scores around 45 +/- 20.
    pub fn random_departments(&mut self) -> Result<BTreeMap<String, DepartmentRecord>, ComputeError> {
        let mut departments = BTreeMap::new();

        for name in STANDARD_DEPARTMENTS {
            let user_count: u32 = self.rng.gen_range(10..200);
            let threat_scores = self.generate_scores(45, 20, user_count as usize)?;
            departments.insert(
                name.to_string(),
                DepartmentRecord::new(user_count, threat_scores),
            );
        }

        Ok(departments)
    }

    /// Organization for the mean engine with fixed per-department profiles
    pub fn random_weighted_departments(&mut self) -> Result<Vec<WeightedDepartment>, ComputeError> {
        STANDARD_DEPARTMENTS
            .iter()
            .zip(WEIGHTED_PROFILES)
            .map(|(name, (mean, spread, importance))| {
                let scores = self.generate_scores(mean, spread, WEIGHTED_SAMPLES)?;
                Ok(WeightedDepartment::new(*name, scores, importance))
            })
            .collect()
    }

    /// User-level records as they would come out of a tabular export, with
    /// scores uniform on 0-100 rounded to two decimals.
    pub fn random_user_records(&mut self, count: usize) -> Vec<UserThreatRecord> {
        (1..=count)
            .map(|n| {
                let department = STANDARD_DEPARTMENTS
                    .choose(&mut self.rng)
                    .copied()
                    .unwrap_or(STANDARD_DEPARTMENTS[0]);
                let score: f64 = self.rng.gen_range(0.0..=100.0);
                UserThreatRecord {
                    user_id: format!("user_{}", n),
                    department: department.to_string(),
                    threat_score: (score * 100.0).round() / 100.0,
                }
            })
            .collect()
    }
}
