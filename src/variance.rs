//! User-weighted variance aggregation
//!
//! Each department's population variance is weighted by its user count and
//! the organization score is the user-weighted average variance. The result
//! is not clamped.

use tracing::{debug, warn};

use crate::error::ComputeError;
use crate::stats::{first_non_finite, variance};
use crate::types::{AggregateBreakdown, AggregationMethod, DepartmentContribution, DepartmentRecord};

/// Aggregator for the variance strategy
pub struct VarianceAggregator;

impl VarianceAggregator {
    /// Compute the user-weighted average variance.
    ///
    /// Accepts anything that iterates `(name, record)` pairs, such as
    /// `&HashMap<String, DepartmentRecord>` or `&BTreeMap<String, DepartmentRecord>`.
    /// Departments with no users or no scores are skipped. Returns exactly 0
    /// when no department contributes.
    pub fn aggregate<'a, I, K>(departments: I) -> Result<f64, ComputeError>
    where
        I: IntoIterator<Item = (&'a K, &'a DepartmentRecord)>,
        K: AsRef<str> + ?Sized + 'a,
    {
        Self::breakdown(departments).map(|b| b.score)
    }

    /// Compute the aggregate along with how each department contributed
    pub fn breakdown<'a, I, K>(departments: I) -> Result<AggregateBreakdown, ComputeError>
    where
        I: IntoIterator<Item = (&'a K, &'a DepartmentRecord)>,
        K: AsRef<str> + ?Sized + 'a,
    {
        let mut total_weighted_variance = 0.0;
        let mut total_users: u64 = 0;
        let mut contributions = Vec::new();

        for (name, record) in departments {
            let name: &str = name.as_ref();

            if record.user_count == 0 || record.threat_scores.is_empty() {
                debug!(
                    department = name,
                    user_count = record.user_count,
                    scores = record.threat_scores.len(),
                    "skipping department without users or scores"
                );
                contributions.push(DepartmentContribution {
                    name: name.to_string(),
                    weight: f64::from(record.user_count),
                    statistic: None,
                    included: false,
                });
                continue;
            }

            if let Some(index) = first_non_finite(&record.threat_scores) {
                return Err(ComputeError::NonFiniteScore {
                    department: name.to_string(),
                    index,
                });
            }

            if record.threat_scores.len() != record.user_count as usize {
                warn!(
                    department = name,
                    user_count = record.user_count,
                    scores = record.threat_scores.len(),
                    "user count does not match number of threat scores"
                );
            }

            let department_variance = variance(&record.threat_scores);
            if !department_variance.is_finite() {
                return Err(ComputeError::NonFiniteResult(format!(
                    "variance for department {}",
                    name
                )));
            }
            total_weighted_variance += department_variance * f64::from(record.user_count);
            total_users += u64::from(record.user_count);

            contributions.push(DepartmentContribution {
                name: name.to_string(),
                weight: f64::from(record.user_count),
                statistic: Some(department_variance),
                included: true,
            });
        }

        let score = if total_users > 0 {
            total_weighted_variance / total_users as f64
        } else {
            0.0
        };

        if !score.is_finite() {
            return Err(ComputeError::NonFiniteResult("weighted variance".to_string()));
        }

        debug!(score, total_users, "variance aggregate computed");

        Ok(AggregateBreakdown {
            method: AggregationMethod::Variance,
            score,
            total_weight: total_users as f64,
            departments: contributions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    fn org(entries: &[(&str, u32, Vec<f64>)]) -> BTreeMap<String, DepartmentRecord> {
        entries
            .iter()
            .map(|(name, users, scores)| {
                (name.to_string(), DepartmentRecord::new(*users, scores.clone()))
            })
            .collect()
    }

    fn repeat(value: f64, n: usize) -> Vec<f64> {
        vec![value; n]
    }

    #[test]
    fn test_similar_threats_have_zero_variance() {
        let data = org(&[
            ("Engineering", 10, repeat(50.0, 10)),
            ("Marketing", 15, repeat(50.0, 15)),
            ("Finance", 20, repeat(50.0, 20)),
            ("HR", 5, repeat(50.0, 5)),
            ("Science", 25, repeat(50.0, 25)),
        ]);

        assert_eq!(VarianceAggregator::aggregate(&data).unwrap(), 0.0);
    }

    #[test]
    fn test_high_threat_user_dominates() {
        let mut engineering = repeat(10.0, 9);
        engineering.push(90.0);
        let data = org(&[
            ("Engineering", 10, engineering),
            ("Marketing", 15, repeat(30.0, 15)),
            ("Finance", 20, repeat(40.0, 20)),
            ("HR", 5, repeat(20.0, 5)),
            ("Science", 25, repeat(50.0, 25)),
        ]);

        // Only Engineering has spread: variance 576 weighted by 10 of 75 users
        let score = VarianceAggregator::aggregate(&data).unwrap();
        assert!((score - 76.8).abs() < 0.01);
    }

    #[test]
    fn test_empty_data() {
        let data: BTreeMap<String, DepartmentRecord> = BTreeMap::new();
        assert_eq!(VarianceAggregator::aggregate(&data).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_user_department_is_skipped() {
        let data = org(&[
            ("Engineering", 0, vec![]),
            ("Marketing", 10, repeat(30.0, 10)),
        ]);

        let breakdown = VarianceAggregator::breakdown(&data).unwrap();
        assert_eq!(breakdown.score, 0.0);
        assert_eq!(breakdown.total_weight, 10.0);
        assert!(!breakdown.departments[0].included);
        assert_eq!(breakdown.departments[0].statistic, None);
    }

    #[test]
    fn test_only_skipped_departments_yield_zero() {
        let data = org(&[
            ("Engineering", 0, vec![12.0, 80.0]),
            ("Marketing", 8, vec![]),
        ]);

        let breakdown = VarianceAggregator::breakdown(&data).unwrap();
        assert_eq!(breakdown.score, 0.0);
        assert_eq!(breakdown.total_weight, 0.0);
        assert!(breakdown.departments.iter().all(|d| !d.included));
    }

    #[test]
    fn test_reordering_does_not_change_result() {
        let entries = vec![
            ("A".to_string(), DepartmentRecord::new(3, vec![1.0, 5.0, 9.0])),
            ("B".to_string(), DepartmentRecord::new(2, vec![40.0, 60.0])),
            ("C".to_string(), DepartmentRecord::new(4, vec![0.0, 0.0, 10.0, 30.0])),
        ];

        let forward = VarianceAggregator::aggregate(entries.iter().map(|(k, v)| (k, v))).unwrap();
        let backward =
            VarianceAggregator::aggregate(entries.iter().rev().map(|(k, v)| (k, v))).unwrap();
        let hashed: HashMap<String, DepartmentRecord> = entries.iter().cloned().collect();
        let from_map = VarianceAggregator::aggregate(&hashed).unwrap();

        assert!((forward - backward).abs() < 1e-9);
        assert!((forward - from_map).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_score_rejected() {
        let data = org(&[("Finance", 2, vec![10.0, f64::NAN])]);

        let err = VarianceAggregator::aggregate(&data).unwrap_err();
        assert!(matches!(
            err,
            ComputeError::NonFiniteScore { ref department, index: 1 } if department == "Finance"
        ));
    }

    #[test]
    fn test_identical_large_scores_have_zero_variance() {
        let data = org(&[
            ("A", 2, vec![1e308, 1e308]),
            ("B", 3, vec![-1e308; 3]),
        ]);

        assert_eq!(VarianceAggregator::aggregate(&data).unwrap(), 0.0);
    }

    #[test]
    fn test_overflowing_variance_is_an_error() {
        let data = org(&[("A", 2, vec![-1e308, 1e308])]);

        assert!(matches!(
            VarianceAggregator::aggregate(&data).unwrap_err(),
            ComputeError::NonFiniteResult(_)
        ));
    }

    #[test]
    fn test_mismatched_user_count_still_weights_by_user_count() {
        // variance of [0, 10] is 25, weighted by the declared 4 users
        let data = org(&[
            ("A", 4, vec![0.0, 10.0]),
            ("B", 1, vec![5.0]),
        ]);

        let score = VarianceAggregator::aggregate(&data).unwrap();
        assert!((score - 100.0 / 5.0).abs() < 1e-9);
    }
}
