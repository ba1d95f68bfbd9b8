//! Importance-weighted mean aggregation
//!
//! Each department's mean threat score is weighted by its importance. The
//! weighted sum is normalized by total importance and clamped into the
//! configured score range (0-90 by default).

use tracing::debug;

use crate::error::ComputeError;
use crate::stats::{first_non_finite, mean_or_zero};
use crate::types::{
    AggregateBreakdown, AggregationMethod, DepartmentContribution, ScoreRange, WeightedDepartment,
};

/// Aggregator for the importance-weighted mean strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAggregator {
    range: ScoreRange,
}

impl MeanAggregator {
    /// Create an aggregator clamping to the default 0-90 range
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aggregator clamping to a custom range
    pub fn with_range(range: ScoreRange) -> Result<Self, ComputeError> {
        range.validate()?;
        Ok(Self { range })
    }

    pub fn range(&self) -> ScoreRange {
        self.range
    }

    /// Compute the clamped importance-weighted mean.
    ///
    /// Departments with zero importance or no scores are skipped. Returns
    /// exactly 0 when no department contributes.
    pub fn aggregate(&self, departments: &[WeightedDepartment]) -> Result<f64, ComputeError> {
        self.breakdown(departments).map(|b| b.score)
    }

    /// Compute the aggregate along with how each department contributed
    pub fn breakdown(
        &self,
        departments: &[WeightedDepartment],
    ) -> Result<AggregateBreakdown, ComputeError> {
        for department in departments {
            validate_importance(department)?;
        }

        // Weights are taken relative to the largest importance so the
        // weighted sum cannot overflow on huge importances.
        let scale = departments
            .iter()
            .map(|d| d.importance)
            .fold(0.0, f64::max);

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        let mut total_importance = 0.0;
        let mut contributions = Vec::with_capacity(departments.len());

        for department in departments {
            if department.importance == 0.0 || department.threat_scores.is_empty() {
                debug!(
                    department = %department.name,
                    importance = department.importance,
                    scores = department.threat_scores.len(),
                    "skipping department without importance or scores"
                );
                contributions.push(DepartmentContribution {
                    name: department.name.clone(),
                    weight: department.importance,
                    statistic: None,
                    included: false,
                });
                continue;
            }

            if let Some(index) = first_non_finite(&department.threat_scores) {
                return Err(ComputeError::NonFiniteScore {
                    department: department.name.clone(),
                    index,
                });
            }

            let department_mean = mean_or_zero(&department.threat_scores);
            if !department_mean.is_finite() {
                return Err(ComputeError::NonFiniteResult(format!(
                    "mean for department {}",
                    department.name
                )));
            }

            let weight = department.importance / scale;
            weighted_sum += department_mean * weight;
            total_weight += weight;
            total_importance += department.importance;

            contributions.push(DepartmentContribution {
                name: department.name.clone(),
                weight: department.importance,
                statistic: Some(department_mean),
                included: true,
            });
        }

        let score = if total_weight > 0.0 {
            let unclamped = weighted_sum / total_weight;
            if !unclamped.is_finite() {
                return Err(ComputeError::NonFiniteResult("weighted mean".to_string()));
            }
            self.range.clamp(unclamped)
        } else {
            0.0
        };

        debug!(score, total_importance, "mean aggregate computed");

        Ok(AggregateBreakdown {
            method: AggregationMethod::Mean,
            score,
            total_weight: total_importance,
            departments: contributions,
        })
    }
}

fn validate_importance(department: &WeightedDepartment) -> Result<(), ComputeError> {
    if !department.importance.is_finite() {
        return Err(ComputeError::NonFiniteWeight {
            department: department.name.clone(),
        });
    }
    if department.importance < 0.0 {
        return Err(ComputeError::NegativeWeight {
            department: department.name.clone(),
            weight: department.importance,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dept(name: &str, scores: &[f64], importance: f64) -> WeightedDepartment {
        WeightedDepartment::new(name, scores.to_vec(), importance)
    }

    #[test]
    fn test_calculate_aggregated_threat_score() {
        let departments = vec![
            dept("Dept1", &[10.0, 20.0, 30.0], 1.0),
            dept("Dept2", &[40.0, 50.0, 60.0], 2.0),
        ];

        let result = MeanAggregator::new().aggregate(&departments).unwrap();
        assert!((result - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregated_score_empty_data() {
        let departments = vec![
            dept("Dept1", &[], 1.0),
            dept("Dept2", &[40.0, 50.0, 60.0], 2.0),
        ];

        let breakdown = MeanAggregator::new().breakdown(&departments).unwrap();
        assert!((breakdown.score - 50.0).abs() < 1e-9);
        assert_eq!(breakdown.total_weight, 2.0);
        assert!(!breakdown.departments[0].included);
    }

    #[test]
    fn test_aggregated_score_zero_importance() {
        let departments = vec![
            dept("Dept1", &[10.0, 20.0, 30.0], 0.0),
            dept("Dept2", &[40.0, 50.0, 60.0], 2.0),
        ];

        let result = MeanAggregator::new().aggregate(&departments).unwrap();
        assert!((result - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_zero_importance_returns_zero() {
        let departments = vec![
            dept("Dept1", &[10.0, 20.0, 30.0], 0.0),
            dept("Dept2", &[80.0], 0.0),
        ];

        assert_eq!(MeanAggregator::new().aggregate(&departments).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_input_returns_zero() {
        assert_eq!(MeanAggregator::new().aggregate(&[]).unwrap(), 0.0);
    }

    #[test]
    fn test_equal_importance() {
        let departments: Vec<_> = ["Engineering", "Marketing", "Finance", "HR", "Science"]
            .iter()
            .map(|name| dept(name, &[50.0, 60.0, 70.0], 3.0))
            .collect();

        let result = MeanAggregator::new().aggregate(&departments).unwrap();
        assert!((result - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_important_departments() {
        let departments = vec![
            dept("Engineering", &[50.0, 60.0, 70.0], 1.0),
            dept("Marketing", &[50.0, 60.0, 70.0], 1.0),
            dept("Finance", &[80.0, 90.0, 70.0], 5.0),
            dept("HR", &[70.0, 80.0, 90.0], 4.0),
            dept("Science", &[30.0, 40.0, 50.0], 1.0),
        ];

        let expected = (80.0 * 5.0 + 80.0 * 4.0 + 60.0 + 60.0 + 40.0) / 12.0;
        let result = MeanAggregator::new().aggregate(&departments).unwrap();
        assert!((result - expected).abs() < 1e-9);
    }

    #[test]
    fn test_result_clamped_to_upper_bound() {
        let departments = vec![dept("Red Team", &[150.0, 150.0], 1.0)];

        assert_eq!(MeanAggregator::new().aggregate(&departments).unwrap(), 90.0);
    }

    #[test]
    fn test_result_clamped_to_lower_bound() {
        let departments = vec![dept("Odd", &[-20.0, -40.0], 2.0)];

        assert_eq!(MeanAggregator::new().aggregate(&departments).unwrap(), 0.0);
    }

    #[test]
    fn test_custom_range() {
        let aggregator = MeanAggregator::with_range(ScoreRange::PERCENT).unwrap();
        let departments = vec![dept("Finance", &[95.0, 97.0], 1.0)];

        assert!((aggregator.aggregate(&departments).unwrap() - 96.0).abs() < 1e-9);
        assert!(MeanAggregator::with_range(ScoreRange { min: 5.0, max: 1.0 }).is_err());
    }

    #[test]
    fn test_negative_importance_rejected() {
        let departments = vec![dept("HR", &[10.0], -1.0)];

        let err = MeanAggregator::new().aggregate(&departments).unwrap_err();
        assert!(matches!(err, ComputeError::NegativeWeight { .. }));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let nan_weight = vec![dept("HR", &[10.0], f64::NAN)];
        assert!(matches!(
            MeanAggregator::new().aggregate(&nan_weight).unwrap_err(),
            ComputeError::NonFiniteWeight { .. }
        ));

        let inf_score = vec![dept("HR", &[10.0, f64::INFINITY], 1.0)];
        assert!(matches!(
            MeanAggregator::new().aggregate(&inf_score).unwrap_err(),
            ComputeError::NonFiniteScore { index: 1, .. }
        ));
    }

    #[test]
    fn test_opposite_extreme_departments_cancel() {
        let departments = vec![
            dept("A", &[1e308, 1e308], 1.0),
            dept("B", &[-1e308, -1e308], 1.0),
        ];

        assert_eq!(MeanAggregator::new().aggregate(&departments).unwrap(), 0.0);
    }

    #[test]
    fn test_huge_importance_does_not_overflow() {
        let single = vec![dept("A", &[10.0], 1e308)];
        assert!((MeanAggregator::new().aggregate(&single).unwrap() - 10.0).abs() < 1e-9);

        let pair = vec![dept("A", &[10.0], 1e308), dept("B", &[40.0], 1e308)];
        assert!((MeanAggregator::new().aggregate(&pair).unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_overflowing_weighted_mean_is_an_error() {
        // three maximal means sum past f64::MAX before normalization
        let departments = vec![
            dept("A", &[f64::MAX], 1.0),
            dept("B", &[f64::MAX], 1.0),
            dept("C", &[f64::MAX], 1.0),
        ];

        assert!(matches!(
            MeanAggregator::new().aggregate(&departments).unwrap_err(),
            ComputeError::NonFiniteResult(_)
        ));
    }

    #[test]
    fn test_non_finite_department_mean_is_an_error() {
        let departments = vec![dept("A", &[-1e308, 1e308], 1.0)];

        assert!(matches!(
            MeanAggregator::new().aggregate(&departments).unwrap_err(),
            ComputeError::NonFiniteResult(_)
        ));
    }

    #[test]
    fn test_result_within_range_for_extreme_inputs() {
        let range = ScoreRange::DEFAULT;
        let cases = vec![
            vec![dept("A", &[1e9], 1e-6), dept("B", &[-1e9], 1e6)],
            vec![dept("A", &[89.9, 90.1], 1e12)],
            vec![dept("A", &[0.0], 0.5), dept("B", &[1e300], 0.5)],
        ];

        for departments in cases {
            let score = MeanAggregator::new().aggregate(&departments).unwrap();
            assert!(range.contains(score), "score {} escaped range", score);
        }
    }
}
