//! Residual evaluation capability
//!
//! The diagnostics code never assumes a particular nonlinear least squares backend; it asks
//! a [`ResidualEvaluator`] for the error of a whole graph or of a single constraint. The
//! default [`Se3Evaluator`] evaluates SE(3) between and prior factors directly with nalgebra.
//!
//! Factor error follows the usual convention
//!
//! ```text
//! e = 0.5 * rᵀ Ω r,    r = [ t(E) ; log(R(E)) ]
//! ```
//!
//! where `E = Z⁻¹ (Xᵢ⁻¹ Xⱼ)` for a between factor with measurement `Z`, and `E = Z⁻¹ X` for a
//! prior.

use nalgebra::{Isometry3, Matrix6, Vector6};

use crate::core::graph::{Factor, FactorGraph, Values};
use crate::core::key::{Key, PoseKey};
use crate::error::{DiagnosticsError, DiagnosticsResult};

/// Evaluates residual errors of a factor graph against a variable assignment
pub trait ResidualEvaluator {
    /// Total error of the graph: sum of every factor's error
    fn graph_error(&self, graph: &FactorGraph, values: &Values) -> DiagnosticsResult<f64> {
        let mut total = 0.0;
        for factor in graph {
            total += self.factor_error(factor, values)?;
        }
        Ok(total)
    }

    /// Error of a single factor
    fn factor_error(&self, factor: &Factor, values: &Values) -> DiagnosticsResult<f64>;
}

/// Direct SE(3) pose graph evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct Se3Evaluator;

impl Se3Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// 6-vector residual of the error transform, translation first
    pub fn residual(error_transform: &Isometry3<f64>) -> Vector6<f64> {
        let t = error_transform.translation.vector;
        let w = error_transform.rotation.scaled_axis();
        Vector6::new(t.x, t.y, t.z, w.x, w.y, w.z)
    }

    fn weighted_error(
        error_transform: &Isometry3<f64>,
        information: &Matrix6<f64>,
    ) -> DiagnosticsResult<f64> {
        let r = Self::residual(error_transform);
        let error = 0.5 * r.dot(&(information * r));
        if error.is_finite() {
            Ok(error)
        } else {
            Err(DiagnosticsError::Evaluation(format!(
                "non-finite factor error {error}"
            )))
        }
    }

    fn lookup(values: &Values, key: Key) -> DiagnosticsResult<&Isometry3<f64>> {
        values.get(key).ok_or_else(|| {
            DiagnosticsError::Evaluation(format!(
                "variable {} is missing from the assignment",
                PoseKey::decode(key)
            ))
        })
    }
}

impl ResidualEvaluator for Se3Evaluator {
    fn factor_error(&self, factor: &Factor, values: &Values) -> DiagnosticsResult<f64> {
        match factor {
            Factor::Between(f) => {
                let x1 = Self::lookup(values, f.key1)?;
                let x2 = Self::lookup(values, f.key2)?;
                let error_transform = f.measured.inverse() * (x1.inverse() * x2);
                Self::weighted_error(&error_transform, &f.information)
            }
            Factor::Prior(f) => {
                let x = Self::lookup(values, f.key)?;
                let error_transform = f.prior.inverse() * x;
                Self::weighted_error(&error_transform, &f.information)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::{BetweenFactor, PriorFactor};
    use crate::core::key::pose_key;
    use nalgebra::{Isometry3, Vector3};

    fn translation(x: f64, y: f64, z: f64) -> Isometry3<f64> {
        Isometry3::translation(x, y, z)
    }

    #[test]
    fn test_consistent_between_factor_has_zero_error() {
        let a = pose_key(0, 0);
        let b = pose_key(0, 1);
        let factor: Factor =
            BetweenFactor::new(a, b, translation(1.0, 0.0, 0.0), Matrix6::identity()).into();
        let values: Values = [(a, translation(0.0, 0.0, 0.0)), (b, translation(1.0, 0.0, 0.0))]
            .into_iter()
            .collect();

        let error = Se3Evaluator.factor_error(&factor, &values).unwrap();
        assert!(error.abs() < 1e-12);
    }

    #[test]
    fn test_translation_offset_error() {
        let a = pose_key(0, 0);
        let b = pose_key(1, 0);
        let factor: Factor =
            BetweenFactor::new(a, b, translation(1.0, 0.0, 0.0), Matrix6::identity()).into();
        let values: Values = [(a, translation(0.0, 0.0, 0.0)), (b, translation(3.0, 0.0, 0.0))]
            .into_iter()
            .collect();

        // residual = [2, 0, 0, 0, 0, 0] -> 0.5 * 4
        let error = Se3Evaluator.factor_error(&factor, &values).unwrap();
        assert!((error - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_offset_error() {
        let a = pose_key(0, 0);
        let factor: Factor =
            PriorFactor::new(a, Isometry3::identity(), Matrix6::identity() * 2.0).into();
        let rotated = Isometry3::new(Vector3::zeros(), Vector3::new(0.0, 0.0, 0.5));
        let values: Values = [(a, rotated)].into_iter().collect();

        // 0.5 * 2 * 0.5^2
        let error = Se3Evaluator.factor_error(&factor, &values).unwrap();
        assert!((error - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_missing_variable_is_evaluation_error() {
        let factor: Factor = BetweenFactor::new(
            pose_key(0, 0),
            pose_key(0, 1),
            Isometry3::identity(),
            Matrix6::identity(),
        )
        .into();
        let values: Values = [(pose_key(0, 0), Isometry3::identity())]
            .into_iter()
            .collect();

        let result = Se3Evaluator.factor_error(&factor, &values);
        assert!(matches!(result, Err(DiagnosticsError::Evaluation(_))));
    }

    #[test]
    fn test_graph_error_sums_factors() {
        let a = pose_key(0, 0);
        let b = pose_key(0, 1);
        let mut graph = FactorGraph::new();
        graph.add(PriorFactor::new(a, translation(1.0, 0.0, 0.0), Matrix6::identity()));
        graph.add(BetweenFactor::new(a, b, translation(0.0, 2.0, 0.0), Matrix6::identity()));
        let values: Values = [(a, Isometry3::identity()), (b, Isometry3::identity())]
            .into_iter()
            .collect();

        // prior: 0.5 * 1, between: 0.5 * 4
        let error = Se3Evaluator.graph_error(&graph, &values).unwrap();
        assert!((error - 2.5).abs() < 1e-12);
    }
}
