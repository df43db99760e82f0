//! Solution quality metrics of a global pose graph
//!
//! Evaluation failures never escape this module's `compute_*` functions: they are reported
//! through `tracing` and replaced by a zero total error or an omitted loop closure.

use tracing::error;

use crate::core::evaluator::ResidualEvaluator;
use crate::core::graph::{Factor, FactorGraph, Values};
use crate::core::key::PoseKey;
use crate::error::DiagnosticsResult;

/// Between factor linking poses of two different robots, with its residual error
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterRobotLoopClosure {
    pub key1: PoseKey,
    pub key2: PoseKey,
    pub error: f64,
}

/// Total graph error, or the evaluator's failure
pub fn try_compute_total_error<E: ResidualEvaluator + ?Sized>(
    evaluator: &E,
    graph: &FactorGraph,
    values: &Values,
) -> DiagnosticsResult<f64> {
    evaluator.graph_error(graph, values)
}

/// Total graph error; 0.0 when the evaluator fails
pub fn compute_total_error<E: ResidualEvaluator + ?Sized>(
    evaluator: &E,
    graph: &FactorGraph,
    values: &Values,
) -> f64 {
    match try_compute_total_error(evaluator, graph, values) {
        Ok(error) => error,
        Err(e) => {
            error!("Logging: Error while computing graph error: {e}");
            0.0
        }
    }
}

/// Inter-robot loop closures of the graph, in graph edge order.
///
/// Only between factors whose endpoints decode to different robots and are both present in
/// `values` are evaluated. An empty assignment yields no closures without touching the graph.
pub fn compute_inter_robot_loop_closures<E: ResidualEvaluator + ?Sized>(
    evaluator: &E,
    graph: &FactorGraph,
    values: &Values,
) -> Vec<InterRobotLoopClosure> {
    let mut closures = Vec::new();
    if values.is_empty() {
        return closures;
    }

    for factor in graph {
        let Factor::Between(between) = factor else {
            continue;
        };
        if !between.is_inter_robot() {
            continue;
        }
        if !(values.exists(between.key1) && values.exists(between.key2)) {
            continue;
        }
        let key1 = PoseKey::decode(between.key1);
        let key2 = PoseKey::decode(between.key2);
        match evaluator.factor_error(factor, values) {
            Ok(error) => closures.push(InterRobotLoopClosure { key1, key2, error }),
            Err(e) => error!(
                "Logging: Error while computing inter-robot loop closure error {key1} -> {key2}: {e}"
            ),
        }
    }
    closures
}
