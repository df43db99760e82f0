pub mod config;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod io;
pub mod logger;
pub mod run_logger;
pub mod stats;
pub mod timer;

pub use config::LoggerConfig;
pub use crate::core::{
    BetweenFactor, Factor, FactorGraph, Key, PoseGraphSnapshot, PoseKey, PriorFactor,
    ResidualEvaluator, Se3Evaluator, Values,
};
pub use diagnostics::{
    InterRobotLoopClosure, compute_inter_robot_loop_closures, compute_total_error,
    try_compute_total_error,
};
pub use error::{DiagnosticsError, DiagnosticsResult};
pub use logger::{init_logger, init_logger_with_level};
pub use run_logger::RunLogger;
pub use stats::{AggregateTotals, GpsSample, PoseGraphSummary, StatisticsAccumulator};
pub use timer::OptimizationTimer;
