//! Core pose graph components for the diagnostics library
//!
//! This module contains the building blocks the diagnostics are computed from:
//! - Composite pose variable keys and their decoding
//! - Factor graphs, variable assignments and snapshots
//! - The residual evaluation capability

pub mod evaluator;
pub mod graph;
pub mod key;

pub use evaluator::{ResidualEvaluator, Se3Evaluator};
pub use graph::{BetweenFactor, Factor, FactorGraph, PoseGraphSnapshot, PriorFactor, Values};
pub use key::{Key, PoseKey};
