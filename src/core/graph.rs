use nalgebra::{Isometry3, Matrix6};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::key::{Key, PoseKey};

/// Variable assignment: pose estimate per raw key, iterated in key order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    poses: BTreeMap<Key, Isometry3<f64>>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the estimate for `key`
    pub fn insert(&mut self, key: Key, pose: Isometry3<f64>) -> Option<Isometry3<f64>> {
        self.poses.insert(key, pose)
    }

    pub fn get(&self, key: Key) -> Option<&Isometry3<f64>> {
        self.poses.get(&key)
    }

    pub fn exists(&self, key: Key) -> bool {
        self.poses.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Key, &Isometry3<f64>)> {
        self.poses.iter().map(|(k, v)| (*k, v))
    }
}

impl FromIterator<(Key, Isometry3<f64>)> for Values {
    fn from_iter<I: IntoIterator<Item = (Key, Isometry3<f64>)>>(iter: I) -> Self {
        Self {
            poses: iter.into_iter().collect(),
        }
    }
}

/// Binary relative-pose constraint between two pose variables
#[derive(Debug, Clone, PartialEq)]
pub struct BetweenFactor {
    pub key1: Key,
    pub key2: Key,
    /// Measured transform from `key1` to `key2`
    pub measured: Isometry3<f64>,
    /// 6x6 information matrix, translation block first
    pub information: Matrix6<f64>,
}

impl BetweenFactor {
    pub fn new(key1: Key, key2: Key, measured: Isometry3<f64>, information: Matrix6<f64>) -> Self {
        Self {
            key1,
            key2,
            measured,
            information,
        }
    }

    /// True when the two endpoints belong to different robots
    pub fn is_inter_robot(&self) -> bool {
        PoseKey::decode(self.key1).robot_id != PoseKey::decode(self.key2).robot_id
    }
}

/// Unary absolute-pose constraint
#[derive(Debug, Clone, PartialEq)]
pub struct PriorFactor {
    pub key: Key,
    pub prior: Isometry3<f64>,
    pub information: Matrix6<f64>,
}

impl PriorFactor {
    pub fn new(key: Key, prior: Isometry3<f64>, information: Matrix6<f64>) -> Self {
        Self {
            key,
            prior,
            information,
        }
    }
}

/// Constraint kinds a global pose graph may carry
#[derive(Debug, Clone, PartialEq)]
pub enum Factor {
    Between(BetweenFactor),
    Prior(PriorFactor),
}

impl Factor {
    pub fn as_between(&self) -> Option<&BetweenFactor> {
        match self {
            Factor::Between(f) => Some(f),
            Factor::Prior(_) => None,
        }
    }
}

impl From<BetweenFactor> for Factor {
    fn from(factor: BetweenFactor) -> Self {
        Factor::Between(factor)
    }
}

impl From<PriorFactor> for Factor {
    fn from(factor: PriorFactor) -> Self {
        Factor::Prior(factor)
    }
}

/// Ordered list of constraints; iteration order is insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactorGraph {
    factors: Vec<Factor>,
}

impl FactorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, factor: impl Into<Factor>) {
        self.factors.push(factor.into());
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Factor> {
        self.factors.iter()
    }

    /// Binary constraints only, in graph order
    pub fn between_factors(&self) -> impl Iterator<Item = &BetweenFactor> {
        self.factors.iter().filter_map(Factor::as_between)
    }
}

impl<'a> IntoIterator for &'a FactorGraph {
    type Item = &'a Factor;
    type IntoIter = std::slice::Iter<'a, Factor>;

    fn into_iter(self) -> Self::IntoIter {
        self.factors.iter()
    }
}

/// A factor graph paired with the assignment it was solved (or initialized) with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseGraphSnapshot {
    pub graph: FactorGraph,
    pub values: Values,
}

impl PoseGraphSnapshot {
    pub fn new(graph: FactorGraph, values: Values) -> Self {
        Self { graph, values }
    }

    pub fn edge_count(&self) -> usize {
        self.graph.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.values.len()
    }

    /// A snapshot without values has nothing worth exporting
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for PoseGraphSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PoseGraphSnapshot [ vertices: {}, edges: {} (between: {}) ]",
            self.vertex_count(),
            self.edge_count(),
            self.graph.between_factors().count()
        )
    }
}
