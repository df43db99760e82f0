//! Per-robot pose graph summaries and their run-level reduction

use serde::{Deserialize, Serialize};

/// Geodetic fix attached to a pose vertex
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GpsSample {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Summary a robot's front end reports about its local pose graph for one epoch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseGraphSummary {
    pub robot_id: u32,
    /// Successful inter-robot match attempts
    pub nb_matches: u32,
    pub nb_failed_matches: u32,
    /// Pose vertices sent to other robots
    pub nb_vertices_transmitted: u32,
    pub front_end_cumulative_communication_bytes: u64,
    /// Seconds spent on sparsification
    pub sparsification_cumulative_computation_time: f64,
    /// (vertex index, fix) pairs in the order they were recorded
    #[serde(default)]
    pub gps: Vec<(u32, GpsSample)>,
}

impl PoseGraphSummary {
    pub fn has_gps(&self) -> bool {
        !self.gps.is_empty()
    }
}

/// Run-level totals over every summary of an epoch
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AggregateTotals {
    pub total_nb_matches: u64,
    pub total_nb_failed_matches: u64,
    pub total_nb_vertices_transmitted: u64,
    pub total_front_end_cumulative_communication_bytes: u64,
    pub total_sparsification_cumulative_computation_time: f64,
}

/// Collects summaries in arrival order until the epoch is flushed
#[derive(Debug, Clone, Default)]
pub struct StatisticsAccumulator {
    records: Vec<PoseGraphSummary>,
}

impl StatisticsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, record: PoseGraphSummary) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[PoseGraphSummary] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum every counter across the current records
    pub fn reduce(&self) -> AggregateTotals {
        self.records
            .iter()
            .fold(AggregateTotals::default(), |mut totals, r| {
                totals.total_nb_matches += u64::from(r.nb_matches);
                totals.total_nb_failed_matches += u64::from(r.nb_failed_matches);
                totals.total_nb_vertices_transmitted += u64::from(r.nb_vertices_transmitted);
                totals.total_front_end_cumulative_communication_bytes +=
                    r.front_end_cumulative_communication_bytes;
                totals.total_sparsification_cumulative_computation_time +=
                    r.sparsification_cumulative_computation_time;
                totals
            })
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
