//! Run-scoped diagnostics logger
//!
//! A [`RunLogger`] owns everything one robot's back end accumulates between two flushes:
//! front-end summaries, the initial and optimized global pose graphs, and the optimization
//! timer. [`RunLogger::write_logs`] persists the epoch under
//!
//! ```text
//! <log_folder>/<dd-mm-YYYY_HH-MM-SS>_experiment_robot_<id>/<dd-mm-YYYY_HH-MM-SS>/
//!     initial_global_pose_graph.g2o
//!     optimized_global_pose_graph.g2o
//!     log.csv
//!     gps_robot_<id>.csv
//! ```
//!
//! and resets the epoch. The logger takes no locks; callers on several threads must serialize
//! access themselves.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::LoggerConfig;
use crate::core::evaluator::{ResidualEvaluator, Se3Evaluator};
use crate::core::graph::PoseGraphSnapshot;
use crate::diagnostics::{compute_inter_robot_loop_closures, compute_total_error};
use crate::error::DiagnosticsResult;
use crate::io::g2o::G2oLoader;
use crate::io::tables::{GpsRow, write_gps_table, write_key_value_log};
use crate::io::{GRAPH_EXTENSION, GraphLoader, TABLE_EXTENSION};
use crate::stats::{PoseGraphSummary, StatisticsAccumulator};
use crate::timer::OptimizationTimer;

const TIMESTAMP_FORMAT: &str = "%d-%m-%Y_%H-%M-%S";

pub const INITIAL_GRAPH_FILE: &str = "initial_global_pose_graph";
pub const OPTIMIZED_GRAPH_FILE: &str = "optimized_global_pose_graph";
pub const LOG_FILE: &str = "log";
pub const GPS_FILE_PREFIX: &str = "gps_robot_";

fn local_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Diagnostics state of one robot for the lifetime of a run
pub struct RunLogger {
    config: LoggerConfig,
    experiment_folder: PathBuf,
    evaluator: Box<dyn ResidualEvaluator + Send>,
    statistics: StatisticsAccumulator,
    initial_global_pose_graph: Option<PoseGraphSnapshot>,
    optimized_global_pose_graph: Option<PoseGraphSnapshot>,
    origin_robot_id: u32,
    timer: OptimizationTimer,
}

impl RunLogger {
    /// Create a logger evaluating residuals with [`Se3Evaluator`]
    pub fn new(config: LoggerConfig) -> DiagnosticsResult<Self> {
        Self::with_evaluator(config, Box::new(Se3Evaluator::new()))
    }

    /// Create a logger with an injected residual evaluator.
    ///
    /// An invalid configuration is rejected. Failing to create the experiment folder is only
    /// reported: every flush retries the creation.
    pub fn with_evaluator(
        config: LoggerConfig,
        evaluator: Box<dyn ResidualEvaluator + Send>,
    ) -> DiagnosticsResult<Self> {
        config.validate()?;

        let experiment_id = format!(
            "{}_experiment_robot_{}",
            local_timestamp(),
            config.robot_id
        );
        let experiment_folder = config.log_folder.join(experiment_id);
        if config.enable_logs {
            if let Err(e) = std::fs::create_dir_all(&experiment_folder) {
                error!(
                    "Logging: Error while creating log folder {}: {e}",
                    experiment_folder.display()
                );
            }
        }

        Ok(Self {
            origin_robot_id: config.robot_id,
            config,
            experiment_folder,
            evaluator,
            statistics: StatisticsAccumulator::new(),
            initial_global_pose_graph: None,
            optimized_global_pose_graph: None,
            timer: OptimizationTimer::new(),
        })
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn experiment_folder(&self) -> &Path {
        &self.experiment_folder
    }

    /// Record a front-end summary for the current epoch
    pub fn add_pose_graph_log_info(&mut self, summary: PoseGraphSummary) {
        self.statistics.add_record(summary);
    }

    pub fn log_initial_global_pose_graph(&mut self, snapshot: PoseGraphSnapshot) {
        self.initial_global_pose_graph = Some(snapshot);
    }

    /// Record the optimized graph and the robot that computed it
    pub fn log_optimized_global_pose_graph(
        &mut self,
        snapshot: PoseGraphSnapshot,
        origin_robot_id: u32,
    ) {
        self.optimized_global_pose_graph = Some(snapshot);
        self.origin_robot_id = origin_robot_id;
    }

    pub fn start_timer(&mut self) {
        self.timer.start();
    }

    /// Stop the optimization timer; must follow [`RunLogger::start_timer`]
    pub fn stop_timer(&mut self) -> Duration {
        self.timer.stop()
    }

    pub fn latest_pgo_time(&self) -> Duration {
        self.timer.latest()
    }

    pub fn total_pgo_time(&self) -> Duration {
        self.timer.total()
    }

    pub fn pending_records(&self) -> &[PoseGraphSummary] {
        self.statistics.records()
    }

    pub fn has_initial_graph(&self) -> bool {
        self.initial_global_pose_graph.is_some()
    }

    pub fn has_optimized_graph(&self) -> bool {
        self.optimized_global_pose_graph.is_some()
    }

    /// Persist the epoch and reset its state.
    ///
    /// Every failure is reported and the remaining steps still run. Returns the epoch folder
    /// when it could be created.
    pub fn write_logs(&mut self) -> Option<PathBuf> {
        let result_folder = if self.config.enable_logs {
            self.write_epoch()
        } else {
            None
        };
        self.reset_epoch();
        result_folder
    }

    fn write_epoch(&self) -> Option<PathBuf> {
        let result_folder = self.experiment_folder.join(local_timestamp());
        if let Err(e) = std::fs::create_dir_all(&result_folder) {
            error!(
                "Logging: Error while creating result folder {}: {e}",
                result_folder.display()
            );
            return None;
        }
        debug!("Logging: writing epoch to {}", result_folder.display());

        self.write_graph(
            self.initial_global_pose_graph.as_ref(),
            &result_folder,
            INITIAL_GRAPH_FILE,
        );
        self.write_graph(
            self.optimized_global_pose_graph.as_ref(),
            &result_folder,
            OPTIMIZED_GRAPH_FILE,
        );

        let log_path = result_folder.join(format!("{LOG_FILE}.{TABLE_EXTENSION}"));
        if let Err(e) = write_key_value_log(&log_path, &self.log_rows()) {
            error!("Logging: Error while writing {}: {e}", log_path.display());
        }

        for (robot_id, rows) in self.gps_tables() {
            let gps_path =
                result_folder.join(format!("{GPS_FILE_PREFIX}{robot_id}.{TABLE_EXTENSION}"));
            if let Err(e) = write_gps_table(&gps_path, &rows) {
                error!("Logging: Error while writing {}: {e}", gps_path.display());
            }
        }

        info!(
            "Logging: wrote {} summaries to {}",
            self.statistics.len(),
            result_folder.display()
        );
        Some(result_folder)
    }

    fn write_graph(&self, snapshot: Option<&PoseGraphSnapshot>, folder: &Path, name: &str) {
        let Some(snapshot) = snapshot.filter(|s| !s.is_empty()) else {
            return;
        };
        let path = folder.join(format!("{name}.{GRAPH_EXTENSION}"));
        if let Err(e) = G2oLoader::write(snapshot, &path) {
            error!("Logging: Error while writing g2o files: {e}");
        }
    }

    /// Rows of the aggregate `log` table
    pub fn log_rows(&self) -> Vec<(&'static str, String)> {
        let totals = self.statistics.reduce();
        let (nb_edges, nb_vertices, total_error, closures) =
            match self.optimized_global_pose_graph.as_ref() {
                Some(snapshot) => (
                    snapshot.edge_count(),
                    snapshot.vertex_count(),
                    compute_total_error(
                        self.evaluator.as_ref(),
                        &snapshot.graph,
                        &snapshot.values,
                    ),
                    compute_inter_robot_loop_closures(
                        self.evaluator.as_ref(),
                        &snapshot.graph,
                        &snapshot.values,
                    ),
                ),
                None => (0, 0, 0.0, Vec::new()),
            };

        let mut rows = vec![
            ("robot_id", self.config.robot_id.to_string()),
            ("origin_robot_id", self.origin_robot_id.to_string()),
            ("nb_robots", self.config.nb_robots.to_string()),
            ("total_nb_matches", totals.total_nb_matches.to_string()),
            (
                "total_nb_failed_matches",
                totals.total_nb_failed_matches.to_string(),
            ),
            (
                "total_nb_vertices_transmitted",
                totals.total_nb_vertices_transmitted.to_string(),
            ),
            (
                "total_front_end_cumulative_communication_bytes",
                totals.total_front_end_cumulative_communication_bytes.to_string(),
            ),
            (
                "total_sparsification_cumulative_computation_time",
                format!("{:.6}", totals.total_sparsification_cumulative_computation_time),
            ),
            ("latest_pgo_time", self.timer.latest().as_millis().to_string()),
            ("total_pgo_time", self.timer.total().as_millis().to_string()),
            ("nb_edges", nb_edges.to_string()),
            ("nb_vertices", nb_vertices.to_string()),
            ("total_error", format!("{total_error:.6}")),
            ("inter_robot_loop_closures", closures.len().to_string()),
        ];
        rows.extend(
            closures
                .iter()
                .map(|closure| ("error", format!("{:.6}", closure.error))),
        );
        rows
    }

    /// Geolocation rows per robot, concatenated in arrival order
    fn gps_tables(&self) -> BTreeMap<u32, Vec<GpsRow>> {
        let mut tables: BTreeMap<u32, Vec<GpsRow>> = BTreeMap::new();
        for summary in self.statistics.records().iter().filter(|s| s.has_gps()) {
            tables
                .entry(summary.robot_id)
                .or_default()
                .extend(summary.gps.iter().map(|(vertex_id, fix)| GpsRow {
                    vertex_id: *vertex_id,
                    latitude: fix.latitude,
                    longitude: fix.longitude,
                    altitude: fix.altitude,
                }));
        }
        tables
    }

    fn reset_epoch(&mut self) {
        self.statistics.clear();
        self.initial_global_pose_graph = None;
        self.optimized_global_pose_graph = None;
    }
}
