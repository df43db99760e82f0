//! Integration tests for the run logger flush
//!
//! Each test drives a [`RunLogger`] through one or more epochs against a temporary log root
//! and inspects the files it leaves behind.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use pgo_diagnostics::io::load_graph;
use pgo_diagnostics::{
    DiagnosticsError, DiagnosticsResult, Factor, LoggerConfig, PoseGraphSnapshot,
    ResidualEvaluator, RunLogger, Values,
};
use tempfile::TempDir;

use pose_graph_test_utils::*;

fn read_log(folder: &Path) -> Vec<(String, String)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(folder.join("log.csv"))
        .expect("log.csv should exist");
    reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[0].to_string(), r[1].to_string())
        })
        .collect()
}

fn value<'a>(rows: &'a [(String, String)], key: &str) -> &'a str {
    rows.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or_else(|| panic!("missing row {key}"))
}

fn logger(root: &TempDir, robot_id: u32) -> RunLogger {
    RunLogger::new(LoggerConfig::new(robot_id, NB_ROBOTS, root.path())).unwrap()
}

struct FailingEvaluator;

impl ResidualEvaluator for FailingEvaluator {
    fn factor_error(&self, _factor: &Factor, _values: &Values) -> DiagnosticsResult<f64> {
        Err(DiagnosticsError::Evaluation("numerical failure".to_string()))
    }
}

#[test]
fn test_experiment_folder_naming() {
    let root = TempDir::new().unwrap();
    let logger = logger(&root, 1);

    let folder = logger.experiment_folder();
    assert!(folder.is_dir());
    assert_eq!(folder.parent(), Some(root.path()));
    let name = folder.file_name().unwrap().to_str().unwrap();
    assert!(name.ends_with("_experiment_robot_1"));
    // dd-mm-YYYY_HH-MM-SS
    assert_eq!(name.len(), "01-01-2024_00-00-00_experiment_robot_1".len());
}

#[test]
fn test_empty_epoch_still_writes_log() {
    let root = TempDir::new().unwrap();
    let mut logger = logger(&root, 0);

    let folder = logger.write_logs().expect("epoch folder");
    assert!(folder.is_dir());
    assert!(folder.starts_with(logger.experiment_folder()));
    assert!(!folder.join("initial_global_pose_graph.g2o").exists());
    assert!(!folder.join("optimized_global_pose_graph.g2o").exists());

    let rows = read_log(&folder);
    let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "robot_id",
            "origin_robot_id",
            "nb_robots",
            "total_nb_matches",
            "total_nb_failed_matches",
            "total_nb_vertices_transmitted",
            "total_front_end_cumulative_communication_bytes",
            "total_sparsification_cumulative_computation_time",
            "latest_pgo_time",
            "total_pgo_time",
            "nb_edges",
            "nb_vertices",
            "total_error",
            "inter_robot_loop_closures",
        ]
    );
    assert_eq!(value(&rows, "nb_robots"), "3");
    assert_eq!(value(&rows, "total_nb_matches"), "0");
    assert_eq!(value(&rows, "total_sparsification_cumulative_computation_time"), "0.000000");
    assert_eq!(value(&rows, "nb_edges"), "0");
    assert_eq!(value(&rows, "total_error"), "0.000000");
    assert_eq!(value(&rows, "inter_robot_loop_closures"), "0");

    let gps_files = std::fs::read_dir(&folder)
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .starts_with("gps_robot_")
        })
        .count();
    assert_eq!(gps_files, 0);
}

#[test]
fn test_full_epoch() {
    let root = TempDir::new().unwrap();
    let mut logger = logger(&root, 0);

    logger.add_pose_graph_log_info(summary(
        0,
        3,
        vec![(0, fix(45.5048612345, -73.6131234567, 35.25))],
    ));
    logger.add_pose_graph_log_info(summary(1, 4, Vec::new()));
    logger.add_pose_graph_log_info(summary(
        0,
        2,
        vec![(1, fix(45.5048700001, -73.6131300002, 35.5))],
    ));

    let snapshot = three_robot_snapshot();
    logger.log_initial_global_pose_graph(snapshot.clone());
    logger.start_timer();
    sleep(Duration::from_millis(5));
    logger.stop_timer();
    logger.log_optimized_global_pose_graph(perturbed(snapshot, 2, 2, 0.5), 2);

    let folder = logger.write_logs().expect("epoch folder");
    let rows = read_log(&folder);

    assert_eq!(value(&rows, "robot_id"), "0");
    assert_eq!(value(&rows, "origin_robot_id"), "2");
    assert_eq!(value(&rows, "total_nb_matches"), "9");
    assert_eq!(value(&rows, "total_nb_failed_matches"), "3");
    assert_eq!(value(&rows, "total_nb_vertices_transmitted"), "15");
    assert_eq!(value(&rows, "total_front_end_cumulative_communication_bytes"), "3000");
    assert_eq!(value(&rows, "total_sparsification_cumulative_computation_time"), "1.500000");
    assert_eq!(
        value(&rows, "latest_pgo_time"),
        logger.latest_pgo_time().as_millis().to_string()
    );
    assert!(value(&rows, "total_pgo_time").parse::<u128>().unwrap() >= 5);
    assert_eq!(value(&rows, "nb_edges"), "12");
    assert_eq!(value(&rows, "nb_vertices"), "12");
    // three factors touch the perturbed pose, each 0.5 * 0.5^2
    assert_eq!(value(&rows, "total_error"), "0.375000");
    assert_eq!(value(&rows, "inter_robot_loop_closures"), "2");

    let errors: Vec<&str> = rows
        .iter()
        .filter(|(k, _)| k == "error")
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(errors, vec!["0.000000", "0.125000"]);

    let gps = std::fs::read_to_string(folder.join("gps_robot_0.csv")).unwrap();
    assert_eq!(
        gps,
        "vertice_id,latitude,longitude,altitude\n\
         0,45.5048612345,-73.6131234567,35.2500000000\n\
         1,45.5048700001,-73.6131300002,35.5000000000\n"
    );
    assert!(!folder.join("gps_robot_1.csv").exists());

    let initial = load_graph(folder.join("initial_global_pose_graph.g2o")).unwrap();
    let optimized = load_graph(folder.join("optimized_global_pose_graph.g2o")).unwrap();
    assert_eq!(initial.vertex_count(), 12);
    // the prior has no g2o edge
    assert_eq!(optimized.edge_count(), 11);
}

#[test]
fn test_flush_resets_epoch_but_not_cumulative_time() {
    let root = TempDir::new().unwrap();
    let mut logger = logger(&root, 1);

    logger.add_pose_graph_log_info(summary(1, 1, Vec::new()));
    logger.log_initial_global_pose_graph(three_robot_snapshot());
    logger.log_optimized_global_pose_graph(three_robot_snapshot(), 1);
    logger.start_timer();
    sleep(Duration::from_millis(2));
    logger.stop_timer();
    let total = logger.total_pgo_time();

    logger.write_logs();
    assert!(logger.pending_records().is_empty());
    assert!(!logger.has_initial_graph());
    assert!(!logger.has_optimized_graph());
    assert_eq!(logger.total_pgo_time(), total);

    logger.start_timer();
    let second = logger.stop_timer();
    assert_eq!(logger.total_pgo_time(), total + second);
}

#[test]
fn test_failing_evaluator_degrades_to_zero() {
    let root = TempDir::new().unwrap();
    let mut logger = RunLogger::with_evaluator(
        LoggerConfig::new(0, NB_ROBOTS, root.path()),
        Box::new(FailingEvaluator),
    )
    .unwrap();
    logger.log_optimized_global_pose_graph(three_robot_snapshot(), 0);

    let folder = logger.write_logs().expect("epoch folder");
    let rows = read_log(&folder);
    assert_eq!(value(&rows, "total_error"), "0.000000");
    assert_eq!(value(&rows, "inter_robot_loop_closures"), "0");
    assert_eq!(value(&rows, "nb_edges"), "12");
    assert!(folder.join("optimized_global_pose_graph.g2o").exists());
}

#[test]
fn test_empty_snapshot_is_not_exported() {
    let root = TempDir::new().unwrap();
    let mut logger = logger(&root, 0);
    logger.log_optimized_global_pose_graph(PoseGraphSnapshot::default(), 1);

    let folder = logger.write_logs().expect("epoch folder");
    assert!(!folder.join("optimized_global_pose_graph.g2o").exists());
    let rows = read_log(&folder);
    assert_eq!(value(&rows, "nb_vertices"), "0");
}

#[test]
fn test_disabled_logs_write_nothing() {
    let root = TempDir::new().unwrap();
    let config = LoggerConfig::new(0, 1, root.path().join("disabled")).with_enable_logs(false);
    let mut logger = RunLogger::new(config).unwrap();
    logger.add_pose_graph_log_info(summary(0, 1, Vec::new()));

    assert!(logger.write_logs().is_none());
    assert!(!root.path().join("disabled").exists());
    assert!(logger.pending_records().is_empty());
}

#[test]
fn test_invalid_config_is_rejected() {
    let root = TempDir::new().unwrap();
    let result = RunLogger::new(LoggerConfig::new(5, 2, root.path()));
    assert!(matches!(result, Err(DiagnosticsError::InvalidInput(_))));
}

#[test]
fn test_unwritable_log_folder_still_resets_epoch() {
    let root = TempDir::new().unwrap();
    let blocker = root.path().join("not_a_directory");
    std::fs::write(&blocker, b"occupied").unwrap();

    let mut logger = RunLogger::new(LoggerConfig::new(0, NB_ROBOTS, &blocker)).unwrap();
    logger.add_pose_graph_log_info(summary(0, 2, vec![(0, fix(45.5, -73.6, 30.0))]));
    logger.log_initial_global_pose_graph(three_robot_snapshot());
    logger.log_optimized_global_pose_graph(three_robot_snapshot(), 1);

    assert!(logger.write_logs().is_none());
    assert!(logger.pending_records().is_empty());
    assert!(!logger.has_initial_graph());
    assert!(!logger.has_optimized_graph());
    assert!(blocker.is_file());
}

#[test]
fn test_graph_write_failure_does_not_stop_flush() {
    let root = TempDir::new().unwrap();
    let mut logger = logger(&root, 0);
    logger.add_pose_graph_log_info(summary(0, 1, vec![(2, fix(45.5, -73.6, 30.0))]));
    logger.log_initial_global_pose_graph(three_robot_snapshot());
    logger.log_optimized_global_pose_graph(three_robot_snapshot(), 0);

    // Occupy the initial graph path with a directory in every epoch folder the flush may pick
    let now = chrono::Local::now();
    for offset in -1..=5 {
        let stamp = (now + chrono::Duration::seconds(offset))
            .format("%d-%m-%Y_%H-%M-%S")
            .to_string();
        std::fs::create_dir_all(
            logger
                .experiment_folder()
                .join(stamp)
                .join("initial_global_pose_graph.g2o"),
        )
        .unwrap();
    }

    let folder = logger.write_logs().expect("epoch folder");
    assert!(folder.join("initial_global_pose_graph.g2o").is_dir());
    assert!(folder.join("optimized_global_pose_graph.g2o").is_file());
    assert!(folder.join("log.csv").is_file());
    assert!(folder.join("gps_robot_0.csv").is_file());

    let rows = read_log(&folder);
    assert_eq!(value(&rows, "nb_vertices"), "12");
    assert!(logger.pending_records().is_empty());
}
