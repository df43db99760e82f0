use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::key::MAX_ROBOT_ID;
use crate::error::{DiagnosticsError, DiagnosticsResult};

/// Configuration of a diagnostics run
///
/// Fields missing from a deserialized configuration take their [`Default`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Id of the robot running this logger
    pub robot_id: u32,
    /// Number of robots in the fleet
    pub nb_robots: u32,
    /// Root under which the experiment folder is created
    pub log_folder: PathBuf,
    /// When false, flushing only resets the epoch state
    pub enable_logs: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            robot_id: 0,
            nb_robots: 1,
            log_folder: PathBuf::from("./results"),
            enable_logs: true,
        }
    }
}

impl LoggerConfig {
    pub fn new(robot_id: u32, nb_robots: u32, log_folder: impl Into<PathBuf>) -> Self {
        Self {
            robot_id,
            nb_robots,
            log_folder: log_folder.into(),
            ..Self::default()
        }
    }

    pub fn with_enable_logs(mut self, enable_logs: bool) -> Self {
        self.enable_logs = enable_logs;
        self
    }

    pub fn validate(&self) -> DiagnosticsResult<()> {
        if self.nb_robots == 0 {
            return Err(DiagnosticsError::InvalidInput(
                "nb_robots must be at least 1".to_string(),
            ));
        }
        if self.robot_id >= self.nb_robots {
            return Err(DiagnosticsError::InvalidInput(format!(
                "robot_id {} is out of range for {} robots",
                self.robot_id, self.nb_robots
            )));
        }
        if self.robot_id > MAX_ROBOT_ID {
            return Err(DiagnosticsError::InvalidInput(format!(
                "robot_id {} does not fit in a pose key label",
                self.robot_id
            )));
        }
        Ok(())
    }
}
