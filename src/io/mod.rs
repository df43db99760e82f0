use std::path::Path;
use thiserror::Error;

use crate::core::graph::PoseGraphSnapshot;

// Module declarations
pub mod g2o;
pub mod tables;

// Re-exports
pub use g2o::G2oLoader;
pub use tables::{GpsRow, write_gps_table, write_key_value_log};

/// File extension of graph exchange files
pub const GRAPH_EXTENSION: &str = "g2o";

/// File extension of tables
pub const TABLE_EXTENSION: &str = "csv";

/// Errors that can occur while reading or writing graph files
#[derive(Error, Debug)]
pub enum GraphIoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid number format at line {line}: {value}")]
    InvalidNumber { line: usize, value: String },

    #[error("Missing required fields at line {line}")]
    MissingFields { line: usize },

    #[error("Duplicate vertex ID: {id}")]
    DuplicateVertex { id: u64 },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// Trait for graph file loaders and writers
pub trait GraphLoader {
    /// Load a snapshot from a file
    fn load<P: AsRef<Path>>(path: P) -> Result<PoseGraphSnapshot, GraphIoError>;

    /// Write a snapshot to a file
    fn write<P: AsRef<Path>>(snapshot: &PoseGraphSnapshot, path: P) -> Result<(), GraphIoError>;
}

/// Convenience function to load any supported format based on file extension
pub fn load_graph<P: AsRef<Path>>(path: P) -> Result<PoseGraphSnapshot, GraphIoError> {
    let path_ref = path.as_ref();
    let extension = path_ref
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| GraphIoError::UnsupportedFormat("No file extension".to_string()))?;

    match extension.to_lowercase().as_str() {
        GRAPH_EXTENSION => G2oLoader::load(path),
        _ => Err(GraphIoError::UnsupportedFormat(format!(
            "Unsupported extension: {extension}"
        ))),
    }
}
