use super::*;
use nalgebra::{Isometry3, Matrix6, Quaternion, Translation3, UnitQuaternion};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::str::FromStr;

use crate::core::graph::{BetweenFactor, FactorGraph, Values};

const VERTEX_TAG: &str = "VERTEX_SE3:QUAT";
const EDGE_TAG: &str = "EDGE_SE3:QUAT";

/// Number of upper-triangular entries of a 6x6 information matrix
const INFORMATION_ENTRIES: usize = 21;

/// G2O reader/writer for 3D pose graphs
pub struct G2oLoader;

impl GraphLoader for G2oLoader {
    fn load<P: AsRef<Path>>(path: P) -> Result<PoseGraphSnapshot, GraphIoError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_content(&content)
    }

    fn write<P: AsRef<Path>>(snapshot: &PoseGraphSnapshot, path: P) -> Result<(), GraphIoError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(Self::to_g2o_string(snapshot).as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

impl G2oLoader {
    /// Render a snapshot as g2o text.
    ///
    /// Vertices are emitted in key order followed by between factors in graph order. Unary
    /// factors have no g2o counterpart here and are left out.
    pub fn to_g2o_string(snapshot: &PoseGraphSnapshot) -> String {
        let mut out = String::new();
        for (key, pose) in snapshot.values.iter() {
            let _ = writeln!(out, "{VERTEX_TAG} {key} {}", format_pose(pose));
        }
        for factor in snapshot.graph.between_factors() {
            let _ = write!(
                out,
                "{EDGE_TAG} {} {} {}",
                factor.key1,
                factor.key2,
                format_pose(&factor.measured)
            );
            for i in 0..6 {
                for j in i..6 {
                    let _ = write!(out, " {}", factor.information[(i, j)]);
                }
            }
            out.push('\n');
        }
        out
    }

    /// Parse g2o content; unknown tags are skipped for compatibility
    pub fn parse_content(content: &str) -> Result<PoseGraphSnapshot, GraphIoError> {
        let mut graph = FactorGraph::new();
        let mut values = Values::new();

        for (line_num, line) in content.lines().enumerate() {
            let line_num = line_num + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts[0] {
                VERTEX_TAG => {
                    let (id, pose) = Self::parse_vertex_se3(&parts, line_num)?;
                    if values.insert(id, pose).is_some() {
                        return Err(GraphIoError::DuplicateVertex { id });
                    }
                }
                EDGE_TAG => {
                    graph.add(Self::parse_edge_se3(&parts, line_num)?);
                }
                _ => {}
            }
        }

        Ok(PoseGraphSnapshot::new(graph, values))
    }

    /// Parse VERTEX_SE3:QUAT line
    pub fn parse_vertex_se3(
        parts: &[&str],
        line_num: usize,
    ) -> Result<(u64, Isometry3<f64>), GraphIoError> {
        if parts.len() < 9 {
            return Err(GraphIoError::MissingFields { line: line_num });
        }
        let id = parse_field::<u64>(parts, 1, line_num)?;
        let pose = parse_pose(&parts[2..9], line_num)?;
        Ok((id, pose))
    }

    /// Parse EDGE_SE3:QUAT line; identity information when the matrix is absent
    pub fn parse_edge_se3(parts: &[&str], line_num: usize) -> Result<BetweenFactor, GraphIoError> {
        if parts.len() < 10 {
            return Err(GraphIoError::MissingFields { line: line_num });
        }
        let from = parse_field::<u64>(parts, 1, line_num)?;
        let to = parse_field::<u64>(parts, 2, line_num)?;
        let measured = parse_pose(&parts[3..10], line_num)?;

        let information = if parts.len() >= 10 + INFORMATION_ENTRIES {
            let entries: Result<Vec<f64>, _> = parts[10..10 + INFORMATION_ENTRIES]
                .iter()
                .map(|s| s.parse::<f64>())
                .collect();
            let entries = entries.map_err(|_| GraphIoError::Parse {
                line: line_num,
                message: "Invalid information matrix values".to_string(),
            })?;
            let mut information = Matrix6::zeros();
            let mut idx = 0;
            for i in 0..6 {
                for j in i..6 {
                    information[(i, j)] = entries[idx];
                    information[(j, i)] = entries[idx];
                    idx += 1;
                }
            }
            information
        } else {
            Matrix6::identity()
        };

        Ok(BetweenFactor::new(from, to, measured, information))
    }
}

fn format_pose(pose: &Isometry3<f64>) -> String {
    let t = pose.translation.vector;
    let q = pose.rotation.quaternion();
    format!(
        "{} {} {} {} {} {} {}",
        t.x, t.y, t.z, q.i, q.j, q.k, q.w
    )
}

fn parse_field<T: FromStr>(parts: &[&str], idx: usize, line_num: usize) -> Result<T, GraphIoError> {
    parts[idx]
        .parse::<T>()
        .map_err(|_| GraphIoError::InvalidNumber {
            line: line_num,
            value: parts[idx].to_string(),
        })
}

/// x y z qx qy qz qw
fn parse_pose(fields: &[&str], line_num: usize) -> Result<Isometry3<f64>, GraphIoError> {
    let mut v = [0.0; 7];
    for (i, slot) in v.iter_mut().enumerate() {
        *slot = parse_field::<f64>(fields, i, line_num)?;
    }
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(v[6], v[3], v[4], v[5]));
    Ok(Isometry3::from_parts(
        Translation3::new(v[0], v[1], v[2]),
        rotation,
    ))
}
