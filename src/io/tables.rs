//! CSV tables written alongside the graph snapshots

use csv::WriterBuilder;
use std::path::Path;

use crate::error::DiagnosticsResult;

/// Header of every geolocation table
pub const GPS_HEADER: [&str; 4] = ["vertice_id", "latitude", "longitude", "altitude"];

/// Fractional digits kept for geodetic coordinates
pub const GPS_PRECISION: usize = 10;

/// One geolocation sample attached to a pose vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsRow {
    pub vertex_id: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Write `key,value` rows without a header
pub fn write_key_value_log<P: AsRef<Path>>(
    path: P,
    rows: &[(&str, String)],
) -> DiagnosticsResult<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    for (key, value) in rows {
        writer.write_record([*key, value.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a geolocation table with fixed-point coordinates
pub fn write_gps_table<P: AsRef<Path>>(path: P, rows: &[GpsRow]) -> DiagnosticsResult<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(GPS_HEADER)?;
    for row in rows {
        writer.write_record([
            row.vertex_id.to_string(),
            format!("{:.*}", GPS_PRECISION, row.latitude),
            format!("{:.*}", GPS_PRECISION, row.longitude),
            format!("{:.*}", GPS_PRECISION, row.altitude),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
