//! PEER NGA-West2 flatfile adapter.
//!
//! Reads the locally stored flatfile CSV, renames columns onto the
//! standard schema, converts PGA from g to cm/s² and numeric mechanism
//! codes to labels, then applies the criteria range filters. The flatfile
//! carries no waveform files, so artifact download reports a typed
//! failure.

use std::fs;
use std::path::PathBuf;

use gmselect_engine::model::{Table, Value};
use gmselect_engine::SearchCriteria;
use gmselect_pipeline::{DataSource, SourceError};

use crate::mapper::to_standard_schema;
use crate::mechanism::mechanism_text;

pub const PEER_SOURCE_NAME: &str = "PEER";

/// Standard gravity, cm/s² per g.
const G_TO_CM_S2: f64 = 980.665;

/// Flatfile header names → standard columns.
const PEER_COLUMN_MAP: &[(&str, &str)] = &[
    ("Record Sequence Number", "RSN"),
    ("Earthquake Name", "EVENT"),
    ("YEAR", "YEAR"),
    ("Earthquake Magnitude", "MAGNITUDE"),
    ("Magnitude Type", "MAGNITUDE_TYPE"),
    ("Station Name", "STATION"),
    ("Station Sequence Number", "SSN"),
    ("Station ID  No.", "STATION_ID"),
    ("Station Latitude", "STATION_LAT"),
    ("Station Longitude", "STATION_LON"),
    ("Vs30 (m/s) selected for analysis", "VS30(m/s)"),
    ("Strike (deg)", "STRIKE1"),
    ("Dip (deg)", "DIP1"),
    ("Rake Angle (deg)", "RAKE1"),
    ("Mechanism Based on Rake Angle", "MECHANISM"),
    ("EpiD (km)", "EPICENTER_DEPTH(km)"),
    ("HypD (km)", "HYPOCENTER_DEPTH(km)"),
    ("Joyner-Boore Dist. (km)", "RJB(km)"),
    ("ClstD (km)", "RRUP(km)"),
    ("Hypocenter Latitude (deg)", "HYPO_LAT"),
    ("Hypocenter Longitude (deg)", "HYPO_LON"),
    ("Hypocenter Depth (km)", "HYPO_DEPTH(km)"),
    ("Lowest Usable Freq - Ave. Component (Hz)", "LOWFREQ(Hz)"),
    ("File Name (Horizontal 1)", "FILE_NAME_H1"),
    ("File Name (Horizontal 2)", "FILE_NAME_H2"),
    ("File Name (Vertical)", "FILE_NAME_V"),
    ("PGA(g)", "PGA(cm2/sec)"),
    ("PGV (cm/sec)", "PGV(cm/sec)"),
    ("PGD (cm)", "PGD(cm)"),
    ("5-95%Duration(sec)", "T90_avg(sec)"),
    ("AriasIntensity(m/sec)", "ARIAS_INTENSITY(m/sec)"),
];

#[derive(Debug)]
pub struct PeerSource {
    flatfile: PathBuf,
}

impl PeerSource {
    pub fn new(flatfile: impl Into<PathBuf>) -> Self {
        Self {
            flatfile: flatfile.into(),
        }
    }
}

impl DataSource for PeerSource {
    fn identity(&self) -> &str {
        PEER_SOURCE_NAME
    }

    fn fetch(&self, criteria: &SearchCriteria) -> Result<Table, SourceError> {
        let data = fs::read_to_string(&self.flatfile).map_err(|e| {
            SourceError::new(
                PEER_SOURCE_NAME,
                format!("cannot read flatfile {}: {e}", self.flatfile.display()),
            )
        })?;
        let mut table = Table::from_csv(&data)
            .map_err(|e| SourceError::new(PEER_SOURCE_NAME, format!("flatfile parse: {e}")))?;

        table.rename_columns(PEER_COLUMN_MAP);

        table.map_column("PGA(cm2/sec)", |value| match value {
            Value::Number(g) => Value::Number(g * G_TO_CM_S2),
            other => other,
        });
        table.map_column("MECHANISM", |value| match value {
            Value::Number(code) => Value::Text(mechanism_text(code as i64).to_string()),
            other => other,
        });

        let standard = to_standard_schema(&table, PEER_SOURCE_NAME);
        Ok(apply_filters(&standard, criteria))
    }

    fn download_artifact(&self, _file_name: &str) -> Result<bool, SourceError> {
        Err(SourceError::new(
            PEER_SOURCE_NAME,
            "the NGA-West2 flatfile carries no waveform files",
        ))
    }
}

/// Range filters over the standard schema. A record with a missing value
/// fails any active filter on that column; mechanism filtering is exact
/// label membership.
fn apply_filters(table: &Table, criteria: &SearchCriteria) -> Table {
    let ranges: &[(&str, Option<f64>, Option<f64>)] = &[
        ("MAGNITUDE", criteria.min_magnitude, criteria.max_magnitude),
        ("RJB(km)", criteria.min_rjb, criteria.max_rjb),
        ("RRUP(km)", criteria.min_rrup, criteria.max_rrup),
        ("VS30(m/s)", criteria.min_vs30, criteria.max_vs30),
        ("HYPO_DEPTH(km)", criteria.min_depth, criteria.max_depth),
        ("PGA(cm2/sec)", criteria.min_pga, criteria.max_pga),
        ("PGV(cm/sec)", criteria.min_pgv, criteria.max_pgv),
        ("PGD(cm)", criteria.min_pgd, criteria.max_pgd),
    ];

    let keep: Vec<usize> = (0..table.n_rows())
        .filter(|&row| {
            for (column, min, max) in ranges {
                if min.is_none() && max.is_none() {
                    continue;
                }
                let value = match table.number(row, column) {
                    Some(v) => v,
                    None => return false,
                };
                if let Some(lo) = min {
                    if value < *lo {
                        return false;
                    }
                }
                if let Some(hi) = max {
                    if value > *hi {
                        return false;
                    }
                }
            }

            if !criteria.mechanisms.is_empty() {
                let label = table.key(row, "MECHANISM");
                if !criteria.mechanisms.iter().any(|m| *m == label) {
                    return false;
                }
            }
            true
        })
        .collect();

    table.select_rows(&keep)
}
