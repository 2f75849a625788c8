//! AFAD strong-motion web API adapter.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gmselect_engine::model::{Table, Value};
use gmselect_engine::SearchCriteria;
use gmselect_pipeline::{DataSource, SourceError};
use serde_json::json;

use crate::http::SourceClient;
use crate::mapper::to_standard_schema;
use crate::mechanism::classify_fault_planes;

pub const AFAD_SOURCE_NAME: &str = "AFAD";

const AFAD_SEARCH_URL: &str = "https://ivmeservis.afad.gov.tr/Waveforms/GetWaveforms";
const AFAD_EXPORT_URL: &str = "https://ivmeprocessguest.afad.gov.tr/ExportData";
const AFAD_ORIGIN: &str = "https://tadas.afad.gov.tr";

/// Responses smaller than this are not plausible waveform archives.
const MIN_ARCHIVE_BYTES: usize = 1024;

/// Native AFAD field names → standard columns.
const AFAD_COLUMN_MAP: &[(&str, &str)] = &[
    ("waveformId", "RSN"),
    ("eventId", "EVENT"),
    ("mvalue", "MAGNITUDE"),
    ("mtype", "MAGNITUDE_TYPE"),
    ("rjb", "RJB(km)"),
    ("rrup", "RRUP(km)"),
    ("repi", "REPI(km)"),
    ("rhyp", "RHYP(km)"),
    ("relatedEarthquakeLatitude", "HYPO_LAT"),
    ("relatedEarthquakeLongitude", "HYPO_LON"),
    ("depth", "HYPO_DEPTH(km)"),
    ("stationCode", "SSN"),
    ("stationId", "STATION_ID"),
    ("location", "STATION"),
    ("relatedStationLatitude", "STATION_LAT"),
    ("relatedStationLongitude", "STATION_LON"),
    ("vs30", "VS30(m/s)"),
    ("pga", "PGA(cm2/sec)"),
    ("pgv", "PGV(cm/sec)"),
    ("pgd", "PGD(cm)"),
    ("relatedStrike1", "STRIKE1"),
    ("relatedDip1", "DIP1"),
    ("relatedRake1", "RAKE1"),
];

/// Criteria mechanism labels → AFAD fault-type codes.
const AFAD_FAULT_TYPES: &[(&str, &str)] = &[
    ("StrikeSlip", "SS"),
    ("Reverse", "R"),
    ("Normal", "N"),
    ("Oblique", "T"),
];

#[derive(Debug)]
pub struct AfadSource {
    client: SourceClient,
    search_url: String,
    export_url: String,
    /// Directory waveform archives are extracted into.
    download_dir: PathBuf,
}

impl AfadSource {
    pub fn new(download_dir: impl Into<PathBuf>) -> Result<Self, SourceError> {
        Self::with_urls(AFAD_SEARCH_URL, AFAD_EXPORT_URL, download_dir)
    }

    pub fn with_urls(
        search_url: &str,
        export_url: &str,
        download_dir: impl Into<PathBuf>,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: SourceClient::new(AFAD_SOURCE_NAME)?,
            search_url: search_url.to_string(),
            export_url: export_url.to_string(),
            download_dir: download_dir.into(),
        })
    }
}

impl DataSource for AfadSource {
    fn identity(&self) -> &str {
        AFAD_SOURCE_NAME
    }

    fn fetch(&self, criteria: &SearchCriteria) -> Result<Table, SourceError> {
        let payload = search_payload(criteria);

        let body = self.client.request_json_with_retry(|http| {
            guest_headers(http.post(&self.search_url)).json(&payload)
        })?;

        let records = body.as_array().ok_or_else(|| {
            SourceError::new(AFAD_SOURCE_NAME, "expected a JSON array of waveform records")
        })?;

        let mut table = table_from_json(records);
        derive_columns(&mut table);
        table.rename_columns(AFAD_COLUMN_MAP);
        Ok(to_standard_schema(&table, AFAD_SOURCE_NAME))
    }

    fn download_artifact(&self, file_name: &str) -> Result<bool, SourceError> {
        let payload = export_payload(file_name);

        let bytes = self.client.request_bytes_with_retry(|http| {
            guest_headers(http.post(&self.export_url)).json(&payload)
        })?;

        if bytes.len() < MIN_ARCHIVE_BYTES {
            return Err(SourceError::new(
                AFAD_SOURCE_NAME,
                format!("downloaded archive suspiciously small ({} bytes)", bytes.len()),
            ));
        }

        extract_archive(&bytes, &self.download_dir)?;
        Ok(true)
    }
}

/// The AFAD service only accepts guest-authenticated browser-like requests.
fn guest_headers(builder: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
    builder
        .header("Accept", "application/json, text/plain, */*")
        .header("Origin", AFAD_ORIGIN)
        .header("Referer", format!("{AFAD_ORIGIN}/"))
        .header("Username", "GuestUser")
        .header("IsGuest", "true")
}

/// Translate generic criteria into the AFAD waveform-search payload.
/// Absent criteria fields are omitted entirely.
fn search_payload(criteria: &SearchCriteria) -> serde_json::Value {
    let mut payload = serde_json::Map::new();
    let mut put = |key: &str, value: Option<f64>| {
        if let Some(v) = value {
            payload.insert(key.to_string(), json!(v));
        }
    };

    put("fromMagnitude", criteria.min_magnitude);
    put("toMagnitude", criteria.max_magnitude);
    put("from_depth", criteria.min_depth);
    put("to_depth", criteria.max_depth);
    put("fromRepi", criteria.min_repi);
    put("toRepi", criteria.max_repi);
    put("fromRhyp", criteria.min_rhyp);
    put("toRhyp", criteria.max_rhyp);
    put("fromRjb", criteria.min_rjb);
    put("toRjb", criteria.max_rjb);
    put("fromRrup", criteria.min_rrup);
    put("toRrup", criteria.max_rrup);
    put("fromVs30", criteria.min_vs30);
    put("toVs30", criteria.max_vs30);
    put("fromPGA", criteria.min_pga);
    put("toPGA", criteria.max_pga);
    put("fromPGV", criteria.min_pgv);
    put("toPGV", criteria.max_pgv);
    put("fromPgd", criteria.min_pgd);
    put("toPgd", criteria.max_pgd);

    if let Some([min_lat, max_lat, min_lon, max_lon]) = criteria.bbox {
        put("fromLatitude", Some(min_lat));
        put("toLatitude", Some(max_lat));
        put("fromLongitude", Some(min_lon));
        put("toLongitude", Some(max_lon));
    }

    payload.insert(
        "startDate".into(),
        json!(format!("{}T00:00:00.000Z", criteria.start_date)),
    );
    payload.insert(
        "endDate".into(),
        json!(format!("{}T23:59:59.999Z", criteria.end_date)),
    );

    if let Some(first) = criteria.mechanisms.first() {
        let code = AFAD_FAULT_TYPES
            .iter()
            .find(|(label, _)| *label == first.as_str())
            .map(|(_, code)| *code)
            .unwrap_or(first.as_str());
        payload.insert("faultType".into(), json!(code));
    }

    serde_json::Value::Object(payload)
}

fn export_payload(file_name: &str) -> serde_json::Value {
    json!({
        "filename": [file_name],
        "file_type": ["unprocessed"],
        "file_status": "RawAcc",
        "export_type": "asc2",
        "user_name": "GuestUser",
        "call": "afad",
    })
}

/// Build a table from an array of JSON objects. Columns are the union of
/// keys in first-seen order (objects iterate in sorted key order).
fn table_from_json(records: &[serde_json::Value]) -> Table {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        if let Some(object) = record.as_object() {
            for key in object.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let mut table = Table::new(columns.clone());
    for record in records {
        let object = match record.as_object() {
            Some(o) => o,
            None => continue,
        };
        let row: Vec<Value> = columns
            .iter()
            .map(|column| match object.get(column) {
                None | Some(serde_json::Value::Null) => Value::Null,
                Some(serde_json::Value::Number(n)) => {
                    n.as_f64().map(Value::Number).unwrap_or(Value::Null)
                }
                Some(serde_json::Value::String(s)) => Value::Text(s.clone()),
                Some(other) => Value::Text(other.to_string()),
            })
            .collect();
        table.push_row(row);
    }
    table
}

/// Columns the AFAD response does not carry directly: YEAR from the event
/// date, waveform file names from the record file name, the averaged
/// significant duration, and the mechanism classified from both nodal
/// planes.
fn derive_columns(table: &mut Table) {
    let n_rows = table.n_rows();

    if table.column_index("eventDate").is_some() {
        let years: Vec<Value> = (0..n_rows)
            .map(|row| {
                table
                    .value(row, "eventDate")
                    .and_then(Value::as_text)
                    .and_then(|date| date.get(..4))
                    .and_then(|year| year.parse::<f64>().ok())
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            })
            .collect();
        table.append_column("YEAR", years);
    }

    if table.column_index("recordFilename").is_some() {
        for target in ["FILE_NAME_H1", "FILE_NAME_H2", "FILE_NAME_V"] {
            let names: Vec<Value> = (0..n_rows)
                .map(|row| {
                    table
                        .value(row, "recordFilename")
                        .cloned()
                        .unwrap_or(Value::Null)
                })
                .collect();
            table.append_column(target, names);
        }
    }

    let t90_columns = ["t90e", "t90n", "t90u"];
    if t90_columns
        .iter()
        .all(|c| table.column_index(c).is_some())
    {
        let averages: Vec<Value> = (0..n_rows)
            .map(|row| {
                let values: Vec<f64> = t90_columns
                    .iter()
                    .filter_map(|c| table.number(row, c))
                    .collect();
                if values.is_empty() {
                    Value::Null
                } else {
                    Value::Number(values.iter().sum::<f64>() / values.len() as f64)
                }
            })
            .collect();
        table.append_column("T90_avg(sec)", averages);
    }

    let mechanisms: Vec<Value> = (0..n_rows)
        .map(|row| {
            Value::Text(classify_fault_planes(
                table.number(row, "relatedDip1"),
                table.number(row, "relatedRake1"),
                table.number(row, "relatedDip2"),
                table.number(row, "relatedRake2"),
            ))
        })
        .collect();
    table.append_column("MECHANISM", mechanisms);
}

fn extract_archive(bytes: &[u8], target_dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let archive_error =
        |e: zip::result::ZipError| SourceError::new(AFAD_SOURCE_NAME, format!("bad archive: {e}"));

    let mut archive = zip::ZipArchive::new(io::Cursor::new(bytes)).map_err(archive_error)?;
    fs::create_dir_all(target_dir).map_err(|e| {
        SourceError::new(
            AFAD_SOURCE_NAME,
            format!("cannot create {}: {e}", target_dir.display()),
        )
    })?;

    let mut extracted = Vec::new();
    for index in 0..archive.len() {
        let mut member = archive.by_index(index).map_err(archive_error)?;
        if member.is_dir() {
            continue;
        }
        let file_name = match member.enclosed_name().and_then(|p| {
            p.file_name().map(|n| n.to_os_string())
        }) {
            Some(name) => name,
            None => continue,
        };
        let out_path = target_dir.join(file_name);
        let mut out = fs::File::create(&out_path).map_err(|e| {
            SourceError::new(
                AFAD_SOURCE_NAME,
                format!("cannot write {}: {e}", out_path.display()),
            )
        })?;
        io::copy(&mut member, &mut out).map_err(|e| {
            SourceError::new(
                AFAD_SOURCE_NAME,
                format!("cannot write {}: {e}", out_path.display()),
            )
        })?;
        extracted.push(out_path);
    }
    Ok(extracted)
}
