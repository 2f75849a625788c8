//! `gmselect run` / `gmselect validate` — criteria-driven pipeline runs.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::json;

use gmselect_engine::model::{Table, Value, SCORE_COLUMN};
use gmselect_engine::{for_design_code, EngineError, SelectionRequest};
use gmselect_pipeline::{run_with_design_code, DataSource, FetchMode, PipelineError, PipelineResult};
use gmselect_sources::{AfadSource, CachedSource, PeerSource, TableCache};

use crate::exit_codes::{
    EXIT_ERROR, EXIT_INVALID_CRITERIA, EXIT_NO_DATA, EXIT_UNKNOWN_STRATEGY,
};
use crate::CliError;

// ── Source configuration ([sources] section of the criteria file) ────

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Query the AFAD strong-motion web API.
    pub afad: bool,
    /// Path to a local PEER NGA-West2 flatfile CSV.
    pub peer_flatfile: Option<PathBuf>,
    pub cache_dir: PathBuf,
    pub cache_hours: u64,
    pub download_dir: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            afad: true,
            peer_flatfile: None,
            cache_dir: PathBuf::from(".gmselect-cache"),
            cache_hours: 24,
            download_dir: PathBuf::from("waveforms"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SourcesProbe {
    #[serde(default)]
    sources: SourcesConfig,
}

pub fn load_sources_config(config_str: &str) -> Result<SourcesConfig, CliError> {
    toml::from_str::<SourcesProbe>(config_str)
        .map(|p| p.sources)
        .map_err(|e| CliError::usage(format!("cannot parse [sources]: {e}")))
}

pub fn build_sources(
    config: &SourcesConfig,
    use_cache: bool,
    download_dir: Option<&PathBuf>,
) -> Result<Vec<Box<dyn DataSource>>, CliError> {
    let mut sources: Vec<Box<dyn DataSource>> = Vec::new();
    let cache = |name: &str| TableCache::new(config.cache_dir.join(name), config.cache_hours);

    if config.afad {
        let dir = download_dir.unwrap_or(&config.download_dir);
        let afad = AfadSource::new(dir.clone())
            .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
        if use_cache {
            sources.push(Box::new(CachedSource::new(afad, cache("afad"))));
        } else {
            sources.push(Box::new(afad));
        }
    }

    if let Some(flatfile) = &config.peer_flatfile {
        let peer = PeerSource::new(flatfile);
        if use_cache {
            sources.push(Box::new(CachedSource::new(peer, cache("peer"))));
        } else {
            sources.push(Box::new(peer));
        }
    }

    if sources.is_empty() {
        return Err(CliError::usage(
            "no sources configured (enable afad or set peer_flatfile under [sources])",
        ));
    }
    Ok(sources)
}

// ── Error mapping ─────────────────────────────────────────────────────

fn criteria_error(err: EngineError) -> CliError {
    let code = match err {
        EngineError::UnknownDesignCode(_) => EXIT_UNKNOWN_STRATEGY,
        _ => EXIT_INVALID_CRITERIA,
    };
    CliError::new(code, err.to_string())
}

fn pipeline_error(err: PipelineError) -> CliError {
    let code = match &err {
        PipelineError::Validation(_) => EXIT_INVALID_CRITERIA,
        PipelineError::Configuration(_) => EXIT_UNKNOWN_STRATEGY,
        PipelineError::NoData(_) => EXIT_NO_DATA,
        PipelineError::Strategy(_) => EXIT_ERROR,
    };
    CliError::new(code, err.to_string())
}

// ── Commands ──────────────────────────────────────────────────────────

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    selected_csv: Option<PathBuf>,
    sequential: bool,
    no_cache: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let config_str = fs::read_to_string(&config_path).map_err(|e| {
        CliError::io(format!("cannot read {}: {e}", config_path.display()))
    })?;

    let request = SelectionRequest::from_toml(&config_str).map_err(criteria_error)?;
    let sources_config = load_sources_config(&config_str)?;
    let sources = build_sources(&sources_config, !no_cache, None)?;
    let source_refs: Vec<&dyn DataSource> = sources.iter().map(|s| s.as_ref()).collect();

    let mode = if sequential {
        FetchMode::Sequential
    } else {
        FetchMode::Concurrent
    };

    if !quiet {
        eprintln!(
            "fetching from {} source(s) [{}]...",
            source_refs.len(),
            source_refs
                .iter()
                .map(|s| s.identity())
                .collect::<Vec<_>>()
                .join(", "),
        );
    }

    let result = run_with_design_code(&source_refs, request.criteria, request.selection, mode)
        .map_err(pipeline_error)?;

    if let Some(path) = &selected_csv {
        let csv = result
            .selected
            .to_csv()
            .map_err(|e| CliError::io(e.to_string()))?;
        fs::write(path, csv)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        if !quiet {
            eprintln!("wrote {}", path.display());
        }
    }

    let report_json = result_json(&result);
    if let Some(path) = &output_file {
        let pretty = serde_json::to_string_pretty(&report_json)
            .map_err(|e| CliError::io(e.to_string()))?;
        fs::write(path, pretty)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        if !quiet {
            eprintln!("wrote {}", path.display());
        }
    }

    if json_output {
        let pretty = serde_json::to_string_pretty(&report_json)
            .map_err(|e| CliError::io(e.to_string()))?;
        println!("{pretty}");
    } else {
        print_summary(&result);
    }

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = fs::read_to_string(&config_path).map_err(|e| {
        CliError::io(format!("cannot read {}: {e}", config_path.display()))
    })?;

    let request = SelectionRequest::from_toml(&config_str).map_err(criteria_error)?;
    for_design_code(&request.selection.design_code).map_err(criteria_error)?;
    let sources_config = load_sources_config(&config_str)?;

    let mut names = Vec::new();
    if sources_config.afad {
        names.push("AFAD");
    }
    if sources_config.peer_flatfile.is_some() {
        names.push("PEER");
    }
    if names.is_empty() {
        return Err(CliError::usage(
            "no sources configured (enable afad or set peer_flatfile under [sources])",
        ));
    }

    println!(
        "OK: criteria valid, design code {}, sources: {}",
        request.selection.design_code,
        names.join(", "),
    );
    Ok(())
}

// ── Output ────────────────────────────────────────────────────────────

/// Selected rows as an array of column→value objects.
fn table_records(table: &Table) -> Vec<serde_json::Value> {
    (0..table.n_rows())
        .map(|row| {
            let mut record = serde_json::Map::new();
            for column in table.columns() {
                let value = match table.value(row, column) {
                    Some(Value::Number(n)) => json!(n),
                    Some(Value::Text(s)) => json!(s),
                    _ => serde_json::Value::Null,
                };
                record.insert(column.clone(), value);
            }
            serde_json::Value::Object(record)
        })
        .collect()
}

fn result_json(result: &PipelineResult) -> serde_json::Value {
    json!({
        "report": result.report,
        "records": table_records(&result.selected),
        "failed_sources": result.failed_sources,
        "execution_time": result.execution_time,
        "logs": result.logs,
    })
}

fn print_summary(result: &PipelineResult) {
    let report = &result.report;
    println!("status: {}", report.status);
    if let Some(message) = &report.message {
        println!("note: {message}");
    }
    println!("strategy: {}", report.strategy);
    if result.failed_sources.is_empty() {
        println!("sources: {}", report.sources.join(", "));
    } else {
        println!(
            "sources: {} (failed: {})",
            report.sources.join(", "),
            result.failed_sources.join(", "),
        );
    }
    println!(
        "records: {} selected of {} considered",
        report.selected_count, report.total_considered,
    );

    if let Some(stats) = &report.statistics {
        if let Some((lo, hi)) = stats.magnitude_range {
            println!("magnitude: {lo:.2} - {hi:.2}");
        }
        if let Some((lo, hi)) = stats.distance_range {
            println!("rjb: {lo:.1} - {hi:.1} km");
        }
        if let Some((lo, hi)) = stats.score_range {
            println!("score: {lo:.1} - {hi:.1}");
        }
    }
    println!("time: {:.2} sec", result.execution_time);

    if !result.selected.is_empty() {
        println!();
        println!("{:>8}  {:<24}  {:<16}  {:>5}  {:>8}  {:>6}", "RSN", "EVENT", "STATION", "MAG", "RJB", "SCORE");
        for row in 0..result.selected.n_rows() {
            println!(
                "{:>8}  {:<24}  {:<16}  {:>5}  {:>8}  {:>6.1}",
                result.selected.key(row, "RSN"),
                truncate(&result.selected.key(row, "EVENT"), 24),
                truncate(&result.selected.key(row, "STATION"), 16),
                result.selected.key(row, "MAGNITUDE"),
                result.selected.key(row, "RJB(km)"),
                result.selected.number(row, SCORE_COLUMN).unwrap_or(0.0),
            );
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).collect::<String>() + "…"
    }
}
