//! `gmselect waveforms` — download waveform files for selected records.

use std::fs;
use std::path::PathBuf;

use gmselect_engine::model::Table;
use gmselect_pipeline::DataSource;

use crate::exit_codes::EXIT_SOURCE_FAILURE;
use crate::run::{build_sources, load_sources_config};
use crate::CliError;

pub fn cmd_waveforms(
    selected_path: PathBuf,
    config_path: PathBuf,
    dir: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let csv = fs::read_to_string(&selected_path).map_err(|e| {
        CliError::io(format!("cannot read {}: {e}", selected_path.display()))
    })?;
    let selected = Table::from_csv(&csv).map_err(|e| CliError::io(e.to_string()))?;

    let config_str = fs::read_to_string(&config_path).map_err(|e| {
        CliError::io(format!("cannot read {}: {e}", config_path.display()))
    })?;
    let sources_config = load_sources_config(&config_str)?;
    // downloads always hit the live source, never the catalog cache
    let sources = build_sources(&sources_config, false, dir.as_ref())?;

    let mut downloaded = 0usize;
    let mut skipped = 0usize;

    for row in 0..selected.n_rows() {
        let provider = selected.key(row, "PROVIDER");
        let file_name = selected.key(row, "FILE_NAME_H1");
        if file_name.is_empty() {
            skipped += 1;
            continue;
        }

        let source = match sources.iter().find(|s| s.identity() == provider) {
            Some(source) => source,
            None => {
                skipped += 1;
                continue;
            }
        };

        match source.download_artifact(&file_name) {
            Ok(_) => {
                downloaded += 1;
                if !quiet {
                    eprintln!(
                        "downloaded {file_name} ({}/{})",
                        row + 1,
                        selected.n_rows(),
                    );
                }
            }
            Err(err) => {
                return Err(CliError::new(
                    EXIT_SOURCE_FAILURE,
                    format!("waveform download failed: {err}"),
                ));
            }
        }
    }

    println!(
        "downloaded {downloaded} waveform file(s), skipped {skipped} record(s)",
    );
    Ok(())
}
