// gmselect CLI - ground-motion record selection from the command line

mod exit_codes;
mod run;
mod waveforms;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "gmselect")]
#[command(about = "Select and rank earthquake ground-motion recordings against design criteria")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the selection pipeline from a TOML criteria file
    #[command(after_help = "\
Examples:
  gmselect run criteria.toml
  gmselect run criteria.toml --json
  gmselect run criteria.toml --output report.json --selected-csv selected.csv
  gmselect run criteria.toml --sequential --no-cache")]
    Run {
        /// Path to the criteria TOML file
        config: PathBuf,

        /// Output the full JSON report to stdout instead of a human summary
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the selected records to a CSV file
        #[arg(long)]
        selected_csv: Option<PathBuf>,

        /// Fetch sources one after another instead of concurrently
        #[arg(long)]
        sequential: bool,

        /// Bypass the catalog cache
        #[arg(long)]
        no_cache: bool,

        /// Suppress progress on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Validate a criteria file without fetching anything
    #[command(after_help = "\
Examples:
  gmselect validate criteria.toml")]
    Validate {
        /// Path to the criteria TOML file
        config: PathBuf,
    },

    /// Download waveform files for previously selected records
    #[command(after_help = "\
Examples:
  gmselect waveforms selected.csv --config criteria.toml
  gmselect waveforms selected.csv --config criteria.toml --dir waveforms/")]
    Waveforms {
        /// CSV of selected records (from `gmselect run --selected-csv`)
        selected: PathBuf,

        /// Criteria TOML file naming the configured sources
        #[arg(long)]
        config: PathBuf,

        /// Directory to extract waveform files into
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Suppress progress on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            hint: None,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, message)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            json,
            output,
            selected_csv,
            sequential,
            no_cache,
            quiet,
        } => run::cmd_run(config, json, output, selected_csv, sequential, no_cache, quiet),
        Commands::Validate { config } => run::cmd_validate(config),
        Commands::Waveforms {
            selected,
            config,
            dir,
            quiet,
        } => waveforms::cmd_waveforms(selected, config, dir, quiet),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = &err.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(err.code)
        }
    }
}
