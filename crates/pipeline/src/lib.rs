//! `gmselect-pipeline` — multi-source record selection pipeline.
//!
//! Orchestrates fetch (concurrent or sequential), combine, and
//! score-and-select over [`DataSource`] implementations, with per-source
//! failure tolerance: a run fails only when every source fails. All
//! cross-stage error propagation goes through `Result`.

pub mod combine;
pub mod context;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod report;
pub mod source;

pub use context::PipelineContext;
pub use error::PipelineError;
pub use fetch::FetchMode;
pub use orchestrator::{run, run_with_design_code};
pub use report::{PipelineResult, Report};
pub use source::{DataSource, SourceError};
