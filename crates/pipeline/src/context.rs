use std::time::Instant;

use gmselect_engine::{SearchCriteria, Table};

/// Mutable state of one pipeline run. Owned exclusively by that run and
/// moved from stage to stage; never aliased across concurrent runs.
#[derive(Debug)]
pub struct PipelineContext {
    pub criteria: SearchCriteria,
    /// Per-source tables collected by the fetch stage.
    pub tables: Vec<Table>,
    pub combined: Option<Table>,
    pub scored: Option<Table>,
    pub selected: Option<Table>,
    /// Identities of sources whose fetch failed (non-fatal).
    pub failed_sources: Vec<String>,
    /// Ordered human-readable stage events.
    pub logs: Vec<String>,
    pub started: Instant,
}

impl PipelineContext {
    pub fn new(criteria: SearchCriteria) -> Self {
        Self {
            criteria,
            tables: Vec::new(),
            combined: None,
            scored: None,
            selected: None,
            failed_sources: Vec::new(),
            logs: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }
}
