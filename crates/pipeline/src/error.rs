use std::fmt;

use gmselect_engine::EngineError;

#[derive(Debug)]
pub enum PipelineError {
    /// Malformed or contradictory criteria, caught before any I/O.
    Validation(EngineError),
    /// Unknown strategy / design code, caught before the pipeline starts.
    Configuration(String),
    /// Every source failed, or combining left nothing usable.
    NoData(String),
    /// Scoring or selection failed internally.
    Strategy(EngineError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "criteria validation failed: {err}"),
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::NoData(msg) => write!(f, "no data: {msg}"),
            Self::Strategy(err) => write!(f, "strategy failed: {err}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) | Self::Strategy(err) => Some(err),
            _ => None,
        }
    }
}
