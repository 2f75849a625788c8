use std::fmt;

use gmselect_engine::{SearchCriteria, Table};

/// One independent origin of ground-motion record data.
///
/// Implementations translate the generic criteria into their native query
/// shape internally, fetch, and return a table already coerced onto the
/// standard column schema with a PROVIDER column stamped. Each carries its
/// own request timeout; a timed-out source is an ordinary recorded failure.
pub trait DataSource: Send + Sync + fmt::Debug {
    /// Stable identity used in logs, the report, and cache keys.
    fn identity(&self) -> &str;

    /// Fetch a normalized catalog table for the criteria.
    fn fetch(&self, criteria: &SearchCriteria) -> Result<Table, SourceError>;

    /// Download a single waveform artifact by file name. Sources without
    /// waveform files report a typed failure.
    fn download_artifact(&self, _file_name: &str) -> Result<bool, SourceError> {
        Err(SourceError::unsupported(self.identity()))
    }
}

/// A single adapter's transport or parsing failure. Non-fatal to the
/// pipeline unless every source fails.
#[derive(Debug, Clone)]
pub struct SourceError {
    pub source: String,
    pub message: String,
}

impl SourceError {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(source: &str) -> Self {
        Self::new(source, "waveform download not supported")
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

impl std::error::Error for SourceError {}
