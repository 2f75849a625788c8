use std::fmt;

use chrono::NaiveDate;

#[derive(Debug)]
pub enum EngineError {
    /// TOML parse / deserialization error.
    CriteriaParse(String),
    /// A [min,max] pair with min > max.
    InvertedRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    /// A bound outside the parameter's physically valid domain.
    OutOfDomain {
        field: &'static str,
        value: f64,
        lo: f64,
        hi: f64,
    },
    /// Start date after end date.
    DateOrder { start: NaiveDate, end: NaiveDate },
    /// Malformed geographic bounding box.
    BoundingBox(String),
    /// Mechanism label outside the known set.
    UnknownMechanism(String),
    /// No strategy is registered for the design code.
    UnknownDesignCode(String),
    /// CSV encode/decode error.
    Csv(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CriteriaParse(msg) => write!(f, "criteria parse error: {msg}"),
            Self::InvertedRange { field, min, max } => {
                write!(f, "{field}: min {min} exceeds max {max}")
            }
            Self::OutOfDomain { field, value, lo, hi } => {
                write!(f, "{field}: {value} outside valid domain [{lo}, {hi}]")
            }
            Self::DateOrder { start, end } => {
                write!(f, "start date {start} is after end date {end}")
            }
            Self::BoundingBox(msg) => write!(f, "invalid bounding box: {msg}"),
            Self::UnknownMechanism(label) => write!(f, "unknown mechanism: '{label}'"),
            Self::UnknownDesignCode(code) => write!(f, "unknown design code: '{code}'"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
