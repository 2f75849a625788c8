//! `gmselect-engine` — ground-motion record scoring and selection.
//!
//! Pure engine crate: receives pre-fetched catalog tables, returns scored
//! and selected tables. No network or file I/O.

pub mod criteria;
pub mod error;
pub mod model;
pub mod registry;
pub mod score;
pub mod select;
pub mod strategy;

pub use criteria::{SearchCriteria, SelectionConfig, SelectionRequest, Weights};
pub use error::EngineError;
pub use model::{Table, Value};
pub use strategy::{for_design_code, SelectionStrategy};
