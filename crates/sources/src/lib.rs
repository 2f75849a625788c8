//! `gmselect-sources` — catalog data source adapters.
//!
//! Each adapter implements [`gmselect_pipeline::DataSource`]: it
//! translates generic criteria into its native query shape, fetches, and
//! returns a table coerced onto the standard column schema. A file-backed
//! cache can wrap any adapter.

pub mod afad;
pub mod cache;
mod http;
pub mod mapper;
pub mod mechanism;
pub mod peer;

pub use afad::{AfadSource, AFAD_SOURCE_NAME};
pub use cache::{CachedSource, TableCache};
pub use peer::{PeerSource, PEER_SOURCE_NAME};
