//! File-backed catalog cache.
//!
//! One JSON file per (source identity, criteria) digest. Entries older
//! than the expiry are deleted on read. The cache is a pure acceleration
//! layer: read errors fall through to the wrapped source, and concurrent
//! identical requests may each miss and re-fetch (an accepted race).

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use gmselect_engine::{SearchCriteria, Table};
use gmselect_pipeline::{DataSource, SourceError};
use sha2::{Digest, Sha256};

#[derive(Debug)]
pub struct TableCache {
    dir: PathBuf,
    expiry: Duration,
}

impl TableCache {
    pub fn new(dir: impl Into<PathBuf>, expiry_hours: u64) -> Self {
        Self {
            dir: dir.into(),
            expiry: Duration::from_secs(expiry_hours * 3600),
        }
    }

    fn entry_path(&self, source: &str, criteria: &SearchCriteria) -> PathBuf {
        let criteria_json = serde_json::to_string(criteria).unwrap_or_default();
        let digest = Sha256::digest(format!("{source}_{criteria_json}").as_bytes());
        self.dir.join(format!("{digest:x}.json"))
    }

    pub fn get(&self, source: &str, criteria: &SearchCriteria) -> Option<Table> {
        let path = self.entry_path(source, criteria);
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;

        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age >= self.expiry {
            let _ = fs::remove_file(&path);
            return None;
        }

        let data = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&data) {
            Ok(table) => Some(table),
            Err(e) => {
                eprintln!("warning: discarding unreadable cache entry {}: {e}", path.display());
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Best-effort write; empty tables are not cached.
    pub fn set(&self, source: &str, criteria: &SearchCriteria, table: &Table) {
        if table.is_empty() {
            return;
        }
        if let Err(e) = fs::create_dir_all(&self.dir) {
            eprintln!("warning: cannot create cache dir {}: {e}", self.dir.display());
            return;
        }
        let path = self.entry_path(source, criteria);
        match serde_json::to_string(table) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    eprintln!("warning: cache write failed for {}: {e}", path.display());
                }
            }
            Err(e) => eprintln!("warning: cache encode failed: {e}"),
        }
    }
}

/// Wraps any source with read-then-write caching.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    cache: TableCache,
}

impl<S: DataSource> CachedSource<S> {
    pub fn new(inner: S, cache: TableCache) -> Self {
        Self { inner, cache }
    }
}

impl<S: DataSource> DataSource for CachedSource<S> {
    fn identity(&self) -> &str {
        self.inner.identity()
    }

    fn fetch(&self, criteria: &SearchCriteria) -> Result<Table, SourceError> {
        if let Some(table) = self.cache.get(self.inner.identity(), criteria) {
            return Ok(table);
        }
        let table = self.inner.fetch(criteria)?;
        self.cache.set(self.inner.identity(), criteria, &table);
        Ok(table)
    }

    fn download_artifact(&self, file_name: &str) -> Result<bool, SourceError> {
        self.inner.download_artifact(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gmselect_engine::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn criteria() -> SearchCriteria {
        SearchCriteria::for_dates(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        )
    }

    fn one_row_table() -> Table {
        let mut t = Table::new(vec!["MAGNITUDE".into()]);
        t.push_row(vec![Value::Number(6.5)]);
        t
    }

    #[derive(Debug)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    impl DataSource for CountingSource {
        fn identity(&self) -> &str {
            "COUNTING"
        }

        fn fetch(&self, _criteria: &SearchCriteria) -> Result<Table, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(one_row_table())
        }
    }

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path(), 24);
        let c = criteria();

        assert!(cache.get("AFAD", &c).is_none());
        cache.set("AFAD", &c, &one_row_table());
        let cached = cache.get("AFAD", &c).unwrap();
        assert_eq!(cached.number(0, "MAGNITUDE"), Some(6.5));
    }

    #[test]
    fn keyed_by_source_and_criteria() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path(), 24);
        let c = criteria();
        cache.set("AFAD", &c, &one_row_table());

        assert!(cache.get("PEER", &c).is_none());
        let mut other = c.clone();
        other.min_magnitude = Some(5.0);
        assert!(cache.get("AFAD", &other).is_none());
    }

    #[test]
    fn expired_entries_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path(), 0); // everything expires immediately
        let c = criteria();
        cache.set("AFAD", &c, &one_row_table());
        assert!(cache.get("AFAD", &c).is_none());
    }

    #[test]
    fn empty_tables_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path(), 24);
        let c = criteria();
        cache.set("AFAD", &c, &Table::new(vec!["MAGNITUDE".into()]));
        assert!(cache.get("AFAD", &c).is_none());
    }

    #[test]
    fn cached_source_fetches_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = CachedSource::new(
            CountingSource { calls: AtomicUsize::new(0) },
            TableCache::new(dir.path(), 24),
        );
        let c = criteria();

        source.fetch(&c).unwrap();
        source.fetch(&c).unwrap();
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 1);
    }
}
