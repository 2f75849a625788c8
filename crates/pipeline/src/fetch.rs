//! Fetch executors.
//!
//! Two interchangeable implementations of one seam: both invoke every
//! source, attribute each outcome to its source identity, and return the
//! outcomes in configured source order. Only the scheduling differs:
//! concurrent mode launches one thread per source and joins them all,
//! with no early cancellation of slower sources.

use std::thread;

use gmselect_engine::{SearchCriteria, Table};

use crate::source::{DataSource, SourceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    #[default]
    Concurrent,
    Sequential,
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub source: String,
    pub result: Result<Table, SourceError>,
}

pub fn run_fetch(
    sources: &[&dyn DataSource],
    criteria: &SearchCriteria,
    mode: FetchMode,
) -> Vec<FetchOutcome> {
    match mode {
        FetchMode::Sequential => fetch_sequential(sources, criteria),
        FetchMode::Concurrent => fetch_concurrent(sources, criteria),
    }
}

fn fetch_sequential(sources: &[&dyn DataSource], criteria: &SearchCriteria) -> Vec<FetchOutcome> {
    sources
        .iter()
        .map(|source| FetchOutcome {
            source: source.identity().to_string(),
            result: source.fetch(criteria),
        })
        .collect()
}

fn fetch_concurrent(sources: &[&dyn DataSource], criteria: &SearchCriteria) -> Vec<FetchOutcome> {
    thread::scope(|scope| {
        let handles: Vec<(String, thread::ScopedJoinHandle<'_, Result<Table, SourceError>>)> =
            sources
                .iter()
                .map(|source| {
                    let identity = source.identity().to_string();
                    let handle = scope.spawn(move || source.fetch(criteria));
                    (identity, handle)
                })
                .collect();

        handles
            .into_iter()
            .map(|(source, handle)| {
                let result = match handle.join() {
                    Ok(result) => result,
                    Err(_) => Err(SourceError::new(source.clone(), "source task panicked")),
                };
                FetchOutcome { source, result }
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gmselect_engine::Value;

    #[derive(Debug)]
    struct StubSource {
        name: &'static str,
        rows: Option<usize>,
    }

    impl DataSource for StubSource {
        fn identity(&self) -> &str {
            self.name
        }

        fn fetch(&self, _criteria: &SearchCriteria) -> Result<Table, SourceError> {
            match self.rows {
                Some(n) => {
                    let mut table = Table::new(vec!["MAGNITUDE".into()]);
                    for i in 0..n {
                        table.push_row(vec![Value::Number(6.0 + i as f64 * 0.1)]);
                    }
                    Ok(table)
                }
                None => Err(SourceError::new(self.name, "connection refused")),
            }
        }
    }

    fn criteria() -> SearchCriteria {
        SearchCriteria::for_dates(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        )
    }

    #[test]
    fn both_modes_collect_identical_outcome_sets() {
        let a = StubSource { name: "A", rows: Some(3) };
        let b = StubSource { name: "B", rows: None };
        let c = StubSource { name: "C", rows: Some(1) };
        let sources: Vec<&dyn DataSource> = vec![&a, &b, &c];
        let criteria = criteria();

        for mode in [FetchMode::Concurrent, FetchMode::Sequential] {
            let outcomes = run_fetch(&sources, &criteria, mode);
            assert_eq!(outcomes.len(), 3);
            assert_eq!(outcomes[0].source, "A");
            assert_eq!(outcomes[0].result.as_ref().unwrap().n_rows(), 3);
            assert!(outcomes[1].result.is_err());
            assert_eq!(outcomes[2].result.as_ref().unwrap().n_rows(), 1);
        }
    }
}
