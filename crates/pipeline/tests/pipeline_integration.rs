use chrono::NaiveDate;

use gmselect_engine::model::{Table, Value, SCORE_COLUMN};
use gmselect_engine::strategy::{for_design_code, DESIGN_CODE_TBDY_2018};
use gmselect_engine::{SearchCriteria, SelectionConfig};
use gmselect_pipeline::{
    run, run_with_design_code, DataSource, FetchMode, PipelineError, SourceError,
};

// -------------------------------------------------------------------------
// Stub sources
// -------------------------------------------------------------------------

#[derive(Debug)]
struct StubSource {
    name: &'static str,
    table: Option<Table>,
}

impl StubSource {
    fn ok(name: &'static str, table: Table) -> Self {
        Self {
            name,
            table: Some(table),
        }
    }

    fn failing(name: &'static str) -> Self {
        Self { name, table: None }
    }
}

impl DataSource for StubSource {
    fn identity(&self) -> &str {
        self.name
    }

    fn fetch(&self, _criteria: &SearchCriteria) -> Result<Table, SourceError> {
        match &self.table {
            Some(table) => Ok(table.clone()),
            None => Err(SourceError::new(self.name, "HTTP 503 after 3 attempts")),
        }
    }
}

fn catalog(rows: &[(&str, &str, f64)]) -> Table {
    // (station, event, magnitude)
    let mut t = Table::new(vec![
        "PROVIDER".into(),
        "STATION".into(),
        "EVENT".into(),
        "MAGNITUDE".into(),
    ]);
    for (station, event, magnitude) in rows {
        t.push_row(vec![
            Value::Text("STUB".into()),
            Value::Text(station.to_string()),
            Value::Text(event.to_string()),
            Value::Number(*magnitude),
        ]);
    }
    t
}

fn criteria() -> SearchCriteria {
    let mut c = SearchCriteria::for_dates(
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
    );
    c.min_magnitude = Some(6.0);
    c.max_magnitude = Some(7.0);
    c
}

fn selection() -> SelectionConfig {
    SelectionConfig {
        design_code: DESIGN_CODE_TBDY_2018.into(),
        num_records: 10,
        max_per_station: 3,
        max_per_event: 3,
        min_score: 50.0,
    }
}

// -------------------------------------------------------------------------
// Scenarios
// -------------------------------------------------------------------------

#[test]
fn partial_failure_is_tolerated() {
    let a = StubSource::ok(
        "A",
        catalog(&[
            ("s1", "e1", 6.5),
            ("s2", "e1", 6.4),
            ("s3", "e2", 6.6),
            ("s4", "e2", 6.5),
            ("s5", "e3", 6.7),
        ]),
    );
    let b = StubSource::failing("B");
    let sources: Vec<&dyn DataSource> = vec![&a, &b];
    let strategy = for_design_code(DESIGN_CODE_TBDY_2018).unwrap();

    let result = run(
        &sources,
        strategy.as_ref(),
        criteria(),
        selection(),
        FetchMode::Concurrent,
    )
    .unwrap();

    assert_eq!(result.failed_sources, vec!["B".to_string()]);
    assert_eq!(result.scored.n_rows(), 5);
    assert_eq!(result.report.status, "success");
    assert!(result.execution_time >= 0.0);
    assert!(result.logs.iter().any(|l| l.contains("[ERROR]")));
    assert!(result.logs.iter().any(|l| l.contains("[OK] A")));
}

#[test]
fn all_sources_failing_is_fatal() {
    let a = StubSource::failing("A");
    let b = StubSource::failing("B");
    let sources: Vec<&dyn DataSource> = vec![&a, &b];
    let strategy = for_design_code(DESIGN_CODE_TBDY_2018).unwrap();

    let err = run(
        &sources,
        strategy.as_ref(),
        criteria(),
        selection(),
        FetchMode::Concurrent,
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::NoData(_)));
}

#[test]
fn invalid_criteria_fail_before_any_fetch() {
    let a = StubSource::ok("A", catalog(&[("s1", "e1", 6.5)]));
    let sources: Vec<&dyn DataSource> = vec![&a];
    let strategy = for_design_code(DESIGN_CODE_TBDY_2018).unwrap();

    let mut bad = criteria();
    bad.min_magnitude = Some(8.0);
    bad.max_magnitude = Some(6.0);

    let err = run(
        &sources,
        strategy.as_ref(),
        bad,
        selection(),
        FetchMode::Sequential,
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Validation(_)));
}

#[test]
fn unknown_design_code_fails_before_any_stage() {
    let a = StubSource::ok("A", catalog(&[("s1", "e1", 6.5)]));
    let sources: Vec<&dyn DataSource> = vec![&a];

    let mut config = selection();
    config.design_code = "EUROCODE_8".into();

    let err = run_with_design_code(&sources, criteria(), config, FetchMode::Sequential)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Configuration(_)));
}

#[test]
fn impossible_min_score_yields_warning_not_error() {
    let a = StubSource::ok("A", catalog(&[("s1", "e1", 6.5)]));
    let sources: Vec<&dyn DataSource> = vec![&a];
    let strategy = for_design_code(DESIGN_CODE_TBDY_2018).unwrap();

    let mut config = selection();
    config.min_score = 101.0;

    let result = run(
        &sources,
        strategy.as_ref(),
        criteria(),
        config,
        FetchMode::Sequential,
    )
    .unwrap();

    assert!(result.selected.is_empty());
    assert_eq!(result.report.status, "warning");
    assert_eq!(result.report.total_considered, 1);
}

#[test]
fn modes_produce_identical_business_results() {
    let make_sources = || {
        (
            StubSource::ok(
                "A",
                catalog(&[("s1", "e1", 6.5), ("s2", "e2", 6.2)]),
            ),
            StubSource::ok("B", catalog(&[("s3", "e3", 6.9)])),
        )
    };
    let strategy = for_design_code(DESIGN_CODE_TBDY_2018).unwrap();

    let (a, b) = make_sources();
    let sources: Vec<&dyn DataSource> = vec![&a, &b];
    let concurrent = run(
        &sources,
        strategy.as_ref(),
        criteria(),
        selection(),
        FetchMode::Concurrent,
    )
    .unwrap();

    let (a, b) = make_sources();
    let sources: Vec<&dyn DataSource> = vec![&a, &b];
    let sequential = run(
        &sources,
        strategy.as_ref(),
        criteria(),
        selection(),
        FetchMode::Sequential,
    )
    .unwrap();

    assert_eq!(concurrent.scored, sequential.scored);
    assert_eq!(concurrent.selected, sequential.selected);
    assert_eq!(
        concurrent.report.selected_count,
        sequential.report.selected_count
    );
}

#[test]
fn selected_records_keep_score_order_and_caps() {
    let a = StubSource::ok(
        "A",
        catalog(&[
            ("s1", "e1", 6.5),
            ("s1", "e1", 6.5),
            ("s1", "e1", 6.5),
            ("s1", "e1", 6.5),
            ("s2", "e2", 6.1),
        ]),
    );
    let sources: Vec<&dyn DataSource> = vec![&a];
    let strategy = for_design_code(DESIGN_CODE_TBDY_2018).unwrap();

    let result = run(
        &sources,
        strategy.as_ref(),
        criteria(),
        selection(),
        FetchMode::Sequential,
    )
    .unwrap();

    // station cap 3 drops the fourth s1 record
    let s1_count = (0..result.selected.n_rows())
        .filter(|&r| result.selected.key(r, "STATION") == "s1")
        .count();
    assert_eq!(s1_count, 3);

    for row in 1..result.selected.n_rows() {
        assert!(
            result.selected.number(row - 1, SCORE_COLUMN).unwrap()
                >= result.selected.number(row, SCORE_COLUMN).unwrap()
        );
    }
}
