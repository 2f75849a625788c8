use serde::Serialize;

use gmselect_engine::model::SCORE_COLUMN;
use gmselect_engine::{SearchCriteria, SelectionConfig, Table};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReportStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnitude_range: Option<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_range: Option<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_range: Option<(f64, f64)>,
}

/// Human- and machine-readable run summary, echoing the request.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// "success", or "warning" when nothing was selected.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub strategy: String,
    pub sources: Vec<String>,
    pub selected_count: usize,
    pub total_considered: usize,
    pub criteria: SearchCriteria,
    pub selection: SelectionConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ReportStatistics>,
}

/// (min, max) over a numeric column, ignoring non-numbers. None when the
/// column is absent or holds no numbers.
fn column_range(table: &Table, column: &str) -> Option<(f64, f64)> {
    table.column_index(column)?;
    let mut range: Option<(f64, f64)> = None;
    for row in 0..table.n_rows() {
        if let Some(value) = table.number(row, column) {
            range = Some(match range {
                Some((lo, hi)) => (lo.min(value), hi.max(value)),
                None => (value, value),
            });
        }
    }
    range
}

pub fn build_report(
    selected: &Table,
    scored: &Table,
    criteria: &SearchCriteria,
    selection: &SelectionConfig,
    strategy_name: &str,
    sources: &[String],
) -> Report {
    let (status, message, statistics) = if selected.is_empty() {
        (
            "warning".to_string(),
            Some("no records selected".to_string()),
            None,
        )
    } else {
        (
            "success".to_string(),
            None,
            Some(ReportStatistics {
                magnitude_range: column_range(selected, "MAGNITUDE"),
                distance_range: column_range(selected, "RJB(km)"),
                score_range: column_range(selected, SCORE_COLUMN),
            }),
        )
    };

    Report {
        status,
        message,
        strategy: strategy_name.to_string(),
        sources: sources.to_vec(),
        selected_count: selected.n_rows(),
        total_considered: scored.n_rows(),
        criteria: criteria.clone(),
        selection: selection.clone(),
        statistics,
    }
}

// ---------------------------------------------------------------------------
// Pipeline result
// ---------------------------------------------------------------------------

/// The complete outcome of one run. Created once, at the end; immutable
/// thereafter. Never returned partially: a failed run yields an error
/// instead.
#[derive(Debug)]
pub struct PipelineResult {
    pub selected: Table,
    pub scored: Table,
    pub report: Report,
    /// Elapsed wall-clock seconds.
    pub execution_time: f64,
    pub failed_sources: Vec<String>,
    pub logs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gmselect_engine::Value;

    fn criteria() -> SearchCriteria {
        SearchCriteria::for_dates(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        )
    }

    fn scored_table() -> Table {
        let mut t = Table::new(vec!["MAGNITUDE".into(), SCORE_COLUMN.into()]);
        t.push_row(vec![Value::Number(6.1), Value::Number(88.0)]);
        t.push_row(vec![Value::Number(7.2), Value::Number(64.0)]);
        t
    }

    #[test]
    fn success_report_carries_ranges() {
        let scored = scored_table();
        let report = build_report(
            &scored,
            &scored,
            &criteria(),
            &SelectionConfig::default(),
            "TBDY_2018_Gaussian",
            &["AFAD".into(), "PEER".into()],
        );
        assert_eq!(report.status, "success");
        assert_eq!(report.selected_count, 2);
        let stats = report.statistics.unwrap();
        assert_eq!(stats.magnitude_range, Some((6.1, 7.2)));
        assert_eq!(stats.score_range, Some((64.0, 88.0)));
        assert_eq!(stats.distance_range, None);
    }

    #[test]
    fn empty_selection_yields_warning() {
        let scored = scored_table();
        let empty = Table::new(scored.columns().to_vec());
        let report = build_report(
            &empty,
            &scored,
            &criteria(),
            &SelectionConfig::default(),
            "TBDY_2018_Gaussian",
            &[],
        );
        assert_eq!(report.status, "warning");
        assert_eq!(report.selected_count, 0);
        assert_eq!(report.total_considered, 2);
        assert!(report.statistics.is_none());
    }
}
