//! Similarity scoring.
//!
//! Each record is scored 0-100 against the criteria's effective targets by
//! iterating the scoring registry: Gaussian similarity for numeric
//! parameters, label matching for the fault mechanism. Parameters with no
//! target, no record value, or a non-positive weight drop out of both the
//! numerator and the weight sum, so scores stay comparable across records
//! with different field coverage.

use crate::criteria::SearchCriteria;
use crate::model::{Table, Value, SCORE_COLUMN};
use crate::registry::{ParamKind, SCORING_REGISTRY};

/// Gaussian similarity: 1.0 at the target, decaying smoothly with distance.
/// `exp(-(value - target)^2 / (2 sigma^2))`
pub fn gaussian_similarity(value: f64, target: f64, sigma: f64) -> f64 {
    let diff = value - target;
    (-(diff * diff) / (2.0 * sigma * sigma)).exp()
}

/// Label similarity: exact match 1.0; an accepted label contained in a
/// compound record label (e.g. "Reverse" in "Reverse-Oblique") 0.7; else 0.
pub fn categorical_similarity(record_label: &str, accepted: &[String]) -> f64 {
    if record_label.is_empty() || accepted.is_empty() {
        return 0.0;
    }
    if accepted.iter().any(|a| a == record_label) {
        return 1.0;
    }
    if accepted.iter().any(|a| record_label.contains(a.as_str())) {
        return 0.7;
    }
    0.0
}

/// Score one row of the table. Returns 0 when no parameter is active.
pub fn score_record(table: &Table, row: usize, criteria: &SearchCriteria) -> f64 {
    let mut weighted_sum = 0.0;
    let mut active_weight = 0.0;

    for spec in SCORING_REGISTRY {
        let weight = criteria.weights.get(spec.key);
        if weight <= 0.0 {
            continue;
        }

        let similarity = match spec.kind {
            ParamKind::Categorical => {
                if criteria.mechanisms.is_empty() {
                    continue;
                }
                let label = match table.value(row, spec.column) {
                    Some(Value::Text(s)) if !s.is_empty() => s.as_str(),
                    _ => continue,
                };
                categorical_similarity(label, &criteria.mechanisms)
            }
            ParamKind::Numeric => {
                let target = match criteria.effective_target(spec.key) {
                    Some(t) => t,
                    None => continue,
                };
                let value = match table.value(row, spec.column) {
                    Some(Value::Number(n)) => *n,
                    _ => continue,
                };
                gaussian_similarity(value, target, criteria.sigma(spec.key))
            }
        };

        weighted_sum += similarity * weight;
        active_weight += weight;
    }

    if active_weight == 0.0 {
        0.0
    } else {
        weighted_sum / active_weight * 100.0
    }
}

/// Score every row and return a copy of the table with a SCORE column.
pub fn score_table(table: &Table, criteria: &SearchCriteria) -> Table {
    let scores: Vec<Value> = (0..table.n_rows())
        .map(|row| Value::Number(score_record(table, row, criteria)))
        .collect();
    let mut scored = table.clone();
    scored.append_column(SCORE_COLUMN, scores);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn criteria() -> SearchCriteria {
        SearchCriteria::for_dates(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        )
    }

    fn one_row(columns: &[(&str, Value)]) -> Table {
        let mut t = Table::new(columns.iter().map(|(c, _)| c.to_string()).collect());
        t.push_row(columns.iter().map(|(_, v)| v.clone()).collect());
        t
    }

    #[test]
    fn gaussian_peaks_at_target() {
        assert!((gaussian_similarity(6.5, 6.5, 0.25) - 1.0).abs() < 1e-12);
        assert!(gaussian_similarity(7.5, 6.5, 0.25) < 0.001);
    }

    #[test]
    fn categorical_exact_partial_none() {
        let accepted = vec!["Reverse".to_string()];
        assert_eq!(categorical_similarity("Reverse", &accepted), 1.0);
        assert_eq!(categorical_similarity("Reverse-Oblique", &accepted), 0.7);
        assert_eq!(categorical_similarity("Normal", &accepted), 0.0);
        assert_eq!(categorical_similarity("", &accepted), 0.0);
        assert_eq!(categorical_similarity("Reverse", &[]), 0.0);
    }

    #[test]
    fn exact_match_on_every_active_parameter_scores_100() {
        let mut c = criteria();
        c.target_magnitude = Some(7.0);
        c.target_vs30 = Some(400.0);
        c.mechanisms = vec!["StrikeSlip".into()];
        let t = one_row(&[
            ("MAGNITUDE", Value::Number(7.0)),
            ("VS30(m/s)", Value::Number(400.0)),
            ("MECHANISM", Value::Text("StrikeSlip".into())),
        ]);
        let score = score_record(&t, 0, &c);
        assert!((score - 100.0).abs() < 1e-9, "score = {score}");
    }

    #[test]
    fn no_active_parameter_scores_zero() {
        let c = criteria();
        let t = one_row(&[("MAGNITUDE", Value::Number(7.0))]);
        assert_eq!(score_record(&t, 0, &c), 0.0);
    }

    #[test]
    fn missing_record_value_drops_parameter() {
        let mut c = criteria();
        c.target_magnitude = Some(7.0);
        c.target_vs30 = Some(400.0);
        // no VS30 column at all: only magnitude participates
        let t = one_row(&[("MAGNITUDE", Value::Number(7.0))]);
        assert!((score_record(&t, 0, &c) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_weight_removes_parameter_from_score() {
        let mut c = criteria();
        c.target_magnitude = Some(5.0);
        c.target_vs30 = Some(400.0);
        c.weights.magnitude = 0.0;
        // magnitude is far off target but weightless; vs30 is exact
        let t = one_row(&[
            ("MAGNITUDE", Value::Number(9.0)),
            ("VS30(m/s)", Value::Number(400.0)),
        ]);
        assert!((score_record(&t, 0, &c) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn score_always_within_bounds() {
        let mut c = criteria();
        c.target_magnitude = Some(6.0);
        c.mechanisms = vec!["Normal".into()];
        for (mag, mech) in [
            (0.0, "StrikeSlip"),
            (6.0, "Normal"),
            (10.0, "Normal-Oblique"),
        ] {
            let t = one_row(&[
                ("MAGNITUDE", Value::Number(mag)),
                ("MECHANISM", Value::Text(mech.into())),
            ]);
            let score = score_record(&t, 0, &c);
            assert!((0.0..=100.0).contains(&score), "score = {score}");
        }
    }

    #[test]
    fn score_table_appends_score_column() {
        let mut c = criteria();
        c.target_magnitude = Some(7.0);
        let t = one_row(&[("MAGNITUDE", Value::Number(7.0))]);
        let scored = score_table(&t, &c);
        assert_eq!(scored.n_cols(), t.n_cols() + 1);
        assert!((scored.number(0, SCORE_COLUMN).unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn scores_are_deterministic() {
        let mut c = criteria();
        c.min_magnitude = Some(6.0);
        c.max_magnitude = Some(7.0);
        c.mechanisms = vec!["Reverse".into()];
        let t = one_row(&[
            ("MAGNITUDE", Value::Number(6.8)),
            ("MECHANISM", Value::Text("Reverse-Oblique".into())),
        ]);
        let a = score_record(&t, 0, &c);
        let b = score_record(&t, 0, &c);
        assert_eq!(a, b);
    }
}
