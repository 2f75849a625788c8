use crate::criteria::{SearchCriteria, SelectionConfig};
use crate::error::EngineError;
use crate::model::Table;
use crate::{score, select};

/// Design code implemented by the Gaussian strategy.
pub const DESIGN_CODE_TBDY_2018: &str = "TBDY_2018";

/// A configured scoring + selection engine, keyed by design code.
pub trait SelectionStrategy {
    fn name(&self) -> &str;

    /// Score every record and apply the selection rules.
    /// Returns `(selected, scored)`; both empty for an empty input table.
    fn select_and_score(
        &self,
        table: &Table,
        criteria: &SearchCriteria,
        config: &SelectionConfig,
    ) -> Result<(Table, Table), EngineError>;
}

/// TBDY 2018 strategy: Gaussian similarity scoring with greedy
/// diversity-capped selection.
pub struct GaussianStrategy;

impl SelectionStrategy for GaussianStrategy {
    fn name(&self) -> &str {
        "TBDY_2018_Gaussian"
    }

    fn select_and_score(
        &self,
        table: &Table,
        criteria: &SearchCriteria,
        config: &SelectionConfig,
    ) -> Result<(Table, Table), EngineError> {
        if table.is_empty() {
            let empty = Table::new(table.columns().to_vec());
            return Ok((empty.clone(), empty));
        }
        let scored = score::score_table(table, criteria);
        let selected = select::apply_selection_rules(&scored, config);
        Ok((selected, scored))
    }
}

/// Map a design code to its strategy. Unknown codes fail here, before the
/// pipeline starts.
pub fn for_design_code(code: &str) -> Result<Box<dyn SelectionStrategy + Send + Sync>, EngineError> {
    match code {
        DESIGN_CODE_TBDY_2018 => Ok(Box::new(GaussianStrategy)),
        other => Err(EngineError::UnknownDesignCode(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_resolves_tbdy() {
        let strategy = for_design_code(DESIGN_CODE_TBDY_2018).unwrap();
        assert_eq!(strategy.name(), "TBDY_2018_Gaussian");
    }

    #[test]
    fn selector_rejects_unknown_code() {
        assert!(matches!(
            for_design_code("EUROCODE_8"),
            Err(EngineError::UnknownDesignCode(_))
        ));
    }

    #[test]
    fn empty_table_yields_empty_results() {
        use chrono::NaiveDate;
        let criteria = SearchCriteria::for_dates(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        );
        let config = SelectionConfig::default();
        let table = Table::new(vec!["MAGNITUDE".into()]);
        let (selected, scored) = GaussianStrategy
            .select_and_score(&table, &criteria, &config)
            .unwrap();
        assert!(selected.is_empty());
        assert!(scored.is_empty());
    }
}
