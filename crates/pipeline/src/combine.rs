//! Combine stage: merge fetched per-source tables into one working table.
//!
//! Rules, in order: drop all-null columns within each source table (a
//! source must not force null columns onto the others), concatenate
//! row-wise with column union, drop columns that are all-null across the
//! combined set, then fill remaining nulls (0 for numeric columns, empty
//! string for text). Never reorders or deduplicates records.

use gmselect_engine::Table;

use crate::error::PipelineError;

pub fn combine_tables(tables: Vec<Table>) -> Result<Table, PipelineError> {
    let mut usable = Vec::new();
    for mut table in tables {
        if table.is_empty() {
            continue;
        }
        table.drop_all_null_columns();
        if table.n_cols() == 0 {
            continue;
        }
        usable.push(table);
    }

    if usable.is_empty() {
        return Err(PipelineError::NoData(
            "no usable source tables to combine".into(),
        ));
    }

    let mut combined = Table::concat(usable);
    combined.drop_all_null_columns();
    if combined.is_empty() || combined.n_cols() == 0 {
        return Err(PipelineError::NoData(
            "nothing survived concatenation".into(),
        ));
    }

    combined.fill_nulls();
    Ok(combined)
}
