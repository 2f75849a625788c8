//! Column mapping onto the standard catalog schema.
//!
//! Every adapter emits tables conforming to the standard column set;
//! downstream combining, scoring, and selection depend on it. Adapters
//! rename their native fields via a static `(from, to)` table, then coerce
//! onto the standard schema: missing standard columns become null, columns
//! outside the schema are dropped, and the PROVIDER column is stamped with
//! the adapter identity.

use gmselect_engine::model::{Table, Value, STANDARD_COLUMNS};

/// Project a renamed table onto the standard schema, stamping PROVIDER.
pub fn to_standard_schema(table: &Table, provider: &str) -> Table {
    let columns: Vec<String> = STANDARD_COLUMNS
        .iter()
        .map(|(name, _)| name.to_string())
        .collect();
    let indices: Vec<Option<usize>> = STANDARD_COLUMNS
        .iter()
        .map(|(name, _)| table.column_index(name))
        .collect();

    let mut standard = Table::new(columns);
    for row in 0..table.n_rows() {
        let values: Vec<Value> = STANDARD_COLUMNS
            .iter()
            .zip(&indices)
            .map(|((name, _), idx)| match (*name, idx) {
                ("PROVIDER", _) => Value::Text(provider.to_string()),
                (_, Some(i)) => table.rows()[row][*i].clone(),
                (_, None) => Value::Null,
            })
            .collect();
        standard.push_row(values);
    }
    standard
}
