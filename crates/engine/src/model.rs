use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A single cell of the working table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text form used for grouping keys (station / event counts) and CSV output.
    pub fn key_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Number(n) => format!("{n}"),
            Value::Text(s) => s.clone(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

// ---------------------------------------------------------------------------
// Standard column registry
// ---------------------------------------------------------------------------

/// Column kind drives the null-fill rule when combining source tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

/// The unified catalog schema every source is coerced onto.
pub const STANDARD_COLUMNS: &[(&str, ColumnKind)] = &[
    ("PROVIDER", ColumnKind::Text),
    ("RSN", ColumnKind::Numeric),
    ("EVENT", ColumnKind::Text),
    ("YEAR", ColumnKind::Numeric),
    ("MAGNITUDE", ColumnKind::Numeric),
    ("MAGNITUDE_TYPE", ColumnKind::Text),
    ("STATION", ColumnKind::Text),
    ("SSN", ColumnKind::Text),
    ("STATION_ID", ColumnKind::Text),
    ("STATION_LAT", ColumnKind::Numeric),
    ("STATION_LON", ColumnKind::Numeric),
    ("VS30(m/s)", ColumnKind::Numeric),
    ("STRIKE1", ColumnKind::Numeric),
    ("DIP1", ColumnKind::Numeric),
    ("RAKE1", ColumnKind::Numeric),
    ("MECHANISM", ColumnKind::Text),
    ("EPICENTER_DEPTH(km)", ColumnKind::Numeric),
    ("HYPOCENTER_DEPTH(km)", ColumnKind::Numeric),
    ("RJB(km)", ColumnKind::Numeric),
    ("RRUP(km)", ColumnKind::Numeric),
    ("REPI(km)", ColumnKind::Numeric),
    ("RHYP(km)", ColumnKind::Numeric),
    ("HYPO_LAT", ColumnKind::Numeric),
    ("HYPO_LON", ColumnKind::Numeric),
    ("HYPO_DEPTH(km)", ColumnKind::Numeric),
    ("T90_avg(sec)", ColumnKind::Numeric),
    ("ARIAS_INTENSITY(m/sec)", ColumnKind::Numeric),
    ("LOWFREQ(Hz)", ColumnKind::Numeric),
    ("FILE_NAME_H1", ColumnKind::Text),
    ("FILE_NAME_H2", ColumnKind::Text),
    ("FILE_NAME_V", ColumnKind::Text),
    ("PGA(cm2/sec)", ColumnKind::Numeric),
    ("PGV(cm/sec)", ColumnKind::Numeric),
    ("PGD(cm)", ColumnKind::Numeric),
];

/// Name of the score column appended by the scoring engine.
pub const SCORE_COLUMN: &str = "SCORE";

/// Kind of a standard column, if known.
pub fn standard_column_kind(name: &str) -> Option<ColumnKind> {
    if name == SCORE_COLUMN {
        return Some(ColumnKind::Numeric);
    }
    STANDARD_COLUMNS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, k)| *k)
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// A small row-major table: ordered column names + rows of [`Value`]s.
///
/// Rows always have exactly one value per column. Records are unique only by
/// their (PROVIDER, RSN) pair; the table itself never deduplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row, padding or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        self.value(row, column).and_then(Value::as_number)
    }

    /// Grouping key for a row value: empty string when the column is absent.
    pub fn key(&self, row: usize, column: &str) -> String {
        self.value(row, column)
            .map(Value::key_string)
            .unwrap_or_default()
    }

    /// Rename columns in place per a `(from, to)` mapping table.
    pub fn rename_columns(&mut self, mapping: &[(&str, &str)]) {
        for column in &mut self.columns {
            if let Some((_, to)) = mapping.iter().find(|(from, _)| *from == column.as_str()) {
                *column = (*to).to_string();
            }
        }
    }

    /// True when the column holds no non-null value. Vacuously false for a
    /// table without rows.
    pub fn is_column_all_null(&self, idx: usize) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|r| r[idx].is_null())
    }

    /// Drop every all-null column, keeping column order otherwise.
    pub fn drop_all_null_columns(&mut self) {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !self.is_column_all_null(i))
            .collect();
        if keep.len() == self.columns.len() {
            return;
        }
        self.columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            *row = keep.iter().map(|&i| row[i].clone()).collect();
        }
    }

    /// Fill remaining nulls: numeric columns get 0, text columns get "".
    /// Unknown columns fall back to inspecting their non-null values.
    pub fn fill_nulls(&mut self) {
        let kinds: Vec<ColumnKind> = (0..self.columns.len())
            .map(|i| {
                standard_column_kind(&self.columns[i]).unwrap_or_else(|| self.infer_kind(i))
            })
            .collect();
        for row in &mut self.rows {
            for (i, value) in row.iter_mut().enumerate() {
                if value.is_null() {
                    *value = match kinds[i] {
                        ColumnKind::Numeric => Value::Number(0.0),
                        ColumnKind::Text => Value::Text(String::new()),
                    };
                }
            }
        }
    }

    fn infer_kind(&self, idx: usize) -> ColumnKind {
        for row in &self.rows {
            match &row[idx] {
                Value::Number(_) => return ColumnKind::Numeric,
                Value::Text(_) => return ColumnKind::Text,
                Value::Null => continue,
            }
        }
        ColumnKind::Numeric
    }

    /// Row-wise concatenation with column union (first-seen column order).
    /// Rows keep their per-table order; missing columns become null.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut combined = Table::new(columns);
        for table in tables {
            let indices: Vec<Option<usize>> = combined
                .columns
                .iter()
                .map(|c| table.column_index(c))
                .collect();
            for row in table.rows {
                let new_row: Vec<Value> = indices
                    .iter()
                    .map(|idx| idx.map_or(Value::Null, |i| row[i].clone()))
                    .collect();
                combined.rows.push(new_row);
            }
        }
        combined
    }

    /// New table containing the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Transform every value of one column in place. No-op when the column
    /// is absent.
    pub fn map_column(&mut self, column: &str, mut f: impl FnMut(Value) -> Value) {
        if let Some(idx) = self.column_index(column) {
            for row in &mut self.rows {
                let value = std::mem::take(&mut row[idx]);
                row[idx] = f(value);
            }
        }
    }

    /// Append a column; `values` must cover every row (padded with null).
    pub fn append_column(&mut self, name: &str, mut values: Vec<Value>) {
        values.resize(self.rows.len(), Value::Null);
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    // -- CSV (string-level, no file I/O) --------------------------------

    /// Parse CSV text: header row becomes the column list; cells that parse
    /// as f64 become numbers, empty cells become null, the rest text.
    pub fn from_csv(data: &str) -> Result<Table, EngineError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data.as_bytes());

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| EngineError::Csv(e.to_string()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut table = Table::new(columns);
        for record in reader.records() {
            let record = record.map_err(|e| EngineError::Csv(e.to_string()))?;
            let row: Vec<Value> = record
                .iter()
                .map(|cell| {
                    if cell.is_empty() {
                        Value::Null
                    } else if let Ok(n) = cell.parse::<f64>() {
                        Value::Number(n)
                    } else {
                        Value::Text(cell.to_string())
                    }
                })
                .collect();
            table.push_row(row);
        }
        Ok(table)
    }

    /// Serialize to CSV text (header always written, nulls as empty cells).
    pub fn to_csv(&self) -> Result<String, EngineError> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer
            .write_record(&self.columns)
            .map_err(|e| EngineError::Csv(e.to_string()))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(Value::key_string).collect();
            writer
                .write_record(&cells)
                .map_err(|e| EngineError::Csv(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| EngineError::Csv(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| EngineError::Csv(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
