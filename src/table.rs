use std::collections::HashMap;
use std::path::Path;

use crate::error::GustError;

/// Rectangular text table: a header row naming the columns plus zero or
/// more data rows. Every value is kept as text — no type inference.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, GustError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(GustError::Configuration(format!(
                    "row {i} has {} fields, expected {}",
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Load a table from a delimited file. The first record is the header;
    /// quoted fields may contain commas, doubled quotes, and newlines.
    /// An empty table (no header or no data rows) is a configuration error.
    pub fn load_csv(path: &Path) -> Result<Self, GustError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GustError::Configuration(format!("failed to load table {}: {e}", path.display()))
        })?;
        let mut records = parse_csv(&raw);
        if records.is_empty() {
            return Err(GustError::Configuration(format!(
                "table {} has no header row",
                path.display()
            )));
        }
        let columns = records.remove(0);
        if records.is_empty() {
            return Err(GustError::Configuration(format!(
                "table {} has no data rows",
                path.display()
            )));
        }
        Self::new(columns, records)
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), GustError> {
        let mut out = String::new();
        write_record(&mut out, &self.columns);
        for row in &self.rows {
            write_record(&mut out, row);
        }
        std::fs::write(path, out).map_err(|e| {
            GustError::Configuration(format!("failed to write table {}: {e}", path.display()))
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row `i` as a column-name → value map.
    pub fn fields(&self, i: usize) -> HashMap<String, String> {
        self.columns
            .iter()
            .cloned()
            .zip(self.rows[i].iter().cloned())
            .collect()
    }

    pub fn value(&self, i: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(&self.rows[i][idx])
    }

    /// Append `values` as a new column. A name collision drops the old
    /// column: the prior values are overwritten, never merged.
    pub fn with_column(mut self, name: &str, values: Vec<String>) -> Result<Self, GustError> {
        if values.len() != self.rows.len() {
            return Err(GustError::Configuration(format!(
                "column {name} has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        if let Some(idx) = self.columns.iter().position(|c| c == name) {
            self.columns.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(self)
    }
}

fn parse_csv(raw: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // Distinguishes a blank line from a quoted empty field (`""`), which
    // is a legitimate one-column record and must be kept.
    let mut saw_quote = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                saw_quote = true;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if record.is_empty() && field.is_empty() && !saw_quote {
                    // genuinely blank line
                } else {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                saw_quote = false;
            }
            _ => field.push(c),
        }
    }
    // Final record without a trailing newline
    if !field.is_empty() || !record.is_empty() || saw_quote {
        record.push(field);
        records.push(record);
    }
    records
}

fn write_record(out: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}
