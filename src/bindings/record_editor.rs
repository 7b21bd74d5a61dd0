//! Key/value record editor model
//!
//! Edits an object as an ordered list of `(key, value)` rows. Rows without
//! a key are drafts: they survive a resync with the bound value but are
//! never emitted.

use serde_json::{Map, Value};
use thiserror::Error;

/// One editable row
pub type Row = (String, Value);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordEditorOptions {
    /// Rows are padded up to this count and cannot be removed below it
    pub min_num: usize,
    /// Only values are editable: no key edits, no adding or removing rows
    pub only_set_value: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordEditorError {
    #[error("record editor only allows setting values")]
    ReadOnlyStructure,

    #[error("row {index} out of range ({len} rows)")]
    NoSuchRow { index: usize, len: usize },

    #[error("cannot drop below {min_num} rows")]
    BelowMinimum { min_num: usize },
}

#[derive(Debug, Clone)]
pub struct RecordEditor {
    options: RecordEditorOptions,
    rows: Vec<Row>,
}

impl RecordEditor {
    pub fn new(value: &Map<String, Value>, options: RecordEditorOptions) -> Self {
        let rows = generate_rows(value, &[], options.min_num);
        Self { options, rows }
    }

    pub fn options(&self) -> RecordEditorOptions {
        self.options
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rebuild rows after the bound value changed, keeping draft rows
    pub fn sync(&mut self, value: &Map<String, Value>) {
        self.rows = generate_rows(value, &self.rows, self.options.min_num);
    }

    pub fn can_remove(&self) -> bool {
        !self.options.only_set_value && self.rows.len() > self.options.min_num
    }

    pub fn add_row(&mut self) -> Result<(), RecordEditorError> {
        if self.options.only_set_value {
            return Err(RecordEditorError::ReadOnlyStructure);
        }
        self.rows.push(empty_row());
        Ok(())
    }

    /// Remove a row and emit the resulting object
    pub fn remove_row(&mut self, index: usize) -> Result<Map<String, Value>, RecordEditorError> {
        if self.options.only_set_value {
            return Err(RecordEditorError::ReadOnlyStructure);
        }
        self.check_index(index)?;
        if !self.can_remove() {
            return Err(RecordEditorError::BelowMinimum {
                min_num: self.options.min_num,
            });
        }
        self.rows.remove(index);
        Ok(self.emit())
    }

    /// Change a key. Nothing is emitted until [`RecordEditor::commit`].
    pub fn edit_key(&mut self, index: usize, key: impl Into<String>) -> Result<(), RecordEditorError> {
        if self.options.only_set_value {
            return Err(RecordEditorError::ReadOnlyStructure);
        }
        self.check_index(index)?;
        self.rows[index].0 = key.into();
        Ok(())
    }

    /// Change a value and emit the resulting object
    pub fn edit_value(
        &mut self,
        index: usize,
        value: Value,
    ) -> Result<Map<String, Value>, RecordEditorError> {
        self.check_index(index)?;
        self.rows[index].1 = value;
        Ok(self.emit())
    }

    /// Emit the current rows (the blur of a key input)
    pub fn commit(&self) -> Map<String, Value> {
        self.emit()
    }

    /// Object of all keyed rows; a later duplicate key wins
    pub fn emit(&self) -> Map<String, Value> {
        self.rows
            .iter()
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<(), RecordEditorError> {
        if index >= self.rows.len() {
            return Err(RecordEditorError::NoSuchRow {
                index,
                len: self.rows.len(),
            });
        }
        Ok(())
    }
}

fn empty_row() -> Row {
    (String::new(), Value::String(String::new()))
}

fn generate_rows(value: &Map<String, Value>, current: &[Row], min_num: usize) -> Vec<Row> {
    let mut rows: Vec<Row> = value.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    rows.extend(current.iter().filter(|(key, _)| key.is_empty()).cloned());
    if rows.len() < min_num {
        rows.resize_with(min_num, empty_row);
    }
    rows
}
