//! Binding-keyed result rows.

use crate::error::{DbError, DbResult};
use crate::value::Value;

/// One result row, labeled with the statement's binding keys.
///
/// Backends hand rows back positionally. The select executor zips each
/// row with the statement's [`keys`](crate::SelectStatement::keys), so
/// callers read values by the names they bound rather than by backend
/// column aliases.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Zip binding keys with positional values. The widths must match.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> DbResult<Self> {
        if columns.len() != values.len() {
            return Err(DbError::ColumnCount {
                expected: columns.len(),
                got: values.len(),
            });
        }
        Ok(Row { columns, values })
    }

    /// The value under a binding key, if that key was selected.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == key)
            .map(|i| &self.values[i])
    }

    /// The value under a binding key, erroring on absent keys.
    pub fn try_get(&self, key: &str) -> DbResult<&Value> {
        self.get(key).ok_or_else(|| DbError::missing_key(key))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
