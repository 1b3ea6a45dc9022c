//! UPDATE statement template.

use crate::error::{DbError, DbResult};
use crate::marker::Marker;
use crate::predicate::Predicate;
use crate::statement::BuiltQuery;
use crate::value::Bindings;
use crate::writer::QueryWriter;

/// A reusable UPDATE template.
///
/// Unbounded updates are refused: a template without a where-clause fails
/// to render with [`DbError::MissingPredicate`].
#[derive(Clone, Debug, Default)]
pub struct UpdateStatement {
    pub table: String,
    pub fields: Vec<Marker>,
    pub where_clause: Option<Predicate>,
}

impl UpdateStatement {
    pub fn new(table: impl Into<String>) -> Self {
        UpdateStatement {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn field(mut self, field: Marker) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Marker>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn where_clause(mut self, clause: Predicate) -> Self {
        self.where_clause = Some(clause);
        self
    }

    /// Render the statement against a binding map. SET values redeem
    /// first, then the where-clause, so placeholders number left to right.
    pub fn build(&self, bindings: &Bindings) -> DbResult<BuiltQuery> {
        if self.fields.is_empty() {
            return Err(DbError::NoMarkers);
        }
        let Some(clause) = &self.where_clause else {
            return Err(DbError::MissingPredicate);
        };

        let mut w = QueryWriter::new();
        w.push(&format!("UPDATE {} SET ", self.table));

        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            let value = field.bound_value(bindings)?;
            let ph = w.redeem(value);
            w.push(&format!("{} = {}", field.column_name(), ph));
        }

        w.push(" WHERE ");
        clause.write_to(&mut w, bindings)?;

        let (sql, args) = w.finish();
        Ok(BuiltQuery { sql, args })
    }
}
