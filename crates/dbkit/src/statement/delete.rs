//! DELETE statement template.

use crate::error::{DbError, DbResult};
use crate::predicate::Predicate;
use crate::statement::BuiltQuery;
use crate::value::Bindings;
use crate::writer::QueryWriter;

/// A reusable DELETE template.
///
/// Like [`UpdateStatement`](crate::UpdateStatement), a template without a
/// where-clause refuses to render.
#[derive(Clone, Debug, Default)]
pub struct DeleteStatement {
    pub table: String,
    pub where_clause: Option<Predicate>,
}

impl DeleteStatement {
    pub fn new(table: impl Into<String>) -> Self {
        DeleteStatement {
            table: table.into(),
            where_clause: None,
        }
    }

    pub fn where_clause(mut self, clause: Predicate) -> Self {
        self.where_clause = Some(clause);
        self
    }

    /// Render the statement against a binding map.
    pub fn build(&self, bindings: &Bindings) -> DbResult<BuiltQuery> {
        let Some(clause) = &self.where_clause else {
            return Err(DbError::MissingPredicate);
        };

        let mut w = QueryWriter::new();
        w.push(&format!("DELETE FROM {} WHERE ", self.table));
        clause.write_to(&mut w, bindings)?;

        let (sql, args) = w.finish();
        Ok(BuiltQuery { sql, args })
    }
}
