//! Statement templates: SELECT / INSERT / UPDATE / DELETE.
//!
//! Statements are plain data. A template names its table and field
//! markers and carries its clauses; rendering it against a binding map
//! produces the final SQL text and an ordered argument list with `$N`
//! placeholders numbered by redemption order.
//!
//! # Usage
//!
//! ```ignore
//! use dbkit::{bindings, statement, Marker, Predicate};
//!
//! let stmt = statement::select("users")
//!     .fields([Marker::column("id"), Marker::column("email")])
//!     .where_clause(Predicate::eq(Marker::column("status")));
//!
//! let built = stmt.build(&bindings! { "status" => "active" })?;
//! assert_eq!(built.sql, "SELECT id, email FROM users WHERE status = $1");
//! ```

mod delete;
mod insert;
mod select;
mod update;

pub use delete::DeleteStatement;
pub use insert::{ConflictAction, ConflictTarget, InsertStatement, OnConflict};
pub use select::{JoinClause, JoinKind, SelectStatement};
pub use update::UpdateStatement;

use crate::value::Arg;

#[cfg(test)]
mod tests;

/// A rendered statement: final SQL plus its ordered argument list.
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub args: Vec<Arg>,
}

/// Start a SELECT template against `table`.
pub fn select(table: impl Into<String>) -> SelectStatement {
    SelectStatement::new(table)
}

/// Start an INSERT template against `table`.
pub fn insert(table: impl Into<String>) -> InsertStatement {
    InsertStatement::new(table)
}

/// Start an UPDATE template against `table`.
pub fn update(table: impl Into<String>) -> UpdateStatement {
    UpdateStatement::new(table)
}

/// Start a DELETE template against `table`.
pub fn delete(table: impl Into<String>) -> DeleteStatement {
    DeleteStatement::new(table)
}
