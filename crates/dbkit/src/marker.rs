//! Column markers: named projections that know their binding key.

use crate::error::{DbError, DbResult};
use crate::value::{Bindings, Value};

/// A field reference a statement can select, insert, update or filter by.
///
/// A marker ties three names together:
///
/// - its *binding key*, looked up in a [`Bindings`](crate::Bindings) map
///   when the statement renders;
/// - the SQL text it renders to in projections and clauses;
/// - the bare *column name* used in INSERT field lists and UPDATE SET
///   clauses.
///
/// For a plain [`Marker::column`] all three coincide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Marker {
    /// Plain column reference
    Column(String),
    /// Table-qualified column filed under its own binding key
    Qualified {
        binding: String,
        table: String,
        column: String,
    },
    /// Arbitrary SQL expression filed under a chosen binding key
    Expr { binding: String, sql: String },
}

impl Marker {
    pub fn column(name: impl Into<String>) -> Self {
        Marker::Column(name.into())
    }

    /// A `"table"."column"` reference answering to `binding`.
    pub fn qualified(
        binding: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Marker::Qualified {
            binding: binding.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    /// An arbitrary SQL expression answering to `binding`.
    pub fn expr(binding: impl Into<String>, sql: impl Into<String>) -> Self {
        Marker::Expr {
            binding: binding.into(),
            sql: sql.into(),
        }
    }

    /// Wrap a marker in a SQL function call, keeping its binding key.
    ///
    /// Extra arguments are rendered verbatim after the wrapped expression:
    /// `Marker::func(Marker::column("biz"), "COALESCE", &["0"])` renders
    /// `COALESCE(biz,0)`.
    pub fn func(inner: Marker, name: &str, args: &[&str]) -> Self {
        let mut parts = vec![inner.to_sql()];
        parts.extend(args.iter().map(|a| (*a).to_owned()));

        Marker::Expr {
            binding: inner.binding().to_owned(),
            sql: format!("{}({})", name, parts.join(",")),
        }
    }

    /// The key this marker answers to in a binding map.
    pub fn binding(&self) -> &str {
        match self {
            Marker::Column(name) => name,
            Marker::Qualified { binding, .. } => binding,
            Marker::Expr { binding, .. } => binding,
        }
    }

    /// The SQL this marker renders to in projections and clauses.
    pub fn to_sql(&self) -> String {
        match self {
            Marker::Column(name) => name.clone(),
            Marker::Qualified { table, column, .. } => format!("\"{table}\".\"{column}\""),
            Marker::Expr { sql, .. } => sql.clone(),
        }
    }

    /// The bare column identifier used in INSERT field lists and UPDATE
    /// SET clauses. Expression markers have no column of their own and
    /// fall back to their rendering.
    pub fn column_name(&self) -> &str {
        match self {
            Marker::Column(name) => name,
            Marker::Qualified { column, .. } => column,
            Marker::Expr { sql, .. } => sql,
        }
    }

    /// Look up this marker's value for one render.
    pub(crate) fn bound_value(&self, bindings: &Bindings) -> DbResult<Value> {
        bindings
            .get(self.binding())
            .cloned()
            .ok_or_else(|| DbError::missing_key(self.binding()))
    }
}

/// Sort direction for an ORDER BY entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One ORDER BY entry: a marker plus a direction.
///
/// Ascending renders bare (the backend default ordering); descending
/// appends ` DESC`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub marker: Marker,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(marker: Marker) -> Self {
        OrderBy {
            marker,
            direction: Direction::Asc,
        }
    }

    pub fn desc(marker: Marker) -> Self {
        OrderBy {
            marker,
            direction: Direction::Desc,
        }
    }

    pub(crate) fn to_sql(&self) -> String {
        match self.direction {
            Direction::Asc => self.marker.to_sql(),
            Direction::Desc => format!("{} DESC", self.marker.to_sql()),
        }
    }
}
