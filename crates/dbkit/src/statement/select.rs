//! SELECT statement template.

use crate::error::DbResult;
use crate::marker::{Marker, OrderBy};
use crate::options::{CallOption, Consistency};
use crate::predicate::Predicate;
use crate::statement::BuiltQuery;
use crate::value::Bindings;
use crate::writer::QueryWriter;

/// How a [`JoinClause`] combines its table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JoinKind {
    /// Bare `JOIN`
    #[default]
    Default,
    Inner,
    LeftOuter,
}

impl JoinKind {
    fn sql(self) -> &'static str {
        match self {
            JoinKind::Default => "JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
        }
    }
}

/// A table joined into a SELECT.
#[derive(Clone, Debug)]
pub struct JoinClause {
    pub table: String,
    pub kind: JoinKind,
    pub on: Option<Predicate>,
}

impl JoinClause {
    pub fn new(table: impl Into<String>) -> Self {
        JoinClause {
            table: table.into(),
            kind: JoinKind::Default,
            on: None,
        }
    }

    pub fn inner(table: impl Into<String>, on: Predicate) -> Self {
        JoinClause {
            table: table.into(),
            kind: JoinKind::Inner,
            on: Some(on),
        }
    }

    pub fn left_outer(table: impl Into<String>, on: Predicate) -> Self {
        JoinClause {
            table: table.into(),
            kind: JoinKind::LeftOuter,
            on: Some(on),
        }
    }

    fn write_to(&self, w: &mut QueryWriter, bindings: &Bindings) -> DbResult<()> {
        w.push(&format!(" {} {}", self.kind.sql(), self.table));
        if let Some(on) = &self.on {
            w.push(" ON ");
            on.write_to(w, bindings)?;
        }
        Ok(())
    }
}

/// A reusable SELECT template.
///
/// Plain data: every part is a public field, with chainable setters for
/// the common construction path. Rendering never mutates the template, so
/// one statement can back any number of executions.
#[derive(Clone, Debug, Default)]
pub struct SelectStatement {
    pub table: String,
    pub fields: Vec<Marker>,
    pub joins: Vec<JoinClause>,
    pub where_clause: Option<Predicate>,
    pub group_by: Vec<Marker>,
    pub having: Option<Predicate>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub consistency: Option<Consistency>,
}

impl SelectStatement {
    pub fn new(table: impl Into<String>) -> Self {
        SelectStatement {
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

    pub fn join(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    pub fn where_clause(mut self, clause: Predicate) -> Self {
        self.where_clause = Some(clause);
        self
    }

    pub fn group_by(mut self, fields: impl IntoIterator<Item = Marker>) -> Self {
        self.group_by.extend(fields);
        self
    }

    pub fn having(mut self, clause: Predicate) -> Self {
        self.having = Some(clause);
        self
    }

    pub fn order_by(mut self, entry: OrderBy) -> Self {
        self.order_by.push(entry);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    /// Ordered binding keys of the selected fields. Result rows are
    /// labeled with these, position by position.
    pub fn keys(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.binding().to_owned()).collect()
    }

    /// Render the statement against a binding map.
    ///
    /// Sections always render in the same order: fields, joins, WHERE,
    /// GROUP BY, HAVING, ORDER BY, LIMIT, OFFSET. A consistency setting
    /// is appended to the argument list, not the SQL.
    pub fn build(&self, bindings: &Bindings) -> DbResult<BuiltQuery> {
        let mut w = QueryWriter::new();

        let fields: Vec<String> = self.fields.iter().map(Marker::to_sql).collect();
        w.push(&format!("SELECT {} FROM {}", fields.join(", "), self.table));

        for join in &self.joins {
            join.write_to(&mut w, bindings)?;
        }

        if let Some(clause) = &self.where_clause {
            w.push(" WHERE ");
            clause.write_to(&mut w, bindings)?;
        }

        if !self.group_by.is_empty() {
            let fields: Vec<String> = self.group_by.iter().map(Marker::to_sql).collect();
            w.push(&format!(" GROUP BY {}", fields.join(", ")));
        }

        if let Some(clause) = &self.having {
            w.push(" HAVING ");
            clause.write_to(&mut w, bindings)?;
        }

        if !self.order_by.is_empty() {
            let entries: Vec<String> = self.order_by.iter().map(OrderBy::to_sql).collect();
            w.push(&format!(" ORDER BY {}", entries.join(", ")));
        }

        if let Some(limit) = self.limit {
            w.push(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            w.push(&format!(" OFFSET {offset}"));
        }

        if let Some(consistency) = self.consistency {
            w.push_option(CallOption::Consistency(consistency));
        }

        let (sql, args) = w.finish();
        Ok(BuiltQuery { sql, args })
    }
}
