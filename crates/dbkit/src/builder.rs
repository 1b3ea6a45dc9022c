//! Prepared execution: pairing statement templates with a queryer.

use crate::client::{ExecResult, Queryer};
use crate::error::DbResult;
use crate::row::Row;
use crate::statement::{DeleteStatement, InsertStatement, SelectStatement, UpdateStatement};
use crate::value::Bindings;

/// Prepares statement templates against a queryer.
///
/// Preparation just pairs a template with the queryer. Every execution
/// renders from the template anew, so a prepared statement is reusable
/// and carries no per-call state.
#[derive(Debug)]
pub struct QueryBuilder<Q> {
    queryer: Q,
}

impl<Q: Queryer> QueryBuilder<Q> {
    pub fn new(queryer: Q) -> Self {
        QueryBuilder { queryer }
    }

    pub fn prepare_select(&self, statement: SelectStatement) -> PreparedSelect<'_, Q> {
        PreparedSelect {
            queryer: &self.queryer,
            statement,
        }
    }

    pub fn prepare_insert(&self, statement: InsertStatement) -> PreparedInsert<'_, Q> {
        PreparedInsert {
            queryer: &self.queryer,
            statement,
        }
    }

    pub fn prepare_update(&self, statement: UpdateStatement) -> PreparedUpdate<'_, Q> {
        PreparedUpdate {
            queryer: &self.queryer,
            statement,
        }
    }

    pub fn prepare_delete(&self, statement: DeleteStatement) -> PreparedDelete<'_, Q> {
        PreparedDelete {
            queryer: &self.queryer,
            statement,
        }
    }
}

/// A SELECT template bound to a queryer.
#[derive(Debug)]
pub struct PreparedSelect<'a, Q> {
    queryer: &'a Q,
    pub statement: SelectStatement,
}

impl<Q: Queryer> PreparedSelect<'_, Q> {
    /// Render and fetch the first row, if any, labeled with the
    /// statement's binding keys.
    pub async fn query_row(&self, bindings: &Bindings) -> DbResult<Option<Row>> {
        let built = self.statement.build(bindings)?;
        tracing::debug!(sql = %built.sql, "query_row");

        match self.queryer.query_row(&built.sql, &built.args).await? {
            Some(values) => Row::new(self.statement.keys(), values).map(Some),
            None => Ok(None),
        }
    }

    /// Render and fetch every row, labeled with the statement's binding
    /// keys.
    pub async fn query(&self, bindings: &Bindings) -> DbResult<Vec<Row>> {
        let built = self.statement.build(bindings)?;
        tracing::debug!(sql = %built.sql, "query");

        let keys = self.statement.keys();
        self.queryer
            .query(&built.sql, &built.args)
            .await?
            .into_iter()
            .map(|values| Row::new(keys.clone(), values))
            .collect()
    }
}

/// An INSERT template bound to a queryer.
#[derive(Debug)]
pub struct PreparedInsert<'a, Q> {
    queryer: &'a Q,
    pub statement: InsertStatement,
}

impl<Q: Queryer> PreparedInsert<'_, Q> {
    /// Render and execute a single-row insert.
    pub async fn exec(&self, bindings: &Bindings) -> DbResult<ExecResult> {
        let built = self.statement.build(bindings)?;
        tracing::debug!(sql = %built.sql, "exec");
        self.queryer.exec(&built.sql, &built.args).await
    }

    /// Render and execute a multi-row insert; see
    /// [`InsertStatement::build_many`] for how `rows` and `shared` bind.
    pub async fn exec_many(&self, rows: &[&Bindings], shared: &Bindings) -> DbResult<ExecResult> {
        let built = self.statement.build_many(rows, shared)?;
        tracing::debug!(sql = %built.sql, rows = rows.len(), "exec_many");
        self.queryer.exec(&built.sql, &built.args).await
    }

    /// Render in query mode (RETURNING in the SQL) and fetch the written
    /// row, labeled with the returning fields' binding keys.
    pub async fn query_row(&self, bindings: &Bindings) -> DbResult<Option<Row>> {
        let built = self.statement.build_query(bindings)?;
        tracing::debug!(sql = %built.sql, "query_row");

        match self.queryer.query_row(&built.sql, &built.args).await? {
            Some(values) => Row::new(self.statement.returning_keys(), values).map(Some),
            None => Ok(None),
        }
    }
}

/// An UPDATE template bound to a queryer.
#[derive(Debug)]
pub struct PreparedUpdate<'a, Q> {
    queryer: &'a Q,
    pub statement: UpdateStatement,
}

impl<Q: Queryer> PreparedUpdate<'_, Q> {
    pub async fn exec(&self, bindings: &Bindings) -> DbResult<ExecResult> {
        let built = self.statement.build(bindings)?;
        tracing::debug!(sql = %built.sql, "exec");
        self.queryer.exec(&built.sql, &built.args).await
    }
}

/// A DELETE template bound to a queryer.
#[derive(Debug)]
pub struct PreparedDelete<'a, Q> {
    queryer: &'a Q,
    pub statement: DeleteStatement,
}

impl<Q: Queryer> PreparedDelete<'_, Q> {
    pub async fn exec(&self, bindings: &Bindings) -> DbResult<ExecResult> {
        let built = self.statement.build(bindings)?;
        tracing::debug!(sql = %built.sql, "exec");
        self.queryer.exec(&built.sql, &built.args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings;
    use crate::error::DbError;
    use crate::marker::Marker;
    use crate::predicate::Predicate;
    use crate::statement::{insert, select, update};
    use crate::testing::StaticDb;
    use crate::value::{Arg, Value};

    #[tokio::test]
    async fn select_rows_are_labeled_with_binding_keys() {
        let db = StaticDb::new();
        db.script_row(Ok(Some(vec![Value::Int(1), Value::Text("alice".into())])));

        let qb = QueryBuilder::new(&db);
        let prepared = qb.prepare_select(
            select("users")
                .fields([Marker::column("id"), Marker::expr("name", "LOWER(name)")])
                .where_clause(Predicate::eq(Marker::column("id"))),
        );

        let row = prepared
            .query_row(&bindings! { "id" => 1i64 })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(row.get("id"), Some(&Value::Int(1)));
        assert_eq!(row.get("name"), Some(&Value::Text("alice".into())));

        let calls = db.query_rows();
        assert_eq!(
            calls[0].sql,
            "SELECT id, LOWER(name) FROM users WHERE id = $1"
        );
        assert_eq!(calls[0].args, vec![Arg::Value(Value::Int(1))]);
    }

    #[tokio::test]
    async fn narrow_backend_row_is_rejected() {
        let db = StaticDb::new();
        db.script_row(Ok(Some(vec![Value::Int(1)])));

        let qb = QueryBuilder::new(&db);
        let err = qb
            .prepare_select(select("users").fields([Marker::column("a"), Marker::column("b")]))
            .query_row(&bindings! {})
            .await
            .unwrap_err();

        assert_eq!(err, DbError::ColumnCount { expected: 2, got: 1 });
    }

    #[tokio::test]
    async fn query_labels_every_row() {
        let db = StaticDb::new();
        db.script_query(Ok(vec![vec![Value::Int(1)], vec![Value::Int(2)]]));

        let qb = QueryBuilder::new(&db);
        let rows = qb
            .prepare_select(select("users").field(Marker::column("id")))
            .query(&bindings! {})
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("id"), Some(&Value::Int(2)));
    }

    #[tokio::test]
    async fn insert_exec_passes_rendered_args() {
        let db = StaticDb::new();
        let qb = QueryBuilder::new(&db);

        let res = qb
            .prepare_insert(insert("users").fields([Marker::column("name")]))
            .exec(&bindings! { "name" => "alice" })
            .await
            .unwrap();

        assert_eq!(res.rows_affected, 1);
        let calls = db.execs();
        assert_eq!(calls[0].sql, "INSERT INTO users(name) VALUES ($1)");
        assert_eq!(calls[0].args, vec![Arg::Value(Value::Text("alice".into()))]);
    }

    #[tokio::test]
    async fn build_errors_surface_before_any_call() {
        let db = StaticDb::new();
        let qb = QueryBuilder::new(&db);

        let err = qb
            .prepare_update(update("users").field(Marker::column("name")))
            .exec(&bindings! { "name" => "x" })
            .await
            .unwrap_err();

        assert_eq!(err, DbError::MissingPredicate);
        assert!(db.execs().is_empty());
    }
}
