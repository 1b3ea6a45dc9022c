//! Select-then-decide upsert protocol.
//!
//! An [`UpsertStatement`] names a table, the markers that identify a row
//! (query values), the markers that carry its mutable payload (set
//! values), and markers written only on first insert (insert values).
//! [`Upserter::prepare`] compiles it into the three statements the
//! protocol needs; [`PreparedUpsert::exec`] then runs select-then-decide
//! inside a retrying serializable transaction:
//!
//! - no row: insert;
//! - row found with every set value already equal: no write at all, the
//!   transaction rolls back and the call still succeeds;
//! - row found with a difference: update.

use crate::client::{Db, ExecResult, Queryer};
use crate::error::{DbError, DbResult};
use crate::marker::Marker;
use crate::predicate::Predicate;
use crate::row::Row;
use crate::statement::{BuiltQuery, InsertStatement, SelectStatement, UpdateStatement};
use crate::tx::{RetryPolicy, TxDecision, TxOptions, execute_tx_with};
use crate::value::{Bindings, Value};

/// Which branches an upsert may take.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpsertMode {
    /// Only insert; an existing row is left untouched.
    Insert,
    /// Only update; a missing row is not created.
    Update,
    /// Insert or update as the select decides.
    #[default]
    Both,
}

impl UpsertMode {
    pub fn allows_insert(self) -> bool {
        matches!(self, UpsertMode::Insert | UpsertMode::Both)
    }

    pub fn allows_update(self) -> bool {
        matches!(self, UpsertMode::Update | UpsertMode::Both)
    }
}

/// An upsert template.
#[derive(Clone, Debug, Default)]
pub struct UpsertStatement {
    pub table: String,
    /// Markers identifying the row; at least one is required.
    pub query_values: Vec<Marker>,
    /// Markers written on both branches and compared for the no-op check.
    pub set_values: Vec<Marker>,
    /// Markers written only when the insert branch runs.
    pub insert_values: Vec<Marker>,
    /// Field whose value is surfaced as `last_insert_id` on every branch.
    pub returning: Option<Marker>,
    pub mode: UpsertMode,
}

impl UpsertStatement {
    pub fn new(table: impl Into<String>) -> Self {
        UpsertStatement {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn query_value(mut self, field: Marker) -> Self {
        self.query_values.push(field);
        self
    }

    pub fn query_values(mut self, fields: impl IntoIterator<Item = Marker>) -> Self {
        self.query_values.extend(fields);
        self
    }

    pub fn set_value(mut self, field: Marker) -> Self {
        self.set_values.push(field);
        self
    }

    pub fn set_values(mut self, fields: impl IntoIterator<Item = Marker>) -> Self {
        self.set_values.extend(fields);
        self
    }

    pub fn insert_value(mut self, field: Marker) -> Self {
        self.insert_values.push(field);
        self
    }

    pub fn insert_values(mut self, fields: impl IntoIterator<Item = Marker>) -> Self {
        self.insert_values.extend(fields);
        self
    }

    pub fn returning(mut self, field: Marker) -> Self {
        self.returning = Some(field);
        self
    }

    pub fn mode(mut self, mode: UpsertMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Compiles upsert templates against a database handle.
#[derive(Debug)]
pub struct Upserter<D> {
    db: D,
    policy: RetryPolicy,
}

impl<D: Db> Upserter<D> {
    pub fn new(db: D) -> Self {
        Upserter {
            db,
            policy: RetryPolicy::default(),
        }
    }

    /// Replace the default retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Compile `statement` into its select/update/insert trio.
    ///
    /// The select projects a constant `1` first so that a template with no
    /// set values still probes cleanly, then every set value, then the
    /// returning field unless a set value already renders it. Select and
    /// update share one where-clause: the AND of equalities over the query
    /// values. The insert writes query values, set values, and insert
    /// values in that order.
    pub fn prepare(&self, statement: UpsertStatement) -> DbResult<PreparedUpsert<'_, D>> {
        let UpsertStatement {
            table,
            query_values,
            set_values,
            insert_values,
            returning,
            mode,
        } = statement;

        if query_values.is_empty() {
            return Err(DbError::NoQueryValues);
        }

        let query_keys: Vec<String> = query_values.iter().map(|f| f.binding().to_owned()).collect();
        let set_keys: Vec<String> = set_values.iter().map(|f| f.binding().to_owned()).collect();

        let clause = Predicate::and(query_values.iter().cloned().map(Predicate::eq));

        let mut select_fields = vec![Marker::expr("one", "1")];
        select_fields.extend(set_values.iter().cloned());
        let returning_key = returning.as_ref().map(|ret| {
            match set_values.iter().find(|f| f.to_sql() == ret.to_sql()) {
                Some(covered) => covered.binding().to_owned(),
                None => {
                    select_fields.push(ret.clone());
                    ret.binding().to_owned()
                }
            }
        });

        let select = SelectStatement::new(table.clone())
            .fields(select_fields)
            .where_clause(clause.clone());

        let update = UpdateStatement::new(table.clone())
            .fields(set_values.iter().cloned())
            .where_clause(clause);

        let mut insert_fields = query_values;
        insert_fields.extend(set_values);
        insert_fields.extend(insert_values);
        let mut insert = InsertStatement::new(table.clone()).fields(insert_fields);
        if let Some(ret) = &returning {
            insert = insert.returning(ret.clone());
        }

        Ok(PreparedUpsert {
            db: &self.db,
            policy: &self.policy,
            table,
            mode,
            select,
            update,
            insert,
            query_keys,
            set_keys,
            returning_key,
        })
    }
}

/// A compiled upsert bound to its database handle.
#[derive(Debug)]
pub struct PreparedUpsert<'a, D> {
    db: &'a D,
    policy: &'a RetryPolicy,
    table: String,
    mode: UpsertMode,
    select: SelectStatement,
    update: UpdateStatement,
    insert: InsertStatement,
    query_keys: Vec<String>,
    set_keys: Vec<String>,
    returning_key: Option<String>,
}

impl<D: Db> PreparedUpsert<'_, D> {
    /// Run the protocol once against `bindings`.
    ///
    /// Every query-value and set-value key must be present up front; the
    /// insert values are only needed if the insert branch runs. The whole
    /// unit of work re-runs on retryable failures, so two concurrent
    /// upserts of identical content converge to one write and one no-op.
    pub async fn exec(&self, bindings: &Bindings) -> DbResult<ExecResult> {
        for key in &self.query_keys {
            if !bindings.contains_key(key) {
                return Err(DbError::missing_key(key));
            }
        }
        let mut set_checks = Vec::with_capacity(self.set_keys.len());
        for key in &self.set_keys {
            match bindings.get(key) {
                Some(value) => set_checks.push((key.clone(), value.clone())),
                None => return Err(DbError::missing_key(key)),
            }
        }

        let attempt = Attempt {
            table: self.table.clone(),
            mode: self.mode,
            select: self.select.build(bindings)?,
            select_keys: self.select.keys(),
            set_checks,
            update: self.update.clone(),
            insert: self.insert.clone(),
            bindings: bindings.clone(),
            returning_key: self.returning_key.clone(),
        };

        execute_tx_with(self.db, TxOptions::serializable(), self.policy, move |tx| {
            let attempt = attempt.clone();
            Box::pin(async move { attempt.run(tx).await })
        })
        .await
    }
}

/// One self-contained run of the unit of work. Owns everything it needs
/// so retries can clone it into a fresh future.
#[derive(Clone)]
struct Attempt {
    table: String,
    mode: UpsertMode,
    select: BuiltQuery,
    select_keys: Vec<String>,
    set_checks: Vec<(String, Value)>,
    update: UpdateStatement,
    insert: InsertStatement,
    bindings: Bindings,
    returning_key: Option<String>,
}

impl Attempt {
    async fn run<Q: Queryer>(self, tx: &Q) -> DbResult<TxDecision<ExecResult>> {
        let Some(values) = tx.query_row(&self.select.sql, &self.select.args).await? else {
            if !self.mode.allows_insert() {
                tracing::debug!(table = %self.table, "no row and inserts are disabled");
                return Ok(TxDecision::Rollback(ExecResult::default()));
            }
            let built = self.insert.build(&self.bindings)?;
            let result = tx.exec(&built.sql, &built.args).await?;
            tracing::debug!(table = %self.table, rows = result.rows_affected, "inserted");
            return Ok(TxDecision::Commit(result));
        };

        let row = Row::new(self.select_keys.clone(), values)?;
        let last_insert_id = self.returning_value(&row)?;

        let pristine = self
            .set_checks
            .iter()
            .all(|(key, value)| row.get(key) == Some(value));
        if pristine {
            tracing::debug!(table = %self.table, "row is already up to date");
            return Ok(TxDecision::Rollback(ExecResult {
                rows_affected: 0,
                last_insert_id,
            }));
        }
        if !self.mode.allows_update() {
            tracing::debug!(table = %self.table, "row differs but updates are disabled");
            return Ok(TxDecision::Rollback(ExecResult {
                rows_affected: 0,
                last_insert_id,
            }));
        }

        let built = self.update.build(&self.bindings)?;
        let result = tx.exec(&built.sql, &built.args).await?;
        tracing::debug!(table = %self.table, rows = result.rows_affected, "updated");
        Ok(TxDecision::Commit(ExecResult {
            rows_affected: result.rows_affected,
            last_insert_id,
        }))
    }

    /// Resolve the returning field from a selected row. The value feeds
    /// `last_insert_id`, so anything non-integer is rejected.
    fn returning_value(&self, row: &Row) -> DbResult<Option<i64>> {
        let Some(key) = &self.returning_key else {
            return Ok(None);
        };
        match row.try_get(key)?.as_i64() {
            Some(id) => Ok(Some(id)),
            None => Err(DbError::InvalidType),
        }
    }
}
