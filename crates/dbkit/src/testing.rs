//! Scripted in-memory backend for tests.
//!
//! [`StaticDb`] implements the execution contracts against queues of
//! canned responses and records every call it sees. A test scripts the
//! backend, runs the code under test, then asserts on the recorded SQL,
//! arguments and transaction lifecycle.
//!
//! Unscripted calls fall back to "empty database that accepts writes"
//! behavior: `exec` reports one affected row, `query_row` finds nothing,
//! `query` returns no rows. Transactions opened by [`StaticDb::begin_tx`]
//! share the database's scripts and recordings, so a protocol spanning
//! several attempts consumes one queue in order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::client::{Db, ExecResult, Queryer, Tx};
use crate::error::{DbError, DbResult};
use crate::tx::TxOptions;
use crate::value::{Arg, Value};

/// One recorded statement execution.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub sql: String,
    pub args: Vec<Arg>,
}

#[derive(Debug, Default)]
struct State {
    exec_results: VecDeque<DbResult<ExecResult>>,
    row_results: VecDeque<DbResult<Option<Vec<Value>>>>,
    query_results: VecDeque<DbResult<Vec<Vec<Value>>>>,
    begin_errors: VecDeque<DbError>,
    commit_errors: VecDeque<DbError>,
    execs: Vec<RecordedCall>,
    query_rows: Vec<RecordedCall>,
    queries: Vec<RecordedCall>,
    begins: usize,
    commits: usize,
    rollbacks: usize,
    tx_options: Vec<TxOptions>,
}

/// A scripted, recording database handle.
#[derive(Clone, Debug)]
pub struct StaticDb {
    state: Arc<Mutex<State>>,
    driver: String,
}

impl Default for StaticDb {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticDb {
    pub fn new() -> Self {
        StaticDb {
            state: Arc::new(Mutex::new(State::default())),
            driver: "static".to_owned(),
        }
    }

    /// A database reporting a different dialect name.
    pub fn with_driver(driver: impl Into<String>) -> Self {
        StaticDb {
            driver: driver.into(),
            ..Self::new()
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue the outcome of the next unscripted `exec`.
    pub fn script_exec(&self, result: DbResult<ExecResult>) {
        self.state().exec_results.push_back(result);
    }

    /// Queue the outcome of the next `query_row`.
    pub fn script_row(&self, result: DbResult<Option<Vec<Value>>>) {
        self.state().row_results.push_back(result);
    }

    /// Queue the outcome of the next `query`.
    pub fn script_query(&self, result: DbResult<Vec<Vec<Value>>>) {
        self.state().query_results.push_back(result);
    }

    /// Fail the next `begin_tx` with `err`.
    pub fn script_begin_error(&self, err: DbError) {
        self.state().begin_errors.push_back(err);
    }

    /// Fail the next `commit` with `err`.
    pub fn script_commit_error(&self, err: DbError) {
        self.state().commit_errors.push_back(err);
    }

    /// Every `exec` seen so far, database and transactions included.
    pub fn execs(&self) -> Vec<RecordedCall> {
        self.state().execs.clone()
    }

    /// Every `query_row` seen so far.
    pub fn query_rows(&self) -> Vec<RecordedCall> {
        self.state().query_rows.clone()
    }

    /// Every `query` seen so far.
    pub fn queries(&self) -> Vec<RecordedCall> {
        self.state().queries.clone()
    }

    pub fn begins(&self) -> usize {
        self.state().begins
    }

    pub fn commits(&self) -> usize {
        self.state().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state().rollbacks
    }

    /// The options of every transaction opened so far.
    pub fn tx_options_seen(&self) -> Vec<TxOptions> {
        self.state().tx_options.clone()
    }
}

fn run_exec(state: &Mutex<State>, sql: &str, args: &[Arg]) -> DbResult<ExecResult> {
    let mut s = state.lock().unwrap_or_else(|e| e.into_inner());
    s.execs.push(RecordedCall {
        sql: sql.to_owned(),
        args: args.to_vec(),
    });
    s.exec_results.pop_front().unwrap_or(Ok(ExecResult {
        rows_affected: 1,
        last_insert_id: None,
    }))
}

fn run_query_row(state: &Mutex<State>, sql: &str, args: &[Arg]) -> DbResult<Option<Vec<Value>>> {
    let mut s = state.lock().unwrap_or_else(|e| e.into_inner());
    s.query_rows.push(RecordedCall {
        sql: sql.to_owned(),
        args: args.to_vec(),
    });
    s.row_results.pop_front().unwrap_or(Ok(None))
}

fn run_query(state: &Mutex<State>, sql: &str, args: &[Arg]) -> DbResult<Vec<Vec<Value>>> {
    let mut s = state.lock().unwrap_or_else(|e| e.into_inner());
    s.queries.push(RecordedCall {
        sql: sql.to_owned(),
        args: args.to_vec(),
    });
    s.query_results.pop_front().unwrap_or(Ok(Vec::new()))
}

impl Queryer for StaticDb {
    async fn exec(&self, sql: &str, args: &[Arg]) -> DbResult<ExecResult> {
        run_exec(&self.state, sql, args)
    }

    async fn query_row(&self, sql: &str, args: &[Arg]) -> DbResult<Option<Vec<Value>>> {
        run_query_row(&self.state, sql, args)
    }

    async fn query(&self, sql: &str, args: &[Arg]) -> DbResult<Vec<Vec<Value>>> {
        run_query(&self.state, sql, args)
    }
}

impl Db for StaticDb {
    type Tx = StaticTx;

    async fn begin_tx(&self, options: TxOptions) -> DbResult<StaticTx> {
        let mut s = self.state();
        s.begins += 1;
        s.tx_options.push(options);
        if let Some(err) = s.begin_errors.pop_front() {
            return Err(err);
        }
        Ok(StaticTx {
            state: Arc::clone(&self.state),
        })
    }

    fn driver(&self) -> &str {
        &self.driver
    }
}

/// A transaction handed out by [`StaticDb`], sharing its scripts.
#[derive(Debug)]
pub struct StaticTx {
    state: Arc<Mutex<State>>,
}

impl Queryer for StaticTx {
    async fn exec(&self, sql: &str, args: &[Arg]) -> DbResult<ExecResult> {
        run_exec(&self.state, sql, args)
    }

    async fn query_row(&self, sql: &str, args: &[Arg]) -> DbResult<Option<Vec<Value>>> {
        run_query_row(&self.state, sql, args)
    }

    async fn query(&self, sql: &str, args: &[Arg]) -> DbResult<Vec<Vec<Value>>> {
        run_query(&self.state, sql, args)
    }
}

impl Tx for StaticTx {
    async fn commit(self) -> DbResult<()> {
        let mut s = self.state.lock().unwrap_or_else(|e| e.into_inner());
        s.commits += 1;
        match s.commit_errors.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn rollback(self) -> DbResult<()> {
        let mut s = self.state.lock().unwrap_or_else(|e| e.into_inner());
        s.rollbacks += 1;
        Ok(())
    }
}
