//! Execution contracts: queryers, transactions and database handles.
//!
//! These traits are the seam between this crate and a concrete driver
//! adapter. The toolkit renders statements and drives protocols; adapters
//! implement these three traits and own everything wire-level.

use std::future::Future;

use crate::error::DbResult;
use crate::tx::TxOptions;
use crate::value::{Arg, Value};

/// Outcome of a mutating statement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Identity of the written row, when the backend (or the returning
    /// emulation) can report one.
    pub last_insert_id: Option<i64>,
}

/// Anything that can run rendered statements: a connection, a pooled
/// handle or a live transaction.
///
/// Rows come back positionally; the prepared executors label them with
/// binding keys. Argument lists may carry
/// [`CallOption`](crate::CallOption)s, which adapters strip and honor
/// before binding values.
pub trait Queryer: Send + Sync {
    /// Run a mutating statement.
    fn exec(&self, sql: &str, args: &[Arg]) -> impl Future<Output = DbResult<ExecResult>> + Send;

    /// Run a row query, returning the first row if any.
    fn query_row(
        &self,
        sql: &str,
        args: &[Arg],
    ) -> impl Future<Output = DbResult<Option<Vec<Value>>>> + Send;

    /// Run a row query, returning every row.
    fn query(
        &self,
        sql: &str,
        args: &[Arg],
    ) -> impl Future<Output = DbResult<Vec<Vec<Value>>>> + Send;
}

impl<Q: Queryer> Queryer for &Q {
    async fn exec(&self, sql: &str, args: &[Arg]) -> DbResult<ExecResult> {
        (*self).exec(sql, args).await
    }

    async fn query_row(&self, sql: &str, args: &[Arg]) -> DbResult<Option<Vec<Value>>> {
        (*self).query_row(sql, args).await
    }

    async fn query(&self, sql: &str, args: &[Arg]) -> DbResult<Vec<Vec<Value>>> {
        (*self).query(sql, args).await
    }
}

/// A live transaction: a queryer that must end in exactly one of
/// [`commit`](Tx::commit) or [`rollback`](Tx::rollback).
pub trait Tx: Queryer {
    fn commit(self) -> impl Future<Output = DbResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = DbResult<()>> + Send;
}

/// A database handle that can open transactions.
pub trait Db: Queryer {
    type Tx: Tx;

    /// Open a transaction with the requested options.
    fn begin_tx(&self, options: TxOptions) -> impl Future<Output = DbResult<Self::Tx>> + Send;

    /// The adapter's dialect name (`"postgres"`, `"sqlite3"`, …), a hint
    /// for callers that need backend-specific decisions.
    fn driver(&self) -> &str;
}
