//! Transactional execution with retry.
//!
//! [`execute_tx`] runs a unit of work inside a fresh transaction and maps
//! its [`TxDecision`] onto commit/rollback. Failures the policy classifies
//! as retryable (serialization failures, lock contention) roll back and
//! re-run the whole unit of work in a new transaction; everything else
//! rolls back and propagates.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

use futures_core::future::BoxFuture;

use crate::client::{Db, Tx};
use crate::error::{DbError, DbResult};

/// Transaction isolation levels, in increasing strictness.
///
/// `Default` leaves the choice to the backend. Adapters map the rest onto
/// their dialect and reject levels they cannot provide.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum IsolationLevel {
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    WriteCommitted,
    RepeatableRead,
    Snapshot,
    Serializable,
    Linearizable,
}

/// Options for opening a transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxOptions {
    pub isolation: IsolationLevel,
}

impl TxOptions {
    pub fn with_isolation(isolation: IsolationLevel) -> Self {
        TxOptions { isolation }
    }

    pub fn serializable() -> Self {
        Self::with_isolation(IsolationLevel::Serializable)
    }
}

/// Verdict of a transactional unit of work.
///
/// `Rollback` is deliberate abandonment, not failure: the transaction is
/// rolled back and the carried value is still returned as success.
/// Failures travel as plain `Err` instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxDecision<T> {
    /// Commit the transaction and return the value
    Commit(T),
    /// Roll the transaction back, then return the value anyway
    Rollback(T),
}

/// When to re-run a failed unit of work.
///
/// The default policy retries exactly the failures
/// [`DbError::is_retryable`] accepts, with no attempt cap: a serializable
/// workload may be preempted arbitrarily often, and giving up turns a
/// livelock into a spurious caller-visible error.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: Option<NonZeroU32>,
    classify: Arc<dyn Fn(&DbError) -> bool + Send + Sync>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: None,
            classify: Arc::new(DbError::is_retryable),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that never retries: one attempt, every error propagates.
    pub fn never() -> Self {
        Self::new().max_attempts(1)
    }

    /// Cap the total number of attempts, first try included. Zero is
    /// treated as unbounded.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = NonZeroU32::new(attempts);
        self
    }

    /// Replace the retryability classifier.
    pub fn classify<F>(mut self, classify: F) -> Self
    where
        F: Fn(&DbError) -> bool + Send + Sync + 'static,
    {
        self.classify = Arc::new(classify);
        self
    }

    pub(crate) fn should_retry(&self, err: &DbError, attempt: u32) -> bool {
        if !(self.classify)(err) {
            return false;
        }
        match self.max_attempts {
            Some(max) => attempt < max.get(),
            None => true,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

/// Run `work` inside a transaction with the default retry policy.
///
/// See [`execute_tx_with`].
pub async fn execute_tx<D, T, F>(db: &D, options: TxOptions, work: F) -> DbResult<T>
where
    D: Db,
    F: for<'a> FnMut(&'a D::Tx) -> BoxFuture<'a, DbResult<TxDecision<T>>>,
{
    execute_tx_with(db, options, &RetryPolicy::default(), work).await
}

/// Run `work` inside a transaction, retrying per `policy`.
///
/// Each attempt opens a fresh transaction at the requested isolation and
/// hands it to `work`:
///
/// - `Ok(TxDecision::Commit(v))` commits; a commit failure propagates,
///   otherwise `v` is returned;
/// - `Ok(TxDecision::Rollback(v))` rolls back and returns `v` — the
///   rollback's own outcome is irrelevant and never surfaces;
/// - `Err(e)` rolls back; a retryable `e` within budget re-runs `work`
///   from scratch, anything else propagates.
///
/// A failure to open the transaction propagates without retry.
pub async fn execute_tx_with<D, T, F>(
    db: &D,
    options: TxOptions,
    policy: &RetryPolicy,
    mut work: F,
) -> DbResult<T>
where
    D: Db,
    F: for<'a> FnMut(&'a D::Tx) -> BoxFuture<'a, DbResult<TxDecision<T>>>,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let tx = db.begin_tx(options).await?;

        match work(&tx).await {
            Ok(TxDecision::Commit(value)) => {
                tx.commit().await?;
                return Ok(value);
            }
            Ok(TxDecision::Rollback(value)) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "ignoring rollback failure");
                }
                return Ok(value);
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "ignoring rollback failure");
                }
                if policy.should_retry(&err, attempt) {
                    tracing::debug!(attempt, error = %err, "retrying transaction");
                    continue;
                }
                return Err(err);
            }
        }
    }
}
