//! # dbkit
//!
//! A backend-agnostic SQL toolkit: composable statement templates and a
//! transactional upsert engine.
//!
//! ## Features
//!
//! - **Markers and predicates**: typed column references and a clause algebra that flattens and simplifies at construction
//! - **Positional rendering**: statements render `$1..$N` placeholders and a matching argument list from one binding map
//! - **Reusable templates**: statements are plain data; clone one template across any number of executions
//! - **Options off the wire**: per-call options (returning field, consistency) ride the argument list, not the SQL text
//! - **Safe defaults**: UPDATE and DELETE refuse to render without a where-clause
//! - **Transactional upserts**: select-then-decide insert/update inside a retrying serializable transaction; a no-op rolls back and still succeeds
//!
//! ## Building statements
//!
//! ```ignore
//! use dbkit::{Marker, Predicate, bindings, select};
//!
//! let stmt = select("users")
//!     .fields([Marker::column("id"), Marker::column("email")])
//!     .where_clause(Predicate::and([
//!         Predicate::eq(Marker::column("org")),
//!         Predicate::gt(Marker::column("age")),
//!     ]))
//!     .limit(10);
//!
//! let built = stmt.build(&bindings! { "org" => "acme", "age" => 21i64 })?;
//! assert_eq!(
//!     built.sql,
//!     "SELECT id, email FROM users WHERE (org = $1) AND (age = $2) LIMIT 10",
//! );
//! ```
//!
//! ## Upserting
//!
//! ```ignore
//! use dbkit::{Marker, UpsertStatement, Upserter, bindings};
//!
//! let upserter = Upserter::new(db);
//! let upsert = upserter.prepare(
//!     UpsertStatement::new("pets")
//!         .query_value(Marker::column("name"))
//!         .set_value(Marker::column("age"))
//!         .returning(Marker::column("id")),
//! )?;
//!
//! // Inserts the first time, updates when the age changes, and writes
//! // nothing (rolling the transaction back) when the row already holds
//! // exactly these values.
//! let result = upsert
//!     .exec(&bindings! { "name" => "rex", "age" => 4i64 })
//!     .await?;
//! ```

pub mod builder;
pub mod client;
pub mod error;
pub mod marker;
pub mod options;
pub mod placeholder;
pub mod predicate;
pub mod row;
pub mod statement;
pub mod testing;
pub mod tx;
pub mod upsert;
pub mod value;
pub mod writer;

pub use builder::{PreparedDelete, PreparedInsert, PreparedSelect, PreparedUpdate, QueryBuilder};
pub use client::{Db, ExecResult, Queryer, Tx};
pub use error::{ConstraintError, ConstraintKind, DbError, DbResult, RollbackError, RollbackKind};
pub use marker::{Direction, Marker, OrderBy};
pub use options::{CallOption, Consistency, Returning, strip_options};
pub use placeholder::to_question_marks;
pub use predicate::{CompareOp, Predicate};
pub use row::Row;
pub use statement::{
    BuiltQuery, ConflictAction, ConflictTarget, DeleteStatement, InsertStatement, JoinClause,
    JoinKind, OnConflict, SelectStatement, UpdateStatement, delete, insert, select, update,
};
pub use tx::{IsolationLevel, RetryPolicy, TxDecision, TxOptions, execute_tx, execute_tx_with};
pub use upsert::{PreparedUpsert, UpsertMode, UpsertStatement, Upserter};
pub use value::{Arg, Bindings, Value};
pub use writer::QueryWriter;
