//! End-to-end upsert protocol runs against the scripted backend.

use dbkit::testing::StaticDb;
use dbkit::{
    Arg, CallOption, DbError, ExecResult, Marker, Returning, RetryPolicy, RollbackKind, TxOptions,
    UpsertMode, UpsertStatement, Upserter, Value, bindings,
};

fn pets() -> UpsertStatement {
    UpsertStatement::new("pets")
        .query_value(Marker::column("name"))
        .set_value(Marker::column("age"))
        .returning(Marker::column("id"))
}

/// A selected row for the `pets` template: constant head, age, id.
fn pet_row(age: i64, id: i64) -> Option<Vec<Value>> {
    Some(vec![Value::Int(1), Value::Int(age), Value::Int(id)])
}

#[tokio::test]
async fn new_content_inserts() {
    let db = StaticDb::new();
    db.script_row(Ok(None));
    db.script_exec(Ok(ExecResult {
        rows_affected: 1,
        last_insert_id: Some(7),
    }));

    let upserter = Upserter::new(db.clone());
    let result = upserter
        .prepare(pets())
        .unwrap()
        .exec(&bindings! { "name" => "rex", "age" => 4i64 })
        .await
        .unwrap();

    assert_eq!(result.rows_affected, 1);
    assert_eq!(result.last_insert_id, Some(7));

    let probes = db.query_rows();
    assert_eq!(probes[0].sql, "SELECT 1, age, id FROM pets WHERE name = $1");
    assert_eq!(probes[0].args, vec![Arg::Value(Value::Text("rex".into()))]);

    let writes = db.execs();
    assert_eq!(writes[0].sql, "INSERT INTO pets(name, age) VALUES ($1, $2)");
    assert_eq!(
        writes[0].args,
        vec![
            Arg::Value(Value::Text("rex".into())),
            Arg::Value(Value::Int(4)),
            Arg::Option(CallOption::Returning(Returning::new("id"))),
        ]
    );

    assert_eq!(db.commits(), 1);
    assert_eq!(db.rollbacks(), 0);
    assert_eq!(db.tx_options_seen(), vec![TxOptions::serializable()]);
}

#[tokio::test]
async fn identical_content_writes_nothing() {
    let db = StaticDb::new();
    db.script_row(Ok(pet_row(4, 7)));

    let upserter = Upserter::new(db.clone());
    let result = upserter
        .prepare(pets())
        .unwrap()
        .exec(&bindings! { "name" => "rex", "age" => 4i64 })
        .await
        .unwrap();

    assert_eq!(result.rows_affected, 0);
    assert_eq!(result.last_insert_id, Some(7));
    assert!(db.execs().is_empty());
    assert_eq!(db.commits(), 0);
    assert_eq!(db.rollbacks(), 1);
}

#[tokio::test]
async fn changed_content_updates() {
    let db = StaticDb::new();
    db.script_row(Ok(pet_row(4, 7)));
    db.script_exec(Ok(ExecResult {
        rows_affected: 1,
        last_insert_id: None,
    }));

    let upserter = Upserter::new(db.clone());
    let result = upserter
        .prepare(pets())
        .unwrap()
        .exec(&bindings! { "name" => "rex", "age" => 5i64 })
        .await
        .unwrap();

    assert_eq!(result.rows_affected, 1);
    // Identity comes from the selected row, not the driver.
    assert_eq!(result.last_insert_id, Some(7));

    let writes = db.execs();
    assert_eq!(writes[0].sql, "UPDATE pets SET age = $1 WHERE name = $2");
    assert_eq!(
        writes[0].args,
        vec![
            Arg::Value(Value::Int(5)),
            Arg::Value(Value::Text("rex".into())),
        ]
    );
    assert_eq!(db.commits(), 1);
}

#[tokio::test]
async fn insert_only_mode_leaves_existing_rows_alone() {
    let db = StaticDb::new();
    db.script_row(Ok(pet_row(4, 7)));

    let upserter = Upserter::new(db.clone());
    let result = upserter
        .prepare(pets().mode(UpsertMode::Insert))
        .unwrap()
        .exec(&bindings! { "name" => "rex", "age" => 9i64 })
        .await
        .unwrap();

    assert_eq!(result.rows_affected, 0);
    assert_eq!(result.last_insert_id, Some(7));
    assert!(db.execs().is_empty());
    assert_eq!(db.rollbacks(), 1);
}

#[tokio::test]
async fn update_only_mode_never_creates_rows() {
    let db = StaticDb::new();
    db.script_row(Ok(None));

    let upserter = Upserter::new(db.clone());
    let result = upserter
        .prepare(pets().mode(UpsertMode::Update))
        .unwrap()
        .exec(&bindings! { "name" => "rex", "age" => 9i64 })
        .await
        .unwrap();

    assert_eq!(result, ExecResult::default());
    assert!(db.execs().is_empty());
    assert_eq!(db.rollbacks(), 1);
}

#[tokio::test]
async fn insert_values_never_reach_the_update() {
    let stmt = pets().insert_value(Marker::column("adopted_at"));
    let values = bindings! {
        "name" => "rex",
        "age" => 5i64,
        "adopted_at" => "2026-01-15",
    };

    // Row exists with a different age: the update must not touch
    // adopted_at, and the comparison must not look at it either.
    let db = StaticDb::new();
    db.script_row(Ok(pet_row(4, 7)));
    db.script_exec(Ok(ExecResult {
        rows_affected: 1,
        last_insert_id: None,
    }));
    Upserter::new(db.clone())
        .prepare(stmt.clone())
        .unwrap()
        .exec(&values)
        .await
        .unwrap();
    assert_eq!(db.execs()[0].sql, "UPDATE pets SET age = $1 WHERE name = $2");

    // No row: the insert carries it, after query and set values.
    let db = StaticDb::new();
    db.script_row(Ok(None));
    Upserter::new(db.clone())
        .prepare(stmt)
        .unwrap()
        .exec(&values)
        .await
        .unwrap();
    assert_eq!(
        db.execs()[0].sql,
        "INSERT INTO pets(name, age, adopted_at) VALUES ($1, $2, $3)"
    );
}

#[tokio::test]
async fn identity_is_the_same_on_every_branch() {
    let values = bindings! { "name" => "rex", "age" => 4i64 };

    let inserted = {
        let db = StaticDb::new();
        db.script_row(Ok(None));
        db.script_exec(Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: Some(7),
        }));
        Upserter::new(db).prepare(pets()).unwrap().exec(&values).await.unwrap()
    };
    let pristine = {
        let db = StaticDb::new();
        db.script_row(Ok(pet_row(4, 7)));
        Upserter::new(db).prepare(pets()).unwrap().exec(&values).await.unwrap()
    };
    let updated = {
        let db = StaticDb::new();
        db.script_row(Ok(pet_row(3, 7)));
        db.script_exec(Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: None,
        }));
        Upserter::new(db).prepare(pets()).unwrap().exec(&values).await.unwrap()
    };

    assert_eq!(inserted.last_insert_id, Some(7));
    assert_eq!(pristine.last_insert_id, Some(7));
    assert_eq!(updated.last_insert_id, Some(7));
}

#[tokio::test]
async fn query_values_alone_make_an_existence_upsert() {
    let stmt = UpsertStatement::new("tags").query_value(Marker::column("label"));
    let values = bindings! { "label" => "urgent" };

    // Absent: inserted.
    let db = StaticDb::new();
    db.script_row(Ok(None));
    let result = Upserter::new(db.clone())
        .prepare(stmt.clone())
        .unwrap()
        .exec(&values)
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 1);
    assert_eq!(db.query_rows()[0].sql, "SELECT 1 FROM tags WHERE label = $1");
    assert_eq!(db.execs()[0].sql, "INSERT INTO tags(label) VALUES ($1)");

    // Present: nothing to compare, so always pristine.
    let db = StaticDb::new();
    db.script_row(Ok(Some(vec![Value::Int(1)])));
    let result = Upserter::new(db.clone())
        .prepare(stmt)
        .unwrap()
        .exec(&values)
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 0);
    assert!(db.execs().is_empty());
    assert_eq!(db.rollbacks(), 1);
}

#[tokio::test]
async fn lost_insert_race_converges_on_retry() {
    let db = StaticDb::new();
    // First attempt: no row, then the insert hits a serialization failure
    // because a concurrent upsert won the race.
    db.script_row(Ok(None));
    db.script_exec(Err(DbError::rollback(
        RollbackKind::SerializationFailure,
        "40001",
    )));
    // Second attempt: the row is there with identical content.
    db.script_row(Ok(pet_row(4, 7)));

    let upserter = Upserter::new(db.clone());
    let result = upserter
        .prepare(pets())
        .unwrap()
        .exec(&bindings! { "name" => "rex", "age" => 4i64 })
        .await
        .unwrap();

    assert_eq!(result.rows_affected, 0);
    assert_eq!(result.last_insert_id, Some(7));
    assert_eq!(db.begins(), 2);
    assert_eq!(db.commits(), 0);
    // One rollback for the failed attempt, one for the no-op.
    assert_eq!(db.rollbacks(), 2);
}

#[tokio::test]
async fn non_retryable_failures_propagate() {
    let db = StaticDb::new();
    db.script_row(Ok(None));
    db.script_exec(Err(DbError::backend("connection reset")));

    let upserter = Upserter::new(db.clone());
    let err = upserter
        .prepare(pets())
        .unwrap()
        .exec(&bindings! { "name" => "rex", "age" => 4i64 })
        .await
        .unwrap_err();

    assert_eq!(err, DbError::backend("connection reset"));
    assert_eq!(db.begins(), 1);
    assert_eq!(db.rollbacks(), 1);
}

#[tokio::test]
async fn bounded_policy_gives_up() {
    let db = StaticDb::new();
    for _ in 0..2 {
        db.script_row(Ok(None));
        db.script_exec(Err(DbError::rollback(RollbackKind::Locked, "busy")));
    }

    let upserter =
        Upserter::new(db.clone()).with_retry_policy(RetryPolicy::new().max_attempts(2));
    let err = upserter
        .prepare(pets())
        .unwrap()
        .exec(&bindings! { "name" => "rex", "age" => 4i64 })
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(db.begins(), 2);
}

#[tokio::test]
async fn non_integer_returning_value_is_rejected() {
    let db = StaticDb::new();
    db.script_row(Ok(Some(vec![
        Value::Int(1),
        Value::Int(4),
        Value::Text("seven".into()),
    ])));

    let upserter = Upserter::new(db.clone());
    let err = upserter
        .prepare(pets())
        .unwrap()
        .exec(&bindings! { "name" => "rex", "age" => 4i64 })
        .await
        .unwrap_err();

    assert_eq!(err, DbError::InvalidType);
    assert_eq!(db.rollbacks(), 1);
    assert_eq!(db.commits(), 0);
}
