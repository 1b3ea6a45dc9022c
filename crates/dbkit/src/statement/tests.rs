//! Cross-statement rendering tests.

use crate::bindings;
use crate::marker::{Marker, OrderBy};
use crate::predicate::Predicate;
use crate::statement::{JoinClause, delete, insert, select, update};
use crate::value::{Arg, Value};

#[test]
fn entry_points_name_their_table() {
    assert_eq!(select("users").table, "users");
    assert_eq!(insert("users").table, "users");
    assert_eq!(update("users").table, "users");
    assert_eq!(delete("users").table, "users");
}

#[test]
fn templates_are_reusable_after_clone() {
    let template = select("users")
        .field(Marker::column("id"))
        .where_clause(Predicate::eq(Marker::column("email")));
    let copy = template.clone();

    let a = template.build(&bindings! { "email" => "a@x" }).unwrap();
    let b = copy.build(&bindings! { "email" => "b@x" }).unwrap();

    assert_eq!(a.sql, b.sql);
    assert_eq!(a.args, vec![Arg::Value(Value::Text("a@x".into()))]);
    assert_eq!(b.args, vec![Arg::Value(Value::Text("b@x".into()))]);

    // and the original still renders the same afterwards
    let again = template.build(&bindings! { "email" => "a@x" }).unwrap();
    assert_eq!(again, a);
}

#[test]
fn placeholder_numbering_spans_sections() {
    let built = update("events")
        .fields([Marker::column("kind"), Marker::column("payload")])
        .where_clause(Predicate::and([
            Predicate::eq(Marker::column("org")),
            Predicate::in_list(Marker::column("state")),
        ]))
        .build(&bindings! {
            "kind" => "audit",
            "payload" => "{}",
            "org" => 7i64,
            "state" => Value::list(["new", "seen"]),
        })
        .unwrap();

    assert_eq!(
        built.sql,
        "UPDATE events SET kind = $1, payload = $2 WHERE (org = $3) AND (state IN ($4, $5))"
    );
    assert_eq!(built.args.len(), 5);
}

#[test]
fn empty_conjunction_renders_a_contradiction() {
    let built = select("users")
        .field(Marker::column("id"))
        .where_clause(Predicate::and([]))
        .build(&bindings! {})
        .unwrap();

    assert_eq!(built.sql, "SELECT id FROM users WHERE 1=0");
    assert!(built.args.is_empty());
}

#[test]
fn full_select_section_order() {
    let built = select("orders")
        .fields([Marker::column("customer"), Marker::expr("total", "SUM(amount)")])
        .join(JoinClause::inner(
            "customers",
            Predicate::eq_markers(
                Marker::qualified("cid", "customers", "id"),
                Marker::column("customer"),
            ),
        ))
        .where_clause(Predicate::gte(Marker::column("created_at")))
        .group_by([Marker::column("customer")])
        .having(Predicate::gt_value(Marker::expr("total", "SUM(amount)"), 100i64))
        .order_by(OrderBy::desc(Marker::expr("total", "SUM(amount)")))
        .limit(10)
        .offset(20)
        .build(&bindings! { "created_at" => 0i64 })
        .unwrap();

    assert_eq!(
        built.sql,
        "SELECT customer, SUM(amount) FROM orders \
         INNER JOIN customers ON \"customers\".\"id\" = customer \
         WHERE created_at >= $1 \
         GROUP BY customer \
         HAVING SUM(amount) > $2 \
         ORDER BY SUM(amount) DESC \
         LIMIT 10 OFFSET 20"
    );
    assert_eq!(built.args.len(), 2);
}

#[test]
fn delete_with_composite_clause() {
    let built = delete("sessions")
        .where_clause(Predicate::or([
            Predicate::lt(Marker::column("expires_at")),
            Predicate::is_null(Marker::column("user_id")),
        ]))
        .build(&bindings! { "expires_at" => 1_700_000_000i64 })
        .unwrap();

    assert_eq!(
        built.sql,
        "DELETE FROM sessions WHERE (expires_at < $1) OR (user_id IS NULL)"
    );
}
