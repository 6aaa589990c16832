//! Integration tests for the qb module.

use crate::dialect::Dialect;
use crate::error::DbError;
use crate::qb::{Connector, JoinType, QueryBuilder};
use crate::row::Row;
use crate::testing::RecordingExecutor;
use crate::value::Value;
use serde_json::json;

fn users(dialect: Dialect) -> QueryBuilder {
    QueryBuilder::for_table(dialect, "users")
}

#[test]
fn test_select_basic() {
    let qb = users(Dialect::Mysql);
    assert_eq!(qb.to_sql().unwrap(), "SELECT * FROM users");
}

#[test]
fn test_select_order_limit_offset() {
    let mut qb = users(Dialect::Mysql);
    qb.select(["id", "name"])
        .order_by("name", "DESC")
        .unwrap()
        .limit(5)
        .unwrap()
        .offset(10)
        .unwrap();

    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT id, name FROM users ORDER BY name DESC LIMIT 5 OFFSET 10"
    );
}

#[test]
fn test_from_overrides_table_for_select() {
    let mut qb = users(Dialect::Postgres);
    qb.from("active_users");
    assert_eq!(qb.to_sql().unwrap(), "SELECT * FROM active_users");
}

#[test]
fn test_missing_table() {
    let qb = QueryBuilder::new(Dialect::Mysql);
    assert!(matches!(qb.to_sql(), Err(DbError::MissingTable)));
    assert!(matches!(qb.to_count_sql(), Err(DbError::MissingTable)));
    assert!(matches!(qb.to_delete_sql(), Err(DbError::MissingTable)));
}

#[test]
fn test_where_count_matches_bindings() {
    let mut qb = users(Dialect::Mysql);
    for (i, column) in ["a", "b", "c", "d"].iter().enumerate() {
        qb.where_(column, "=", i as i64).unwrap();
    }

    let sql = qb.to_sql().unwrap();
    let where_sql = sql.split(" WHERE ").nth(1).unwrap();
    assert_eq!(where_sql.matches(" = :").count(), 4);
    assert_eq!(qb.where_clauses().len(), 4);
    assert_eq!(qb.bindings().len(), 4);
}

#[test]
fn test_connector_offset() {
    let mut qb = QueryBuilder::for_table(Dialect::Mysql, "t");
    qb.where_with("a", "=", 1, Connector::And)
        .unwrap()
        .where_with("b", "=", 2, Connector::Or)
        .unwrap();

    assert_eq!(qb.to_sql().unwrap(), "SELECT * FROM t WHERE a = :a_1 OR b = :b_2");
}

#[test]
fn test_first_clause_connector_is_discarded() {
    let mut qb = QueryBuilder::for_table(Dialect::Mysql, "t");
    qb.or_where("a", "=", 1)
        .unwrap()
        .where_("b", "=", 2)
        .unwrap();

    assert_eq!(qb.to_sql().unwrap(), "SELECT * FROM t WHERE a = :a_1 AND b = :b_2");
}

#[test]
fn test_where_in_expands_lists() {
    let mut qb = users(Dialect::Postgres);
    qb.where_in("id", vec![1, 2, 3])
        .unwrap()
        .or_where_in("role", Vec::<String>::new())
        .unwrap();

    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT * FROM users WHERE id IN (:id_1, :id_2, :id_3) OR role IN (NULL)"
    );
    assert_eq!(qb.bindings().len(), 3);
}

#[test]
fn test_between_and_is_null() {
    let mut qb = users(Dialect::Mysql);
    qb.where_("age", "between", vec![18, 30])
        .unwrap()
        .where_("deleted_at", "IS NULL", Value::Null)
        .unwrap();

    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT * FROM users WHERE age BETWEEN :age_1 AND :age_2 AND deleted_at IS NULL"
    );
    assert_eq!(qb.bindings().len(), 2);
}

#[test]
fn test_between_requires_two_values() {
    let mut qb = users(Dialect::Mysql);
    let err = qb.where_("age", "BETWEEN", 18).unwrap_err();
    assert!(matches!(err, DbError::InvalidValue { column, .. } if column == "age"));
    assert!(qb.where_clauses().is_empty());
    assert!(qb.bindings().is_empty());
}

#[test]
fn test_unsupported_operator_leaves_state_untouched() {
    let mut qb = users(Dialect::Mysql);
    let err = qb.where_("name", "SOUNDS LIKE", "bob").unwrap_err();
    assert!(err.is_unsupported_operator());
    assert!(qb.where_clauses().is_empty());
    assert!(qb.bindings().is_empty());
}

#[test]
fn test_join() {
    let mut qb = users(Dialect::Mysql);
    qb.select(["users.id", "orders.total"])
        .join("orders", "orders.user_id", "=", "users.id", JoinType::Inner)
        .unwrap()
        .left_join("profiles", "profiles.user_id", "=", "users.id")
        .unwrap();

    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT users.id, orders.total FROM users \
         INNER JOIN orders ON orders.user_id = users.id \
         LEFT JOIN profiles ON profiles.user_id = users.id"
    );
}

#[test]
fn test_join_fixed_type_wrappers() {
    let mut qb = users(Dialect::Postgres);
    qb.right_join("a", "a.id", "=", "users.a_id")
        .unwrap()
        .full_join("b", "b.id", "<>", "users.b_id")
        .unwrap();

    let sql = qb.to_sql().unwrap();
    assert!(sql.contains("RIGHT JOIN a ON a.id = users.a_id"));
    assert!(sql.contains("FULL JOIN b ON b.id <> users.b_id"));
}

#[test]
fn test_join_operator_whitelist() {
    let mut mysql = users(Dialect::Mysql);
    let err = mysql
        .join("orders", "orders.id", "FOO", "users.id", JoinType::Inner)
        .unwrap_err();
    assert!(err.is_unsupported_operator());

    let err = mysql
        .join("orders", "orders.id", "ILIKE", "users.id", JoinType::Inner)
        .unwrap_err();
    assert!(err.is_unsupported_operator());
    assert_eq!(mysql.to_sql().unwrap(), "SELECT * FROM users");

    let mut postgres = users(Dialect::Postgres);
    postgres
        .join("orders", "orders.id", "ILIKE", "users.id", JoinType::Inner)
        .unwrap();
    assert_eq!(
        postgres.to_sql().unwrap(),
        "SELECT * FROM users INNER JOIN orders ON orders.id ILIKE users.id"
    );
}

#[test]
fn test_order_by_direction() {
    let mut qb = users(Dialect::Mysql);
    qb.order_by("name", "asc").unwrap();
    let err = qb.order_by("age", "UP").unwrap_err();
    assert!(matches!(err, DbError::UnsupportedDirection { direction } if direction == "UP"));
    assert_eq!(qb.to_sql().unwrap(), "SELECT * FROM users ORDER BY name ASC");
}

#[test]
fn test_limit_offset_validation() {
    let mut qb = users(Dialect::Mysql);

    let err = qb.limit(-1).unwrap_err();
    assert!(matches!(err, DbError::InvalidLimitOffset { clause: "LIMIT", ref value } if value == "-1"));
    assert!(qb.limit("x").unwrap_err().is_invalid_limit_offset());
    assert!(qb.offset(-5).unwrap_err().is_invalid_limit_offset());

    qb.limit(0).unwrap().offset("20").unwrap();
    assert_eq!(qb.to_sql().unwrap(), "SELECT * FROM users LIMIT 0 OFFSET 20");
}

#[test]
fn test_identifiers_are_sanitized() {
    let mut qb = QueryBuilder::for_table(Dialect::Mysql, "users'--");
    qb.select(["<b>name</b>"]);
    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT &lt;b&gt;name&lt;/b&gt; FROM users&#039;--"
    );
}

#[test]
fn test_values_never_inlined() {
    let mut qb = users(Dialect::Postgres);
    qb.where_("name", "=", "Robert'); DROP TABLE users; --")
        .unwrap()
        .where_("age", ">", 42)
        .unwrap();

    let sql = qb.to_sql().unwrap();
    assert!(!sql.contains("Robert"));
    assert!(!sql.contains("42"));
    assert_eq!(sql, "SELECT * FROM users WHERE name = :name_1 AND age > :age_2");
}

#[test]
fn test_count_sql_drops_paging() {
    let mut qb = users(Dialect::Mysql);
    qb.select(["id"])
        .where_("active", "=", true)
        .unwrap()
        .order_by("id", "DESC")
        .unwrap()
        .limit(10)
        .unwrap();

    assert_eq!(
        qb.to_count_sql().unwrap(),
        "SELECT COUNT(*) AS count FROM users WHERE active = :active_1"
    );
    // The projection is left alone for later SELECTs.
    assert!(qb.to_sql().unwrap().starts_with("SELECT id FROM users"));
}

#[test]
fn test_update_shape() {
    let mut qb = users(Dialect::Mysql);
    qb.where_("id", "=", 1).unwrap();

    let sql = qb.stage_update([("name", "Bob")]).unwrap().unwrap();
    assert_eq!(sql, "UPDATE users SET name = :name_2 WHERE id = :id_1");
    assert_eq!(qb.bindings().len(), 2);
    assert_eq!(qb.bindings().get("name_2"), Some(&Value::from("Bob")));
}

#[test]
fn test_update_without_where_fails() {
    let mut qb = users(Dialect::Mysql);
    let err = qb.stage_update([("name", "Bob")]).unwrap_err();
    assert!(matches!(err, DbError::MissingWhereClause { ref table } if table == "users"));
    assert!(err.is_missing_where_clause());
    assert!(qb.bindings().is_empty());
}

#[test]
fn test_delete_has_no_guard() {
    let qb = users(Dialect::Mysql);
    assert_eq!(qb.to_delete_sql().unwrap(), "DELETE FROM users");

    let mut qb = users(Dialect::Mysql);
    qb.where_("id", "=", 7).unwrap();
    assert_eq!(qb.to_delete_sql().unwrap(), "DELETE FROM users WHERE id = :id_1");
}

#[test]
fn test_insert_multi_row() {
    let mut qb = users(Dialect::Mysql);
    let sql = qb
        .stage_insert(vec![vec![("name", "A")], vec![("name", "B")]])
        .unwrap()
        .unwrap();

    assert_eq!(sql, "INSERT INTO users (name) VALUES (:name_1), (:name_2)");
    let values: Vec<&Value> = qb.bindings().iter().map(|(_, v)| v).collect();
    assert_eq!(values, vec![&Value::from("A"), &Value::from("B")]);
}

#[test]
fn test_insert_follows_first_row_column_order() {
    let mut qb = users(Dialect::Postgres);
    let rows = vec![
        vec![("name", Value::from("A")), ("age", Value::from(1))],
        vec![("age", Value::from(2)), ("name", Value::from("B"))],
    ];
    let sql = qb.stage_insert(rows).unwrap().unwrap();

    assert_eq!(
        sql,
        "INSERT INTO users (name, age) VALUES (:name_1, :age_2), (:name_3, :age_4)"
    );
    assert_eq!(qb.bindings().get("name_3"), Some(&Value::from("B")));
    assert_eq!(qb.bindings().get("age_4"), Some(&Value::Int(2)));
}

#[test]
fn test_insert_rejects_mismatched_rows() {
    let mut qb = users(Dialect::Mysql);
    let rows = vec![
        vec![("name", Value::from("A"))],
        vec![("email", Value::from("b@example.com"))],
    ];
    let err = qb.stage_insert(rows).unwrap_err();
    assert!(matches!(err, DbError::MismatchedRow { index: 1, .. }));
    assert!(qb.bindings().is_empty());
}

#[test]
fn test_insert_empty_is_noop() {
    let mut qb = users(Dialect::Mysql);
    let rows: Vec<Vec<(String, Value)>> = Vec::new();
    assert!(qb.stage_insert(rows).unwrap().is_none());
}

// ==================== Terminal operations ====================

#[tokio::test]
async fn test_get_dispatches_to_sql_verbatim() {
    let mut conn = RecordingExecutor::new(Dialect::Postgres);
    conn.push_result(vec![[("id", json!(1)), ("name", json!("Ann"))].into_iter().collect()]);

    let mut qb = users(Dialect::Postgres);
    qb.select(["id", "name"])
        .where_("name", "ILIKE", "%an%")
        .unwrap()
        .order_by("id", "ASC")
        .unwrap();

    let rows = qb.get(&mut conn).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&json!("Ann")));
    assert_eq!(conn.last_sql(), Some(qb.to_sql().unwrap().as_str()));
}

#[tokio::test]
async fn test_count_reads_count_field() {
    let mut conn = RecordingExecutor::new(Dialect::Mysql);
    let row: Row = [("count", json!(12))].into_iter().collect();
    conn.push_result(vec![row]);

    let mut qb = users(Dialect::Mysql);
    qb.where_("active", "=", 1).unwrap();

    assert_eq!(qb.count(&mut conn).await.unwrap(), 12);
    assert_eq!(
        conn.last_sql(),
        Some("SELECT COUNT(*) AS count FROM users WHERE active = :active_1")
    );
}

#[tokio::test]
async fn test_count_without_result_row() {
    let mut conn = RecordingExecutor::new(Dialect::Mysql);
    let qb = users(Dialect::Mysql);
    assert!(matches!(qb.count(&mut conn).await, Err(DbError::NotFound(_))));
}

#[tokio::test]
async fn test_empty_insert_touches_nothing() {
    let mut conn = RecordingExecutor::new(Dialect::Mysql);
    let mut qb = users(Dialect::Mysql);
    let rows: Vec<Vec<(&str, Value)>> = Vec::new();

    assert_eq!(qb.insert(&mut conn, rows).await.unwrap(), 0);
    assert!(conn.dispatched.is_empty());
}

#[tokio::test]
async fn test_insert_dispatches_bindings_in_row_order() {
    let mut conn = RecordingExecutor::new(Dialect::Mysql);
    let mut qb = users(Dialect::Mysql);

    qb.insert(&mut conn, vec![vec![("name", "A")], vec![("name", "B")]])
        .await
        .unwrap();

    let sent = &conn.dispatched[0];
    assert_eq!(sent.sql, "INSERT INTO users (name) VALUES (:name_1), (:name_2)");
    let values: Vec<&Value> = sent.bindings.iter().map(|(_, v)| v).collect();
    assert_eq!(values, vec![&Value::from("A"), &Value::from("B")]);
}

#[tokio::test]
async fn test_rejected_update_issues_no_sql() {
    let mut conn = RecordingExecutor::new(Dialect::Mysql);
    let mut qb = users(Dialect::Mysql);

    let err = qb.update(&mut conn, [("name", "Bob")]).await.unwrap_err();
    assert!(err.is_missing_where_clause());
    assert!(conn.dispatched.is_empty());
}

#[tokio::test]
async fn test_update_and_delete_dispatch() {
    let mut conn = RecordingExecutor::new(Dialect::Postgres);
    let mut qb = users(Dialect::Postgres);
    qb.where_("id", "=", 1).unwrap();

    qb.update(&mut conn, [("name", "Bob")]).await.unwrap();
    assert_eq!(
        conn.last_sql(),
        Some("UPDATE users SET name = :name_2 WHERE id = :id_1")
    );

    let qb = users(Dialect::Postgres);
    qb.delete(&mut conn).await.unwrap();
    assert_eq!(conn.last_sql(), Some("DELETE FROM users"));
}

#[tokio::test]
async fn test_transactions_delegate() {
    let mut conn = RecordingExecutor::new(Dialect::Mysql);
    let qb = users(Dialect::Mysql);

    qb.begin_transaction(&mut conn).await.unwrap();
    qb.rollback(&mut conn).await.unwrap();
    qb.begin_transaction(&mut conn).await.unwrap();
    qb.commit(&mut conn).await.unwrap();

    assert_eq!(conn.transaction_log, vec!["BEGIN", "ROLLBACK", "BEGIN", "COMMIT"]);
}

#[tokio::test]
async fn test_builder_refuses_connection_of_other_dialect() {
    let mut conn = RecordingExecutor::new(Dialect::Mysql);
    let mut qb = users(Dialect::Postgres);
    qb.where_("name", "ILIKE", "%a%").unwrap();

    let err = qb.get(&mut conn).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::DialectMismatch { builder: Dialect::Postgres, connection: Dialect::Mysql }
    ));
    assert!(qb.count(&mut conn).await.unwrap_err().is_dialect_mismatch());
    assert!(qb.delete(&mut conn).await.unwrap_err().is_dialect_mismatch());
    assert!(
        qb.update(&mut conn, [("name", "Bob")])
            .await
            .unwrap_err()
            .is_dialect_mismatch()
    );
    assert!(
        qb.insert(&mut conn, [[("name", "Bob")]])
            .await
            .unwrap_err()
            .is_dialect_mismatch()
    );

    assert!(conn.dispatched.is_empty());
    assert_eq!(qb.bindings().len(), 1);
}
