//! Integration tests against the in-memory catalog
//!
//! Tests the full flow: YAML table definitions → model → DDL → catalog state

use chrono::NaiveDate;
use serde_json::json;
use solidafy_partitioned::loader::build_model_on;
use solidafy_partitioned::{
    load_tables_from_str, strategy, Connection, Error, InfrastructureOptions, KeyValue,
    MemoryConnection, Model, PartitionManager, PartitionedTable,
};
use std::sync::Arc;

const SCHEMA: &[&str] = &[
    "CREATE TABLE companies (id serial primary key, name text)",
    "CREATE TABLE employees (id serial, company_id integer, name text, created_at timestamp)",
    "CREATE TABLE awards (id serial, company_id integer, awarded_on date)",
];

const TABLES: &str = r#"
tables:
  - name: Employee
    table_name: employees
    strategy:
      type: by_id
      table_size: 10
    foreign_keys:
      - field: company_id
  - name: Award
    table_name: awards
    strategy:
      type: multi_level
      levels:
        - type: by_foreign_key
          field: company_id
        - type: by_weekly_time_field
          field: awarded_on
  - name: Event
    table_name: events
    strategy:
      type: by_daily_time_field
      field: created_at
    janitorial:
      create_ahead: 2
      drop_after: 7
"#;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn database() -> Arc<MemoryConnection> {
    let connection = Arc::new(MemoryConnection::new());
    for statement in SCHEMA {
        connection.execute(statement).unwrap();
    }
    connection
}

fn model(name: &str) -> Model {
    let def = load_tables_from_str(TABLES).unwrap();
    build_model_on(def.find(name).unwrap(), date(2024, 3, 10)).unwrap()
}

fn manager(name: &str, connection: &Arc<MemoryConnection>) -> PartitionManager {
    let manager = PartitionManager::new(model(name), connection.clone());
    manager
        .create_infrastructure(&InfrastructureOptions::default())
        .unwrap();
    manager
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[test]
fn test_create_then_drop() {
    let db = database();
    let manager = manager("Employee", &db);
    let key = [KeyValue::Integer(25)];

    assert!(!manager.adapter().partition_exists(&key).unwrap());
    manager.create_new_partition(&key).unwrap();
    assert!(manager.adapter().partition_exists(&key).unwrap());

    let table = db.table("employees_partitions.p20").unwrap();
    assert_eq!(table.parent.as_deref(), Some("public.employees"));
    assert_eq!(table.check.as_deref(), Some("( id >= 20 and id < 30 )"));
    assert_eq!(table.indexes, vec!["p20_id_udx"]);
    assert_eq!(
        table.foreign_keys.get("p20_company_id_fkey").map(String::as_str),
        Some("public.companies")
    );

    manager.drop_old_partition(&key).unwrap();
    assert!(!manager.adapter().partition_exists(&key).unwrap());
}

#[test]
fn test_archive_keeps_table() {
    let db = database();
    let manager = manager("Employee", &db);
    let key = [KeyValue::Integer(1)];
    manager.create_new_partition(&key).unwrap();

    manager.archive_old_partition(&key).unwrap();
    assert!(manager.adapter().partition_exists(&key).unwrap());
    assert_eq!(db.table("employees_partitions.p0").unwrap().parent, None);
}

#[test]
fn test_batch_isolation() {
    let db = database();
    let manager = manager("Employee", &db);
    manager.create_new_partition(&[KeyValue::Integer(5)]).unwrap();

    let report = manager.create_new_partition_tables([
        vec![KeyValue::Integer(5)],
        vec![KeyValue::Integer(15)],
    ]);

    assert_eq!(report.attempted(), 2);
    assert_eq!(report.succeeded, vec![vec![KeyValue::Integer(15)]]);
    assert!(matches!(
        report.failures[0].error,
        Error::PartitionAlreadyExists { .. }
    ));
    assert!(db.has_table("employees_partitions.p10"));
}

#[test]
fn test_last_n_partition_names() {
    let db = database();
    let manager = manager("Employee", &db);
    manager.create_new_partition_tables([
        vec![KeyValue::Integer(5)],
        vec![KeyValue::Integer(105)],
        vec![KeyValue::Integer(25)],
    ]);

    assert_eq!(
        manager.adapter().last_n_partition_names(2).unwrap(),
        vec!["p100", "p20"]
    );
}

// ============================================================================
// Infrastructure Tests
// ============================================================================

#[test]
fn test_infrastructure_idempotence() {
    let db = database();
    let manager = manager("Employee", &db);

    manager
        .create_infrastructure(&InfrastructureOptions::default())
        .unwrap();
    let err = manager
        .create_infrastructure(&InfrastructureOptions::default().strict())
        .unwrap_err();
    assert!(err.is_already_exists());
}

#[test]
fn test_parent_insert_rejected() {
    let db = database();
    let manager = manager("Employee", &db);
    manager.create_new_partition(&[KeyValue::Integer(1)]).unwrap();

    let err = db
        .execute("INSERT INTO employees (company_id, name) VALUES (1, 'Keith')")
        .unwrap_err();
    assert_eq!(err.sqlstate(), Some("P0001"));

    db.execute("INSERT INTO employees_partitions.p0 (company_id, name) VALUES (1, 'Keith')")
        .unwrap();
    assert_eq!(db.table("employees_partitions.p0").unwrap().rows, 1);
}

#[test]
fn test_schema_not_empty() {
    let db = database();
    let manager = manager("Employee", &db);
    manager.create_new_partition(&[KeyValue::Integer(1)]).unwrap();

    let err = manager
        .delete_infrastructure(&InfrastructureOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::SchemaNotEmpty { ref schema } if schema == "employees_partitions"));

    manager
        .delete_infrastructure(&InfrastructureOptions::default().cascade())
        .unwrap();
    assert!(!db.has_schema("employees_partitions"));
    db.execute("INSERT INTO employees (company_id) VALUES (1)")
        .unwrap();
}

// ============================================================================
// Multi-Level Tests
// ============================================================================

#[test]
fn test_multi_level_nested_creation() {
    let db = database();
    let manager = manager("Award", &db);
    let outer = [KeyValue::Integer(1)];
    let inner = [KeyValue::Integer(1), KeyValue::Date(date(2011, 10, 12))];

    let err = manager.create_new_partition(&inner).unwrap_err();
    assert!(err.is_missing());

    manager.create_new_partition(&outer).unwrap();
    manager.create_new_partition(&inner).unwrap();

    let outer_table = db.table("awards_partitions.p1").unwrap();
    assert_eq!(outer_table.parent.as_deref(), Some("public.awards"));
    assert_eq!(outer_table.check.as_deref(), Some("( company_id = 1 )"));

    let inner_table = db.table("awards_partitions.p1_20111010").unwrap();
    assert_eq!(inner_table.parent.as_deref(), Some("awards_partitions.p1"));
    assert_eq!(
        inner_table.check.as_deref(),
        Some("awarded_on >= '2011-10-10' AND awarded_on < '2011-10-17'")
    );
    assert_eq!(inner_table.indexes, vec!["p1_20111010_awarded_on_idx"]);
    assert!(inner_table
        .foreign_keys
        .values()
        .any(|referenced| referenced == "public.companies"));
}

#[test]
fn test_multi_level_routing() {
    let db = database();
    let awards = PartitionedTable::new(model("Award"), db.clone());
    let attributes = json!({"company_id": 1, "awarded_on": "2011-10-12"});

    let route = awards.route(attributes.as_object().unwrap()).unwrap();
    assert_eq!(route.table.name, "awards_partitions.p1_20111010");

    let target = awards.from_partition(&route.key_values).unwrap();
    assert_eq!(
        target.from_clause(),
        "awards_partitions.p1_20111010 AS awards_partitions_p1_20111010"
    );
}

// ============================================================================
// Janitorial Tests
// ============================================================================

#[test]
fn test_janitorial_create_and_drop() {
    let db = database();
    db.execute("CREATE TABLE events (id serial, created_at timestamp)")
        .unwrap();
    let manager = manager("Event", &db);

    let created = manager.create_new_partitions().unwrap().into_result().unwrap();
    assert_eq!(created.len(), 3);
    assert_eq!(
        db.table_names("events_partitions"),
        vec!["p20240310", "p20240311", "p20240312"]
    );

    // the drop window is a week back, which was never created
    let dropped = manager.drop_old_partitions().unwrap();
    assert_eq!(dropped.failures.len(), 1);
    assert!(dropped.failures[0].error.is_missing());

    let daily = strategy::by_daily_time_field()
        .derive("Event", |p| {
            p.model_table_name("events").time_field("created_at");
        })
        .unwrap();
    let plain = PartitionManager::new(daily, db.clone());
    plain
        .create_new_partition(&[KeyValue::Date(date(2024, 3, 3))])
        .unwrap();
    assert!(manager.drop_old_partitions().unwrap().is_success());
    assert!(!db.has_table("events_partitions.p20240303"));
}
