//! Tests for the configuration data and DSL

use super::*;
use crate::error::Error;
use crate::model::Model;
use crate::strategy;
use crate::types::KeyValue;
use pretty_assertions::assert_eq;
use test_case::test_case;

fn configure(f: impl FnOnce(&mut Dsl)) -> Model {
    strategy::partitioned_base().derive("Foo", f).unwrap()
}

fn own_data(model: &Model) -> &Data {
    model.layers().next().unwrap().data()
}

// ============================================================================
// Setting Tests
// ============================================================================

#[test]
fn test_setting_from_str_detects_templates() {
    assert!(matches!(Setting::from("employees_partitions"), Setting::Literal(_)));
    assert!(matches!(
        Setting::from("{{ model.table_name }}_partitions"),
        Setting::Template(_)
    ));
}

#[test]
fn test_empty_settings() {
    assert!(Setting::from("").is_empty());
    assert!(!Setting::from("x").is_empty());
    assert!(!Setting::computed(|_, _| Ok(String::new())).is_empty());
}

// ============================================================================
// Foreign Key Tests
// ============================================================================

#[test_case("company_id", "companies")]
#[test_case("user_id", "users")]
#[test_case("address_id", "addresses")]
#[test_case("box_id", "boxes")]
#[test_case("day_id", "days")]
#[test_case("branch_id", "branches")]
#[test_case("owner", "owners")]
fn test_foreign_key_table_name(field: &str, table: &str) {
    assert_eq!(foreign_key_to_foreign_table_name(field), table);
}

#[test]
fn test_foreign_key_defaults() {
    let fk = ForeignKey::new("company_id");
    assert_eq!(fk.referencing_field, "company_id");
    assert_eq!(fk.referenced_table, "companies");
    assert_eq!(fk.referenced_field, "id");

    let explicit = ForeignKey::references("boss_id", "employees", "id");
    assert_eq!(explicit.referenced_table, "employees");
}

#[test]
fn test_index_columns() {
    let index = Index::unique("company_id, ID");
    assert_eq!(index.columns(), vec!["company_id", "id"]);
    assert!(index.options.unique);
}

// ============================================================================
// DSL Tests
// ============================================================================

#[test]
fn test_dsl_on_sets_field() {
    let model = configure(|p| {
        p.on("company_id");
    });
    assert!(matches!(
        own_data(&model).on_field,
        Some(Setting::Literal(ref f)) if f == "company_id"
    ));
}

#[test]
fn test_dsl_index_appends() {
    let model = configure(|p| {
        p.index("id", IndexOptions::unique());
        p.index("name", IndexOptions::default());
        p.index_with(|model, _| Ok(Index::unique(model.name())));
    });
    let indexes = &own_data(&model).indexes;
    assert_eq!(indexes.len(), 3);
    assert!(matches!(&indexes[0], Entry::Literal(i) if i.field == "id" && i.options.unique));
    assert!(matches!(&indexes[1], Entry::Literal(i) if i.field == "name" && !i.options.unique));
    assert!(!indexes[1].is_computed());
    assert!(indexes[2].is_computed());
}

#[test]
fn test_dsl_foreign_key_appends() {
    let model = configure(|p| {
        p.foreign_key("company_id");
        p.foreign_key(ForeignKey::references("boss_id", "employees", "id"));
    });
    assert_eq!(own_data(&model).foreign_keys.len(), 2);
}

#[test]
fn test_dsl_singular_calls_overwrite() {
    let model = configure(|p| {
        p.check_constraint("a = 1");
        p.check_constraint("b = 2");
    });
    assert!(matches!(
        own_data(&model).check_constraint,
        Some(Setting::Literal(ref c)) if c == "b = 2"
    ));
}

#[test]
fn test_dsl_accepts_every_singular_field() {
    let model = configure(|p| {
        p.on("f")
            .order("tablename")
            .schema_name("s")
            .name_prefix("x")
            .base_name("b")
            .part_name("pn")
            .table_name("s.t")
            .table_alias_name("a")
            .parent_table_schema_name("ps")
            .parent_table_name("pt")
            .check_constraint("c");
    });
    let data = own_data(&model);
    assert!(ALL_FIELDS.iter().all(|f| data.setting(*f).is_some()));
}

#[test]
fn test_dsl_computed_setting() {
    let model = configure(|p| {
        p.base_name(Setting::computed(|_, kv| Ok(format!("k{}", kv[0]))));
    });
    match &own_data(&model).base_name {
        Some(Setting::Computed(f)) => {
            assert_eq!(f(&model, &[KeyValue::Integer(3)]).unwrap(), "k3");
        }
        other => panic!("Expected computed setting, got {other:?}"),
    }
}

#[test]
fn test_dsl_schedules_and_hooks() {
    let model = configure(|p| {
        p.janitorial_creates_needed(|_| Ok(vec![vec![KeyValue::Integer(1)]]));
        p.after_partition_table_create_hook(|_, _, _| Ok(()));
        p.after_partition_table_create_hook(|_, _, _| Ok(()));
    });
    let data = own_data(&model);
    assert!(data.janitorial_creates_needed.is_some());
    assert!(data.janitorial_drops_needed.is_none());
    assert_eq!(data.after_partition_table_create_hooks.len(), 2);
}

#[test]
fn test_dsl_using_classes_appends() {
    let model = strategy::multi_level()
        .derive("Employee", |p| {
            p.using_classes([strategy::by_id()]);
            p.using_classes([strategy::by_created_at()]);
        })
        .unwrap();
    let names: Vec<_> = own_data(&model)
        .using_classes
        .iter()
        .map(|m| m.name().to_string())
        .collect();
    assert_eq!(names, vec!["ById", "ByCreatedAt"]);
}

#[test]
fn test_dsl_rejects_on_for_multi_level() {
    let result = strategy::multi_level().derive("Employee", |p| {
        p.on("id");
    });
    assert!(matches!(result, Err(Error::InvalidForMultiLevel { .. })));
}

#[test]
fn test_empty_layer() {
    let model = configure(|_| {});
    assert!(own_data(&model).is_empty());
    assert!(!own_data(&strategy::partitioned_base()).is_empty());
}
