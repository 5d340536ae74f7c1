//! Tests for the built-in strategies

use super::*;
use crate::config::IndexOptions;
use crate::error::Error;
use crate::model::Model;
use crate::types::KeyValue;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use test_case::test_case;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn employee(strategy: Model) -> Model {
    strategy
        .derive("Employee", |p| {
            p.model_table_name("employees");
        })
        .unwrap()
}

// ============================================================================
// Partitioned Base
// ============================================================================

#[test_case("employees", "employees_partitions")]
#[test_case("public.employees", "employees_partitions")]
#[test_case("other.foos", "other_foos_partitions")]
fn test_default_schema_name(table: &str, expected: &str) {
    assert_eq!(default_schema_name(table), expected);
}

#[test]
fn test_base_defaults() {
    let model = employee(by_id());
    let c = model.configurator();
    let kv = [KeyValue::Integer(1)];

    assert_eq!(c.schema_name().unwrap(), "employees_partitions");
    assert_eq!(c.name_prefix().unwrap(), "p");
    assert_eq!(c.base_name(&kv).unwrap(), "0");
    assert_eq!(c.part_name(&kv).unwrap(), "p0");
    assert_eq!(c.table_name(&kv).unwrap(), "employees_partitions.p0");
    assert_eq!(c.table_alias_name(&kv).unwrap(), "employees_partitions_p0");
    assert_eq!(c.parent_table_name(&[]).unwrap(), "employees");
    assert_eq!(c.parent_table_schema_name(&[]).unwrap(), "public");
}

#[test]
fn test_qualified_parent_table() {
    let model = by_integer_field()
        .derive("Foo", |p| {
            p.model_table_name("other.foos").integer_field("id");
        })
        .unwrap();
    let c = model.configurator();

    assert_eq!(c.schema_name().unwrap(), "other_foos_partitions");
    assert_eq!(c.parent_table_schema_name(&[]).unwrap(), "other");
    assert_eq!(
        c.table_name(&[KeyValue::Integer(7)]).unwrap(),
        "other_foos_partitions.p7"
    );
}

#[test]
fn test_sanitize_identifier() {
    assert_eq!(sanitize_identifier("a.b-c d_e9"), "a_b_c_d_e9");
}

// ============================================================================
// Integer strategies
// ============================================================================

#[test_case(1, 1, "( integer_field = 1 )")]
#[test_case(2, 1, "( integer_field >= 0 and integer_field < 2 )")]
#[test_case(10, 25, "( integer_field >= 20 and integer_field < 30 )")]
fn test_integer_check_constraint(size: i64, value: i64, expected: &str) {
    let model = by_integer_field()
        .derive("Employee", |p| {
            p.model_table_name("employees")
                .integer_field("integer_field")
                .table_size(size);
        })
        .unwrap();
    let constraint = model
        .configurator()
        .check_constraint(&[KeyValue::Integer(value)])
        .unwrap();
    assert_eq!(constraint, expected);
}

#[test]
fn test_integer_normalize_floors_negatives() {
    let model = by_integer_field()
        .derive("Sized", |p| {
            p.integer_field("x").table_size(10);
        })
        .unwrap();
    assert_eq!(
        model
            .partition_normalize_key_value(&KeyValue::Integer(-3))
            .unwrap(),
        KeyValue::Integer(-10)
    );
}

#[test_case(i64::MAX; "upper bound past max")]
#[test_case(i64::MIN; "floor below min")]
fn test_by_id_bucket_out_of_range(value: i64) {
    let c = employee(by_id()).configurator();
    let err = c.check_constraint(&[KeyValue::Integer(value)]).unwrap_err();
    let invalid = match err {
        Error::Resolution { ref source, .. } => matches!(**source, Error::InvalidKeyValue { .. }),
        Error::InvalidKeyValue { .. } => true,
        _ => false,
    };
    assert!(invalid, "unexpected error: {err:?}");
}

#[test]
fn test_integer_check_constraint_at_range_end() {
    assert!(integer_check_constraint("id", i64::MAX - 5, 10).is_err());
    assert_eq!(
        integer_check_constraint("id", i64::MAX, 1).unwrap(),
        format!("( id = {} )", i64::MAX)
    );
}

#[test]
fn test_integer_generate_range() {
    let model = by_integer_field()
        .derive("Sized", |p| {
            p.integer_field("x").table_size(2);
        })
        .unwrap();
    let range = model
        .partition_generate_range(&KeyValue::Integer(1), &KeyValue::Integer(4))
        .unwrap();
    assert_eq!(
        range,
        vec![KeyValue::Integer(0), KeyValue::Integer(2), KeyValue::Integer(4)]
    );
}

#[test]
fn test_by_integer_field_requires_field() {
    let err = by_integer_field()
        .configurator()
        .check_constraint(&[KeyValue::Integer(1)])
        .unwrap_err();
    assert!(matches!(err, Error::MethodNotImplemented { ref member, .. } if member == "partition_integer_field"));
}

#[test]
fn test_by_id_members() {
    let model = employee(by_id());
    assert_eq!(model.partition_integer_field().unwrap(), "id");
    assert_eq!(model.partition_table_size().unwrap(), 10_000_000);
    assert!(model.prefetch_primary_key());

    let indexes = model.configurator().indexes(&[KeyValue::Integer(0)]).unwrap();
    assert_eq!(indexes.len(), 1);
    assert_eq!(indexes[0].field, "id");
    assert_eq!(indexes[0].options, IndexOptions::unique());
}

#[test]
fn test_by_foreign_key_members() {
    let model = by_foreign_key()
        .derive("Employee", |p| {
            p.model_table_name("employees").foreign_key_field("company_id");
        })
        .unwrap();
    let c = model.configurator();
    let kv = [KeyValue::Integer(3)];

    assert_eq!(model.partition_integer_field().unwrap(), "company_id");
    assert_eq!(model.partition_table_size().unwrap(), 1);
    assert_eq!(c.on_fields().unwrap(), vec!["company_id"]);
    assert_eq!(c.check_constraint(&kv).unwrap(), "( company_id = 3 )");

    let fks = c.foreign_keys(&kv).unwrap();
    assert_eq!(fks.len(), 1);
    assert_eq!(fks[0].referencing_field, "company_id");
    assert_eq!(fks[0].referenced_table, "companies");
    assert_eq!(fks[0].referenced_field, "id");
}

#[test]
fn test_by_foreign_key_abstract() {
    let err = by_foreign_key().partition_foreign_key().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Method not implemented: ByForeignKey.partition_foreign_key"
    );
}

// ============================================================================
// Time strategies
// ============================================================================

#[test_case(TimeBucket::Day, date(2011, 1, 5), date(2011, 1, 5))]
#[test_case(TimeBucket::Week, date(2011, 1, 5), date(2011, 1, 3))]
#[test_case(TimeBucket::Week, date(2011, 1, 3), date(2011, 1, 3))]
#[test_case(TimeBucket::Month, date(2011, 1, 31), date(2011, 1, 1))]
#[test_case(TimeBucket::Year, date(2011, 7, 14), date(2011, 1, 1))]
fn test_bucket_floor(bucket: TimeBucket, input: NaiveDate, expected: NaiveDate) {
    assert_eq!(bucket.floor(input), expected);
}

#[test]
fn test_bucket_shift() {
    assert_eq!(TimeBucket::Month.shift(date(2011, 12, 1), 1).unwrap(), date(2012, 1, 1));
    assert_eq!(TimeBucket::Week.shift(date(2011, 1, 3), -2).unwrap(), date(2010, 12, 20));
    assert_eq!(TimeBucket::Year.next(date(2011, 1, 1)).unwrap(), date(2012, 1, 1));
}

#[test]
fn test_daily_check_constraint() {
    let model = by_daily_time_field()
        .derive("Event", |p| {
            p.model_table_name("events").time_field("created_at");
        })
        .unwrap();
    let c = model.configurator();
    let kv = [KeyValue::Date(date(2011, 1, 5))];

    assert_eq!(
        c.check_constraint(&kv).unwrap(),
        "created_at >= '2011-01-05' AND created_at < '2011-01-06'"
    );
    assert_eq!(c.base_name(&kv).unwrap(), "20110105");
    assert_eq!(c.table_name(&kv).unwrap(), "events_partitions.p20110105");
}

#[test]
fn test_weekly_normalizes_to_monday() {
    let model = employee(by_created_at());
    let c = model.configurator();
    let kv = [KeyValue::Date(date(2011, 10, 12))];

    assert_eq!(c.base_name(&kv).unwrap(), "20111010");
    assert_eq!(
        c.check_constraint(&kv).unwrap(),
        "created_at >= '2011-10-10' AND created_at < '2011-10-17'"
    );
}

#[test]
fn test_monthly_base_name() {
    let model = by_monthly_time_field()
        .derive("Event", |p| {
            p.model_table_name("events").time_field("at");
        })
        .unwrap();
    let c = model.configurator();
    let kv = [KeyValue::Date(date(2011, 2, 17))];

    assert_eq!(c.base_name(&kv).unwrap(), "201102");
    assert_eq!(c.check_constraint(&kv).unwrap(), "at >= '2011-02-01' AND at < '2011-03-01'");
}

#[test]
fn test_yearly_normalizes_to_january_first() {
    let model = by_yearly_time_field()
        .derive("Event", |p| {
            p.model_table_name("events").time_field("at");
        })
        .unwrap();

    assert_eq!(
        model
            .partition_normalize_key_value(&KeyValue::Date(date(2011, 9, 30)))
            .unwrap(),
        KeyValue::Date(date(2011, 1, 1))
    );
    assert_eq!(
        model
            .configurator()
            .base_name(&[KeyValue::Date(date(2011, 9, 30))])
            .unwrap(),
        "2011"
    );
}

#[test]
fn test_timestamps_use_their_date() {
    let model = employee(by_created_at());
    let ts = date(2011, 10, 16).and_hms_opt(23, 0, 0).unwrap();
    assert_eq!(
        model.configurator().base_name(&[KeyValue::Timestamp(ts)]).unwrap(),
        "20111010"
    );
}

#[test]
fn test_time_index_on_time_field() {
    let model = employee(by_created_at());
    let indexes = model
        .configurator()
        .indexes(&[KeyValue::Date(date(2011, 10, 10))])
        .unwrap();
    assert_eq!(indexes.len(), 1);
    assert_eq!(indexes[0].field, "created_at");
    assert!(!indexes[0].options.unique);
}

#[test]
fn test_date_generate_range() {
    let model = employee(by_created_at());
    let range = model
        .partition_generate_range(
            &KeyValue::Date(date(2011, 10, 12)),
            &KeyValue::Date(date(2011, 10, 25)),
        )
        .unwrap();
    assert_eq!(
        range,
        vec![
            KeyValue::Date(date(2011, 10, 10)),
            KeyValue::Date(date(2011, 10, 17)),
            KeyValue::Date(date(2011, 10, 24)),
        ]
    );
}

#[test]
fn test_non_date_key_rejected() {
    let model = employee(by_created_at());
    let err = model
        .configurator()
        .base_name(&[KeyValue::Integer(1)])
        .unwrap_err();
    assert!(err.to_string().contains("not a date"));
}

#[test]
fn test_janitorial_windows() {
    let creates = creates_window(TimeBucket::Week, date(2011, 10, 12), 2).unwrap();
    assert_eq!(
        creates,
        vec![
            vec![KeyValue::Date(date(2011, 10, 10))],
            vec![KeyValue::Date(date(2011, 10, 17))],
            vec![KeyValue::Date(date(2011, 10, 24))],
        ]
    );

    let drops = expired_window(TimeBucket::Month, date(2011, 10, 12), 3).unwrap();
    assert_eq!(drops, vec![vec![KeyValue::Date(date(2011, 7, 1))]]);
}

#[test]
fn test_for_bucket() {
    assert_eq!(for_bucket(TimeBucket::Month).name(), "ByMonthlyTimeField");
    assert_eq!("weekly".parse::<TimeBucket>().unwrap(), TimeBucket::Week);
    assert!("hourly".parse::<TimeBucket>().is_err());
}

// ============================================================================
// Multi level
// ============================================================================

#[test]
fn test_multi_level_is_multi_level() {
    assert!(multi_level().is_multi_level());
    assert!(!by_id().is_multi_level());
    assert_eq!(multi_level().ancestor_names(), vec!["MultiLevel", "PartitionedBase"]);
}
