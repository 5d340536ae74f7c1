//! Integer range strategies: by integer field, by id, by foreign key

use super::base::{partitioned_base, single_key};
use crate::config::{ForeignKey, IndexOptions, Member, Setting};
use crate::error::{Error, Result};
use crate::model::Model;
use crate::types::KeyValue;
use std::sync::{Arc, LazyLock};

static BY_INTEGER_FIELD: LazyLock<Model> = LazyLock::new(|| {
    partitioned_base().strategy("ByIntegerField", |p| {
        p.table_size(1);
        let contract = p.contract_mut();
        contract.normalizer = Some(Arc::new(|model: &Model, value: &KeyValue| {
            normalize_integer(model, value).map(KeyValue::Integer)
        }));
        contract.range = Some(Arc::new(integer_range));

        p.on(Setting::computed(|model, _| model.partition_integer_field()));
        p.check_constraint(Setting::computed(|model, kv| {
            let field = model.partition_integer_field()?;
            let size = model.partition_table_size()?;
            let value = normalize_integer(model, single_key("check_constraint", kv)?)?;
            integer_check_constraint(&field, value, size)
        }));
        p.order("substring(tablename, 2)::integer desc");
    })
});

static BY_ID: LazyLock<Model> = LazyLock::new(|| {
    by_integer_field().strategy("ById", |p| {
        p.integer_field("id")
            .table_size(10_000_000)
            .prefetch_primary_key(true)
            .index("id", IndexOptions::unique());
    })
});

static BY_FOREIGN_KEY: LazyLock<Model> = LazyLock::new(|| {
    by_integer_field().strategy("ByForeignKey", |p| {
        p.contract_mut().integer_field =
            Some(Member::derived(|model| model.partition_foreign_key()));
        p.table_size(1);
        p.foreign_key_with(|model, _| Ok(ForeignKey::new(model.partition_foreign_key()?)));
    })
});

/// Partition on an integer column in buckets of `partition_table_size`
pub fn by_integer_field() -> Model {
    BY_INTEGER_FIELD.clone()
}

/// Partition on `id` in buckets of ten million, unique on `id`
pub fn by_id() -> Model {
    BY_ID.clone()
}

/// One child table per referenced row
pub fn by_foreign_key() -> Model {
    BY_FOREIGN_KEY.clone()
}

/// `( f = v )` for single-value buckets, `( f >= v and f < v+s )` otherwise.
///
/// Fails when the bucket's upper bound does not fit in an `i64`.
pub fn integer_check_constraint(field: &str, value: i64, size: i64) -> Result<String> {
    if size == 1 {
        return Ok(format!("( {field} = {value} )"));
    }
    let upper = value.checked_add(size).ok_or_else(|| {
        Error::invalid_key(format!("bucket {value} + {size} of {field} is out of range"))
    })?;
    Ok(format!("( {field} >= {value} and {field} < {upper} )"))
}

fn normalize_integer(model: &Model, value: &KeyValue) -> Result<i64> {
    let size = model.partition_table_size()?;
    if size <= 0 {
        return Err(Error::config(format!(
            "{}: partition_table_size must be positive, got {size}",
            model.name()
        )));
    }
    let value = match value {
        KeyValue::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| Error::invalid_key(format!("not an integer: {s}")))?,
        other => other
            .as_integer()
            .ok_or_else(|| Error::invalid_key(format!("not an integer: {other}")))?,
    };
    value
        .div_euclid(size)
        .checked_mul(size)
        .ok_or_else(|| Error::invalid_key(format!("bucket of {value} is out of range")))
}

fn integer_range(model: &Model, start: &KeyValue, end: &KeyValue) -> Result<Vec<KeyValue>> {
    let size = model.partition_table_size()?;
    let mut current = normalize_integer(model, start)?;
    let end = normalize_integer(model, end)?;

    let mut values = Vec::new();
    while current <= end {
        values.push(KeyValue::Integer(current));
        current = match current.checked_add(size) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(values)
}
