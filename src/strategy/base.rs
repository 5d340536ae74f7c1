//! Root of every strategy chain: default naming for child tables

use crate::config::Setting;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::types::KeyValue;
use std::sync::LazyLock;

static PARTITIONED_BASE: LazyLock<Model> = LazyLock::new(|| {
    Model::root("PartitionedBase", |p| {
        p.schema_name(Setting::computed(|model, _| {
            Ok(default_schema_name(&model.table_name()?))
        }));
        p.name_prefix("p");
        p.base_name(Setting::computed(|model, kv| {
            let value = single_key("base_name", kv)?;
            Ok(model.partition_normalize_key_value(value)?.to_string())
        }));
        p.part_name(Setting::computed(|model, kv| {
            let configurator = model.configurator();
            Ok(format!(
                "{}{}",
                configurator.name_prefix()?,
                configurator.base_name(kv)?
            ))
        }));
        p.table_name(Setting::computed(|model, kv| {
            let configurator = model.configurator();
            Ok(format!(
                "{}.{}",
                configurator.schema_name()?,
                configurator.part_name(kv)?
            ))
        }));
        p.table_alias_name(Setting::computed(|model, kv| {
            Ok(sanitize_identifier(&model.configurator().table_name(kv)?))
        }));
        p.parent_table_name(Setting::computed(|model, _| model.table_name()));
        p.parent_table_schema_name(Setting::computed(|model, _| {
            Ok(split_qualified(&model.table_name()?).0.to_string())
        }));
    })
});

/// The root strategy every other strategy derives from
pub fn partitioned_base() -> Model {
    PARTITIONED_BASE.clone()
}

/// `employees` → `employees_partitions`, `other.foos` → `other_foos_partitions`
pub fn default_schema_name(table_name: &str) -> String {
    match split_qualified(table_name) {
        ("public", table) => format!("{table}_partitions"),
        (schema, table) => format!("{schema}_{table}_partitions"),
    }
}

/// Split `schema.table`; unqualified names live in `public`
pub fn split_qualified(name: &str) -> (&str, &str) {
    name.split_once('.').unwrap_or(("public", name))
}

/// Replace anything outside `[A-Za-z0-9_]` with `_`
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// The sole key value of a single-key resolution
pub(crate) fn single_key<'a>(field: &str, key_values: &'a [KeyValue]) -> Result<&'a KeyValue> {
    match key_values {
        [only] => Ok(only),
        _ => Err(Error::KeyArity {
            field: field.to_string(),
            expected: 1,
            actual: key_values.len(),
        }),
    }
}
