//! Composition of several strategies into nested child tables

use super::base::partitioned_base;
use crate::model::Model;
use std::sync::LazyLock;

static MULTI_LEVEL: LazyLock<Model> =
    LazyLock::new(|| partitioned_base().composing("MultiLevel", |_| {}));

/// Partition on several axes; levels are given with `using_classes`
pub fn multi_level() -> Model {
    MULTI_LEVEL.clone()
}
