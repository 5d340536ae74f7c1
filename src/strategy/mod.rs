//! Built-in partitioning strategies
//!
//! Each strategy is a [`Model`](crate::Model) built once on first use and
//! shared afterwards. Table models derive from one of them.
//!
//! ```text
//! PartitionedBase
//! ├── ByIntegerField ── ById, ByForeignKey
//! ├── ByTimeField ───── ByDailyTimeField, ByWeeklyTimeField (ByCreatedAt),
//! │                     ByMonthlyTimeField, ByYearlyTimeField
//! └── MultiLevel
//! ```

mod base;
mod integer;
mod multi_level;
mod time;

pub use base::{default_schema_name, partitioned_base, sanitize_identifier, split_qualified};
pub use integer::{by_foreign_key, by_id, by_integer_field, integer_check_constraint};
pub use multi_level::multi_level;
pub use time::{
    by_created_at, by_daily_time_field, by_monthly_time_field, by_time_field,
    by_weekly_time_field, by_yearly_time_field, creates_window, expired_window, for_bucket,
    time_check_constraint, TimeBucket,
};

pub(crate) use base::single_key;

#[cfg(test)]
mod tests;
