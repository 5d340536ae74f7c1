//! Time bucket strategies: daily, weekly, monthly and yearly child tables

use super::base::{partitioned_base, single_key};
use crate::config::{Index, IndexOptions, Setting};
use crate::error::{Error, Result};
use crate::model::Model;
use crate::types::{KeyValue, KeyValues};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

/// Width of one time partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    Day,
    /// Weeks start on Monday
    Week,
    Month,
    Year,
}

impl TimeBucket {
    /// First day of the bucket containing `date`
    pub fn floor(self, date: NaiveDate) -> NaiveDate {
        match self {
            TimeBucket::Day => date,
            TimeBucket::Week => date
                .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
                .unwrap_or(date),
            TimeBucket::Month => date.with_day(1).unwrap_or(date),
            TimeBucket::Year => date.with_ordinal(1).unwrap_or(date),
        }
    }

    /// Move `date` by `n` buckets (negative moves back)
    pub fn shift(self, date: NaiveDate, n: i64) -> Result<NaiveDate> {
        let shifted = match self {
            TimeBucket::Day => shift_days(date, n),
            TimeBucket::Week => n.checked_mul(7).and_then(|days| shift_days(date, days)),
            TimeBucket::Month => shift_months(date, n),
            TimeBucket::Year => n.checked_mul(12).and_then(|months| shift_months(date, months)),
        };
        shifted.ok_or_else(|| {
            Error::invalid_key(format!("{date} shifted by {n} {self}(s) is out of range"))
        })
    }

    /// First day of the bucket after the one starting at `start`
    pub fn next(self, start: NaiveDate) -> Result<NaiveDate> {
        self.shift(start, 1)
    }

    /// strftime format of a child table's base name
    pub fn base_name_format(self) -> &'static str {
        match self {
            TimeBucket::Day | TimeBucket::Week => "%Y%m%d",
            TimeBucket::Month => "%Y%m",
            TimeBucket::Year => "%Y",
        }
    }
}

fn shift_days(date: NaiveDate, n: i64) -> Option<NaiveDate> {
    let days = Days::new(n.unsigned_abs());
    if n >= 0 {
        date.checked_add_days(days)
    } else {
        date.checked_sub_days(days)
    }
}

fn shift_months(date: NaiveDate, n: i64) -> Option<NaiveDate> {
    let months = Months::new(u32::try_from(n.unsigned_abs()).ok()?);
    if n >= 0 {
        date.checked_add_months(months)
    } else {
        date.checked_sub_months(months)
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeBucket::Day => "day",
            TimeBucket::Week => "week",
            TimeBucket::Month => "month",
            TimeBucket::Year => "year",
        })
    }
}

impl FromStr for TimeBucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "day" | "daily" => Ok(TimeBucket::Day),
            "week" | "weekly" => Ok(TimeBucket::Week),
            "month" | "monthly" => Ok(TimeBucket::Month),
            "year" | "yearly" => Ok(TimeBucket::Year),
            other => Err(Error::config(format!("unknown time bucket: {other}"))),
        }
    }
}

// ============================================================================
// Strategies
// ============================================================================

static BY_TIME_FIELD: LazyLock<Model> = LazyLock::new(|| {
    partitioned_base().strategy("ByTimeField", |p| {
        p.time_bucket(TimeBucket::Day);
        let contract = p.contract_mut();
        contract.normalizer = Some(Arc::new(|model: &Model, value: &KeyValue| {
            normalize_date(model, value).map(KeyValue::Date)
        }));
        contract.range = Some(Arc::new(date_range));

        p.on(Setting::computed(|model, _| model.partition_time_field()));
        p.index_with(|model, _| {
            Ok(Index::new(model.partition_time_field()?, IndexOptions::default()))
        });
        p.base_name(Setting::computed(|model, kv| {
            let start = normalize_date(model, single_key("base_name", kv)?)?;
            let format = model.partition_time_bucket()?.base_name_format();
            Ok(start.format(format).to_string())
        }));
        p.check_constraint(Setting::computed(|model, kv| {
            let field = model.partition_time_field()?;
            let start = normalize_date(model, single_key("check_constraint", kv)?)?;
            let next = model.partition_time_bucket()?.next(start)?;
            Ok(time_check_constraint(&field, start, next))
        }));
        p.order("tablename desc");
    })
});

static BY_DAILY_TIME_FIELD: LazyLock<Model> = LazyLock::new(|| {
    by_time_field().strategy("ByDailyTimeField", |p| {
        p.time_bucket(TimeBucket::Day);
    })
});

static BY_WEEKLY_TIME_FIELD: LazyLock<Model> = LazyLock::new(|| {
    by_time_field().strategy("ByWeeklyTimeField", |p| {
        p.time_bucket(TimeBucket::Week);
    })
});

static BY_MONTHLY_TIME_FIELD: LazyLock<Model> = LazyLock::new(|| {
    by_time_field().strategy("ByMonthlyTimeField", |p| {
        p.time_bucket(TimeBucket::Month);
    })
});

static BY_YEARLY_TIME_FIELD: LazyLock<Model> = LazyLock::new(|| {
    by_time_field().strategy("ByYearlyTimeField", |p| {
        p.time_bucket(TimeBucket::Year);
    })
});

static BY_CREATED_AT: LazyLock<Model> = LazyLock::new(|| {
    by_weekly_time_field().strategy("ByCreatedAt", |p| {
        p.time_field("created_at");
    })
});

/// Partition on a date/timestamp column, one child per day unless overridden
pub fn by_time_field() -> Model {
    BY_TIME_FIELD.clone()
}

pub fn by_daily_time_field() -> Model {
    BY_DAILY_TIME_FIELD.clone()
}

pub fn by_weekly_time_field() -> Model {
    BY_WEEKLY_TIME_FIELD.clone()
}

pub fn by_monthly_time_field() -> Model {
    BY_MONTHLY_TIME_FIELD.clone()
}

pub fn by_yearly_time_field() -> Model {
    BY_YEARLY_TIME_FIELD.clone()
}

/// Weekly child tables on `created_at`
pub fn by_created_at() -> Model {
    BY_CREATED_AT.clone()
}

/// The strategy for a bucket width
pub fn for_bucket(bucket: TimeBucket) -> Model {
    match bucket {
        TimeBucket::Day => by_daily_time_field(),
        TimeBucket::Week => by_weekly_time_field(),
        TimeBucket::Month => by_monthly_time_field(),
        TimeBucket::Year => by_yearly_time_field(),
    }
}

/// Half-open range constraint over one bucket
pub fn time_check_constraint(field: &str, start: NaiveDate, next: NaiveDate) -> String {
    format!(
        "{field} >= '{}' AND {field} < '{}'",
        start.format("%Y-%m-%d"),
        next.format("%Y-%m-%d")
    )
}

fn normalize_date(model: &Model, value: &KeyValue) -> Result<NaiveDate> {
    let date = match value {
        KeyValue::Text(s) => s.parse::<KeyValue>()?.as_date(),
        other => other.as_date(),
    }
    .ok_or_else(|| Error::invalid_key(format!("not a date: {value}")))?;
    Ok(model.partition_time_bucket()?.floor(date))
}

fn date_range(model: &Model, start: &KeyValue, end: &KeyValue) -> Result<Vec<KeyValue>> {
    let bucket = model.partition_time_bucket()?;
    let mut current = normalize_date(model, start)?;
    let end = normalize_date(model, end)?;

    let mut values = Vec::new();
    while current <= end {
        values.push(KeyValue::Date(current));
        current = bucket.next(current)?;
    }
    Ok(values)
}

// ============================================================================
// Janitorial windows
// ============================================================================

/// The bucket containing `today` and the `ahead` buckets after it
pub fn creates_window(bucket: TimeBucket, today: NaiveDate, ahead: u32) -> Result<Vec<KeyValues>> {
    let start = bucket.floor(today);
    (0..=i64::from(ahead))
        .map(|n| Ok(vec![KeyValue::Date(bucket.shift(start, n)?)]))
        .collect()
}

/// The bucket `after` buckets before the one containing `today`
pub fn expired_window(bucket: TimeBucket, today: NaiveDate, after: u32) -> Result<Vec<KeyValues>> {
    let start = bucket.floor(today);
    Ok(vec![vec![KeyValue::Date(bucket.shift(start, -i64::from(after))?)]])
}
