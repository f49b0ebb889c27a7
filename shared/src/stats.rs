//! Dashboard aggregation
//!
//! Pure functions over a list of orders: counts, revenue, the five most
//! recent orders and a bucketed revenue series. Time windows and buckets are
//! evaluated in the business time zone passed by the caller, so this module
//! stays generic over [`chrono::TimeZone`].

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};
use crate::models::Order;
use crate::order::OrderStatus;

/// Number of orders shown in the dashboard's "recent" list
pub const RECENT_ORDER_COUNT: usize = 5;

/// Reporting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "range")]
pub enum TimeWindow {
    Today,
    /// Monday through today
    Week,
    /// First of the month through today
    Month,
    /// Inclusive date range
    Custom { start: NaiveDate, end: NaiveDate },
}

/// Revenue bucket size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Hour-of-day buckets, keyed `"9:00"`
    Hourly,
    /// Calendar-day buckets, keyed `"2026-10-16"`
    Daily,
}

impl TimeWindow {
    /// Parse query parameters (`range`, `start`, `end`)
    ///
    /// Missing range defaults to today. Dates are `YYYY-MM-DD`.
    pub fn parse(range: Option<&str>, start: Option<&str>, end: Option<&str>) -> Result<Self, AppError> {
        match range.unwrap_or("today") {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "custom" => {
                let (Some(start), Some(end)) = (start, end) else {
                    return Err(AppError::with_message(
                        ErrorCode::RequiredField,
                        "Custom range requires start and end dates",
                    ));
                };
                let start = parse_date(start)?;
                let end = parse_date(end)?;
                if start > end {
                    return Err(AppError::validation(format!(
                        "Start date {} is after end date {}",
                        start, end
                    )));
                }
                Ok(Self::Custom { start, end })
            }
            other => Err(AppError::with_message(
                ErrorCode::InvalidFormat,
                format!("Unknown time range: {}", other),
            )),
        }
    }

    /// First and last calendar day covered, relative to `today`
    pub fn dates(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match *self {
            Self::Today => (today, today),
            Self::Week => {
                let offset = today.weekday().num_days_from_monday();
                (today - Duration::days(i64::from(offset)), today)
            }
            Self::Month => (today.with_day(1).unwrap_or(today), today),
            Self::Custom { start, end } => (start, end),
        }
    }

    /// Unix millis `[start, end)` of the window in `tz`
    pub fn bounds<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> (i64, i64) {
        let tz = now.timezone();
        let (first, last) = self.dates(now.date_naive());
        let next = last.succ_opt().unwrap_or(last);
        (local_midnight(first, &tz), local_midnight(next, &tz))
    }

    /// Hourly for single-day windows, daily otherwise
    pub fn granularity(&self) -> Granularity {
        match self {
            Self::Today => Granularity::Hourly,
            Self::Custom { start, end } if start == end => Granularity::Hourly,
            _ => Granularity::Daily,
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        AppError::with_message(ErrorCode::InvalidFormat, format!("Invalid date format: {}", s))
    })
}

/// Local 00:00 of `date` in `tz` as Unix millis
///
/// Falls back to UTC midnight when local midnight does not exist (DST gap).
pub fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> i64 {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// One point of the revenue chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub time: String,
    pub value: i64,
}

/// Dashboard aggregates for one window
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub order_count: usize,
    pub revenue: i64,
    pub pending_count: usize,
    /// Most recent first
    pub recent: Vec<Order>,
}

/// Full statistics response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub start: i64,
    pub end: i64,
    pub granularity: Granularity,
    pub stats: DashboardStats,
    pub revenue_series: Vec<RevenuePoint>,
}

/// Aggregate orders already restricted to the active window
pub fn summarize(orders: &[Order]) -> DashboardStats {
    let mut recent: Vec<Order> = orders.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(RECENT_ORDER_COUNT);

    DashboardStats {
        order_count: orders.len(),
        revenue: orders.iter().map(|o| o.total_price).sum(),
        pending_count: orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count(),
        recent,
    }
}

/// Sum `total_price` into buckets, sorted ascending by bucket
///
/// Hourly buckets sort by hour number, so `"9:00"` precedes `"14:00"`.
pub fn revenue_series<Tz: TimeZone>(
    orders: &[Order],
    granularity: Granularity,
    tz: &Tz,
) -> Vec<RevenuePoint> {
    let local_times = orders.iter().filter_map(|o| {
        DateTime::from_timestamp_millis(o.created_at).map(|dt| (dt.with_timezone(tz), o.total_price))
    });

    match granularity {
        Granularity::Hourly => {
            let mut buckets: BTreeMap<u32, i64> = BTreeMap::new();
            for (dt, value) in local_times {
                *buckets.entry(dt.hour()).or_default() += value;
            }
            buckets
                .into_iter()
                .map(|(hour, value)| RevenuePoint {
                    time: format!("{}:00", hour),
                    value,
                })
                .collect()
        }
        Granularity::Daily => {
            let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
            for (dt, value) in local_times {
                *buckets.entry(dt.date_naive()).or_default() += value;
            }
            buckets
                .into_iter()
                .map(|(date, value)| RevenuePoint {
                    time: date.format("%Y-%m-%d").to_string(),
                    value,
                })
                .collect()
        }
    }
}

/// Build the full report for `window` as seen at `now`
///
/// Orders outside the window are ignored.
pub fn build_report<Tz: TimeZone>(orders: &[Order], window: TimeWindow, now: &DateTime<Tz>) -> StatisticsReport {
    let (start, end) = window.bounds(now);
    let in_window: Vec<Order> = orders
        .iter()
        .filter(|o| o.created_at >= start && o.created_at < end)
        .cloned()
        .collect();
    let granularity = window.granularity();

    StatisticsReport {
        start,
        end,
        granularity,
        revenue_series: revenue_series(&in_window, granularity, &now.timezone()),
        stats: summarize(&in_window),
    }
}
