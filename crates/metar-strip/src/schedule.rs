//! Refresh schedules.
//!
//! A schedule only answers "when is the next refresh after `now`". Cron
//! expressions are the configured form; fixed intervals exist for demos
//! and tests.

use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::time::Duration;

/// Errors from schedule operations.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid cron expression: {0}")]
    CronParse(String),
    #[error("schedule has no occurrence after {0}")]
    Stalled(DateTime<Utc>),
}

type Result<T> = std::result::Result<T, ScheduleError>;

/// Next-occurrence function over wall-clock time.
pub trait Schedule: Send + Sync + 'static {
    /// The first trigger instant after `after`, if any.
    fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>>;
}

/// Next trigger strictly after `now`.
///
/// A schedule that returns nothing, or an instant not in the future, can
/// never advance and is reported as [`ScheduleError::Stalled`].
pub fn next_instant<S: Schedule + ?Sized>(schedule: &S, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    match schedule.next_after(now) {
        Some(next) if next > now => Ok(next),
        _ => Err(ScheduleError::Stalled(now)),
    }
}

/// A parsed cron expression.
///
/// The `cron` crate expects 6-field expressions (sec min hr dom month dow).
/// Standard 5-field expressions get "0 " prepended to pin seconds to zero.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expr: String,
    inner: cron::Schedule,
}

impl CronSchedule {
    pub fn parse(cron_expr: &str) -> Result<Self> {
        let expr = normalize_cron_expr(cron_expr);
        let inner = cron::Schedule::from_str(&expr)
            .map_err(|e| ScheduleError::CronParse(format!("{}: {}", cron_expr, e)))?;
        Ok(Self {
            expr: cron_expr.trim().to_string(),
            inner,
        })
    }

    /// The expression as configured.
    pub fn expression(&self) -> &str {
        &self.expr
    }
}

impl FromStr for CronSchedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Schedule for CronSchedule {
    fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.inner.after(&after).next()
    }
}

/// Normalise a cron expression to 6-field format.
fn normalize_cron_expr(expr: &str) -> String {
    let trimmed = expr.trim();
    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    if fields.len() == 5 {
        format!("0 {}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Fires every `period` after the given instant.
#[derive(Debug, Clone, Copy)]
pub struct Interval(pub Duration);

impl Schedule for Interval {
    fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let period = chrono::Duration::from_std(self.0).ok()?;
        after.checked_add_signed(period)
    }
}
