// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schedule parsing and next-occurrence computation.
//!
//! Accepted forms (case-insensitive):
//! - 5-field cron (`*/15 * * * *`) or 6-field cron with seconds
//! - `every N seconds|minutes|hours|days`, and `every second|minute|hour|day`
//! - `every day at HH:MM` (UTC)
//! - `hourly`, `daily`, `weekly`
//! - `at <RFC 3339 timestamp>` for a one-shot reminder

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use youclaw_core::YouclawError;

#[derive(Clone)]
enum Kind {
    /// Fixed period anchored on the previous fire time.
    Interval(Duration),
    /// Wall-clock calendar schedule.
    Cron(Arc<croner::Cron>),
    /// Fires once at a fixed instant.
    Once(DateTime<Utc>),
}

/// A parsed, validated task schedule.
#[derive(Clone)]
pub struct Schedule {
    raw: String,
    kind: Kind,
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule").field("raw", &self.raw).finish()
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn invalid(input: &str, detail: &str) -> YouclawError {
    YouclawError::InvalidInput(format!("invalid schedule '{input}': {detail}"))
}

fn unit_duration(unit: &str, n: i64) -> Result<Duration, &'static str> {
    let period = match unit.trim_end_matches('s') {
        "second" | "sec" => Duration::try_seconds(n),
        "minute" | "min" => Duration::try_minutes(n),
        "hour" => Duration::try_hours(n),
        "day" => Duration::try_days(n),
        _ => return Err("unit must be seconds, minutes, hours or days"),
    };
    period.ok_or("interval is too large")
}

/// Turn an alias or a 5-field expression into a 6-field cron expression.
fn normalize_cron(input: &str) -> Option<String> {
    let fields = input.split_whitespace().count();
    match fields {
        5 => Some(format!("0 {input}")),
        6 => Some(input.to_string()),
        _ => None,
    }
}

impl Schedule {
    /// Parse a schedule, rejecting anything that can never fire.
    pub fn parse(input: &str) -> Result<Self, YouclawError> {
        let raw = input.split_whitespace().collect::<Vec<_>>().join(" ");
        if raw.is_empty() {
            return Err(YouclawError::InvalidInput("schedule is empty".into()));
        }
        let lower = raw.to_lowercase();

        let cron_expr = match lower.as_str() {
            "hourly" => Some("0 0 * * * *".to_string()),
            "daily" => Some("0 0 0 * * *".to_string()),
            "weekly" => Some("0 0 0 * * 0".to_string()),
            _ => None,
        };

        let kind = if let Some(expr) = cron_expr {
            Kind::Cron(Arc::new(parse_cron(&raw, &expr)?))
        } else if lower.starts_with("at ") {
            let when = raw
                .get(3..)
                .and_then(|t| DateTime::parse_from_rfc3339(t.trim()).ok())
                .ok_or_else(|| invalid(&raw, "expected 'at <RFC 3339 timestamp>'"))?;
            Kind::Once(when.with_timezone(&Utc))
        } else if let Some(rest) = lower.strip_prefix("every ") {
            if let Some(at) = rest.strip_prefix("day at ") {
                let (hour, minute) = at
                    .split_once(':')
                    .and_then(|(h, m)| Some((h.parse::<u32>().ok()?, m.parse::<u32>().ok()?)))
                    .filter(|(h, m)| *h < 24 && *m < 60)
                    .ok_or_else(|| invalid(&raw, "expected HH:MM"))?;
                Kind::Cron(Arc::new(parse_cron(&raw, &format!("0 {minute} {hour} * * *"))?))
            } else {
                let words: Vec<&str> = rest.split_whitespace().collect();
                let (n, unit) = match words.as_slice() {
                    [unit] => (1, *unit),
                    [n, unit] => {
                        let n: i64 = n
                            .parse()
                            .map_err(|_| invalid(&raw, "interval count is not a number"))?;
                        (n, *unit)
                    }
                    _ => return Err(invalid(&raw, "expected 'every N <unit>'")),
                };
                if n <= 0 {
                    return Err(invalid(&raw, "interval must be greater than zero"));
                }
                let period = unit_duration(unit, n).map_err(|detail| invalid(&raw, detail))?;
                Kind::Interval(period)
            }
        } else if let Some(expr) = normalize_cron(&raw) {
            Kind::Cron(Arc::new(parse_cron(&raw, &expr)?))
        } else {
            return Err(invalid(&raw, "unrecognized format"));
        };

        Ok(Self { raw, kind })
    }

    /// The schedule as written (whitespace collapsed); this is what is persisted.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_interval(&self) -> bool {
        matches!(self.kind, Kind::Interval(_))
    }

    /// True for `at <timestamp>` schedules, which have a single occurrence.
    pub fn is_one_shot(&self) -> bool {
        matches!(self.kind, Kind::Once(_))
    }

    /// First occurrence strictly after `after`.
    ///
    /// Interval schedules are anchored on `after` itself, which is the fire
    /// time when rescheduling.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match &self.kind {
            Kind::Interval(period) => after.checked_add_signed(*period),
            Kind::Cron(cron) => cron.iter_after(after).next(),
            Kind::Once(at) => (*at > after).then_some(*at),
        }
    }
}

fn parse_cron(raw: &str, expr: &str) -> Result<croner::Cron, YouclawError> {
    expr.parse::<croner::Cron>()
        .map_err(|e| invalid(raw, &e.to_string()))
}
