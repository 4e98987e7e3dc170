use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};

use crate::error::{RelayError, Result};

/// How many years ahead `next_after` searches before giving up. Covers
/// leap-day schedules (`0 0 29 2 *`) with room to spare.
const SEARCH_YEARS: i32 = 8;

/// A parsed five-field cron expression, evaluated in UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    minutes: u64,
    hours: u64,
    days_of_month: u64,
    months: u64,
    days_of_week: u64,
    /// `*` in the day-of-month field.
    dom_any: bool,
    /// `*` in the day-of-week field.
    dow_any: bool,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(RelayError::InvalidSchedule(format!(
                "expected 5 fields, got {} in {expression:?}",
                fields.len()
            )));
        }

        let minutes = parse_field(fields[0], 0, 59)?;
        let hours = parse_field(fields[1], 0, 23)?;
        let days_of_month = parse_field(fields[2], 1, 31)?;
        let months = parse_field(fields[3], 1, 12)?;
        let mut days_of_week = parse_field(fields[4], 0, 7)?;
        // 7 is an alias for Sunday.
        if days_of_week & (1 << 7) != 0 {
            days_of_week = (days_of_week & !(1 << 7)) | 1;
        }

        Ok(Self {
            expression: fields.join(" "),
            minutes,
            hours,
            days_of_month,
            months,
            days_of_week,
            dom_any: fields[2] == "*",
            dow_any: fields[4] == "*",
        })
    }

    /// The normalised expression (fields joined by single spaces).
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First minute boundary strictly after `from` that matches.
    ///
    /// Returns `None` when nothing matches within the search window
    /// (e.g. `0 0 31 2 *`).
    pub fn next_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let floor = from.timestamp() - from.timestamp().rem_euclid(60);
        let mut t = DateTime::from_timestamp(floor, 0)? + Duration::minutes(1);
        let limit = from.year() + SEARCH_YEARS;

        while t.year() <= limit {
            if !bit(self.months, t.month()) {
                // Jump to the first minute of the next month.
                let (y, m) = if t.month() == 12 {
                    (t.year() + 1, 1)
                } else {
                    (t.year(), t.month() + 1)
                };
                t = Utc.with_ymd_and_hms(y, m, 1, 0, 0, 0).single()?;
                continue;
            }
            if !self.day_matches(t) {
                let next_day = t.date_naive().succ_opt()?;
                t = next_day.and_hms_opt(0, 0, 0)?.and_utc();
                continue;
            }
            if !bit(self.hours, t.hour()) {
                t += Duration::minutes(i64::from(60 - t.minute()));
                continue;
            }
            if !bit(self.minutes, t.minute()) {
                t += Duration::minutes(1);
                continue;
            }
            return Some(t);
        }
        None
    }

    /// Next firing for a loop that last fired at `last_fired`.
    ///
    /// Never returns an instant at or before `last_fired`, even when the wall
    /// clock reads earlier than the instant the loop just slept until.
    pub fn next_fire(
        &self,
        now: DateTime<Utc>,
        last_fired: Option<DateTime<Utc>>,
    ) -> Option<DateTime<Utc>> {
        let from = match last_fired {
            Some(last) if last > now => last,
            _ => now,
        };
        self.next_after(from)
    }

    /// Whether `at` (truncated to the minute) is a firing instant.
    pub fn matches(&self, at: DateTime<Utc>) -> bool {
        bit(self.months, at.month())
            && self.day_matches(at)
            && bit(self.hours, at.hour())
            && bit(self.minutes, at.minute())
    }

    /// POSIX rule: when both day fields are restricted, either may match.
    fn day_matches(&self, t: DateTime<Utc>) -> bool {
        let dom = bit(self.days_of_month, t.day());
        let dow = bit(self.days_of_week, t.weekday().num_days_from_sunday());
        match (self.dom_any, self.dow_any) {
            (true, true) => true,
            (true, false) => dow,
            (false, true) => dom,
            (false, false) => dom || dow,
        }
    }
}

impl std::fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expression)
    }
}

impl std::str::FromStr for CronSchedule {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn bit(mask: u64, n: u32) -> bool {
    mask & (1 << n) != 0
}

/// Parse one comma-separated field into a bitmask over `min..=max`.
fn parse_field(field: &str, min: u32, max: u32) -> Result<u64> {
    let mut mask = 0u64;
    for part in field.split(',') {
        let (base, step) = match part.split_once('/') {
            Some((base, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| invalid(field, "step is not a number"))?;
                if step == 0 {
                    return Err(invalid(field, "step must be positive"));
                }
                (base, Some(step))
            }
            None => (part, None),
        };

        let (lo, hi) = if base == "*" {
            (min, max)
        } else if let Some((a, b)) = base.split_once('-') {
            (parse_num(field, a)?, parse_num(field, b)?)
        } else {
            let n = parse_num(field, base)?;
            // `N/S` runs from N to the end of the range.
            (n, if step.is_some() { max } else { n })
        };

        if lo < min || hi > max || lo > hi {
            return Err(invalid(field, &format!("values must lie within {min}-{max}")));
        }

        let step = step.unwrap_or(1);
        let mut v = lo;
        while v <= hi {
            mask |= 1 << v;
            v += step;
        }
    }
    Ok(mask)
}

fn parse_num(field: &str, s: &str) -> Result<u32> {
    s.parse()
        .map_err(|_| invalid(field, &format!("{s:?} is not a number")))
}

fn invalid(field: &str, reason: &str) -> RelayError {
    RelayError::InvalidSchedule(format!("field {field:?}: {reason}"))
}
