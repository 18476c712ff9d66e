//! Next-fire computation in a user's timezone.

use crate::error::{SchedulerError, SchedulerResult};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Longest DST gap searched forward, in minutes.
const MAX_GAP_MINUTES: i64 = 3 * 60;

/// Parse an IANA zone name, falling back to UTC.
///
/// The flag is `false` when the fallback was used.
pub fn resolve_timezone(name: &str) -> (Tz, bool) {
    match name.trim().parse::<Tz>() {
        Ok(tz) => (tz, true),
        Err(_) => {
            warn!(timezone = name, "Invalid timezone, defaulting to UTC");
            (Tz::UTC, false)
        }
    }
}

pub fn validate_time(hour: u32, minute: u32) -> SchedulerResult<()> {
    if hour > 23 || minute > 59 {
        return Err(SchedulerError::InvalidTime { hour, minute });
    }
    Ok(())
}

/// Map a local wall time to an instant. Folds take the earlier instant, gaps
/// the first valid minute after the gap.
fn local_instant(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    for shift in 0..=MAX_GAP_MINUTES {
        match tz.from_local_datetime(&(local + Duration::minutes(shift))) {
            LocalResult::Single(t) => return Some(t.with_timezone(&Utc)),
            LocalResult::Ambiguous(a, b) => {
                return Some(a.min(b).with_timezone(&Utc));
            }
            LocalResult::None => continue,
        }
    }
    None
}

/// First instant strictly after `now` at which the clock in `tz` reads
/// `hour:minute`.
pub fn next_occurrence(
    now: DateTime<Utc>,
    hour: u32,
    minute: u32,
    tz: Tz,
) -> SchedulerResult<DateTime<Utc>> {
    validate_time(hour, minute)?;
    let today: NaiveDate = now.with_timezone(&tz).date_naive();

    let mut day = today - Duration::days(1);
    for _ in 0..4 {
        if let Some(local) = day.and_hms_opt(hour, minute, 0) {
            if let Some(at) = local_instant(tz, local) {
                if at > now {
                    return Ok(at);
                }
            }
        }
        day += Duration::days(1);
    }
    Err(SchedulerError::InvalidTime { hour, minute })
}
