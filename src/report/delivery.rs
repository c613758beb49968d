//! Delivery-day calendar arithmetic.
//!
//! A delivery day starts at local midnight in the market timezone. Period N
//! starts N-1 absolute hours after that instant, so on a 23-hour spring day the
//! last period spills into the next local date, and on a 25-hour autumn day the
//! repeated local hour gets two distinct UTC timestamps.

use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ReportError;

/// Longest DST gap we step through when midnight does not exist locally.
const MAX_GAP_MINUTES: u32 = 180;

/// Parse an IANA timezone identifier.
pub fn resolve_timezone(id: &str) -> Result<Tz, ReportError> {
    id.parse::<Tz>()
        .map_err(|_| ReportError::Configuration(format!("unknown time zone identifier '{id}'")))
}

/// The day a report generated at `now` is for: the local calendar date in
/// `tz`, plus one.
pub fn delivery_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    let today = now.with_timezone(&tz).date_naive();
    today.succ_opt().unwrap_or(NaiveDate::MAX)
}

/// The UTC instant of local midnight at the start of `date`.
///
/// An ambiguous midnight resolves to the earlier instant. A midnight that
/// falls inside a spring-forward gap resolves to the first valid local time
/// after it.
pub fn local_midnight_utc(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => first_valid_after(midnight, tz),
    }
}

fn first_valid_after(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    (1..=MAX_GAP_MINUTES)
        .find_map(|minutes| {
            tz.from_local_datetime(&(local + Duration::minutes(i64::from(minutes))))
                .earliest()
        })
        .map_or_else(
            || {
                let offset = tz.offset_from_utc_datetime(&local).fix();
                (local - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
            },
            |dt| dt.with_timezone(&Utc),
        )
}

/// Start of `period` (1-based) on `date`, in UTC.
pub fn period_start_utc(date: NaiveDate, period: u8, tz: Tz) -> DateTime<Utc> {
    local_midnight_utc(date, tz) + Duration::hours(i64::from(period) - 1)
}

/// Number of whole hours between this local midnight and the next.
pub fn hours_in_day(date: NaiveDate, tz: Tz) -> i64 {
    let next = date.succ_opt().unwrap_or(NaiveDate::MAX);
    (local_midnight_utc(next, tz) - local_midnight_utc(date, tz)).num_hours()
}
