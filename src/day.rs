//! Day boundary utilities
//!
//! Every calendar comparison in Questlog goes through these functions. A day
//! runs midnight-to-midnight in the host's local timezone. There is no
//! normalization beyond that: if the device timezone changes between two
//! evaluations, a batch generated "today" may compare as a different day and
//! be regenerated.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Timelike};

/// Local calendar date of a timestamp
pub fn local_date<Tz: TimeZone>(ts: &DateTime<Tz>) -> NaiveDate {
    ts.with_timezone(&Local).date_naive()
}

/// Whether two timestamps fall on the same local calendar day
pub fn is_same_day<A: TimeZone, B: TimeZone>(a: &DateTime<A>, b: &DateTime<B>) -> bool {
    local_date(a) == local_date(b)
}

/// Whether `ts` falls on the same local day as `now`
pub fn is_today<A: TimeZone, B: TimeZone>(ts: &DateTime<A>, now: &DateTime<B>) -> bool {
    is_same_day(ts, now)
}

/// Local hour of day (0-23)
pub fn local_hour<Tz: TimeZone>(ts: &DateTime<Tz>) -> u32 {
    ts.with_timezone(&Local).hour()
}
