use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, NaiveTime, TimeZone};

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Next wall-clock occurrence of `hour:minute:00` strictly after `now`.
///
/// When today's occurrence is at or before `now`, tomorrow's is returned.
/// A time that falls into a DST gap resolves to the first valid instant
/// after the gap.
pub fn next_occurrence<Tz: TimeZone>(now: &DateTime<Tz>, hour: u8, minute: u8) -> Option<DateTime<Tz>> {
    let time = NaiveTime::from_hms_opt(u32::from(hour), u32::from(minute), 0)?;
    let tz = now.timezone();
    let mut date = now.naive_local().date();

    // today, tomorrow, and one spare day in case tomorrow's slot is skipped by DST
    for _ in 0..3 {
        if let Some(candidate) = resolve_local(&tz, date.and_time(time)) {
            if candidate > *now {
                return Some(candidate);
            }
        }
        date = date.succ_opt()?;
    }
    None
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest(),
    }
}
