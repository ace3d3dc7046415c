//! Wall clock in the configured time zone

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;

/// The instant at which the local wall clock in `tz` reads `date` `time`.
///
/// A time repeated by a DST fall-back resolves to its earliest occurrence.
/// A time skipped by a spring-forward jump lands the same distance past the
/// jump (02:30 in a 02:00 → 03:00 gap becomes 03:30).
pub fn local_instant(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Tz> {
    let local = date.and_time(time);
    match tz.from_local_datetime(&local) {
        LocalResult::Single(instant) => instant,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let before = tz
                .offset_from_utc_datetime(&(local - Duration::days(1)))
                .fix()
                .local_minus_utc();
            tz.from_utc_datetime(&(local - Duration::seconds(i64::from(before))))
        }
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;

    /// Local calendar date
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }
}

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Tz>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Tz>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Tz>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Tz> {
        *self.now.lock()
    }
}
