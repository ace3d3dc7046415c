//! Progressive hint unlocking
//!
//! Hints unlock one per interval counted from local midnight of the quiz
//! date. The anchor is the calendar day, not the release broadcast, so a
//! late release can already have several hints unlocked.

use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use std::num::NonZeroU32;

use crate::clock::local_instant;
use crate::error::QuizError;
use crate::types::{Quiz, UserRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintState {
    /// Before the quiz day started
    Locked,
    Unlocked(usize),
    Exhausted,
}

#[derive(Debug, Clone, Copy)]
pub struct HintClock {
    tz: Tz,
    interval_minutes: NonZeroU32,
}

impl HintClock {
    pub fn new(tz: Tz, interval_minutes: NonZeroU32) -> Self {
        Self {
            tz,
            interval_minutes,
        }
    }

    /// Local midnight of `date`
    pub fn day_start(&self, date: NaiveDate) -> DateTime<Tz> {
        local_instant(date, NaiveTime::MIN, self.tz)
    }

    /// Number of whole intervals elapsed since the day start (negative before it)
    pub fn available_index(&self, date: NaiveDate, now: DateTime<Tz>) -> i64 {
        let elapsed = (now - self.day_start(date)).num_seconds();
        elapsed.div_euclid(i64::from(self.interval_minutes.get()) * 60)
    }

    pub fn state(&self, date: NaiveDate, hint_count: usize, now: DateTime<Tz>) -> HintState {
        let index = self.available_index(date, now);
        if index < 0 {
            HintState::Locked
        } else if index as u64 >= hint_count as u64 {
            HintState::Exhausted
        } else {
            HintState::Unlocked(index as usize)
        }
    }

    /// The hint `user` may see now. Does not touch the user's flag.
    pub fn reveal<'q>(
        &self,
        quiz: &'q Quiz,
        user: &UserRecord,
        now: DateTime<Tz>,
    ) -> Result<&'q str, QuizError> {
        if user.used_hint {
            return Err(QuizError::AlreadyUsed);
        }
        match self.state(quiz.date, quiz.hints.len(), now) {
            HintState::Locked => Err(QuizError::HintLocked),
            HintState::Exhausted => Err(QuizError::Exhausted),
            HintState::Unlocked(i) => Ok(&quiz.hints[i]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use chrono_tz::Europe::{Berlin, Moscow};

    fn minutes(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Tz> {
        local_instant(date(), NaiveTime::from_hms_opt(h, m, 0).unwrap(), Moscow)
    }

    fn quiz() -> Quiz {
        Quiz::new(date(), "q", "a", vec!["a".into(), "b".into(), "c".into()])
    }

    #[test]
    fn test_day_start_is_local_midnight() {
        let clock = HintClock::new(Moscow, minutes(30));
        let start = clock.day_start(date());
        assert_eq!(start, at(0, 0));
        assert_eq!(start.to_rfc3339(), "2024-03-08T00:00:00+03:00");
    }

    #[test]
    fn test_unlock_scenario() {
        let clock = HintClock::new(Moscow, minutes(30));
        assert_eq!(clock.available_index(date(), at(0, 10)), 0);
        assert_eq!(clock.available_index(date(), at(0, 31)), 1);
        assert!(clock.available_index(date(), at(2, 0)) >= 3);

        assert_eq!(clock.state(date(), 3, at(0, 10)), HintState::Unlocked(0));
        assert_eq!(clock.state(date(), 3, at(0, 31)), HintState::Unlocked(1));
        assert_eq!(clock.state(date(), 3, at(2, 0)), HintState::Exhausted);
    }

    #[test]
    fn test_before_midnight_is_locked() {
        let clock = HintClock::new(Moscow, minutes(30));
        let before = at(0, 0) - Duration::minutes(1);
        assert_eq!(clock.available_index(date(), before), -1);
        assert_eq!(clock.state(date(), 3, before), HintState::Locked);
    }

    #[test]
    fn test_index_is_monotonic() {
        let clock = HintClock::new(Moscow, minutes(7));
        let mut previous = i64::MIN;
        let mut now = at(0, 0) - Duration::hours(2);
        while now < at(23, 59) {
            let index = clock.available_index(date(), now);
            assert!(index >= previous);
            previous = index;
            now += Duration::seconds(97);
        }
    }

    #[test]
    fn test_reveal_contract() {
        let clock = HintClock::new(Moscow, minutes(30));
        let quiz = quiz();
        let fresh = UserRecord::new("1");

        assert_eq!(clock.reveal(&quiz, &fresh, at(0, 10)).unwrap(), "a");
        assert_eq!(clock.reveal(&quiz, &fresh, at(1, 5)).unwrap(), "c");
        assert!(matches!(
            clock.reveal(&quiz, &fresh, at(2, 0)),
            Err(QuizError::Exhausted)
        ));
    }

    #[test]
    fn test_used_hint_always_already_used() {
        let clock = HintClock::new(Moscow, minutes(30));
        let quiz = quiz();
        let used = UserRecord {
            used_hint: true,
            ..UserRecord::new("1")
        };
        for now in [at(0, 0) - Duration::hours(1), at(0, 10), at(0, 45), at(20, 0)] {
            assert!(matches!(
                clock.reveal(&quiz, &used, now),
                Err(QuizError::AlreadyUsed)
            ));
        }
    }

    #[test]
    fn test_day_start_on_dst_change() {
        let clock = HintClock::new(Berlin, minutes(30));
        let spring = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(clock.day_start(spring).to_rfc3339(), "2024-03-31T00:00:00+01:00");

        // 10:00 local is only nine real hours after midnight on this day
        let release = local_instant(spring, NaiveTime::from_hms_opt(10, 0, 0).unwrap(), Berlin);
        assert_eq!(clock.available_index(spring, release), 18);
    }
}
