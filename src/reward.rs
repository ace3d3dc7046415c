//! Coin rewards for correct answers
//!
//! The first solver of the day earns [`BASE_REWARD`] + 1 coins and every
//! later solver earns one coin less, down to [`MIN_REWARD`]. Fridays add a
//! flat [`FRIDAY_BONUS`] on top.

use chrono::NaiveDate;

use crate::types::{is_friday, UserRecord};

pub const BASE_REWARD: u64 = 10;
pub const MIN_REWARD: u64 = 1;
pub const FRIDAY_BONUS: u64 = 3;

/// Reward for the first solver given `prior` correct answers already recorded
pub fn reward_for(prior: usize, friday: bool) -> u64 {
    let prior = prior as u64;
    let base = (BASE_REWARD + 1).saturating_sub(prior).max(MIN_REWARD);
    if friday {
        base + FRIDAY_BONUS
    } else {
        base
    }
}

/// Coins for the next correct answer on `date`, from ledger state before that
/// user's own update
pub fn compute<'a, I>(date: NaiveDate, users: I) -> u64
where
    I: IntoIterator<Item = &'a UserRecord>,
{
    let prior = users.into_iter().filter(|u| u.answered_on(date)).count();
    reward_for(prior, is_friday(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answered(id: usize, date: NaiveDate) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            last_answer_date: Some(date),
            answered_today: true,
            ..Default::default()
        }
    }

    fn users_with(prior: usize, date: NaiveDate) -> Vec<UserRecord> {
        (0..prior).map(|i| answered(i, date)).collect()
    }

    #[test]
    fn test_friday_scenarios() {
        let friday = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        assert_eq!(compute(friday, &users_with(0, friday)), 14);
        assert_eq!(compute(friday, &users_with(9, friday)), 5);
        assert_eq!(compute(friday, &users_with(15, friday)), 4);
    }

    #[test]
    fn test_weekday_decay_and_floor() {
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(compute(monday, &users_with(0, monday)), 11);
        assert_eq!(compute(monday, &users_with(1, monday)), 10);
        assert_eq!(compute(monday, &users_with(10, monday)), 1);
        assert_eq!(compute(monday, &users_with(11, monday)), 1);
        assert_eq!(compute(monday, &users_with(500, monday)), 1);
    }

    #[test]
    fn test_only_same_day_answers_count() {
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        let mut users = users_with(5, sunday);
        users.push(UserRecord::new("fresh"));
        assert_eq!(compute(monday, &users), 11);
    }

    #[test]
    fn test_non_increasing_in_prior_answers() {
        for friday in [false, true] {
            let floor = if friday { 4 } else { 1 };
            let mut previous = u64::MAX;
            for prior in 0..40 {
                let reward = reward_for(prior, friday);
                assert!(reward <= previous);
                assert!(reward >= floor);
                previous = reward;
            }
        }
    }
}
