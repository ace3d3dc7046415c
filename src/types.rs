//! Quiz and user records

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// One day's riddle. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub date: NaiveDate,
    pub question: String,
    /// Normalized with [`normalize_answer`]
    pub answer: String,
    pub hints: Vec<String>,
    /// Derived from `date` at creation, never recomputed
    pub friday_bonus: bool,
}

impl Quiz {
    pub fn new(
        date: NaiveDate,
        question: impl Into<String>,
        answer: &str,
        hints: Vec<String>,
    ) -> Self {
        Self {
            date,
            question: question.into(),
            answer: normalize_answer(answer),
            hints,
            friday_bonus: is_friday(date),
        }
    }

    pub fn is_correct(&self, attempt: &str) -> bool {
        normalize_answer(attempt) == self.answer
    }
}

/// Per-user coin balance and daily state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub coins: u64,
    pub last_answer_date: Option<NaiveDate>,
    pub answered_today: bool,
    pub used_hint: bool,
}

impl UserRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn answered_on(&self, date: NaiveDate) -> bool {
        self.last_answer_date == Some(date)
    }
}

/// Lower-case and strip every whitespace character
pub fn normalize_answer(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn is_friday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_answer() {
        assert_eq!(normalize_answer("  Black Hole "), "blackhole");
        assert_eq!(normalize_answer("ЧЁРНАЯ\tдыра"), "чёрнаядыра");
        assert_eq!(normalize_answer(""), "");
    }

    #[test]
    fn test_quiz_new_derives_friday_bonus() {
        let friday = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        let quiz = Quiz::new(friday, "q", "Some Answer", vec![]);
        assert!(quiz.friday_bonus);
        assert_eq!(quiz.answer, "someanswer");
        assert!(quiz.is_correct("some ANSWER"));
        assert!(!quiz.is_correct("other"));

        assert!(!Quiz::new(saturday, "q", "a", vec![]).friday_bonus);
    }
}
