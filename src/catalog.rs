//! Date-keyed catalog of quizzes

use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::error::{QuizError, StoreError};
use crate::storage::JsonStore;
use crate::types::Quiz;

pub struct QuizCatalog {
    quizzes: RwLock<BTreeMap<NaiveDate, Quiz>>,
    store: Arc<JsonStore>,
}

impl QuizCatalog {
    /// Load every stored quiz, failing on a malformed store
    pub fn open(store: Arc<JsonStore>) -> Result<Self, StoreError> {
        let quizzes = store.load_quizzes()?;
        info!("Loaded {} quizzes", quizzes.len());
        Ok(Self {
            quizzes: RwLock::new(quizzes),
            store,
        })
    }

    /// Store a quiz for `date`, replacing any previous one
    pub fn put(
        &self,
        date: NaiveDate,
        question: &str,
        answer: &str,
        hints: Vec<String>,
    ) -> Result<Quiz, QuizError> {
        let quiz = Quiz::new(date, question, answer, hints);

        let mut quizzes = self.quizzes.write();
        let mut next = quizzes.clone();
        next.insert(date, quiz.clone());
        self.store.save_quizzes(&next)?;
        *quizzes = next;

        info!(
            "Stored quiz for {} ({} hints, friday bonus: {})",
            date,
            quiz.hints.len(),
            quiz.friday_bonus
        );
        Ok(quiz)
    }

    pub fn get(&self, date: NaiveDate) -> Result<Quiz, QuizError> {
        self.quizzes
            .read()
            .get(&date)
            .cloned()
            .ok_or(QuizError::NotFound(date))
    }

    pub fn len(&self) -> usize {
        self.quizzes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.quizzes.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, Weekday};

    fn catalog() -> QuizCatalog {
        QuizCatalog::open(Arc::new(JsonStore::in_memory())).unwrap()
    }

    #[test]
    fn test_put_then_get_sets_friday_bonus() {
        let catalog = catalog();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        for offset in 0..14 {
            let date = start + Duration::days(offset);
            catalog
                .put(date, "question", " Answer ", vec!["h1".into()])
                .unwrap();
            let quiz = catalog.get(date).unwrap();
            assert_eq!(quiz.date, date);
            assert_eq!(quiz.answer, "answer");
            assert_eq!(quiz.friday_bonus, date.weekday() == Weekday::Fri);
        }
        assert_eq!(catalog.len(), 14);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let catalog = catalog();
        let date = NaiveDate::from_ymd_opt(2024, 5, 5).unwrap();
        assert!(matches!(catalog.get(date), Err(QuizError::NotFound(d)) if d == date));
    }

    #[test]
    fn test_catalog_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::new(
            dir.path().join("data.json"),
            dir.path().join("users.json"),
        ));
        let date = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        QuizCatalog::open(store.clone())
            .unwrap()
            .put(date, "q", "a", vec![])
            .unwrap();

        let reopened = QuizCatalog::open(store).unwrap();
        assert!(reopened.get(date).unwrap().friday_bonus);
    }

    #[test]
    fn test_failed_write_keeps_previous_quiz() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir(&data_dir).unwrap();
        let store = Arc::new(JsonStore::new(
            data_dir.join("data.json"),
            data_dir.join("users.json"),
        ));
        let catalog = QuizCatalog::open(store).unwrap();
        let friday = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let saturday = friday + Duration::days(1);
        catalog.put(friday, "first", "a", vec![]).unwrap();

        std::fs::remove_dir_all(&data_dir).unwrap();

        assert!(matches!(
            catalog.put(saturday, "q", "a", vec![]),
            Err(QuizError::Storage(_))
        ));
        assert!(matches!(catalog.get(saturday), Err(QuizError::NotFound(_))));

        assert!(matches!(
            catalog.put(friday, "second", "b", vec![]),
            Err(QuizError::Storage(_))
        ));
        assert_eq!(catalog.get(friday).unwrap().question, "first");
        assert_eq!(catalog.len(), 1);
    }
}
