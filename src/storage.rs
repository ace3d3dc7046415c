//! Whole-file JSON storage for quizzes and users
//!
//! Both collections are JSON objects: quizzes keyed by `YYYY-MM-DD`, users
//! keyed by id. Every save replaces the whole file through a temporary file
//! and a rename, so a reader never observes a half-written collection.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StoreError;
use crate::types::{Quiz, UserRecord};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize, Deserialize)]
struct StoredQuiz {
    question: String,
    answer: String,
    hints: Vec<String>,
    friday_bonus: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredUser {
    coins: u64,
    /// Empty string when the user never answered
    last_answer_date: String,
    answered_today: bool,
    used_hint: bool,
}

pub struct JsonStore {
    quizzes_path: Option<PathBuf>,
    users_path: Option<PathBuf>,
}

impl JsonStore {
    pub fn new(quizzes_path: impl Into<PathBuf>, users_path: impl Into<PathBuf>) -> Self {
        Self {
            quizzes_path: Some(quizzes_path.into()),
            users_path: Some(users_path.into()),
        }
    }

    /// Store that loads nothing and discards every save
    pub fn in_memory() -> Self {
        Self {
            quizzes_path: None,
            users_path: None,
        }
    }

    pub fn load_quizzes(&self) -> Result<BTreeMap<NaiveDate, Quiz>, StoreError> {
        let Some(path) = &self.quizzes_path else {
            return Ok(BTreeMap::new());
        };
        let stored: BTreeMap<String, StoredQuiz> = read_collection(path)?;

        stored
            .into_iter()
            .map(|(key, quiz)| -> Result<(NaiveDate, Quiz), StoreError> {
                let date = parse_date(path, &key)?;
                Ok((
                    date,
                    Quiz {
                        date,
                        question: quiz.question,
                        answer: quiz.answer,
                        hints: quiz.hints,
                        friday_bonus: quiz.friday_bonus,
                    },
                ))
            })
            .collect()
    }

    pub fn save_quizzes(&self, quizzes: &BTreeMap<NaiveDate, Quiz>) -> Result<(), StoreError> {
        let Some(path) = &self.quizzes_path else {
            return Ok(());
        };
        let stored: BTreeMap<String, StoredQuiz> = quizzes
            .values()
            .map(|quiz| {
                (
                    quiz.date.format(DATE_FORMAT).to_string(),
                    StoredQuiz {
                        question: quiz.question.clone(),
                        answer: quiz.answer.clone(),
                        hints: quiz.hints.clone(),
                        friday_bonus: quiz.friday_bonus,
                    },
                )
            })
            .collect();
        write_collection(path, &stored)
    }

    pub fn load_users(&self) -> Result<BTreeMap<String, UserRecord>, StoreError> {
        let Some(path) = &self.users_path else {
            return Ok(BTreeMap::new());
        };
        let stored: BTreeMap<String, StoredUser> = read_collection(path)?;

        stored
            .into_iter()
            .map(|(id, user)| -> Result<(String, UserRecord), StoreError> {
                let last_answer_date = if user.last_answer_date.is_empty() {
                    None
                } else {
                    Some(parse_date(path, &user.last_answer_date)?)
                };
                let record = UserRecord {
                    id: id.clone(),
                    coins: user.coins,
                    last_answer_date,
                    answered_today: user.answered_today,
                    used_hint: user.used_hint,
                };
                Ok((id, record))
            })
            .collect()
    }

    pub fn save_users(&self, users: &BTreeMap<String, UserRecord>) -> Result<(), StoreError> {
        let Some(path) = &self.users_path else {
            return Ok(());
        };
        let stored: BTreeMap<&str, StoredUser> = users
            .values()
            .map(|user| {
                (
                    user.id.as_str(),
                    StoredUser {
                        coins: user.coins,
                        last_answer_date: user
                            .last_answer_date
                            .map(|d| d.format(DATE_FORMAT).to_string())
                            .unwrap_or_default(),
                        answered_today: user.answered_today,
                        used_hint: user.used_hint,
                    },
                )
            })
            .collect();
        write_collection(path, &stored)
    }
}

fn parse_date(path: &Path, value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| StoreError::Schema {
        path: path.to_path_buf(),
        reason: format!("invalid date {:?}: {}", value, e),
    })
}

fn read_collection<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        debug!("{} does not exist yet, starting empty", path.display());
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Load {
        path: path.to_path_buf(),
        source,
    })
}

fn write_collection<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, bytes).map_err(|source| StoreError::Io {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_storage_in_memory() {
        let store = JsonStore::in_memory();
        assert!(store.load_quizzes().unwrap().is_empty());
        assert!(store.load_users().unwrap().is_empty());
        store.save_users(&BTreeMap::new()).unwrap();
    }

    #[test]
    fn test_missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("data.json"), dir.path().join("users.json"));
        assert!(store.load_quizzes().unwrap().is_empty());
        assert!(store.load_users().unwrap().is_empty());
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("data.json"), dir.path().join("users.json"));

        let quiz = Quiz::new(date("2024-03-08"), "What has keys?", "Piano", vec!["music".into()]);
        let mut quizzes = BTreeMap::new();
        quizzes.insert(quiz.date, quiz.clone());
        store.save_quizzes(&quizzes).unwrap();

        let mut users = BTreeMap::new();
        users.insert("42".to_string(), UserRecord::new("42"));
        users.insert(
            "7".to_string(),
            UserRecord {
                id: "7".to_string(),
                coins: 14,
                last_answer_date: Some(date("2024-03-08")),
                answered_today: true,
                used_hint: false,
            },
        );
        store.save_users(&users).unwrap();

        assert_eq!(store.load_quizzes().unwrap(), quizzes);
        assert_eq!(store.load_users().unwrap(), users);
        assert!(!dir.path().join("users.json.tmp").exists());
    }

    #[test]
    fn test_reads_legacy_user_shape() {
        let dir = tempfile::tempdir().unwrap();
        let users_path = dir.path().join("users.json");
        std::fs::write(
            &users_path,
            r#"{"100": {"coins": 3, "last_answer_date": "", "answered_today": false, "used_hint": true}}"#,
        )
        .unwrap();

        let store = JsonStore::new(dir.path().join("data.json"), &users_path);
        let users = store.load_users().unwrap();
        let user = &users["100"];
        assert_eq!(user.coins, 3);
        assert_eq!(user.last_answer_date, None);
        assert!(user.used_hint);
    }

    #[test]
    fn test_schema_mismatch_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let users_path = dir.path().join("users.json");
        let quizzes_path = dir.path().join("data.json");
        let store = JsonStore::new(&quizzes_path, &users_path);

        std::fs::write(&users_path, r#"{"100": {"coins": 3}}"#).unwrap();
        assert!(matches!(store.load_users(), Err(StoreError::Load { .. })));

        std::fs::write(
            &quizzes_path,
            r#"{"08.03.2024": {"question": "q", "answer": "a", "hints": [], "friday_bonus": true}}"#,
        )
        .unwrap();
        assert!(matches!(store.load_quizzes(), Err(StoreError::Schema { .. })));
    }
}
