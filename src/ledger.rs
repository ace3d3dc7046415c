//! Per-user coin ledger
//!
//! All read-modify-write sequences run under one mutex. Counting today's
//! solvers, computing the reward and recording the answer happen in a single
//! critical section, so two simultaneous correct answers never observe the
//! same count. Every mutation is persisted before it becomes visible in
//! memory.

use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{QuizError, StoreError};
use crate::reward;
use crate::storage::JsonStore;
use crate::types::UserRecord;

pub struct UserLedger {
    users: Mutex<BTreeMap<String, UserRecord>>,
    store: Arc<JsonStore>,
}

impl UserLedger {
    pub fn open(store: Arc<JsonStore>) -> Result<Self, StoreError> {
        let users = store.load_users()?;
        info!("Loaded {} users", users.len());
        Ok(Self {
            users: Mutex::new(users),
            store,
        })
    }

    /// Fetch a record, creating and persisting a default one on first access
    pub fn get(&self, id: &str) -> Result<UserRecord, QuizError> {
        let mut users = self.users.lock();
        if let Some(user) = users.get(id) {
            return Ok(user.clone());
        }
        let user = UserRecord::new(id);
        self.commit(&mut users, user.clone())?;
        debug!("Registered user {}", id);
        Ok(user)
    }

    /// Fetch a record without creating it
    pub fn peek(&self, id: &str) -> Option<UserRecord> {
        self.users.lock().get(id).cloned()
    }

    pub fn set_answered(
        &self,
        id: &str,
        date: NaiveDate,
        delta: u64,
    ) -> Result<UserRecord, QuizError> {
        let mut users = self.users.lock();
        let mut user = users.get(id).cloned().unwrap_or_else(|| UserRecord::new(id));
        apply_answer(&mut user, date, delta);
        self.commit(&mut users, user.clone())?;
        Ok(user)
    }

    pub fn set_hint_used(&self, id: &str) -> Result<(), QuizError> {
        let mut users = self.users.lock();
        let mut user = users.get(id).cloned().unwrap_or_else(|| UserRecord::new(id));
        user.used_hint = true;
        self.commit(&mut users, user)
    }

    /// Record a correct answer for `date` and return the coins earned.
    ///
    /// Rejects a second answer from a user who already solved `date`.
    pub fn award(&self, id: &str, date: NaiveDate) -> Result<u64, QuizError> {
        let mut users = self.users.lock();
        let mut user = users.get(id).cloned().unwrap_or_else(|| UserRecord::new(id));
        if user.answered_on(date) {
            return Err(QuizError::AlreadyAnswered(date));
        }

        let delta = reward::compute(date, users.values());
        apply_answer(&mut user, date, delta);
        self.commit(&mut users, user)?;
        Ok(delta)
    }

    /// Run `reveal` against the user's record and, if it succeeds, mark the
    /// hint as used. The check and the flag update are not interleaved with
    /// other ledger writes.
    pub fn reveal_hint<T, F>(&self, id: &str, reveal: F) -> Result<T, QuizError>
    where
        F: FnOnce(&UserRecord) -> Result<T, QuizError>,
    {
        let mut users = self.users.lock();
        let mut user = users.get(id).cloned().unwrap_or_else(|| UserRecord::new(id));
        let revealed = reveal(&user)?;
        user.used_hint = true;
        self.commit(&mut users, user)?;
        Ok(revealed)
    }

    /// Up to `n` users by coins descending, ties by id ascending
    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        let users = self.users.lock();
        let mut ranking: Vec<(String, u64)> = users
            .values()
            .map(|u| (u.id.clone(), u.coins))
            .collect();
        ranking.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranking.truncate(n);
        ranking
    }

    /// Users still waiting for today's riddle
    pub fn pending_recipients(&self) -> Vec<String> {
        self.users
            .lock()
            .values()
            .filter(|u| !u.answered_today)
            .map(|u| u.id.clone())
            .collect()
    }

    pub fn all_ids(&self) -> Vec<String> {
        self.users.lock().keys().cloned().collect()
    }

    /// Clear the daily answer and hint flags of every user
    pub fn begin_day(&self) -> Result<usize, QuizError> {
        let mut users = self.users.lock();
        let mut next = users.clone();
        let mut reset = 0;
        for user in next.values_mut() {
            if user.answered_today || user.used_hint {
                user.answered_today = false;
                user.used_hint = false;
                reset += 1;
            }
        }
        if reset > 0 {
            self.store.save_users(&next)?;
            *users = next;
        }
        Ok(reset)
    }

    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.lock().is_empty()
    }

    fn commit(
        &self,
        users: &mut BTreeMap<String, UserRecord>,
        user: UserRecord,
    ) -> Result<(), QuizError> {
        let mut next = users.clone();
        next.insert(user.id.clone(), user);
        self.store.save_users(&next)?;
        *users = next;
        Ok(())
    }
}

fn apply_answer(user: &mut UserRecord, date: NaiveDate, delta: u64) {
    user.coins += delta;
    user.last_answer_date = Some(date);
    user.answered_today = true;
    user.used_hint = false;
}
