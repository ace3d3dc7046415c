//! Daily Riddle bot service
//!
//! Owns the catalog, the ledger and the timing context, and turns user
//! commands into replies. Transport-specific code (webhook, CLI) only parses
//! input into a [`Command`] and delivers the resulting [`Reply`].

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::catalog::QuizCatalog;
use crate::clock::Clock;
use crate::error::QuizError;
use crate::hint::HintClock;
use crate::ledger::UserLedger;
use crate::messenger::{Action, HINT_CALLBACK};
use crate::types::{Quiz, UserRecord};

/// Entries shown by /rating
pub const RATING_SIZE: usize = 10;

const ADD_QUIZ_USAGE: &str = "Usage: /addquiz YYYY-MM-DD question answer hint1 hint2 ...\n\
     Use '|' between fields for multi-word values: /addquiz 2024-03-08 | question | answer | hint";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Rating,
    MyCoins,
    Hint,
    AdminStats,
    AddQuiz(Vec<String>),
    Answer(String),
    Unknown(String),
}

impl Command {
    /// Parse a chat message. Anything that is not a slash command is an answer attempt.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let Some(rest) = text.strip_prefix('/') else {
            return Self::Answer(text.to_string());
        };

        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        // "/rating@SomeBot" in group chats
        let name = head.split('@').next().unwrap_or(head).to_lowercase();

        match name.as_str() {
            "start" => Self::Start,
            "rating" => Self::Rating,
            "mycoins" => Self::MyCoins,
            "hint" => Self::Hint,
            "adminstats" => Self::AdminStats,
            "addquiz" => Self::AddQuiz(split_args(args)),
            _ => Self::Unknown(name),
        }
    }

    /// Parse the payload of an inline button press
    pub fn from_callback(data: &str) -> Self {
        if data == HINT_CALLBACK {
            Self::Hint
        } else {
            Self::Unknown(data.to_string())
        }
    }
}

fn split_args(args: &str) -> Vec<String> {
    if args.contains('|') {
        args.split('|')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        args.split_whitespace().map(str::to_string).collect()
    }
}

/// Text sent back to the user, optionally with an action button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub action: Option<Action>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: None,
        }
    }
}

impl From<QuizError> for Reply {
    fn from(err: QuizError) -> Self {
        Reply::text(err.user_message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct { coins: u64 },
    Incorrect,
}

pub struct QuizBot {
    catalog: Arc<QuizCatalog>,
    ledger: Arc<UserLedger>,
    hints: HintClock,
    clock: Arc<dyn Clock>,
    admin_id: String,
    max_hints: usize,
}

impl QuizBot {
    pub fn new(
        catalog: Arc<QuizCatalog>,
        ledger: Arc<UserLedger>,
        hints: HintClock,
        clock: Arc<dyn Clock>,
        admin_id: impl Into<String>,
        max_hints: usize,
    ) -> Self {
        Self {
            catalog,
            ledger,
            hints,
            clock,
            admin_id: admin_id.into(),
            max_hints,
        }
    }

    pub fn catalog(&self) -> &QuizCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &UserLedger {
        &self.ledger
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn admin_id(&self) -> &str {
        &self.admin_id
    }

    pub fn is_admin(&self, caller: &str) -> bool {
        caller == self.admin_id
    }

    /// Register the user
    pub fn start(&self, user_id: &str) -> Result<UserRecord, QuizError> {
        self.ledger.get(user_id)
    }

    pub fn today_quiz(&self) -> Result<Quiz, QuizError> {
        self.catalog.get(self.clock.today())
    }

    pub fn submit_answer(&self, user_id: &str, text: &str) -> Result<AnswerOutcome, QuizError> {
        let quiz = self.today_quiz()?;
        if !quiz.is_correct(text) {
            debug!("Wrong answer from {} for {}", user_id, quiz.date);
            return Ok(AnswerOutcome::Incorrect);
        }

        let coins = self.ledger.award(user_id, quiz.date)?;
        info!("User {} solved {} for {} coins", user_id, quiz.date, coins);
        Ok(AnswerOutcome::Correct { coins })
    }

    pub fn request_hint(&self, user_id: &str) -> Result<String, QuizError> {
        let quiz = self.today_quiz()?;
        let now = self.clock.now();
        let hint = self.ledger.reveal_hint(user_id, |user| {
            self.hints.reveal(&quiz, user, now).map(str::to_string)
        })?;
        info!("User {} took a hint for {}", user_id, quiz.date);
        Ok(hint)
    }

    /// Balance of a known user
    pub fn coins(&self, user_id: &str) -> Option<u64> {
        self.ledger.peek(user_id).map(|u| u.coins)
    }

    pub fn rating(&self) -> Vec<(String, u64)> {
        self.ledger.top(RATING_SIZE)
    }

    pub fn add_quiz(
        &self,
        caller: &str,
        date: &str,
        question: &str,
        answer: &str,
        hints: Vec<String>,
    ) -> Result<Quiz, QuizError> {
        if !self.is_admin(caller) {
            warn!("Rejected add_quiz from non-admin {}", caller);
            return Err(QuizError::Unauthorized);
        }

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
            QuizError::InvalidInput(format!("Invalid date {:?}, expected YYYY-MM-DD", date))
        })?;
        if question.trim().is_empty() || answer.trim().is_empty() {
            return Err(QuizError::InvalidInput(
                "Question and answer must not be empty".to_string(),
            ));
        }
        if hints.len() > self.max_hints {
            return Err(QuizError::InvalidInput(format!(
                "At most {} hints are allowed, got {}",
                self.max_hints,
                hints.len()
            )));
        }

        self.catalog.put(date, question.trim(), answer, hints)
    }

    /// Full ranking, admin only
    pub fn stats(&self, caller: &str) -> Result<Vec<(String, u64)>, QuizError> {
        if !self.is_admin(caller) {
            warn!("Rejected stats from non-admin {}", caller);
            return Err(QuizError::Unauthorized);
        }
        Ok(self.ledger.top(usize::MAX))
    }

    /// Execute a command on behalf of `user_id`
    pub fn handle(&self, user_id: &str, command: Command) -> Reply {
        let result = match command {
            Command::Start => self
                .start(user_id)
                .map(|_| Reply::text("Hi there! 🎉 Ready to solve some riddles?")),
            Command::Rating => Ok(Reply::text(format_ranking("📊 Rating:", &self.rating()))),
            Command::MyCoins => Ok(Reply::text(match self.coins(user_id) {
                Some(coins) => format!("💰 You have {} coins!", coins),
                None => "You don't have any coins yet 😔".to_string(),
            })),
            Command::Hint => self
                .request_hint(user_id)
                .map(|hint| Reply::text(format!("💭 Hint: {}", hint))),
            Command::AdminStats => self
                .stats(user_id)
                .map(|ranking| Reply::text(format_ranking("📊 Full rating:", &ranking))),
            Command::AddQuiz(args) => self.handle_add_quiz(user_id, args),
            Command::Answer(text) => {
                self.submit_answer(user_id, &text)
                    .map(|outcome| match outcome {
                        AnswerOutcome::Correct { coins } => {
                            Reply::text(format!("🎉 Correct! You earned {} coins!", coins))
                        }
                        AnswerOutcome::Incorrect => Reply::text("❌ Wrong! Try again."),
                    })
            }
            Command::Unknown(name) => Ok(Reply::text(format!("Unknown command: {}", name))),
        };

        result.unwrap_or_else(Reply::from)
    }

    fn handle_add_quiz(&self, user_id: &str, args: Vec<String>) -> Result<Reply, QuizError> {
        if !self.is_admin(user_id) {
            return Err(QuizError::Unauthorized);
        }
        let mut args = args.into_iter();
        let (Some(date), Some(question), Some(answer)) = (args.next(), args.next(), args.next())
        else {
            return Ok(Reply::text(ADD_QUIZ_USAGE));
        };

        let quiz = self.add_quiz(user_id, &date, &question, &answer, args.collect())?;
        Ok(Reply::text(format!("Riddle for {} added!", quiz.date)))
    }

    /// Message broadcast at release time
    pub fn release_reply(quiz: &Quiz) -> Reply {
        Reply {
            text: format!("💡 Riddle of the day:\n\n{}", quiz.question),
            action: Some(Action::Hint),
        }
    }
}

pub fn format_ranking(title: &str, ranking: &[(String, u64)]) -> String {
    let mut text = format!("{}\n", title);
    for (i, (id, coins)) in ranking.iter().enumerate() {
        text.push_str(&format!("{}. User {}: {} coins\n", i + 1, id, coins));
    }
    text
}
