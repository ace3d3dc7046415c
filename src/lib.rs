//! Daily Riddle - a daily quiz bot that rewards early solvers
//!
//! Every calendar day has one riddle. Users answer it in chat and earn
//! coins, fewer for every user who solved it before them. One hint per day
//! can be requested, and later hints unlock as the day goes on.
//!
//! # How it works
//!
//! 1. The admin adds riddles ahead of time with `/addquiz`
//! 2. A reminder goes out shortly before the release time
//! 3. At release time the riddle is sent to everyone who has not solved it
//! 4. The first solver earns 11 coins, each later solver one less (minimum 1)
//! 5. Friday riddles pay 3 extra coins
//!
//! # Consistency
//!
//! - Ledger updates are serialized, so concurrent solvers get distinct rewards
//! - A user can only be rewarded once per riddle
//! - Every change is written to disk atomically before it is visible

pub mod bot;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod hint;
pub mod ledger;
pub mod messenger;
pub mod reward;
pub mod scheduler;
pub mod server;
pub mod storage;
pub mod types;

pub use bot::{AnswerOutcome, Command, QuizBot, Reply};
pub use catalog::QuizCatalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, Schedule};
pub use error::{DeliveryError, QuizError, StoreError};
pub use hint::{HintClock, HintState};
pub use ledger::UserLedger;
pub use messenger::{Action, Messenger, TelegramMessenger};
pub use scheduler::{BroadcastReport, Scheduler, Trigger};
pub use storage::JsonStore;
pub use types::{Quiz, UserRecord};
