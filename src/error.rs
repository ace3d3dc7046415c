//! Error types

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single bot request. None of these are fatal to the process.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("no quiz for {0}")]
    NotFound(NaiveDate),

    #[error("hint already used today")]
    AlreadyUsed,

    #[error("all hints are exhausted")]
    Exhausted,

    #[error("hints are not unlocked yet")]
    HintLocked,

    #[error("already answered the quiz for {0}")]
    AlreadyAnswered(NaiveDate),

    #[error("admin rights required")]
    Unauthorized,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl QuizError {
    /// Text shown to the user who triggered the request
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(_) => "Today's riddle is not available yet.".to_string(),
            Self::AlreadyUsed => "You have already used a hint today!".to_string(),
            Self::Exhausted => "All hints have been used up!".to_string(),
            Self::HintLocked => "Hints are not available yet.".to_string(),
            Self::AlreadyAnswered(_) => {
                "You already solved today's riddle. Come back tomorrow!".to_string()
            }
            Self::Unauthorized => "You don't have admin rights!".to_string(),
            Self::InvalidInput(msg) => msg.clone(),
            Self::Storage(_) | Self::Internal(_) => {
                "Something went wrong, please try again later.".to_string()
            }
        }
    }
}

/// Persistence failure of the JSON store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema mismatch in {path}: {reason}")]
    Schema { path: PathBuf, reason: String },

    #[error("failed to encode records: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure to deliver one outbound message
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rejected by messenger api: {0}")]
    Rejected(String),

    #[error("invalid recipient id: {0}")]
    InvalidRecipient(String),
}
