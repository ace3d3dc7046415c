//! Daily Riddle HTTP server
//!
//! Receives Telegram webhook updates and exposes the leaderboard and the
//! admin surface as JSON endpoints. Webhook calls must carry the secret
//! registered with Telegram, admin calls must carry the admin bearer token.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

use crate::bot::{Command, QuizBot, Reply};
use crate::error::QuizError;
use crate::messenger::Messenger;

/// Header Telegram sets to the secret given to setWebhook
pub const WEBHOOK_SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Shared secrets guarding the inbound endpoints
#[derive(Debug, Clone)]
pub struct Credentials {
    pub webhook_secret: String,
    /// `None` disables the /admin API
    pub admin_token: Option<String>,
}

pub struct AppState {
    pub bot: Arc<QuizBot>,
    pub messenger: Arc<dyn Messenger>,
    pub credentials: Credentials,
    pub started_at: std::time::Instant,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/webhook", post(webhook_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .route("/admin/quiz", post(add_quiz_handler))
        .route("/admin/stats", get(stats_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Constant-time comparison, an empty secret never matches
fn secrets_match(expected: &str, given: &str) -> bool {
    !expected.is_empty()
        && expected.len() == given.len()
        && expected
            .bytes()
            .zip(given.bytes())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

// ============================================================================
// Telegram webhook
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    #[serde(default)]
    pub message: Option<TelegramMessage>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
}

/// A command addressed to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user_id: String,
    pub command: Command,
    /// Set when the command came from a button press
    pub callback_id: Option<String>,
}

impl TelegramUpdate {
    /// Sender and command, if the update carries anything the bot handles
    pub fn into_command(self) -> Option<Inbound> {
        if let Some(query) = self.callback_query {
            return Some(Inbound {
                user_id: query.from.id.to_string(),
                command: Command::from_callback(query.data.as_deref().unwrap_or_default()),
                callback_id: Some(query.id),
            });
        }
        let message = self.message?;
        let from = message.from?;
        let text = message.text?;
        Some(Inbound {
            user_id: from.id.to_string(),
            command: Command::parse(&text),
            callback_id: None,
        })
    }
}

async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(update): Json<TelegramUpdate>,
) -> StatusCode {
    let given = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !secrets_match(&state.credentials.webhook_secret, given) {
        warn!("Rejected webhook call with a missing or wrong secret");
        return StatusCode::UNAUTHORIZED;
    }

    let Some(inbound) = update.into_command() else {
        debug!("Ignoring update without text or callback data");
        return StatusCode::OK;
    };

    if let Some(callback_id) = &inbound.callback_id {
        if let Err(e) = state.messenger.acknowledge(callback_id).await {
            warn!("Failed to answer callback {}: {}", callback_id, e);
        }
    }

    // Ledger writes hit the disk under the ledger lock
    let bot = state.bot.clone();
    let user_id = inbound.user_id.clone();
    let handled = tokio::task::spawn_blocking(move || bot.handle(&user_id, inbound.command));
    let reply = match handled.await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Command for user {} panicked: {}", inbound.user_id, e);
            Reply::from(QuizError::Internal(e.to_string()))
        }
    };

    if let Err(e) = state
        .messenger
        .deliver(&inbound.user_id, &reply.text, reply.action)
        .await
    {
        warn!("Failed to reply to user {}: {}", inbound.user_id, e);
    }

    // Telegram redelivers on non-2xx, the reply failure is already logged
    StatusCode::OK
}

// ============================================================================
// JSON API
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub uptime_secs: u64,
    pub version: String,
    pub quizzes: usize,
    pub users: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankedUser {
    pub rank: usize,
    pub user_id: String,
    pub coins: u64,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddQuizRequest {
    pub date: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub hints: Vec<String>,
}

fn status_for(err: &QuizError) -> StatusCode {
    match err {
        QuizError::Unauthorized => StatusCode::FORBIDDEN,
        QuizError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        QuizError::NotFound(_) => StatusCode::NOT_FOUND,
        QuizError::AlreadyUsed
        | QuizError::Exhausted
        | QuizError::HintLocked
        | QuizError::AlreadyAnswered(_) => StatusCode::CONFLICT,
        QuizError::Storage(_) | QuizError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

type JsonResponse = (StatusCode, Json<serde_json::Value>);

fn error_response(err: QuizError) -> JsonResponse {
    (status_for(&err), Json(json!({ "error": err.to_string() })))
}

/// Check the admin bearer token
fn authorize_admin(credentials: &Credentials, headers: &HeaderMap) -> Result<(), JsonResponse> {
    let Some(expected) = &credentials.admin_token else {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "admin API is disabled" })),
        ));
    };
    let given = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();
    if secrets_match(expected, given) {
        Ok(())
    } else {
        warn!("Rejected admin API call with a missing or wrong token");
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid admin token" })),
        ))
    }
}

fn ranked(ranking: Vec<(String, u64)>) -> Vec<RankedUser> {
    ranking
        .into_iter()
        .enumerate()
        .map(|(i, (user_id, coins))| RankedUser {
            rank: i + 1,
            user_id,
            coins,
        })
        .collect()
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        uptime_secs: state.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        quizzes: state.bot.catalog().len(),
        users: state.bot.ledger().len(),
    })
}

async fn leaderboard_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<serde_json::Value> {
    let limit = query.limit.unwrap_or(crate::bot::RATING_SIZE);
    let leaderboard = ranked(state.bot.ledger().top(limit));
    Json(json!({ "leaderboard": leaderboard }))
}

async fn add_quiz_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<AddQuizRequest>,
) -> JsonResponse {
    if let Err(rejection) = authorize_admin(&state.credentials, &headers) {
        return rejection;
    }

    let bot = state.bot.clone();
    let added = tokio::task::spawn_blocking(move || {
        bot.add_quiz(
            bot.admin_id(),
            &request.date,
            &request.question,
            &request.answer,
            request.hints,
        )
    })
    .await
    .unwrap_or_else(|e| Err(QuizError::Internal(e.to_string())));

    match added {
        Ok(quiz) => {
            info!("Quiz for {} added via API", quiz.date);
            (
                StatusCode::CREATED,
                Json(json!({
                    "date": quiz.date,
                    "hints": quiz.hints.len(),
                    "friday_bonus": quiz.friday_bonus,
                })),
            )
        }
        Err(e) => error_response(e),
    }
}

async fn stats_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> JsonResponse {
    if let Err(rejection) = authorize_admin(&state.credentials, &headers) {
        return rejection;
    }

    match state.bot.stats(state.bot.admin_id()) {
        Ok(ranking) => (
            StatusCode::OK,
            Json(json!({ "users": ranking.len(), "ranking": ranked(ranking) })),
        ),
        Err(e) => error_response(e),
    }
}

/// Run the server
pub async fn run_server(
    host: &str,
    port: u16,
    bot: Arc<QuizBot>,
    messenger: Arc<dyn Messenger>,
    credentials: Credentials,
) -> anyhow::Result<()> {
    if credentials.admin_token.is_none() {
        warn!("No admin token configured, the /admin API is disabled");
    }

    let state = Arc::new(AppState {
        bot,
        messenger,
        credentials,
        started_at: std::time::Instant::now(),
    });

    let app = create_router(state);
    let addr = format!("{}:{}", host, port);

    info!("Starting Daily Riddle server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
