//! Daily Riddle Server
//!
//! Runs the daily scheduler and the webhook/admin HTTP server

use std::sync::Arc;

use anyhow::Context;
use daily_riddle::server::{run_server, Credentials};
use daily_riddle::{
    Config, HintClock, JsonStore, Messenger, QuizBot, QuizCatalog, Scheduler, SystemClock,
    TelegramMessenger, UserLedger,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Daily Riddle Server");

    let config = Config::load()?;
    let schedule = config.schedule()?;

    let token = config.bot_token().ok_or_else(|| {
        error!("BOT_TOKEN environment variable or bot.token is required");
        anyhow::anyhow!("bot token not set")
    })?;
    let webhook_secret = config.webhook_secret().ok_or_else(|| {
        error!("WEBHOOK_SECRET environment variable or bot.webhook_secret is required");
        anyhow::anyhow!("webhook secret not set")
    })?;
    let credentials = Credentials {
        webhook_secret,
        admin_token: config.admin_token(),
    };

    let store = Arc::new(JsonStore::new(
        &config.storage.quizzes_path,
        &config.storage.users_path,
    ));
    let catalog = Arc::new(QuizCatalog::open(store.clone()).context("Failed to load quizzes")?);
    let ledger = Arc::new(UserLedger::open(store).context("Failed to load users")?);
    info!("Storage initialized");

    let bot = Arc::new(QuizBot::new(
        catalog,
        ledger,
        HintClock::new(schedule.tz, schedule.hint_interval_minutes),
        Arc::new(SystemClock::new(schedule.tz)),
        config.bot.admin_id.clone(),
        schedule.max_hints,
    ));
    let messenger: Arc<dyn Messenger> =
        Arc::new(TelegramMessenger::new(&config.bot.api_base, &token));

    // Daily release, reminder and rollover
    let scheduler = Scheduler::new(bot.clone(), messenger.clone(), schedule);
    tokio::spawn(scheduler.run());

    let (host, port) = config.bind_addr();
    run_server(&host, port, bot, messenger, credentials).await?;

    Ok(())
}
