//! Daily Riddle CLI
//!
//! Admin and player tooling for a running Daily Riddle server.

mod client;
mod commands;
mod style;

use clap::{Parser, Subcommand};
use client::AddQuizRequest;
use style::*;

#[derive(Parser)]
#[command(name = "riddle")]
#[command(version)]
#[command(about = "Daily Riddle - one riddle a day, coins for the quickest", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Daily Riddle server URL
    #[arg(
        short,
        long,
        env = "RIDDLE_SERVER",
        default_value = "http://127.0.0.1:8080",
        global = true
    )]
    server: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// View the leaderboard
    #[command(visible_alias = "lb")]
    Leaderboard {
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Add the riddle for a day (admin only)
    #[command(visible_alias = "add")]
    AddQuiz {
        /// Admin API token
        #[arg(short, long, env = "RIDDLE_ADMIN_TOKEN", hide_env_values = true)]
        token: String,

        /// Day of the riddle, YYYY-MM-DD
        #[arg(short, long)]
        date: String,

        #[arg(short, long)]
        question: String,

        #[arg(long)]
        answer: String,

        /// Hint, in unlock order (repeatable)
        #[arg(long = "hint")]
        hints: Vec<String>,
    },

    /// Show the full rating (admin only)
    Stats {
        /// Admin API token
        #[arg(short, long, env = "RIDDLE_ADMIN_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Show the resolved local configuration
    Config {
        /// Path to config.toml
        #[arg(short, long)]
        path: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("info").init();
    }

    let result = match cli.command {
        Commands::Leaderboard { limit } => commands::leaderboard::run(&cli.server, limit).await,
        Commands::AddQuiz {
            token,
            date,
            question,
            answer,
            hints,
        } => {
            let request = AddQuizRequest {
                date,
                question,
                answer,
                hints,
            };
            commands::quiz::run(&cli.server, &token, request).await
        }
        Commands::Stats { token } => commands::stats::run(&cli.server, &token).await,
        Commands::Config { path } => commands::config::run(path.as_deref()).await,
    };

    if let Err(e) = result {
        print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
