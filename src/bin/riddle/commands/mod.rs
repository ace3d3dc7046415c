pub mod config;
pub mod leaderboard;
pub mod quiz;
pub mod stats;
