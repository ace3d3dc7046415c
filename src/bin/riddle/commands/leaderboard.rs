//! Leaderboard command

use crate::style::*;
use anyhow::Result;

pub async fn run(server: &str, limit: usize) -> Result<()> {
    print_header("Daily Riddle Leaderboard");

    let client = crate::client::RiddleClient::new(server);

    match client.get_leaderboard(limit).await {
        Ok(entries) => {
            if entries.is_empty() {
                print_info("Nobody has earned coins yet.");
                return Ok(());
            }

            println!();
            println!("{:>6}  {:<20}  {:>8}", "Rank", "User", "Coins");
            println!("{}", "─".repeat(38));

            for entry in &entries {
                println!(
                    "{}  {:<20}  {:>8}",
                    style_rank(entry.rank, RANK_WIDTH),
                    entry.user_id,
                    entry.coins
                );
            }

            println!();
            println!("Total users: {}", entries.len());
        }
        Err(e) => {
            print_error(&format!("Failed to fetch leaderboard: {}", e));
        }
    }

    Ok(())
}
