//! Stats command - full ranking for the admin

use crate::style::*;
use anyhow::Result;

pub async fn run(server: &str, token: &str) -> Result<()> {
    print_header("Full Rating");

    let client = crate::client::RiddleClient::new(server).with_admin_token(token);
    let ranking = client.get_stats().await?;

    println!();
    for entry in &ranking {
        println!(
            "{}  {:<20}  {} coins",
            style_rank(entry.rank, RANK_WIDTH),
            entry.user_id,
            style_bold(&entry.coins.to_string())
        );
    }
    println!();
    println!("{}", style_dim(&format!("{} users", ranking.len())));

    Ok(())
}
