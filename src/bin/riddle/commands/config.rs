//! Config command - show the resolved local configuration

use crate::style::*;
use anyhow::Result;
use daily_riddle::Config;

pub async fn run(path: Option<&str>) -> Result<()> {
    print_header("Daily Riddle Configuration");

    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let schedule = config.schedule()?;
    let (host, port) = config.bind_addr();

    println!();
    println!("{}", style_bold("Schedule:"));
    println!("  Time zone:        {}", style_cyan(schedule.tz.name()));
    println!("  Reminder:         {}", schedule.reminder.format("%H:%M"));
    println!("  Release:          {}", schedule.release.format("%H:%M"));
    println!("  Hint interval:    {} min", schedule.hint_interval_minutes);
    println!("  Max hints:        {}", schedule.max_hints);
    println!();
    println!("{}", style_bold("Server:"));
    println!("  Bind:             {}:{}", host, port);
    println!("  Quizzes file:     {}", config.storage.quizzes_path.display());
    println!("  Users file:       {}", config.storage.users_path.display());
    println!("  Bot token:        {}", presence(config.bot_token().is_some()));
    println!("  Webhook secret:   {}", presence(config.webhook_secret().is_some()));
    println!("  Admin token:      {}", presence(config.admin_token().is_some()));

    Ok(())
}

fn presence(set: bool) -> String {
    if set {
        style_green("set")
    } else {
        style_red("missing")
    }
}
