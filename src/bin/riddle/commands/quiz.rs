//! Add-quiz command

use crate::client::AddQuizRequest;
use crate::style::*;
use anyhow::Result;

pub async fn run(server: &str, token: &str, request: AddQuizRequest) -> Result<()> {
    let client = crate::client::RiddleClient::new(server).with_admin_token(token);
    let date = request.date.clone();
    let hints = request.hints.len();

    let created = client.add_quiz(&request).await?;

    print_success(&format!("Riddle for {} added with {} hints", date, hints));
    if created["friday_bonus"].as_bool().unwrap_or(false) {
        print_info(&format!(
            "{} is a Friday: solvers earn the bonus",
            style_yellow(&date)
        ));
    }

    Ok(())
}
