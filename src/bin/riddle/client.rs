//! Daily Riddle HTTP API client

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Leaderboard / ranking entry
#[derive(Debug, Deserialize)]
pub struct RankedUser {
    pub rank: usize,
    pub user_id: String,
    pub coins: u64,
}

/// New riddle sent to the admin endpoint
#[derive(Debug, Serialize)]
pub struct AddQuizRequest {
    pub date: String,
    pub question: String,
    pub answer: String,
    pub hints: Vec<String>,
}

pub struct RiddleClient {
    client: Client,
    base_url: String,
    admin_token: Option<String>,
}

impl RiddleClient {
    pub fn new(server_url: &str) -> Self {
        // Build HTTP client with timeout, falling back to default client if builder fails
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: server_url.trim_end_matches('/').to_string(),
            admin_token: None,
        }
    }

    /// Authenticate /admin calls with `token`
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    fn admin_token(&self) -> Result<&str> {
        self.admin_token
            .as_deref()
            .ok_or_else(|| anyhow!("An admin token is required (--token or RIDDLE_ADMIN_TOKEN)"))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_leaderboard(&self, limit: usize) -> Result<Vec<RankedUser>> {
        let url = self.url(&format!("leaderboard?limit={}", limit));
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if status.is_success() {
            let data: serde_json::Value = resp.json().await?;
            ranking_from(&data, "leaderboard")
        } else {
            let error_text = resp.text().await.unwrap_or_else(|_| "Unknown error".into());
            Err(anyhow!(
                "Failed to fetch leaderboard ({}): {}",
                status,
                error_text
            ))
        }
    }

    pub async fn get_stats(&self) -> Result<Vec<RankedUser>> {
        let url = self.url("admin/stats");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(self.admin_token()?)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            let data: serde_json::Value = resp.json().await?;
            ranking_from(&data, "ranking")
        } else {
            let error_text = resp.text().await.unwrap_or_else(|_| "Unknown error".into());
            Err(anyhow!("Failed to fetch stats ({}): {}", status, error_text))
        }
    }

    pub async fn add_quiz(&self, request: &AddQuizRequest) -> Result<serde_json::Value> {
        let url = self.url("admin/quiz");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.admin_token()?)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(resp.json().await?)
        } else {
            let error_text = resp.text().await.unwrap_or_else(|_| "Unknown error".into());
            Err(anyhow!("Failed to add riddle ({}): {}", status, error_text))
        }
    }
}

fn ranking_from(data: &serde_json::Value, key: &str) -> Result<Vec<RankedUser>> {
    match data.get(key) {
        Some(entries) => Ok(serde_json::from_value(entries.clone())?),
        None => Ok(vec![]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = RiddleClient::new("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.url("/admin/quiz"), "http://localhost:8080/admin/quiz");
    }

    #[test]
    fn test_admin_calls_need_token() {
        let client = RiddleClient::new("http://localhost:8080");
        assert!(client.admin_token().is_err());

        let client = client.with_admin_token("s3cret");
        assert_eq!(client.admin_token().unwrap(), "s3cret");
    }

    #[test]
    fn test_ranking_from() {
        let data = serde_json::json!({
            "leaderboard": [{ "rank": 1, "user_id": "42", "coins": 14 }]
        });
        let ranking = ranking_from(&data, "leaderboard").unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].user_id, "42");
        assert!(ranking_from(&data, "ranking").unwrap().is_empty());
    }
}
