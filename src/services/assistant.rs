//! Study assistant backed by an OpenAI-compatible chat-completions API.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::models::daily_log::DailyLog;

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1024;

#[derive(Clone)]
pub struct Assistant {
    client: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// What the assistant knows about the student when answering.
pub struct StudentContext<'a> {
    pub name: &'a str,
    pub recent_logs: &'a [DailyLog],
    pub has_timetable: bool,
}

impl StudentContext<'_> {
    pub fn summary(&self) -> String {
        let mut out = format!("User Name: {}\n", self.name);

        if self.recent_logs.is_empty() {
            out.push_str("\nNo study logs found for the last 7 days.\n");
        } else {
            out.push_str("\nRecent Study Logs (Last 7 Days):\n");
            for log in self.recent_logs {
                out.push_str(&format!(
                    "- {}: {} ({} hrs)",
                    log.log_date, log.subject_id, log.hours_spent
                ));
                if !log.notes.is_empty() {
                    out.push_str(&format!(" - {}", log.notes));
                }
                out.push('\n');
            }
        }

        if self.has_timetable {
            out.push_str("\nTimetable Data is available (configured).\n");
        } else {
            out.push_str("\nTimetable is not configured.\n");
        }
        out
    }
}

pub fn system_prompt(context: &StudentContext<'_>) -> String {
    format!(
        r#"You are a helpful academic assistant chatbot for the StudyTrack app.
Your goal is to help students stay organized and motivated.

Context about the student:
{}
Answer the student's question based on this context.
If they ask about their progress, summarize the logs.
If they ask for advice, give general study tips suitable for a student.
Keep answers concise and encouraging."#,
        context.summary()
    )
}

impl Assistant {
    pub fn from_config(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client for assistant");
                reqwest::Client::new()
            });

        Self {
            client,
            api_key: config.chat_api_key.clone(),
            api_url: config.chat_api_url.clone(),
            model: config.chat_model.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn ask(&self, system_prompt: &str, question: &str) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Chat API key is not configured"))?;

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": system_prompt },
                    { "role": "user", "content": question },
                ],
                "temperature": TEMPERATURE,
                "max_tokens": MAX_TOKENS,
                "top_p": 1,
                "stream": false,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat API error {}: {}", status, body);
        }

        let completion: Completion = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("Chat API returned no content"))
    }
}
