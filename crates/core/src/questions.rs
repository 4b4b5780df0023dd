use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;

use crate::evaluator::LlmResponse;
use crate::session::Level;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Parameters for one question fetch. Questions are fetched once per
/// session and never refreshed mid-run.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRequest {
    pub topic: String,
    pub level: Level,
    pub count: usize,
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait QuestionProvider: Send + Sync {
    /// Returns an ordered list of at most `request.count` questions.
    async fn fetch(&self, request: &QuestionRequest) -> Result<Vec<String>>;
}

/// Chat-completions backed question source.
pub struct LlmQuestionProvider {
    client: Client,
    api_key: String,
    model: String,
}

impl LlmQuestionProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl QuestionProvider for LlmQuestionProvider {
    async fn fetch(&self, request: &QuestionRequest) -> Result<Vec<String>> {
        let prompt = format!(
            "Write {count} interview questions for a {level}-level candidate on the topic \
             \"{topic}\". Each question must be answerable out loud in one or two minutes. \
             Respond ONLY as a numbered list of questions (no explanations).",
            count = request.count,
            level = request.level,
            topic = request.topic,
        );

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        });

        let resp = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .json::<LlmResponse>()
            .await?;

        let content = &resp
            .choices
            .first()
            .ok_or_else(|| anyhow::anyhow!("No response from LLM"))?
            .message
            .content;

        // Parse the numbered list, dropping numbering and blank lines.
        let questions: Vec<String> = content
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                line.find('.').map(|idx| line[idx + 1..].trim().to_string())
            })
            .filter(|q| !q.is_empty())
            .take(request.count)
            .collect();

        Ok(questions)
    }
}
