use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;

use crate::session::Evaluation;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub content: String,
}

/// One question/answer pair submitted for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRequest {
    pub question: String,
    pub answer: String,
    pub topic: String,
}

// The `EvaluationClient` trait is the contract for any service that can
// score an answer. The orchestrator depends on this abstraction rather than
// a concrete client, so unit tests can drive whole sessions with `mockall`'s
// `MockEvaluationClient` instead of real network calls.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait EvaluationClient: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation>;
}

/// Chat-completions backed evaluator.
pub struct LlmEvaluator {
    client: Client,
    api_key: String,
    model: String,
}

impl LlmEvaluator {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl EvaluationClient for LlmEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation> {
        let prompt = format!(
            r#"You are scoring a candidate's spoken answer in a mock interview on "{topic}".

Question: "{question}"

Candidate's answer: "{answer}"

Score the answer from 0 to 10 and give qualitative feedback. An empty answer scores 0.

Respond STRICTLY as JSON:
{{"score": <number 0-10>, "summary": "<one or two sentences>", "strengths": ["..."], "improvements": ["..."]}}

Do NOT add any explanation, just the JSON."#,
            topic = request.topic,
            question = request.question,
            answer = request.answer,
        );

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.1 // Low temperature for consistent scoring
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

        let mut evaluation: Evaluation = serde_json::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse evaluation JSON: {e}: {content}"))?;

        // Some models occasionally wander off the 0-10 scale.
        evaluation.score = evaluation.score.clamp(0.0, 10.0);

        Ok(evaluation)
    }
}
