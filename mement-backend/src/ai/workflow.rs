//! Workflow invocation against an OpenAI-compatible chat completion endpoint.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::prompt::PromptNode;
use super::{DEFAULT_TASK, DEFAULT_WORKFLOW};

/// Outcome of the answer workflow: an answerability verdict plus the answer
/// text. `rationale` carries the raw verdict for user-facing rejections.
#[derive(Debug, Clone)]
pub struct WorkflowAnswer {
    pub answerable: bool,
    pub answer: String,
    pub rationale: String,
}

/// Agent fields generated from a free-form idea (public creation flow).
#[derive(Debug, Clone, Deserialize)]
pub struct AgentFields {
    pub name: String,
    pub titles: Vec<String>,
    pub suggestions: Vec<String>,
    pub prompt: String,
}

#[async_trait]
pub trait GenerationWorkflow: Send + Sync {
    /// Run the named answer workflow with a persona task and a question.
    async fn answer(
        &self,
        workflow: &str,
        task: &str,
        question: &str,
        context: &str,
    ) -> Result<WorkflowAnswer, String>;

    /// Compress `text` under `limit` characters, keeping its meaning.
    async fn shorten(&self, text: &str, limit: usize) -> Result<String, String>;

    /// Generate agent fields from an idea.
    async fn agent_fields(&self, idea: &str) -> Result<AgentFields, String>;
}

#[derive(Clone)]
pub struct OpenAiWorkflow {
    client: Client,
    endpoint: String,
    model: String,
}

impl OpenAiWorkflow {
    pub fn new(api_key: &str, model: &str) -> Result<Self, String> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| format!("Invalid API key format: {}", e))?;
        headers.insert(header::AUTHORIZATION, auth_value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: model.to_string(),
        })
    }

    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<Value, String> {
        let body = json!({
            "model": self.model,
            "temperature": temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Generation request failed: {}", e))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| format!("Invalid generation response: {}", e))?;

        if !status.is_success() {
            let message = payload["error"]["message"].as_str().unwrap_or("unknown error");
            return Err(format!("Generation endpoint returned {}: {}", status, message));
        }

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| "Generation response missing content".to_string())?;

        serde_json::from_str(content).map_err(|e| format!("Generation output is not JSON: {}", e))
    }
}

pub(crate) fn parse_answer(fields: &Value) -> Result<WorkflowAnswer, String> {
    let success = fields["success"]
        .as_str()
        .map(|s| s.to_string())
        .or_else(|| fields["success"].as_bool().map(|b| b.to_string()))
        .ok_or_else(|| "missing success field".to_string())?;
    let answer = fields["answer"].as_str().unwrap_or_default().to_string();

    let answerable = success.eq_ignore_ascii_case("true");
    Ok(WorkflowAnswer {
        answerable,
        answer,
        rationale: fields.to_string(),
    })
}

#[async_trait]
impl GenerationWorkflow for OpenAiWorkflow {
    async fn answer(
        &self,
        workflow: &str,
        task: &str,
        question: &str,
        context: &str,
    ) -> Result<WorkflowAnswer, String> {
        let workflow = if workflow.is_empty() { DEFAULT_WORKFLOW } else { workflow };
        let task = if task.is_empty() { DEFAULT_TASK } else { task };
        log::debug!("[WORKFLOW] invoking '{}'", workflow);

        let system = PromptNode::group("system")
            .child(PromptNode::text(
                "instruction",
                "Think about response to the question in described situation, then make a \
                 twitter post from the first person, avoid using hashtags, yet make it a \
                 personal message to the audience. Respond as a JSON object.",
            ))
            .child(
                PromptNode::group("requiredFields")
                    .child(PromptNode::text(
                        "success",
                        "Can be TRUE or FALSE. Signifies whether provided question is \
                         appropriate to the task and confident answer can be derived.",
                    ))
                    .child(PromptNode::text(
                        "answer",
                        "Text of the final complete answer to the question in task context.",
                    )),
            )
            .render();

        let user = PromptNode::group("user")
            .child(PromptNode::text("situation", task))
            .child(PromptNode::text("context", context))
            .child(PromptNode::text("question", question))
            .render();

        let fields = self.complete(&system, &user, 0.0).await?;
        parse_answer(&fields)
    }

    async fn shorten(&self, text: &str, limit: usize) -> Result<String, String> {
        let system = PromptNode::group("system")
            .child(PromptNode::text(
                "instruction",
                &format!(
                    "Rewrite the message so it fits in {} characters without losing its \
                     meaning or voice. Respond as a JSON object with a single `answer` field.",
                    limit
                ),
            ))
            .render();

        let user = PromptNode::text("message", text).render();

        let fields = self.complete(&system, &user, 0.0).await?;
        Ok(fields["answer"].as_str().unwrap_or_default().to_string())
    }

    async fn agent_fields(&self, idea: &str) -> Result<AgentFields, String> {
        let system = PromptNode::group("system")
            .child(PromptNode::text(
                "instruction",
                "Generate fields for an agent entry based on the provided idea. Respond \
                 as a JSON object.",
            ))
            .child(
                PromptNode::group("requiredFields")
                    .child(PromptNode::text("name", "Name of the bot"))
                    .child(PromptNode::text("titles", "List of alternative titles for the bot"))
                    .child(PromptNode::text("suggestions", "List of items to scroll"))
                    .child(PromptNode::text("prompt", "System prompt for the bot")),
            )
            .render();

        let user = PromptNode::text("idea", idea).render();

        let fields = self.complete(&system, &user, 0.5).await?;
        serde_json::from_value(fields).map_err(|e| format!("missing response fields: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer_affirmative() {
        let fields = json!({ "success": "TRUE", "answer": "Plant in spring." });
        let parsed = parse_answer(&fields).unwrap();
        assert!(parsed.answerable);
        assert_eq!(parsed.answer, "Plant in spring.");
    }

    #[test]
    fn test_parse_answer_rejection_keeps_rationale() {
        let fields = json!({ "success": "FALSE", "answer": "Not my area." });
        let parsed = parse_answer(&fields).unwrap();
        assert!(!parsed.answerable);
        assert!(parsed.rationale.contains("FALSE"));
    }

    #[test]
    fn test_parse_answer_missing_success() {
        let fields = json!({ "answer": "text" });
        assert!(parse_answer(&fields).is_err());
    }

    #[test]
    fn test_parse_answer_boolean_success() {
        let fields = json!({ "success": true, "answer": "ok" });
        assert!(parse_answer(&fields).unwrap().answerable);
    }
}
