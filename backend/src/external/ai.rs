//! Chat completion client
//!
//! Client for an OpenAI-compatible chat completions API with function
//! calling. The assistant answers inventory questions by invoking tools
//! supplied by the caller through the [`ToolExecutor`] trait.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};

/// Upper bound on tool-call rounds in a single conversation turn
const MAX_TOOL_ROUNDS: usize = 5;

/// Client for an OpenAI-compatible chat completions API
#[derive(Clone)]
pub struct AiClient {
    endpoint: String,
    api_key: String,
    model: String,
    http_client: Client,
}

/// Executes a named tool call on behalf of the model.
///
/// Implementations run the actual inventory operations and return a JSON
/// value that is fed back to the model as the tool result.
#[axum::async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, name: &str, arguments: serde_json::Value) -> AppResult<serde_json::Value>;
}

/// A message in the chat transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn tool_result(tool_call_id: String, content: String) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: Some(tool_call_id),
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments string, per the OpenAI wire format
    pub arguments: String,
}

/// A tool definition advertised to the model
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub spec_type: String,
    pub function: FunctionSpec,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolSpec {
    pub fn function(name: &str, description: &str, parameters: serde_json::Value) -> Self {
        Self {
            spec_type: "function".to_string(),
            function: FunctionSpec {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl AiClient {
    /// Create a new chat completion client
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            api_key,
            model,
            http_client,
        }
    }

    /// Run one conversation turn, resolving tool calls until the model
    /// produces a plain text reply or `MAX_TOOL_ROUNDS` is reached.
    pub async fn chat_with_tools(
        &self,
        mut messages: Vec<ChatMessage>,
        tools: &[ToolSpec],
        executor: &dyn ToolExecutor,
    ) -> AppResult<String> {
        for _ in 0..MAX_TOOL_ROUNDS {
            let assistant = self.complete(&messages, tools).await?;

            let Some(tool_calls) = assistant.tool_calls.clone().filter(|c| !c.is_empty()) else {
                return Ok(assistant.content.unwrap_or_default());
            };

            messages.push(assistant);

            for call in tool_calls {
                let arguments: serde_json::Value = serde_json::from_str(&call.function.arguments)
                    .unwrap_or_else(|_| json!({}));

                let result = match executor.execute(&call.function.name, arguments).await {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::warn!("Tool {} failed: {}", call.function.name, e);
                        json!({ "error": e.to_string() })
                    }
                };

                messages.push(ChatMessage::tool_result(call.id, result.to_string()));
            }
        }

        Err(AppError::ExternalService(
            "Chat assistant exceeded tool call limit".to_string(),
        ))
    }

    /// Single chat completion request
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> AppResult<ChatMessage> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if !tools.is_empty() {
            body["tools"] = serde_json::to_value(tools)
                .map_err(|e| AppError::Internal(format!("Tool serialization failed: {}", e)))?;
        }

        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));
        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Chat API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Chat API error: {} - {}",
                status, body
            )));
        }

        let data: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse chat response: {}", e)))?;

        data.choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| AppError::ExternalService("Chat API returned no choices".to_string()))
    }
}
