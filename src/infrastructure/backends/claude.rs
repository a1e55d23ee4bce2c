#[cfg(test)]
#[path = "claude_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendName;
use crate::domain::models::BackendResponse;
use crate::domain::models::GenerationRequest;
use crate::domain::services::prompts;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ToolRequest {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ToolChoiceRequest {
    #[serde(rename = "type")]
    _type: String,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<MessageRequest>,
    tools: Vec<ToolRequest>,
    tool_choice: ToolChoiceRequest,
    stream: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionDeltaResponse {
    #[serde(rename = "type")]
    _type: String,
    #[serde(default)]
    partial_json: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionErrorResponse {
    #[serde(rename = "type")]
    _type: String,
    message: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(rename = "type")]
    _type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delta: Option<CompletionDeltaResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<CompletionErrorResponse>,
}

pub struct Claude {
    url: String,
    token: String,
    model: String,
    timeout: String,
}

impl Default for Claude {
    fn default() -> Claude {
        let mut model = Config::get(ConfigKey::Model);
        if model.is_empty() {
            model = DEFAULT_MODEL.to_string();
        }

        return Claude {
            url: Config::get(ConfigKey::ClaudeURL),
            token: Config::get(ConfigKey::ClaudeToken),
            model,
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

impl Claude {
    fn completion_request(&self, request: GenerationRequest) -> Result<CompletionRequest> {
        let messages = request
            .prior_turns
            .into_iter()
            .map(|turn| {
                return MessageRequest {
                    role: turn.role.to_string(),
                    content: turn.content,
                };
            })
            .collect::<Vec<MessageRequest>>();

        if messages.is_empty() {
            bail!("Claude requires at least one message to respond to");
        }

        return Ok(CompletionRequest {
            model: self.model.to_string(),
            max_tokens: 2048,
            system: prompts::system_prompt(request.language, request.student_context.as_ref()),
            messages,
            tools: vec![ToolRequest {
                name: prompts::RESPONSE_TOOL_NAME.to_string(),
                description: "Respond to the student with structured feedback.".to_string(),
                input_schema: prompts::tutor_response_schema(),
            }],
            tool_choice: ToolChoiceRequest {
                _type: "tool".to_string(),
                name: prompts::RESPONSE_TOOL_NAME.to_string(),
            },
            stream: true,
        });
    }
}

#[async_trait]
impl Backend for Claude {
    fn name(&self) -> BackendName {
        return BackendName::Claude;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Claude URL is not defined");
        }
        if self.token.is_empty() {
            bail!("Claude token is not defined");
        }

        let res = reqwest::Client::new()
            .get(format!("{url}/v1/models", url = self.url))
            .header("x-api-key", &self.token)
            .header("anthropic-version", "2023-06-01")
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let result = match res {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = ?err, "Claude is not reachable");
                bail!("Claude is not reachable");
            }
        };

        let status = result.status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Claude health check failed");
            bail!("Claude health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion<'a>(
        &self,
        request: GenerationRequest,
        tx: &'a mpsc::UnboundedSender<BackendResponse>,
    ) -> Result<()> {
        let req = self.completion_request(request)?;

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/messages", url = self.url))
            .header("x-api-key", &self.token)
            .header("content-type", "application/json")
            .header("anthropic-version", "2023-06-01")
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make completion request to Claude"
            );
            bail!(format!(
                "Failed to make completion request to Claude, status {}",
                res.status().as_u16()
            ));
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        while let Some(line) = lines_reader.next_line().await? {
            let mut cleaned_line = line.trim().to_string();
            if !cleaned_line.starts_with("data:") {
                continue;
            }
            cleaned_line = cleaned_line.split_off(5).trim().to_string();
            if cleaned_line.is_empty() {
                continue;
            }

            let ores: CompletionResponse = match serde_json::from_str(&cleaned_line) {
                Ok(ores) => ores,
                Err(err) => {
                    tracing::error!(error = ?err, line = %cleaned_line, "Malformed Claude stream event");
                    bail!("Claude sent a malformed stream event");
                }
            };
            tracing::debug!(body = ?ores, "Completion response");

            match ores._type.as_str() {
                "content_block_stop" | "message_stop" => break,
                "error" => {
                    let message = ores.error.map(|e| return e.message).unwrap_or_default();
                    tracing::error!(error_message = %message, "Claude stream failed");
                    bail!(format!("Claude stream failed: {message}"));
                }
                "content_block_delta" => {}
                _ => continue,
            }

            let text = ores.delta.map(|e| return e.partial_json).unwrap_or_default();
            if text.is_empty() {
                continue;
            }

            tx.send(BackendResponse { text, done: false })?;
        }

        tx.send(BackendResponse {
            text: "".to_string(),
            done: true,
        })?;

        return Ok(());
    }
}
