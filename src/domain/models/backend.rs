#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;

use super::Language;
use super::Role;
use super::StudentContext;
use super::TutorTurn;

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Claude,
    OpenAI,
}

impl BackendName {
    pub fn parse(text: String) -> Result<BackendName> {
        if let Some(name) = BackendName::iter().find(|e| return e.to_string() == text) {
            return Ok(name);
        }

        bail!(format!("No backend named {text}"));
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTurn {
    pub role: Role,
    pub content: String,
}

/// Everything a backend needs to produce the next tutor response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prior_turns: Vec<PromptTurn>,
    pub language: Language,
    pub student_context: Option<StudentContext>,
}

impl GenerationRequest {
    /// Builds the request from a transcript. Only finalized turns are part of
    /// the conversation history the model sees.
    pub fn new(
        transcript: &[TutorTurn],
        language: Language,
        student_context: Option<StudentContext>,
    ) -> GenerationRequest {
        let prior_turns = transcript
            .iter()
            .filter(|turn| return turn.is_final())
            .map(|turn| {
                return PromptTurn {
                    role: turn.role,
                    content: turn.content.to_prompt_text(),
                };
            })
            .collect();

        return GenerationRequest {
            prior_turns,
            language,
            student_context,
        };
    }
}

pub struct BackendResponse {
    pub text: String,
    pub done: bool,
}

#[async_trait]
pub trait Backend {
    fn name(&self) -> BackendName;

    /// Used at startup to verify all configurations are available to work with
    /// the backend.
    async fn health_check(&self) -> Result<()>;

    /// Requests a structured tutor response from the backend. The raw JSON
    /// text is streamed back fragment by fragment through the channel, in
    /// order, exactly as the model produces it.
    ///
    /// Upon receiving all results, a final `done` boolean is provided as the
    /// last message to the channel.
    async fn get_completion<'a>(
        &self,
        request: GenerationRequest,
        tx: &'a mpsc::UnboundedSender<BackendResponse>,
    ) -> Result<()>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
