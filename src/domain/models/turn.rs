#[cfg(test)]
#[path = "turn_test.rs"]
mod tests;

use chrono::Local;
use chrono::SecondsFormat;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

use super::PartialTutorResponse;
use super::TutorResponse;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    #[default]
    Final,
    InProgress,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Response(TutorResponse),
    Partial(PartialTutorResponse),
}

impl TurnContent {
    /// The assistant content as a partial view, whether or not it has been
    /// finalized. `None` for user text.
    pub fn as_partial(&self) -> Option<PartialTutorResponse> {
        match self {
            TurnContent::Text(_) => return None,
            TurnContent::Response(res) => return Some(PartialTutorResponse::from(res.clone())),
            TurnContent::Partial(partial) => return Some(partial.clone()),
        }
    }

    /// Text sent back to the model as conversation history.
    pub fn to_prompt_text(&self) -> String {
        match self {
            TurnContent::Text(text) => return text.to_string(),
            TurnContent::Response(res) => {
                return serde_json::to_string(res).unwrap_or_default();
            }
            TurnContent::Partial(partial) => {
                return serde_json::to_string(partial).unwrap_or_default();
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorTurn {
    pub id: String,
    pub role: Role,
    pub content: TurnContent,
    #[serde(default)]
    pub status: TurnStatus,
    #[serde(default)]
    pub created_at: String,
}

impl TutorTurn {
    pub fn create_id() -> String {
        return Uuid::new_v4().to_string();
    }

    pub fn user(text: &str) -> TutorTurn {
        return TutorTurn {
            id: TutorTurn::create_id(),
            role: Role::User,
            content: TurnContent::Text(text.to_string()),
            status: TurnStatus::Final,
            created_at: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        };
    }

    pub fn streaming(snapshot: PartialTutorResponse) -> TutorTurn {
        return TutorTurn {
            id: TutorTurn::create_id(),
            role: Role::Assistant,
            content: TurnContent::Partial(snapshot),
            status: TurnStatus::InProgress,
            created_at: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        };
    }

    pub fn is_final(&self) -> bool {
        return self.status == TurnStatus::Final;
    }

    pub fn response(&self) -> Option<&TutorResponse> {
        if let TurnContent::Response(res) = &self.content {
            return Some(res);
        }
        return None;
    }

    pub fn text(&self) -> Option<&str> {
        if let TurnContent::Text(text) = &self.content {
            return Some(text);
        }
        return None;
    }
}
