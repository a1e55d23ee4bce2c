#[cfg(test)]
#[path = "tutor_response_test.rs"]
mod tests;

use std::collections::BTreeMap;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::ValidationError;

pub const CHAT_MESSAGE_MAX_CHARS: usize = 100;
pub const EXPLANATION_MAX_CHARS: usize = 200;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExercisePart {
    pub text: String,
    pub translation: String,
    pub notes: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextExercise {
    pub full_sentence: String,
    pub parts: Vec<ExercisePart>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub overall_level: String,
    pub steps_to_next_level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_levels: Option<BTreeMap<String, String>>,
}

/// A fully streamed and validated tutor reply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorResponse {
    pub chat_message: String,
    pub english_sentence: String,
    pub submitted_sentence: String,
    pub corrected_response: String,
    pub explanations: Vec<String>,
    pub next_exercise: NextExercise,
    pub progress: Progress,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialExercisePart {
    pub text: Option<String>,
    pub translation: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialNextExercise {
    pub full_sentence: Option<String>,
    pub parts: Option<Vec<Option<PartialExercisePart>>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialProgress {
    pub overall_level: Option<String>,
    pub steps_to_next_level: Option<u32>,
    pub category_levels: Option<BTreeMap<String, Option<String>>>,
}

/// The shape of a [`TutorResponse`] while it is still streaming. Every field,
/// at every depth, may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialTutorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub english_sentence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_sentence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanations: Option<Vec<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_exercise: Option<PartialNextExercise>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<PartialProgress>,
}

impl PartialTutorResponse {
    pub fn is_empty(&self) -> bool {
        return self == &PartialTutorResponse::default();
    }

    /// Explanations with sparse mid-stream entries removed.
    pub fn explanations(&self) -> Vec<&str> {
        return self
            .explanations
            .iter()
            .flatten()
            .filter_map(|e| return e.as_deref())
            .filter(|e| return !e.is_empty())
            .collect();
    }

    pub fn parts(&self) -> Vec<PartialExercisePart> {
        return self
            .next_exercise
            .as_ref()
            .and_then(|e| return e.parts.as_ref())
            .map(|parts| {
                return parts.iter().flatten().cloned().collect::<Vec<_>>();
            })
            .unwrap_or_default();
    }

    pub fn full_sentence(&self) -> Option<&str> {
        return self
            .next_exercise
            .as_ref()
            .and_then(|e| return e.full_sentence.as_deref());
    }

    pub fn overall_level(&self) -> Option<&str> {
        return self
            .progress
            .as_ref()
            .and_then(|e| return e.overall_level.as_deref());
    }

    pub fn steps_to_next_level(&self) -> Option<u32> {
        return self
            .progress
            .as_ref()
            .and_then(|e| return e.steps_to_next_level);
    }
}

impl From<TutorResponse> for PartialTutorResponse {
    fn from(res: TutorResponse) -> PartialTutorResponse {
        let parts = res
            .next_exercise
            .parts
            .into_iter()
            .map(|part| {
                return Some(PartialExercisePart {
                    text: Some(part.text),
                    translation: Some(part.translation),
                    notes: Some(part.notes),
                });
            })
            .collect();

        let category_levels = res.progress.category_levels.map(|levels| {
            return levels
                .into_iter()
                .map(|(k, v)| return (k, Some(v)))
                .collect();
        });

        return PartialTutorResponse {
            chat_message: Some(res.chat_message),
            english_sentence: Some(res.english_sentence),
            submitted_sentence: Some(res.submitted_sentence),
            corrected_response: Some(res.corrected_response),
            explanations: Some(res.explanations.into_iter().map(Some).collect()),
            next_exercise: Some(PartialNextExercise {
                full_sentence: Some(res.next_exercise.full_sentence),
                parts: Some(parts),
            }),
            progress: Some(PartialProgress {
                overall_level: Some(res.progress.overall_level),
                steps_to_next_level: Some(res.progress.steps_to_next_level),
                category_levels,
            }),
        };
    }
}

impl TryFrom<PartialTutorResponse> for TutorResponse {
    type Error = ValidationError;

    fn try_from(partial: PartialTutorResponse) -> Result<TutorResponse, ValidationError> {
        let chat_message = partial
            .chat_message
            .ok_or(ValidationError::MissingField("chatMessage"))?;
        if chat_message.chars().count() > CHAT_MESSAGE_MAX_CHARS {
            tracing::warn!(
                len = chat_message.chars().count(),
                "chatMessage exceeds {CHAT_MESSAGE_MAX_CHARS} characters"
            );
        }

        let next_exercise = partial
            .next_exercise
            .ok_or(ValidationError::MissingField("nextExercise"))?;
        let full_sentence = next_exercise
            .full_sentence
            .ok_or(ValidationError::MissingField("nextExercise.fullSentence"))?;
        let parts = next_exercise
            .parts
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(|part| {
                let text = part.text.filter(|e| return !e.is_empty())?;
                return Some(ExercisePart {
                    text,
                    translation: part.translation.unwrap_or_default(),
                    notes: part.notes.unwrap_or_default(),
                });
            })
            .collect();

        let progress = partial
            .progress
            .ok_or(ValidationError::MissingField("progress"))?;
        let overall_level = progress
            .overall_level
            .ok_or(ValidationError::MissingField("progress.overallLevel"))?;
        let steps_to_next_level = progress
            .steps_to_next_level
            .ok_or(ValidationError::MissingField("progress.stepsToNextLevel"))?;
        let category_levels = progress.category_levels.map(|levels| {
            return levels
                .into_iter()
                .filter_map(|(k, v)| return Some((k, v?)))
                .collect::<BTreeMap<String, String>>();
        });

        let explanations = partial
            .explanations
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter(|e| return !e.is_empty())
            .collect::<Vec<String>>();
        for explanation in &explanations {
            if explanation.chars().count() > EXPLANATION_MAX_CHARS {
                tracing::warn!(
                    len = explanation.chars().count(),
                    "explanation exceeds {EXPLANATION_MAX_CHARS} characters"
                );
            }
        }

        return Ok(TutorResponse {
            chat_message,
            english_sentence: partial.english_sentence.unwrap_or_default(),
            submitted_sentence: partial.submitted_sentence.unwrap_or_default(),
            corrected_response: partial.corrected_response.unwrap_or_default(),
            explanations,
            next_exercise: NextExercise {
                full_sentence,
                parts,
            },
            progress: Progress {
                overall_level,
                steps_to_next_level,
                category_levels,
            },
        });
    }
}
