#[cfg(test)]
#[path = "prompts_test.rs"]
mod tests;

use serde_json::json;

use crate::domain::models::Language;
use crate::domain::models::StudentContext;
use crate::domain::models::CHAT_MESSAGE_MAX_CHARS;
use crate::domain::models::EXPLANATION_MAX_CHARS;

/// Name of the structured output the backends force the model to produce.
pub const RESPONSE_TOOL_NAME: &str = "json";

pub fn system_prompt(language: Language, student_context: Option<&StudentContext>) -> String {
    let mut prompt = format!(
        r#"You are a {language} language tutor that helps students learn by correcting their translations.

Your teaching approach:
1. When a student translates a sentence, carefully check their translation
2. Provide the correct translation
3. Explain any mistakes they made (grammar, vocabulary, word order, etc.)
4. Evaluate their current language level (A1-C2) based on their performance
5. Provide the next sentence to translate, adapted to match their level
6. Start with easy sentences and gradually increase difficulty based on their performance

Greet the student warmly and introduce yourself as their {language} tutor. Then provide the first simple sentence in English for them to translate to {language}. This should be a very easy sentence suitable for absolute beginners (A1 level).

Guidelines:
- Be encouraging and supportive
- Provide clear, educational explanations
- Adapt difficulty based on the student's demonstrated level
- Always answer with the structured response format, never with free text
- Keep translations contextually appropriate and culturally relevant"#
    );

    if let Some(ctx) = student_context {
        prompt.push_str(&format!(
            "\n\nAbout the student:\n- Age: {}\n- Native language: {}\nChoose topics suitable for their age, and compare with {} when it helps an explanation.",
            ctx.age, ctx.native_language, ctx.native_language
        ));
    }

    return prompt;
}

/// JSON schema of a tutor response, shared by every backend's structured
/// output mode.
pub fn tutor_response_schema() -> serde_json::Value {
    return json!({
        "type": "object",
        "additionalProperties": false,
        "required": [
            "chatMessage",
            "englishSentence",
            "submittedSentence",
            "correctedResponse",
            "explanations",
            "nextExercise",
            "progress"
        ],
        "properties": {
            "chatMessage": {
                "type": "string",
                "maxLength": CHAT_MESSAGE_MAX_CHARS,
                "description": "A brief message from the tutor to the student, e.g., encouraging them to keep going, giving them context on the corrections, or greeting them."
            },
            "englishSentence": {
                "type": "string",
                "description": "The original input text in English."
            },
            "submittedSentence": {
                "type": "string",
                "description": "The submitted input text in the target language."
            },
            "correctedResponse": {
                "type": "string",
                "description": "The correct translation of the input text. Only provide this if the user made an attempt at a translation."
            },
            "explanations": {
                "type": "array",
                "description": "An array of explanations for any mistakes made in the submitted translation.",
                "items": {
                    "type": "string",
                    "maxLength": EXPLANATION_MAX_CHARS
                }
            },
            "nextExercise": {
                "type": "object",
                "additionalProperties": false,
                "required": ["fullSentence", "parts"],
                "properties": {
                    "fullSentence": {
                        "type": "string",
                        "description": "The next sentence to translate to the target language, adapted to the student's level."
                    },
                    "parts": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "additionalProperties": false,
                            "required": ["text", "translation", "notes"],
                            "properties": {
                                "text": {
                                    "type": "string",
                                    "description": "A part of the sentence, e.g., a word or phrase. Must be contiguous ie \"the cat\" is valid but \"the ... cat\" is not."
                                },
                                "translation": {
                                    "type": "string",
                                    "description": "The translation of this part into the target language."
                                },
                                "notes": {
                                    "type": "string",
                                    "description": "Any notes or explanations about this part, e.g., grammar points, vocabulary tips, etc."
                                }
                            }
                        }
                    }
                }
            },
            "progress": {
                "type": "object",
                "additionalProperties": false,
                "required": ["overallLevel", "stepsToNextLevel"],
                "properties": {
                    "overallLevel": {
                        "type": "string",
                        "enum": ["A1", "A2", "B1", "B2", "C1", "C2"],
                        "description": "The evaluated language level of the student (A1-C2)."
                    },
                    "stepsToNextLevel": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "How many more correct exercises the student needs before reaching the next level."
                    },
                    "categoryLevels": {
                        "type": "object",
                        "description": "Evaluated level per skill, e.g., grammar or vocabulary.",
                        "additionalProperties": { "type": "string" }
                    }
                }
            }
        }
    });
}
