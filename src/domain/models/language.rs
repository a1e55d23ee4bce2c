use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumString;
use strum::EnumVariantNames;

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    EnumString,
    EnumVariantNames,
    strum::Display,
    Serialize,
    Deserialize,
)]
pub enum Language {
    #[default]
    German,
    French,
    Spanish,
    Italian,
    Portuguese,
    Japanese,
    Chinese,
    Korean,
    Irish,
    Danish,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentContext {
    pub age: u32,
    pub native_language: String,
}

impl StudentContext {
    /// Both values must be present for the context to be sent to the model.
    pub fn from_config(age: &str, native_language: &str) -> Option<StudentContext> {
        let age = age.trim().parse::<u32>().ok()?;
        if native_language.trim().is_empty() {
            return None;
        }

        return Some(StudentContext {
            age,
            native_language: native_language.trim().to_string(),
        });
    }
}
