use anyhow::Result;
use test_utils::tutor_response_fixture;

use super::PartialExercisePart;
use super::PartialNextExercise;
use super::PartialProgress;
use super::PartialTutorResponse;
use super::TutorResponse;
use crate::domain::models::ValidationError;

fn complete_partial() -> Result<PartialTutorResponse> {
    let partial: PartialTutorResponse = serde_json::from_str(tutor_response_fixture())?;
    return Ok(partial);
}

#[test]
fn it_deserializes_camel_case_fields() -> Result<()> {
    let res: TutorResponse = serde_json::from_str(tutor_response_fixture())?;

    assert_eq!(res.chat_message, "Great effort! Just one small slip.");
    assert_eq!(res.corrected_response, "Ich habe einen Hund.");
    assert_eq!(res.explanations.len(), 1);
    assert_eq!(res.next_exercise.full_sentence, "I like the red car");
    assert_eq!(res.next_exercise.parts[0].translation, "das rote Auto");
    assert_eq!(res.progress.overall_level, "A2");
    assert_eq!(res.progress.steps_to_next_level, 3);

    return Ok(());
}

#[test]
fn it_finalizes_a_complete_partial() -> Result<()> {
    let expected: TutorResponse = serde_json::from_str(tutor_response_fixture())?;
    let res = TutorResponse::try_from(complete_partial()?)?;

    assert_eq!(res, expected);
    return Ok(());
}

#[test]
fn it_converts_back_into_a_partial() -> Result<()> {
    let res: TutorResponse = serde_json::from_str(tutor_response_fixture())?;
    let partial = PartialTutorResponse::from(res.clone());

    assert_eq!(TutorResponse::try_from(partial)?, res);
    return Ok(());
}

#[test]
fn it_rejects_missing_required_fields() -> Result<()> {
    let mut partial = complete_partial()?;
    partial.progress = Some(PartialProgress {
        overall_level: Some("A1".to_string()),
        steps_to_next_level: None,
        category_levels: None,
    });

    let res = TutorResponse::try_from(partial);
    assert_eq!(
        res.unwrap_err(),
        ValidationError::MissingField("progress.stepsToNextLevel")
    );

    return Ok(());
}

#[test]
fn it_defaults_optional_fields_for_greetings() -> Result<()> {
    let partial = PartialTutorResponse {
        chat_message: Some("Hallo Anna!".to_string()),
        next_exercise: Some(PartialNextExercise {
            full_sentence: Some("I have a dog.".to_string()),
            parts: None,
        }),
        progress: Some(PartialProgress {
            overall_level: Some("A1".to_string()),
            steps_to_next_level: Some(5),
            category_levels: None,
        }),
        ..PartialTutorResponse::default()
    };

    let res = TutorResponse::try_from(partial)?;
    assert!(res.submitted_sentence.is_empty());
    assert!(res.corrected_response.is_empty());
    assert!(res.explanations.is_empty());
    assert!(res.next_exercise.parts.is_empty());

    return Ok(());
}

#[test]
fn it_drops_sparse_entries_when_finalizing() -> Result<()> {
    let mut partial = complete_partial()?;
    partial.explanations = Some(vec![None, Some("Use the accusative.".to_string()), None]);
    if let Some(next) = partial.next_exercise.as_mut() {
        next.parts = Some(vec![
            None,
            Some(PartialExercisePart {
                text: None,
                translation: Some("rot".to_string()),
                notes: None,
            }),
            Some(PartialExercisePart {
                text: Some("car".to_string()),
                translation: None,
                notes: None,
            }),
        ]);
    }

    let res = TutorResponse::try_from(partial)?;
    assert_eq!(res.explanations, vec!["Use the accusative.".to_string()]);
    assert_eq!(res.next_exercise.parts.len(), 1);
    assert_eq!(res.next_exercise.parts[0].text, "car");
    assert!(res.next_exercise.parts[0].translation.is_empty());

    return Ok(());
}

#[test]
fn it_filters_sparse_explanations_for_display() {
    let partial = PartialTutorResponse {
        explanations: Some(vec![Some("one".to_string()), None, Some("".to_string())]),
        ..PartialTutorResponse::default()
    };

    assert_eq!(partial.explanations(), vec!["one"]);
}

#[test]
fn it_reports_empty_partials() {
    assert!(PartialTutorResponse::default().is_empty());
    assert!(!PartialTutorResponse {
        chat_message: Some("".to_string()),
        ..PartialTutorResponse::default()
    }
    .is_empty());
}
