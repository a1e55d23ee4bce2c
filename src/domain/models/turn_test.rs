use anyhow::Result;
use test_utils::tutor_response_fixture;

use super::Role;
use super::TurnContent;
use super::TurnStatus;
use super::TutorTurn;
use crate::domain::models::PartialTutorResponse;
use crate::domain::models::TutorResponse;

#[test]
fn it_creates_final_user_turns() {
    let turn = TutorTurn::user("Hallo");
    assert_eq!(turn.role, Role::User);
    assert_eq!(turn.text(), Some("Hallo"));
    assert!(turn.is_final());
    assert!(!turn.id.is_empty());
}

#[test]
fn it_creates_in_progress_assistant_turns() {
    let turn = TutorTurn::streaming(PartialTutorResponse::default());
    assert_eq!(turn.role, Role::Assistant);
    assert_eq!(turn.status, TurnStatus::InProgress);
    assert!(turn.response().is_none());
}

#[test]
fn it_assigns_unique_ids() {
    assert_ne!(TutorTurn::user("a").id, TutorTurn::user("a").id);
}

#[test]
fn it_deserializes_persisted_turns() -> Result<()> {
    let user = r#"{"id":"1","role":"user","content":"Ich habe ein Hund."}"#;
    let turn: TutorTurn = serde_json::from_str(user)?;
    assert_eq!(turn.content, TurnContent::Text("Ich habe ein Hund.".to_string()));
    assert_eq!(turn.status, TurnStatus::Final);

    let assistant = format!(
        r#"{{"id":"2","role":"assistant","content":{},"status":"final"}}"#,
        tutor_response_fixture()
    );
    let turn: TutorTurn = serde_json::from_str(&assistant)?;
    let expected: TutorResponse = serde_json::from_str(tutor_response_fixture())?;
    assert_eq!(turn.response(), Some(&expected));

    return Ok(());
}

#[test]
fn it_serializes_prompt_text() -> Result<()> {
    let res: TutorResponse = serde_json::from_str(tutor_response_fixture())?;
    let content = TurnContent::Response(res);
    let text = content.to_prompt_text();

    let round_trip: TutorResponse = serde_json::from_str(&text)?;
    assert_eq!(TurnContent::Response(round_trip), content);
    assert_eq!(TurnContent::Text("Hi".to_string()).to_prompt_text(), "Hi");

    return Ok(());
}
