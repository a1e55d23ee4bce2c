use test_utils::tutor_response_fixture;

use super::render_error;
use super::render_level_up;
use super::render_progress;
use super::render_turn;
use super::Line;
use super::Tone;
use crate::domain::models::CefrLevel;
use crate::domain::models::LevelUp;
use crate::domain::models::PartialTutorResponse;
use crate::domain::models::StreamError;
use crate::domain::models::TurnContent;
use crate::domain::models::TurnStatus;
use crate::domain::models::TutorResponse;
use crate::domain::models::TutorTurn;

fn partial(json: &str) -> PartialTutorResponse {
    return serde_json::from_str(json).unwrap();
}

fn lines_to_string(lines: &[Line]) -> String {
    return lines
        .iter()
        .map(|line| return line.text.to_string())
        .collect::<Vec<String>>()
        .join("\n");
}

#[test]
fn it_renders_user_turns() {
    let lines = render_turn(&TutorTurn::user("Ich habe ein Hund."));
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].tone, Tone::Student);
    insta::assert_snapshot!(lines_to_string(&lines), @"you> Ich habe ein Hund.");
}

#[test]
fn it_renders_a_finalized_response() {
    let response: TutorResponse = serde_json::from_str(tutor_response_fixture()).unwrap();
    let mut turn = TutorTurn::streaming(PartialTutorResponse::default());
    turn.content = TurnContent::Response(response);
    turn.status = TurnStatus::Final;

    insta::assert_snapshot!(lines_to_string(&render_turn(&turn)), @r###"
    tutor> Great effort! Just one small slip.
      You wrote: Ich habe ein Hund.
      Correct: Ich habe einen Hund.
      - "Hund" is masculine, so the accusative article is "einen".
      Translate: [I like] the [red car]
        [I like] Ich mag (mögen is irregular.)
        [red car] das rote Auto (Adjectives take an -e ending after the definite article.)
    "###);
}

#[test]
fn it_renders_partial_responses_without_placeholders() {
    let turn = TutorTurn::streaming(partial(
        r#"{"chatMessage":"Gut!","explanations":[null,"Word order"],"nextExercise":{"fullSentence":"I like the red car","parts":[{"text":"red car"},{"text":"blue"}]}}"#,
    ));

    insta::assert_snapshot!(lines_to_string(&render_turn(&turn)), @r###"
    tutor> Gut!
      - Word order
      Translate: I like the [red car]
        [red car]
      (thinking...)
    "###);
}

#[test]
fn it_shows_the_level_being_evaluated_while_streaming() {
    let turn = TutorTurn::streaming(partial(
        r#"{"chatMessage":"Gut!","progress":{"overallLevel":"b1","stepsToNextLevel":2}}"#,
    ));

    insta::assert_snapshot!(lines_to_string(&render_turn(&turn)), @r###"
    tutor> Gut!
      Level: B1, 2 steps to the next level
      (thinking...)
    "###);

    let turn = TutorTurn::streaming(partial(
        r#"{"chatMessage":"Gut!","progress":{"overallLevel":"expert"}}"#,
    ));
    insta::assert_snapshot!(lines_to_string(&render_turn(&turn)), @r###"
    tutor> Gut!
      (thinking...)
    "###);
}

#[test]
fn it_renders_tracked_progress() {
    let line = render_progress(Some(CefrLevel::A2), Some(3), None);
    insta::assert_debug_snapshot!(line, @r###"
    Some(
        Line {
            tone: Progress,
            text: "  Level: A2, 3 steps to the next level",
        },
    )
    "###);

    let line = render_progress(Some(CefrLevel::C1), Some(1), None).unwrap();
    assert_eq!(line.text, "  Level: C1, 1 step to the next level");

    let line = render_progress(Some(CefrLevel::B1), None, None).unwrap();
    assert_eq!(line.text, "  Level: B1");

    assert_eq!(render_progress(None, Some(3), None), None);
}

#[test]
fn it_mentions_the_level_up_being_celebrated() {
    let level_up = LevelUp {
        from: CefrLevel::A2,
        to: CefrLevel::B1,
    };

    let line = render_progress(Some(CefrLevel::B1), Some(5), Some(level_up)).unwrap();
    assert_eq!(line.text, "  Level: B1 (up from A2), 5 steps to the next level");

    let line = render_progress(Some(CefrLevel::A2), Some(5), Some(level_up)).unwrap();
    assert_eq!(line.text, "  Level: A2, 5 steps to the next level");
}

#[test]
fn it_marks_failed_turns() {
    let mut turn = TutorTurn::streaming(partial(r#"{"chatMessage":"Hal"}"#));
    turn.status = TurnStatus::Failed;

    let lines = render_turn(&turn);
    assert_eq!(lines.last().unwrap().tone, Tone::Alert);
    insta::assert_snapshot!(lines_to_string(&lines), @r###"
    tutor> Hal
      (this response failed, type /retry to ask again)
    "###);
}

#[test]
fn it_renders_level_ups_and_errors() {
    let line = render_level_up(&LevelUp {
        from: CefrLevel::A2,
        to: CefrLevel::B1,
    });
    assert_eq!(line.text, "*** Level up! A2 -> B1 ***");

    let line = render_error(&StreamError::Transport("connection reset".to_string()));
    insta::assert_snapshot!(line.text, @"the tutor backend failed mid-stream: connection reset. Check your connection, then type /retry to try again.");

    let line = render_error(&StreamError::Decode("expected value".to_string()));
    assert_eq!(line.tone, Tone::Alert);
    insta::assert_snapshot!(line.text, @"the tutor's response could not be decoded: expected value. Type /retry to ask again.");
}
