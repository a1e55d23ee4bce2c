use std::time::Duration;

use anyhow::Result;
use test_utils::tutor_response_fixture;
use tokio::sync::mpsc;

use super::wrapped_rows;
use super::Repl;
use crate::domain::models::Action;
use crate::domain::models::Language;
use crate::domain::models::Notification;
use crate::domain::models::PartialTutorResponse;
use crate::domain::models::StreamError;
use crate::domain::models::StreamEvent;
use crate::domain::models::StreamUpdate;
use crate::domain::services::render::Line;
use crate::domain::services::render::Tone;
use crate::domain::services::SessionReconciler;

struct Harness {
    repl: Repl<Vec<u8>>,
    _action_rx: mpsc::UnboundedReceiver<Action>,
    _notification_rx: mpsc::UnboundedReceiver<Notification>,
}

impl Harness {
    fn new() -> Harness {
        let (action_tx, action_rx) = mpsc::unbounded_channel::<Action>();
        let (notification_tx, notification_rx) = mpsc::unbounded_channel::<Notification>();
        let reconciler = SessionReconciler::new(
            Language::German,
            None,
            Duration::from_secs(3),
            action_tx,
            notification_tx,
        );

        return Harness {
            repl: Repl::new(reconciler, "Ana".to_string(), vec![]),
            _action_rx: action_rx,
            _notification_rx: notification_rx,
        };
    }

    fn send(&mut self, update: StreamUpdate) -> Result<()> {
        let generation = self.repl.reconciler.generation();
        return self.repl.apply(StreamEvent { generation, update });
    }

    fn output(&self) -> String {
        return String::from_utf8_lossy(&self.repl.out).to_string();
    }
}

fn partial(json: &str) -> PartialTutorResponse {
    return serde_json::from_str(json).unwrap();
}

fn response_at(level: &str) -> PartialTutorResponse {
    return partial(&tutor_response_fixture().replace(
        r#""overallLevel":"A2""#,
        &format!(r#""overallLevel":"{level}""#),
    ));
}

fn line(text: &str) -> Line {
    return Line {
        tone: Tone::Muted,
        text: text.to_string(),
    };
}

#[test]
fn it_counts_one_row_per_short_line() {
    let lines = vec![line("tutor> Hallo"), line(""), line("  Level: A1")];
    assert_eq!(wrapped_rows(&lines, 80), 3);
}

#[test]
fn it_counts_wrapped_rows() {
    let lines = vec![line(&"a".repeat(81)), line(&"ü".repeat(40))];
    assert_eq!(wrapped_rows(&lines, 40), 4);
}

#[test]
fn it_survives_a_zero_width_terminal() {
    assert_eq!(wrapped_rows(&[line("abc")], 0), 3);
}

#[test]
fn it_holds_notices_until_the_reply_settles() -> Result<()> {
    let mut harness = Harness::new();
    assert!(harness.repl.handle_input("Ich habe ein Hund.")?);
    assert!(harness.repl.awaiting_reply);

    harness.repl.honey_balance(4)?;
    assert_eq!(harness.repl.pending_notices.len(), 1);
    assert!(!harness.output().contains("honey"));

    harness.send(StreamUpdate::Snapshot(partial(r#"{"chatMessage":"Great effort!"}"#)))?;
    assert!(harness.repl.awaiting_reply);
    assert!(harness.repl.drawn_rows >= 2);
    assert!(harness.output().contains("(thinking...)"));
    assert!(!harness.output().contains("honey"));

    harness.send(StreamUpdate::Completed(partial(tutor_response_fixture())))?;
    assert!(!harness.repl.awaiting_reply);
    assert_eq!(harness.repl.drawn_rows, 0);
    assert!(harness.repl.pending_notices.is_empty());

    let output = harness.output();
    let reply = output.find("Correct: Ich habe einen Hund.").unwrap();
    let progress = output.find("Level: A2, 3 steps to the next level").unwrap();
    let honey = output.find("You have 4 honey.").unwrap();
    assert!(reply < progress);
    assert!(progress < honey);

    return Ok(());
}

#[test]
fn it_settles_a_failed_reply_and_reports_the_error() -> Result<()> {
    let mut harness = Harness::new();
    harness.repl.handle_input("Hallo")?;
    harness.send(StreamUpdate::Snapshot(partial(r#"{"chatMessage":"Hal"}"#)))?;
    harness.repl.honey_balance(3)?;
    assert!(!harness.output().contains("honey"));

    harness.send(StreamUpdate::Failed {
        last: None,
        error: StreamError::Transport("connection reset".to_string()),
    })?;
    assert!(!harness.repl.awaiting_reply);
    assert_eq!(harness.repl.drawn_rows, 0);
    assert!(harness.repl.pending_notices.is_empty());

    let output = harness.output();
    let failed = output.find("(this response failed, type /retry to ask again)").unwrap();
    let error = output.find("connection reset").unwrap();
    let honey = output.find("You have 3 honey.").unwrap();
    assert!(failed < error);
    assert!(error < honey);
    assert!(!output.contains("Level:"));

    return Ok(());
}

#[test]
fn it_reports_failures_before_any_reply_arrived() -> Result<()> {
    let mut harness = Harness::new();
    harness.repl.handle_input("Hallo")?;
    harness.send(StreamUpdate::Failed {
        last: None,
        error: StreamError::Timeout(Duration::from_secs(30)),
    })?;

    assert!(!harness.repl.awaiting_reply);
    assert!(harness.output().contains("did not finish responding"));
    assert!(!harness.output().contains("tutor>"));

    return Ok(());
}

#[test]
fn it_rejects_input_while_the_tutor_is_answering() -> Result<()> {
    let mut harness = Harness::new();
    harness.repl.handle_input("Hallo")?;
    harness.repl.handle_input("Noch etwas")?;

    assert!(harness.repl.awaiting_reply);
    assert!(harness.output().contains("Your tutor is still answering"));

    return Ok(());
}

#[test]
fn it_announces_level_ups_with_the_tracked_progress() -> Result<()> {
    let mut harness = Harness::new();
    harness.repl.handle_input("Hallo")?;
    harness.send(StreamUpdate::Completed(response_at("A1")))?;
    assert!(harness.output().contains("Level: A1, 3 steps to the next level"));
    assert!(!harness.output().contains("Level up!"));

    harness.repl.handle_input("Ich habe einen Hund.")?;
    harness.send(StreamUpdate::Completed(response_at("A2")))?;

    let output = harness.output();
    let banner = output.find("*** Level up! A1 -> A2 ***").unwrap();
    let progress = output.find("Level: A2 (up from A1), 3 steps to the next level").unwrap();
    assert!(banner < progress);

    return Ok(());
}

#[test]
fn it_quits_on_the_quit_command() -> Result<()> {
    let mut harness = Harness::new();
    assert!(!harness.repl.handle_input("/quit")?);
    assert!(harness.repl.handle_input("/help")?);
    assert!(harness.output().contains("/retry (/r)"));

    return Ok(());
}
