use anyhow::Result;
use tokio::sync::mpsc;

use super::ArchiveService;
use crate::domain::models::Event;
use crate::domain::models::Language;
use crate::domain::models::Notification;
use crate::domain::models::TutorTurn;
use crate::domain::services::HoneyLedger;
use crate::domain::services::Sessions;

#[tokio::test]
async fn it_archives_turns_and_rewards_exchanges() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let (notification_tx, mut notification_rx) = mpsc::unbounded_channel::<Notification>();

    notification_tx.send(Notification::TurnFinalized {
        session_id: "abc".to_string(),
        language: Language::Italian,
        turn: TutorTurn::user("Ciao"),
    })?;
    notification_tx.send(Notification::ExchangeCompleted {
        session_id: "abc".to_string(),
    })?;
    drop(notification_tx);

    ArchiveService::start(
        Sessions::new(dir.path()),
        HoneyLedger::new(dir.path(), 1),
        event_tx,
        &mut notification_rx,
    )
    .await?;

    let session = Sessions::new(dir.path()).load("abc").await?;
    assert_eq!(session.language, Language::Italian);
    assert_eq!(session.turns.len(), 1);

    match event_rx.recv().await {
        Some(Event::HoneyBalance(honey)) => assert_eq!(honey, 4),
        _ => panic!("expected a honey balance event"),
    }

    return Ok(());
}
