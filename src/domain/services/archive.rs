#[cfg(test)]
#[path = "archive_test.rs"]
mod tests;

use anyhow::Result;
use tokio::sync::mpsc;

use super::HoneyLedger;
use super::Sessions;
use crate::domain::models::Event;
use crate::domain::models::Notification;

/// Persists what the session reconciler reports. Write failures are logged
/// and never reach the session.
pub struct ArchiveService {}

impl ArchiveService {
    pub async fn start(
        sessions: Sessions,
        ledger: HoneyLedger,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Notification>,
    ) -> Result<()> {
        while let Some(notification) = rx.recv().await {
            match notification {
                Notification::TurnFinalized {
                    session_id,
                    language,
                    turn,
                } => {
                    if let Err(err) = sessions.append_turn(&session_id, language, turn).await {
                        tracing::error!(error = ?err, %session_id, "Failed to archive turn");
                    }
                }
                Notification::ExchangeCompleted { session_id } => {
                    match ledger.record_exchange().await {
                        Ok(balance) => {
                            tx.send(Event::HoneyBalance(balance.honey))?;
                        }
                        Err(err) => {
                            tracing::error!(error = ?err, %session_id, "Failed to record exchange");
                        }
                    }
                }
            }
        }

        return Ok(());
    }
}
