#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::stream;
use futures::Stream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::task::JoinSet;
use tokio::time;

use super::snapshots;
use super::ParserEvent;
use crate::domain::models::Action;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendResponse;
use crate::domain::models::Event;
use crate::domain::models::Generation;
use crate::domain::models::GenerationRequest;
use crate::domain::models::PartialTutorResponse;
use crate::domain::models::StreamError;
use crate::domain::models::StreamEvent;
use crate::domain::models::StreamUpdate;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /retry (/r) - Requests the tutor's last response again after it failed.
- /new (/n) - Abandons the current session and starts a fresh one.
- /quit /exit (/q) - Exit Hivetutor.
- /help (/h) - Provides this help menu.

Anything else you type is sent to your tutor as a translation attempt.
        "#;

    return text.trim().to_string();
}

type ChunkState = (
    mpsc::UnboundedReceiver<BackendResponse>,
    JoinSet<Result<()>>,
    bool,
);

/// Raw text chunks from a backend producer. A producer failure becomes the
/// final item of the stream.
fn backend_chunks(
    rx: mpsc::UnboundedReceiver<BackendResponse>,
    producer: JoinSet<Result<()>>,
) -> impl Stream<Item = Result<String, StreamError>> {
    let state: ChunkState = (rx, producer, false);

    return stream::unfold(state, |(mut rx, mut producer, finished)| {
        return async move {
            if finished {
                return None;
            }

            while let Some(res) = rx.recv().await {
                if res.done {
                    if res.text.is_empty() {
                        return None;
                    }
                    return Some((Ok(res.text), (rx, producer, true)));
                }
                if !res.text.is_empty() {
                    return Some((Ok(res.text), (rx, producer, false)));
                }
            }

            let error = match producer.join_next().await {
                Some(Ok(Ok(()))) | None => return None,
                Some(Ok(Err(err))) => {
                    tracing::error!(error = ?err, "Backend failed mid-stream");
                    StreamError::Transport(err.to_string())
                }
                Some(Err(err)) => StreamError::Transport(err.to_string()),
            };

            return Some((Err(error), (rx, producer, true)));
        };
    });
}

fn send_update(
    tx: &mpsc::UnboundedSender<Event>,
    generation: Generation,
    update: StreamUpdate,
) -> Result<()> {
    tx.send(Event::Stream(StreamEvent { generation, update }))?;
    return Ok(());
}

/// Streams one generation from the backend, reporting every snapshot tagged
/// with its generation. The stream as a whole must finish before `timeout`.
async fn stream_generation(
    backend: Arc<BackendBox>,
    generation: Generation,
    request: GenerationRequest,
    timeout: Duration,
    tx: mpsc::UnboundedSender<Event>,
) -> Result<()> {
    let deadline = time::Instant::now() + timeout;
    let (chunk_tx, chunk_rx) = mpsc::unbounded_channel::<BackendResponse>();

    let mut producer = JoinSet::new();
    producer.spawn(async move {
        return backend.get_completion(request, &chunk_tx).await;
    });

    let mut events = Box::pin(snapshots(backend_chunks(chunk_rx, producer)));
    let mut last: Option<PartialTutorResponse> = None;

    loop {
        let event = match time::timeout_at(deadline, events.next()).await {
            Ok(Some(event)) => event,
            Ok(None) => return Ok(()),
            Err(_) => {
                tracing::warn!(generation, ?timeout, "Generation stream timed out");
                let error = StreamError::Timeout(timeout);
                send_update(&tx, generation, StreamUpdate::Failed { last, error })?;
                return Ok(());
            }
        };

        match event {
            ParserEvent::Partial(snapshot) => {
                tracing::debug!(generation, "Stream snapshot");
                last = Some(snapshot.clone());
                send_update(&tx, generation, StreamUpdate::Snapshot(snapshot))?;
            }
            ParserEvent::Final(snapshot) => {
                tracing::debug!(generation, "Stream completed");
                send_update(&tx, generation, StreamUpdate::Completed(snapshot))?;
                return Ok(());
            }
            ParserEvent::Failed { last, error } => {
                send_update(&tx, generation, StreamUpdate::Failed { last, error })?;
                return Ok(());
            }
        }
    }
}

pub struct ActionsService {}

impl ActionsService {
    /// Runs until the action channel closes. At most one generation worker
    /// is alive at a time.
    pub async fn start(
        backend: BackendBox,
        stream_timeout: Duration,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        let backend = Arc::new(backend);

        // Lazy default.
        let mut worker: JoinHandle<Result<()>> = tokio::spawn(async {
            return Ok(());
        });

        while let Some(action) = rx.recv().await {
            match action {
                Action::Abort() => {
                    tracing::debug!("Aborting generation worker");
                    worker.abort();
                }
                Action::Generate(generation, request) => {
                    worker.abort();

                    let worker_tx = tx.clone();
                    let worker_backend = backend.clone();
                    worker = tokio::spawn(async move {
                        return stream_generation(
                            worker_backend,
                            generation,
                            request,
                            stream_timeout,
                            worker_tx,
                        )
                        .await;
                    });
                }
            }
        }

        worker.abort();
        return Ok(());
    }
}
