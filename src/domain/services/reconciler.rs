#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;

use std::time::Duration;
use std::time::Instant;

use tokio::sync::mpsc;

use super::Celebrations;
use super::LevelTracker;
use crate::domain::models::Action;
use crate::domain::models::CefrLevel;
use crate::domain::models::Generation;
use crate::domain::models::GenerationRequest;
use crate::domain::models::Language;
use crate::domain::models::LevelUp;
use crate::domain::models::Notification;
use crate::domain::models::PartialTutorResponse;
use crate::domain::models::Role;
use crate::domain::models::SessionSeed;
use crate::domain::models::StreamError;
use crate::domain::models::StreamEvent;
use crate::domain::models::StreamUpdate;
use crate::domain::models::StudentContext;
use crate::domain::models::TurnContent;
use crate::domain::models::TurnStatus;
use crate::domain::models::TutorResponse;
use crate::domain::models::TutorTurn;

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum SessionState {
    Idle,
    UserPending,
    Streaming,
    Error,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// A response is still being generated for the previous submission.
    InFlight,
    /// The previous exchange failed and must be retried or abandoned first.
    AwaitingRetry,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted {
        turn_id: String,
        generation: Generation,
    },
    Ignored,
    Rejected(Rejection),
}

/// Read-only snapshot of the session handed to the presentation layer.
#[derive(Debug)]
pub struct SessionView<'a> {
    pub session_id: &'a str,
    pub language: Language,
    pub transcript: &'a [TutorTurn],
    pub open_turn_id: Option<&'a str>,
    pub state: SessionState,
    pub current_level: Option<CefrLevel>,
    pub steps_to_next_level: Option<u32>,
    pub pending_level_up: Option<LevelUp>,
    pub last_error: Option<&'a StreamError>,
}

impl<'a> SessionView<'a> {
    pub fn open_turn(&self) -> Option<&'a TutorTurn> {
        let id = self.open_turn_id?;
        return self.transcript.iter().find(|turn| return turn.id == id);
    }
}

/// Owns the transcript of one tutoring session and folds generation stream
/// events into it. Only the open turn is ever mutated by the stream, and
/// events carrying a stale generation are dropped.
pub struct SessionReconciler {
    session_id: String,
    language: Language,
    student_context: Option<StudentContext>,
    transcript: Vec<TutorTurn>,
    open_turn_id: Option<String>,
    state: SessionState,
    generation: Generation,
    tracker: LevelTracker,
    celebrations: Celebrations,
    last_error: Option<StreamError>,
    action_tx: mpsc::UnboundedSender<Action>,
    notification_tx: mpsc::UnboundedSender<Notification>,
}

impl SessionReconciler {
    pub fn new(
        language: Language,
        student_context: Option<StudentContext>,
        celebration_duration: Duration,
        action_tx: mpsc::UnboundedSender<Action>,
        notification_tx: mpsc::UnboundedSender<Notification>,
    ) -> SessionReconciler {
        return SessionReconciler {
            session_id: TutorTurn::create_id(),
            language,
            student_context,
            transcript: vec![],
            open_turn_id: None,
            state: SessionState::Idle,
            generation: 0,
            tracker: LevelTracker::default(),
            celebrations: Celebrations::new(celebration_duration),
            last_error: None,
            action_tx,
            notification_tx,
        };
    }

    /// Replays a persisted session. Unfinished turns are not restored.
    pub fn restore(&mut self, seed: SessionSeed) {
        self.session_id = seed.session_id;
        self.language = seed.language;
        self.transcript = seed
            .turns
            .into_iter()
            .filter(|turn| return turn.is_final())
            .collect();
        self.open_turn_id = None;
        self.state = SessionState::Idle;
        self.last_error = None;
        self.celebrations.clear();

        let last_progress = self
            .transcript
            .iter()
            .rev()
            .find_map(|turn| return turn.response())
            .map(|res| return &res.progress);

        let level = seed.overall_level.or_else(|| {
            return last_progress.map(|progress| return progress.overall_level.to_string());
        });
        let steps = last_progress.map(|progress| return progress.steps_to_next_level);
        self.tracker = LevelTracker::restore(level.as_deref(), steps);

        tracing::debug!(
            session_id = %self.session_id,
            turns = self.transcript.len(),
            "Restored session"
        );
    }

    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        match self.state {
            SessionState::UserPending | SessionState::Streaming => {
                tracing::debug!(generation = self.generation, "Submit rejected while in flight");
                return SubmitOutcome::Rejected(Rejection::InFlight);
            }
            SessionState::Error => {
                return SubmitOutcome::Rejected(Rejection::AwaitingRetry);
            }
            SessionState::Idle => {}
        }

        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let turn = TutorTurn::user(text);
        let turn_id = turn.id.to_string();
        self.transcript.push(turn.clone());
        self.notify(Notification::TurnFinalized {
            session_id: self.session_id.to_string(),
            language: self.language,
            turn,
        });

        let generation = self.request_generation();

        return SubmitOutcome::Accepted {
            turn_id,
            generation,
        };
    }

    /// Reissues the request for the last user turn after a failed stream.
    /// Returns the new generation, or `None` when there is nothing to retry.
    pub fn retry(&mut self) -> Option<Generation> {
        if self.state != SessionState::Error {
            return None;
        }

        if let Some(last) = self.transcript.last() {
            if last.role == Role::Assistant && last.status == TurnStatus::Failed {
                self.transcript.pop();
            }
        }

        return Some(self.request_generation());
    }

    /// Cancels any in-flight stream and starts over with an empty transcript.
    pub fn abandon_session(&mut self) {
        let in_flight = matches!(self.state, SessionState::UserPending | SessionState::Streaming);
        self.generation += 1;
        if in_flight && self.action_tx.send(Action::Abort()).is_err() {
            tracing::warn!("Action channel closed while abandoning session");
        }

        self.session_id = TutorTurn::create_id();
        self.transcript.clear();
        self.open_turn_id = None;
        self.state = SessionState::Idle;
        self.tracker = LevelTracker::default();
        self.celebrations.clear();
        self.last_error = None;
    }

    /// Folds one stream event into the transcript. Returns false when the
    /// event was discarded.
    pub fn apply(&mut self, event: StreamEvent) -> bool {
        if event.generation != self.generation {
            tracing::debug!(
                event_generation = event.generation,
                current_generation = self.generation,
                "Discarding stale stream event"
            );
            return false;
        }

        if !matches!(self.state, SessionState::UserPending | SessionState::Streaming) {
            tracing::debug!(state = %self.state, "Discarding stream event outside of a stream");
            return false;
        }

        match event.update {
            StreamUpdate::Snapshot(snapshot) => {
                self.apply_snapshot(snapshot);
            }
            StreamUpdate::Completed(snapshot) => {
                self.complete(snapshot);
            }
            StreamUpdate::Failed { last, error } => {
                self.fail(last, error);
            }
        }

        return true;
    }

    /// Advances the celebration queue. Returns a level-up at the moment its
    /// celebration starts.
    pub fn tick(&mut self, now: Instant) -> Option<LevelUp> {
        return self.celebrations.advance(now);
    }

    pub fn view(&self) -> SessionView<'_> {
        return SessionView {
            session_id: &self.session_id,
            language: self.language,
            transcript: &self.transcript,
            open_turn_id: self.open_turn_id.as_deref(),
            state: self.state,
            current_level: self.tracker.current_level(),
            steps_to_next_level: self.tracker.steps_to_next_level(),
            pending_level_up: self.celebrations.current(),
            last_error: self.last_error.as_ref(),
        };
    }

    pub fn generation(&self) -> Generation {
        return self.generation;
    }

    pub fn state(&self) -> SessionState {
        return self.state;
    }

    fn request_generation(&mut self) -> Generation {
        self.generation += 1;
        self.state = SessionState::UserPending;
        self.last_error = None;

        let request = GenerationRequest::new(
            &self.transcript,
            self.language,
            self.student_context.clone(),
        );

        tracing::debug!(generation = self.generation, "Requesting generation");
        if self
            .action_tx
            .send(Action::Generate(self.generation, request))
            .is_err()
        {
            tracing::error!("Action channel closed, generation could not be requested");
            self.state = SessionState::Error;
            self.last_error = Some(StreamError::Transport(
                "the generation worker is not running".to_string(),
            ));
        }

        return self.generation;
    }

    fn open_turn_mut(&mut self) -> Option<&mut TutorTurn> {
        let id = self.open_turn_id.as_deref()?;
        return self.transcript.iter_mut().find(|turn| return turn.id == id);
    }

    /// Writes the snapshot into the open turn, creating it on first use.
    fn upsert_open_turn(&mut self, snapshot: PartialTutorResponse) {
        if let Some(turn) = self.open_turn_mut() {
            turn.content = TurnContent::Partial(snapshot);
            return;
        }

        let turn = TutorTurn::streaming(snapshot);
        self.open_turn_id = Some(turn.id.to_string());
        self.transcript.push(turn);
        self.state = SessionState::Streaming;
    }

    fn apply_snapshot(&mut self, snapshot: PartialTutorResponse) {
        if snapshot.is_empty() {
            return;
        }
        self.upsert_open_turn(snapshot);
    }

    fn complete(&mut self, snapshot: PartialTutorResponse) {
        let response = match TutorResponse::try_from(snapshot.clone()) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "Final response failed validation");
                let last = if snapshot.is_empty() {
                    None
                } else {
                    Some(snapshot)
                };
                self.fail(last, StreamError::from(err));
                return;
            }
        };

        let level = response.progress.overall_level.to_string();
        let steps = response.progress.steps_to_next_level;

        self.upsert_open_turn(snapshot);
        let Some(turn) = self.open_turn_mut() else {
            return;
        };
        turn.content = TurnContent::Response(response);
        turn.status = TurnStatus::Final;
        let turn = turn.clone();

        self.open_turn_id = None;
        self.state = SessionState::Idle;
        self.last_error = None;

        if let Some(level_up) = self.tracker.observe(&level, Some(steps)) {
            self.celebrations.push(level_up);
        }

        self.notify(Notification::TurnFinalized {
            session_id: self.session_id.to_string(),
            language: self.language,
            turn,
        });
        self.notify(Notification::ExchangeCompleted {
            session_id: self.session_id.to_string(),
        });
    }

    fn fail(&mut self, last: Option<PartialTutorResponse>, error: StreamError) {
        tracing::warn!(error = %error, generation = self.generation, "Stream failed");

        if let Some(snapshot) = last.filter(|e| return !e.is_empty()) {
            self.upsert_open_turn(snapshot);
        }
        if let Some(turn) = self.open_turn_mut() {
            turn.status = TurnStatus::Failed;
        }

        self.open_turn_id = None;
        self.state = SessionState::Error;
        self.last_error = Some(error);
    }

    fn notify(&self, notification: Notification) {
        if self.notification_tx.send(notification).is_err() {
            tracing::warn!("Notification channel closed, dropping notification");
        }
    }
}
