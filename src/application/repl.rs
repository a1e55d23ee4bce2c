#[cfg(test)]
#[path = "repl_test.rs"]
mod tests;

use std::io;
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;
use std::time::Instant;

use anyhow::Result;
use crossterm::cursor::MoveToPreviousLine;
use crossterm::queue;
use crossterm::terminal;
use crossterm::terminal::Clear;
use crossterm::terminal::ClearType;
use owo_colors::OwoColorize;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::time;

use crate::application::cli;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Language;
use crate::domain::models::Notification;
use crate::domain::models::Role;
use crate::domain::models::SessionSeed;
use crate::domain::models::SlashCommand;
use crate::domain::models::StreamEvent;
use crate::domain::models::StudentContext;
use crate::domain::models::TurnStatus;
use crate::domain::services::actions::help_text;
use crate::domain::services::render::render_error;
use crate::domain::services::render::render_level_up;
use crate::domain::services::render::render_progress;
use crate::domain::services::render::render_turn;
use crate::domain::services::render::Line;
use crate::domain::services::render::Tone;
use crate::domain::services::Rejection;
use crate::domain::services::SessionReconciler;
use crate::domain::services::SessionState;
use crate::domain::services::SubmitOutcome;

pub fn paint(line: &Line) -> String {
    let text = line.text.as_str();
    match line.tone {
        Tone::Student => return text.cyan().to_string(),
        Tone::Tutor => return text.bold().to_string(),
        Tone::Correction => return text.green().to_string(),
        Tone::Explanation => return text.yellow().to_string(),
        Tone::Exercise => return text.bright_white().bold().to_string(),
        Tone::Progress => return text.magenta().to_string(),
        Tone::Muted => return text.dimmed().to_string(),
        Tone::Alert => return text.red().to_string(),
    }
}

/// Terminal rows taken by `lines` once wrapped at `width` columns.
pub fn wrapped_rows(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let rows = lines
        .iter()
        .map(|line| {
            let chars = line.text.chars().count();
            return chars.div_ceil(width).max(1);
        })
        .sum::<usize>();

    return rows.min(u16::MAX as usize) as u16;
}

fn notice(tone: Tone, text: &str) -> Line {
    return Line {
        tone,
        text: text.to_string(),
    };
}

struct Repl<W: Write> {
    reconciler: SessionReconciler,
    student_name: String,
    awaiting_reply: bool,
    drawn_rows: u16,
    pending_notices: Vec<Line>,
    out: W,
}

impl<W: Write> Repl<W> {
    fn new(reconciler: SessionReconciler, student_name: String, out: W) -> Repl<W> {
        return Repl {
            reconciler,
            student_name,
            awaiting_reply: false,
            drawn_rows: 0,
            pending_notices: vec![],
            out,
        };
    }

    fn print_lines(&mut self, lines: &[Line]) -> Result<()> {
        for line in lines {
            writeln!(self.out, "{}", paint(line))?;
        }
        self.out.flush()?;

        return Ok(());
    }

    fn print_transcript(&mut self) -> Result<()> {
        let lines = self
            .reconciler
            .view()
            .transcript
            .iter()
            .flat_map(render_turn)
            .collect::<Vec<Line>>();

        return self.print_lines(&lines);
    }

    fn print_progress(&mut self) -> Result<()> {
        let view = self.reconciler.view();
        let progress = render_progress(
            view.current_level,
            view.steps_to_next_level,
            view.pending_level_up,
        );

        if let Some(line) = progress {
            self.print_lines(&[line])?;
        }

        return Ok(());
    }

    /// Replaces the rows drawn for the streaming turn with its latest render.
    fn redraw_live(&mut self, lines: &[Line]) -> Result<()> {
        if self.drawn_rows > 0 {
            queue!(
                self.out,
                MoveToPreviousLine(self.drawn_rows),
                Clear(ClearType::FromCursorDown)
            )?;
        }

        self.print_lines(lines)?;
        let (width, _) = terminal::size().unwrap_or((80, 24));
        self.drawn_rows = wrapped_rows(lines, width);

        return Ok(());
    }

    fn settle(&mut self) {
        self.awaiting_reply = false;
        self.drawn_rows = 0;
    }

    fn flush_notices(&mut self) -> Result<()> {
        if self.awaiting_reply || self.pending_notices.is_empty() {
            return Ok(());
        }

        let notices = std::mem::take(&mut self.pending_notices);
        return self.print_lines(&notices);
    }

    fn greet(&mut self) -> Result<()> {
        let greeting = format!("Hi, I'm {}", self.student_name);
        self.print_lines(&[notice(Tone::Student, &format!("you> {greeting}"))])?;
        return self.submit(&greeting);
    }

    fn submit(&mut self, text: &str) -> Result<()> {
        match self.reconciler.submit(text) {
            SubmitOutcome::Accepted { .. } => self.awaiting_reply = true,
            SubmitOutcome::Ignored => {}
            SubmitOutcome::Rejected(Rejection::InFlight) => {
                self.print_lines(&[notice(
                    Tone::Alert,
                    "Your tutor is still answering, wait for them to finish.",
                )])?;
            }
            SubmitOutcome::Rejected(Rejection::AwaitingRetry) => {
                self.print_lines(&[notice(
                    Tone::Alert,
                    "The last response failed. Type /retry to ask again or /new to start over.",
                )])?;
            }
        }

        return Ok(());
    }

    /// Returns false when the student asked to quit.
    fn handle_input(&mut self, text: &str) -> Result<bool> {
        let Some(command) = SlashCommand::parse(text) else {
            self.submit(text)?;
            return Ok(true);
        };

        if command.is_quit() {
            return Ok(false);
        }

        if command.is_retry() {
            match self.reconciler.retry() {
                Some(_) => self.awaiting_reply = true,
                None => {
                    self.print_lines(&[notice(Tone::Muted, "There is nothing to retry.")])?;
                }
            }
        } else if command.is_new() {
            self.reconciler.abandon_session();
            self.settle();
            tracing::debug!(generation = self.reconciler.generation(), "Started a new session");
            self.print_lines(&[notice(Tone::Muted, "Started a new session.")])?;
            self.greet()?;
        } else if command.is_help() {
            let lines = help_text()
                .lines()
                .map(|line| return notice(Tone::Muted, line))
                .collect::<Vec<Line>>();
            self.print_lines(&lines)?;
        }

        return Ok(true);
    }

    fn apply(&mut self, event: StreamEvent) -> Result<()> {
        if !self.reconciler.apply(event) {
            return Ok(());
        }

        let state = self.reconciler.state();
        let view = self.reconciler.view();
        // The open turn while streaming, the settled reply right after.
        let reply = view
            .open_turn()
            .or_else(|| {
                return view
                    .transcript
                    .last()
                    .filter(|turn| return turn.role == Role::Assistant);
            })
            .filter(|_| return self.awaiting_reply)
            .map(|turn| return (turn.status, render_turn(turn)));
        let error = view
            .last_error
            .filter(|_| return state == SessionState::Error)
            .map(render_error);

        if let Some((status, lines)) = reply {
            self.redraw_live(&lines)?;

            if status != TurnStatus::InProgress {
                self.settle();
            }
            if status == TurnStatus::Final {
                if let Some(level_up) = self.reconciler.tick(Instant::now()) {
                    self.print_lines(&[render_level_up(&level_up)])?;
                }
                self.print_progress()?;
            }
        }

        if let Some(line) = error {
            self.settle();
            self.print_lines(&[line])?;
        }

        return self.flush_notices();
    }

    fn honey_balance(&mut self, honey: u32) -> Result<()> {
        self.pending_notices
            .push(notice(Tone::Progress, &format!("You have {honey} honey.")));
        return self.flush_notices();
    }

    fn tick(&mut self) -> Result<()> {
        if let Some(level_up) = self.reconciler.tick(Instant::now()) {
            self.pending_notices.push(render_level_up(&level_up));
        }

        return self.flush_notices();
    }
}

pub async fn start(
    action_tx: mpsc::UnboundedSender<Action>,
    notification_tx: mpsc::UnboundedSender<Notification>,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let language = Language::from_str(&Config::get(ConfigKey::Language)).unwrap_or_default();
    let student_context = StudentContext::from_config(
        &Config::get(ConfigKey::StudentAge),
        &Config::get(ConfigKey::NativeLanguage),
    );
    let celebration_duration = Duration::from_millis(Config::get_u64(ConfigKey::CelebrationDuration));

    let reconciler = SessionReconciler::new(
        language,
        student_context,
        celebration_duration,
        action_tx,
        notification_tx,
    );
    let mut repl = Repl::new(reconciler, Config::get(ConfigKey::StudentName), io::stdout());

    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();

    let session_id = Config::get(ConfigKey::SessionID);
    if !session_id.is_empty() {
        let session = cli::sessions().load(&session_id).await?;
        repl.reconciler.restore(SessionSeed::from(session));
        repl.print_transcript()?;
        repl.print_progress()?;
    }

    let language = repl.reconciler.view().language;
    repl.print_lines(&[notice(
        Tone::Muted,
        &format!("Learning {language}. Type /help for commands, /quit to leave."),
    )])?;

    if repl.reconciler.view().transcript.is_empty() {
        while repl.student_name.trim().is_empty() {
            write!(repl.out, "What's your name? ")?;
            repl.out.flush()?;
            match stdin_lines.next_line().await? {
                Some(name) => repl.student_name = name.trim().to_string(),
                None => return Ok(()),
            }
        }
        repl.greet()?;
    }

    let mut ticker = time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            line = stdin_lines.next_line() => {
                match line? {
                    Some(text) => {
                        if !repl.handle_input(&text)? {
                            break;
                        }
                    }
                    None => break,
                }
            }
            event = event_rx.recv() => {
                match event {
                    Some(Event::Stream(event)) => repl.apply(event)?,
                    Some(Event::HoneyBalance(honey)) => repl.honey_balance(honey)?,
                    None => break,
                }
            }
            _ = ticker.tick() => repl.tick()?,
        }
    }

    return Ok(());
}
