#[cfg(test)]
#[path = "render_test.rs"]
mod tests;

use super::segment;
use crate::domain::models::CefrLevel;
use crate::domain::models::LevelUp;
use crate::domain::models::PartialTutorResponse;
use crate::domain::models::Role;
use crate::domain::models::StreamError;
use crate::domain::models::TurnStatus;
use crate::domain::models::TutorTurn;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tone {
    Student,
    Tutor,
    Correction,
    Explanation,
    Exercise,
    Progress,
    Muted,
    Alert,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub tone: Tone,
    pub text: String,
}

impl Line {
    fn new(tone: Tone, text: &str) -> Line {
        return Line {
            tone,
            text: text.to_string(),
        };
    }
}

/// Renders whatever part of a tutor response has arrived so far. Missing
/// fields are skipped, never shown as placeholders.
fn render_response(res: &PartialTutorResponse) -> Vec<Line> {
    let mut lines = vec![];

    if let Some(message) = &res.chat_message {
        lines.push(Line::new(Tone::Tutor, &format!("tutor> {message}")));
    }

    if let Some(corrected) = res.corrected_response.as_deref().filter(|e| return !e.is_empty()) {
        let submitted = res.submitted_sentence.as_deref().unwrap_or_default();
        if !submitted.is_empty() && submitted != corrected {
            lines.push(Line::new(Tone::Muted, &format!("  You wrote: {submitted}")));
        }
        lines.push(Line::new(Tone::Correction, &format!("  Correct: {corrected}")));
    }

    for explanation in res.explanations() {
        lines.push(Line::new(Tone::Explanation, &format!("  - {explanation}")));
    }

    if let Some(sentence) = res.full_sentence().filter(|e| return !e.is_empty()) {
        let segments = segment(sentence, &res.parts());
        let highlighted = segments
            .iter()
            .map(|seg| {
                if seg.is_matched() {
                    return format!("[{}]", seg.text);
                }
                return seg.text.to_string();
            })
            .collect::<String>();
        lines.push(Line::new(Tone::Exercise, &format!("  Translate: {highlighted}")));

        for seg in segments.iter() {
            let Some(part) = &seg.part else {
                continue;
            };
            let mut text = format!("    [{}]", seg.text);
            if let Some(translation) = part.translation.as_deref().filter(|e| return !e.is_empty()) {
                text.push_str(&format!(" {translation}"));
            }
            if let Some(notes) = part.notes.as_deref().filter(|e| return !e.is_empty()) {
                text.push_str(&format!(" ({notes})"));
            }
            lines.push(Line::new(Tone::Muted, &text));
        }
    }

    return lines;
}

pub fn render_turn(turn: &TutorTurn) -> Vec<Line> {
    if turn.role == Role::User {
        let text = turn.content.to_prompt_text();
        return vec![Line::new(Tone::Student, &format!("you> {text}"))];
    }

    let partial = turn.content.as_partial();
    let mut lines = partial
        .as_ref()
        .map(render_response)
        .unwrap_or_default();

    match turn.status {
        TurnStatus::Final => {}
        TurnStatus::InProgress => {
            let evaluated = partial.as_ref().and_then(|res| {
                let level = CefrLevel::parse(res.overall_level()?);
                return render_progress(level, res.steps_to_next_level(), None);
            });
            lines.extend(evaluated);
            lines.push(Line::new(Tone::Muted, "  (thinking...)"));
        }
        TurnStatus::Failed => {
            lines.push(Line::new(
                Tone::Alert,
                "  (this response failed, type /retry to ask again)",
            ));
        }
    }

    return lines;
}

pub fn render_level_up(level_up: &LevelUp) -> Line {
    return Line::new(
        Tone::Progress,
        &format!("*** Level up! {} -> {} ***", level_up.from, level_up.to),
    );
}

/// The student's standing as tracked across the session. Nothing is shown
/// until a recognized level has been evaluated.
pub fn render_progress(
    level: Option<CefrLevel>,
    steps_to_next_level: Option<u32>,
    level_up: Option<LevelUp>,
) -> Option<Line> {
    let level = level?;

    let mut text = format!("  Level: {level}");
    if let Some(level_up) = level_up.filter(|e| return e.to == level) {
        text.push_str(&format!(" (up from {})", level_up.from));
    }
    match steps_to_next_level {
        Some(1) => text.push_str(", 1 step to the next level"),
        Some(steps) => text.push_str(&format!(", {steps} steps to the next level")),
        None => {}
    }

    return Some(Line::new(Tone::Progress, &text));
}

pub fn render_error(error: &StreamError) -> Line {
    if error.is_transport() {
        return Line::new(
            Tone::Alert,
            &format!("{error}. Check your connection, then type /retry to try again."),
        );
    }

    return Line::new(Tone::Alert, &format!("{error}. Type /retry to ask again."));
}
