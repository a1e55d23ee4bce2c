#[cfg(test)]
#[path = "segments_test.rs"]
mod tests;

use crate::domain::models::PartialExercisePart;
use crate::domain::models::Segment;

/// Partitions `sentence` into ordered plain and matched segments.
///
/// Matching is greedy: the leftmost occurrence among the remaining parts wins,
/// ties going to the part listed first, and each part is matched at most once.
/// Concatenating the segment texts always yields `sentence`.
pub fn segment(sentence: &str, parts: &[PartialExercisePart]) -> Vec<Segment> {
    let mut candidates = parts
        .iter()
        .filter_map(|part| {
            let text = part.text.as_deref().filter(|e| return !e.is_empty())?;
            if !sentence.contains(text) {
                tracing::debug!(part = text, sentence, "Exercise part does not occur in sentence");
                return None;
            }
            return Some((text, part));
        })
        .collect::<Vec<(&str, &PartialExercisePart)>>();

    let mut segments: Vec<Segment> = vec![];
    let mut remaining = sentence;

    while !remaining.is_empty() {
        let mut earliest: Option<(usize, usize)> = None;
        for (candidate_idx, (text, _)) in candidates.iter().enumerate() {
            if let Some(idx) = remaining.find(text) {
                if earliest.map_or(true, |(best, _)| return idx < best) {
                    earliest = Some((idx, candidate_idx));
                }
            }
        }

        let (idx, candidate_idx) = match earliest {
            Some(found) => found,
            None => {
                segments.push(Segment::plain(remaining));
                break;
            }
        };

        let (text, part) = candidates.remove(candidate_idx);
        if idx > 0 {
            segments.push(Segment::plain(&remaining[..idx]));
        }

        let end = idx + text.len();
        segments.push(Segment::matched(&remaining[idx..end], part.clone()));
        remaining = &remaining[end..];
    }

    return segments;
}
