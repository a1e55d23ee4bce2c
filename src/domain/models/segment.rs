use super::PartialExercisePart;

/// A contiguous slice of a sentence. Matched slices carry the exercise part
/// that annotates them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub part: Option<PartialExercisePart>,
}

impl Segment {
    pub fn plain(text: &str) -> Segment {
        return Segment {
            text: text.to_string(),
            part: None,
        };
    }

    pub fn matched(text: &str, part: PartialExercisePart) -> Segment {
        return Segment {
            text: text.to_string(),
            part: Some(part),
        };
    }

    pub fn is_matched(&self) -> bool {
        return self.part.is_some();
    }
}
