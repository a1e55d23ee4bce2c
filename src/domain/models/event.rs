use super::PartialTutorResponse;
use super::StreamError;

/// Monotonic token identifying one outbound generation request.
pub type Generation = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamUpdate {
    Snapshot(PartialTutorResponse),
    Completed(PartialTutorResponse),
    Failed {
        last: Option<PartialTutorResponse>,
        error: StreamError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamEvent {
    pub generation: Generation,
    pub update: StreamUpdate,
}

pub enum Event {
    HoneyBalance(u32),
    Stream(StreamEvent),
}
