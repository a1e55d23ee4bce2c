use super::Language;
use super::TutorTurn;

/// Messages the session hands to its external collaborators. Delivery is
/// fire-and-forget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    TurnFinalized {
        session_id: String,
        language: Language,
        turn: TutorTurn,
    },
    ExchangeCompleted {
        session_id: String,
    },
}
